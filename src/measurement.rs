//! IV measurements, temperature bands and the lookup of the most
//! recent measurement of a module.

use std::fmt::{self, Display, Formatter};

use ndarray::Array1;
use tracing::{debug, warn};

use crate::Error;

/// One IV test event of a module, as stored in `module_iv_test`.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct IvMeasurement {
    /// Test sequence number; later tests have larger numbers.
    pub mod_ivtest_no: i64,
    /// Programmed voltages [V].
    pub program_v: Vec<f64>,
    /// Measured currents [A], one per voltage.
    pub meas_i: Vec<f64>,
    /// Temperature [°C].
    pub temp_c: f64,
    /// Relative humidity [%], not always recorded.
    pub rel_hum: Option<f64>,
}

impl IvMeasurement {
    /// Absolute value of the programmed voltages [V].
    pub fn voltage(&self) -> Array1<f64> {
        Array1::from(self.program_v.clone()).mapv(f64::abs)
    }

    /// Measured currents converted to µA.
    pub fn current_ua(&self) -> Array1<f64> {
        Array1::from(self.meas_i.clone()) * 1e6
    }
}

/// Comparison applied to the real-valued cast of `temp_c`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TempPredicate {
    Above(f32),
    Equals(f32),
}

impl Default for TempPredicate {
    fn default() -> Self {
        TempPredicate::Equals(20.)
    }
}

impl TempPredicate {
    /// SQL comparison operator.  The threshold is always bound as a
    /// query parameter.
    pub fn sql_operator(self) -> &'static str {
        match self {
            TempPredicate::Above(_) => ">",
            TempPredicate::Equals(_) => "=",
        }
    }

    pub fn threshold(self) -> f32 {
        match self {
            TempPredicate::Above(t) | TempPredicate::Equals(t) => t,
        }
    }
}

impl Display for TempPredicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.sql_operator(), self.threshold())
    }
}

/// Temperature condition of a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Band {
    /// Anything above 20°C.
    Room,
    Minus40,
    Plus20,
}

impl Band {
    pub const ALL: [Band; 3] = [Band::Room, Band::Minus40, Band::Plus20];

    pub fn predicate(self) -> TempPredicate {
        match self {
            Band::Room => TempPredicate::Above(20.),
            Band::Minus40 => TempPredicate::Equals(-40.),
            Band::Plus20 => TempPredicate::Equals(20.),
        }
    }

    /// Name of the summary chart of this band.
    pub fn summary_name(self) -> &'static str {
        match self {
            Band::Room => "summary0_ZoomTemp",
            Band::Minus40 => "summary1_Minus40",
            Band::Plus20 => "summary2_Plus20",
        }
    }

    /// Title of the legend of the summary chart.
    pub fn legend_title(self) -> &'static str {
        match self {
            Band::Room => "room_temp",
            Band::Minus40 => "minus 40",
            Band::Plus20 => "plus 20",
        }
    }
}

/// Where IV measurements are read from.
pub trait MeasurementSource {
    /// All measurements of `module` whose temperature satisfies
    /// `predicate`, ordered by ascending test sequence number.
    fn measurements(
        &mut self, module: &str, predicate: TempPredicate
    ) -> Result<Vec<IvMeasurement>, Error>;

    /// Release the source.  Dropping it releases it as well, without
    /// reporting errors.
    fn close(self) -> Result<(), Error>
    where Self: Sized {
        Ok(())
    }
}

/// Return the most recent measurement of `module` satisfying
/// `predicate`, or `None` (with a warning) if there is none.
pub fn lookup<S>(
    source: &mut S, module: &str, predicate: TempPredicate,
) -> Result<Option<IvMeasurement>, Error>
where S: MeasurementSource + ?Sized {
    let rows = source.measurements(module, predicate)?;
    debug!(module, %predicate, rows = rows.len(), "IV data queried");
    // `max_by_key` keeps the last of equal keys, like taking the last row.
    let latest = rows.into_iter().max_by_key(|m| m.mod_ivtest_no);
    if latest.is_none() {
        warn!("IV data for {module} does not exist at temperature {predicate} !");
    }
    Ok(latest)
}

/// The latest measurement of one module in every band.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleCurves {
    pub room: Option<IvMeasurement>,
    pub minus40: Option<IvMeasurement>,
    pub plus20: Option<IvMeasurement>,
}

impl ModuleCurves {
    /// Look up the three bands of `module`, in the order room, -40, +20.
    pub fn fetch<S>(source: &mut S, module: &str) -> Result<Self, Error>
    where S: MeasurementSource + ?Sized {
        Ok(ModuleCurves {
            room: lookup(source, module, Band::Room.predicate())?,
            minus40: lookup(source, module, Band::Minus40.predicate())?,
            plus20: lookup(source, module, Band::Plus20.predicate())?,
        })
    }

    pub fn get(&self, band: Band) -> Option<&IvMeasurement> {
        match band {
            Band::Room => self.room.as_ref(),
            Band::Minus40 => self.minus40.as_ref(),
            Band::Plus20 => self.plus20.as_ref(),
        }
    }

    pub fn take(&mut self, band: Band) -> Option<IvMeasurement> {
        match band {
            Band::Room => self.room.take(),
            Band::Minus40 => self.minus40.take(),
            Band::Plus20 => self.plus20.take(),
        }
    }

    pub fn is_empty(&self) -> bool {
        Band::ALL.iter().all(|&b| self.get(b).is_none())
    }
}

/// Latest measurement of several modules in a single band, in the
/// order the modules were first inserted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BandCollection {
    entries: Vec<(String, IvMeasurement)>,
}

impl BandCollection {
    /// Record `measurement` for `module`, replacing a previous one.
    pub fn insert(&mut self, module: &str, measurement: IvMeasurement) {
        match self.entries.iter_mut().find(|(m, _)| m == module) {
            Some(entry) => entry.1 = measurement,
            None => self.entries.push((module.to_string(), measurement)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IvMeasurement)> {
        self.entries.iter().map(|(m, iv)| (m.as_str(), iv))
    }
}
