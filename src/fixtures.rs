//! In-memory stand-ins for the database and the plotting backend.

use std::{
    cell::Cell,
    fs,
    path::{Path, PathBuf},
    rc::Rc,
};
use crate::{
    chart::Chart,
    measurement::{IvMeasurement, MeasurementSource, TempPredicate},
    report::{Connect, Render},
    Error,
};

/// A measurement at `temp_c` with the voltages and currents of a small
/// healthy sensor.
pub(crate) fn measurement(mod_ivtest_no: i64, temp_c: f64) -> IvMeasurement {
    IvMeasurement {
        mod_ivtest_no,
        program_v: vec![0., -100., -200., -300.],
        meas_i: vec![1e-9, 2e-8, 5e-8, 9e-8],
        temp_c,
        rel_hum: Some(12.5),
    }
}

/// Evaluate `predicate` the way the database does, on `REAL`.
pub(crate) fn satisfies(predicate: TempPredicate, temp_c: f64) -> bool {
    let t = temp_c as f32;
    match predicate {
        TempPredicate::Above(x) => t > x,
        TempPredicate::Equals(x) => t == x,
    }
}

/// Rows of `module_iv_test`, queried like the database does.
pub(crate) struct MemorySource {
    rows: Vec<(String, IvMeasurement)>,
    closed: Rc<Cell<usize>>,
}

impl MemorySource {
    pub(crate) fn new(rows: Vec<(&str, IvMeasurement)>) -> Self {
        let rows = rows.into_iter()
            .map(|(m, iv)| (m.to_string(), iv)).collect();
        MemorySource { rows, closed: Rc::default() }
    }
}

impl MeasurementSource for MemorySource {
    fn measurements(
        &mut self, module: &str, predicate: TempPredicate
    ) -> Result<Vec<IvMeasurement>, Error> {
        let mut found: Vec<_> = self.rows.iter()
            .filter(|(m, iv)| m == module && satisfies(predicate, iv.temp_c))
            .map(|(_, iv)| iv.clone())
            .collect();
        found.sort_by_key(|iv| iv.mod_ivtest_no);
        Ok(found)
    }

    fn close(self) -> Result<(), Error> {
        self.closed.set(self.closed.get() + 1);
        Ok(())
    }
}

/// Hands out a fresh [`MemorySource`] over the same rows per connection.
pub(crate) struct MemoryConnector {
    rows: Vec<(String, IvMeasurement)>,
    pub(crate) opened: Cell<usize>,
    pub(crate) closed: Rc<Cell<usize>>,
}

impl MemoryConnector {
    pub(crate) fn new(rows: Vec<(&str, IvMeasurement)>) -> Self {
        let rows = rows.into_iter()
            .map(|(m, iv)| (m.to_string(), iv)).collect();
        MemoryConnector { rows, opened: Cell::new(0), closed: Rc::default() }
    }
}

impl Connect for MemoryConnector {
    type Source = MemorySource;

    fn connect(&self) -> Result<MemorySource, Error> {
        self.opened.set(self.opened.get() + 1);
        Ok(MemorySource { rows: self.rows.clone(), closed: self.closed.clone() })
    }
}

/// Writes empty files where the charts would go and keeps the charts.
#[derive(Default)]
pub(crate) struct Recorder {
    pub(crate) charts: Vec<Chart>,
}

impl Render for Recorder {
    fn render(
        &mut self, chart: &Chart, out_dir: &Path
    ) -> Result<Vec<PathBuf>, Error> {
        let paths = chart.output_paths(out_dir);
        for p in &paths {
            fs::write(p, b"")?;
        }
        self.charts.push(chart.clone());
        Ok(paths.to_vec())
    }
}

/// File names in `dir`, sorted.
pub(crate) fn file_names(dir: &Path) -> Result<Vec<String>, Error> {
    let mut names = fs::read_dir(dir)?
        .map(|e| e.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<Result<Vec<_>, _>>()?;
    names.sort();
    Ok(names)
}
