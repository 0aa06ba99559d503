//! Producing the IV plots of a list of modules.

use std::path::{Path, PathBuf};
use tracing::{debug, info};
use crate::{
    chart::Chart,
    measurement::{Band, BandCollection, MeasurementSource, ModuleCurves},
    Error,
};

/// Opens a fresh [`MeasurementSource`] for every module.
pub trait Connect {
    type Source: MeasurementSource;

    fn connect(&self) -> Result<Self::Source, Error>;
}

/// Draws a chart into files of `out_dir` and returns their paths.
pub trait Render {
    fn render(
        &mut self, chart: &Chart, out_dir: &Path
    ) -> Result<Vec<PathBuf>, Error>;
}

#[derive(Debug, Clone)]
pub struct Options {
    /// One chart per band over all modules instead of one per module.
    pub summary: bool,
    pub legend: bool,
    /// Existing directory receiving the plots.
    pub out_dir: PathBuf,
}

impl Default for Options {
    fn default() -> Self {
        Options { summary: false, legend: true, out_dir: PathBuf::from("out") }
    }
}

/// Per band curves of all modules, for the summary charts.
#[derive(Debug, Default)]
struct Summary {
    room: BandCollection,
    minus40: BandCollection,
    plus20: BandCollection,
}

impl Summary {
    fn add(&mut self, module: &str, mut curves: ModuleCurves) {
        for band in Band::ALL {
            if let Some(iv) = curves.take(band) {
                self.band_mut(band).insert(module, iv);
            }
        }
    }

    fn band_mut(&mut self, band: Band) -> &mut BandCollection {
        match band {
            Band::Room => &mut self.room,
            Band::Minus40 => &mut self.minus40,
            Band::Plus20 => &mut self.plus20,
        }
    }

    fn band(&self, band: Band) -> &BandCollection {
        match band {
            Band::Room => &self.room,
            Band::Minus40 => &self.minus40,
            Band::Plus20 => &self.plus20,
        }
    }
}

/// Plot the latest IV curves of `modules` and return the files written.
///
/// Every module is read through its own connection, closed before the
/// next module is processed.  Modules or bands without data are
/// skipped; database errors abort the run.
pub fn make_iv_curves<C, R>(
    modules: &[String], options: &Options, connector: &C, renderer: &mut R,
) -> Result<Vec<PathBuf>, Error>
where C: Connect, R: Render {
    if !options.out_dir.is_dir() {
        return Err(Error::OutputDir(options.out_dir.clone()));
    }
    let mut written = Vec::new();
    let mut summary = Summary::default();
    for module in modules {
        let mut source = connector.connect()?;
        let curves = ModuleCurves::fetch(&mut source, module)?;
        source.close()?;

        if options.summary {
            summary.add(module, curves);
        } else if let Some(chart) = Chart::module(module, &curves) {
            let chart = chart.with_legend(options.legend);
            written.extend(renderer.render(&chart, &options.out_dir)?);
        } else {
            debug!(module, "no IV data in any band, no plot");
        }
    }
    if options.summary {
        for band in Band::ALL {
            let modules = Some(summary.band(band));
            match Chart::summary(band, modules) {
                Some(chart) => {
                    let chart = chart.with_legend(options.legend);
                    written.extend(renderer.render(&chart, &options.out_dir)?);
                }
                None => debug!(?band, "no module has data, no summary plot"),
            }
        }
    }
    info!(modules = modules.len(), files = written.len(), "IV plots done");
    Ok(written)
}
