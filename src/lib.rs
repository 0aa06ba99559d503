//! IV curves of tested hardware modules.
//!
//! Usage
//! -----
//!
//! The most recent current-voltage measurement of every requested
//! module is read from the `module_iv_test` table at three temperature
//! bands (room temperature, -40°C and 20°C) and drawn with
//! [Matplotlib][] into `out/<name>_IV.png` and `out/<name>_IV.pdf`,
//! either one chart per module or one summary chart per band.
//!
//! ```no_run
//! use std::path::PathBuf;
//! use iv_curve::{db::PgConnector, plot::Matplotlib, report, Settings};
//!
//! let settings = Settings::load("configuration.yaml")?;
//! let connector = PgConnector::new(settings.connect_options()?)?;
//! let options = report::Options {
//!     summary: true,
//!     legend: true,
//!     out_dir: PathBuf::from("out"),
//! };
//! let modules = vec!["320MLL3WCNT0181".to_string()];
//! report::make_iv_curves(&modules, &options, &connector, &mut Matplotlib)?;
//! # Ok::<(), iv_curve::Error>(())
//! ```
//!
//! [Matplotlib]: https://matplotlib.org/

use std::path::PathBuf;

pub mod chart;
pub mod db;
pub mod measurement;
pub mod plot;
pub mod report;
pub mod settings;

#[cfg(test)]
mod fixtures;

pub use chart::Chart;
pub use measurement::{Band, IvMeasurement, TempPredicate};
pub use settings::Settings;

/// Possible errors while producing IV plots.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The configuration file is missing, unreadable or incomplete.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
    /// Connecting to or querying the measurement database failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    /// `LOG_LEVEL` holds a value other than DEBUG, INFO or WARNING.
    #[error("unsupported LOG_LEVEL {0:?} (expected DEBUG, INFO or WARNING)")]
    LogLevel(String),
    /// A global tracing subscriber was already installed.
    #[error("cannot install the logger: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),
    /// Plots are only written into an existing directory.
    #[error("output directory {} does not exist", .0.display())]
    OutputDir(PathBuf),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Plot(#[from] plot::Error),
}
