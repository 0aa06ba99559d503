use std::path::PathBuf;
use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use iv_curve::{db::PgConnector, plot::Matplotlib, report, settings, Settings};

/// Draw the IV curves of modules from the test database.
#[derive(Debug, Parser)]
#[command(name = "make-iv-curve")]
struct Args {
    /// Input module IDs for drawing, separated with spaces.
    #[arg(required = true)]
    modules: Vec<String>,

    /// Generate summary plots. Modules not found in the database are
    /// ignored.
    #[arg(short, long)]
    summary: bool,

    /// Configuration file with the database credentials.
    #[arg(short, long, default_value = "configuration.yaml")]
    config: PathBuf,

    /// Do not draw legends.
    #[arg(long)]
    no_legend: bool,
}

fn main() -> Result<()> {
    settings::init_logging()?;
    let args = Args::parse();
    debug!(?args, "arguments");

    let settings = Settings::load(&args.config)
        .with_context(|| format!("cannot read {}", args.config.display()))?;
    settings.export_framework_path();

    let connector = PgConnector::new(settings.connect_options()?)?;
    let options = report::Options {
        summary: args.summary,
        legend: !args.no_legend,
        ..Default::default()
    };
    report::make_iv_curves(&args.modules, &options, &connector, &mut Matplotlib)?;
    Ok(())
}
