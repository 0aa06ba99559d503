//! Configuration file, environment and logging.

use std::path::Path;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};
use crate::Error;

/// Port of the measurement database.
pub const DB_PORT: u16 = 5432;

/// Prefix of the environment variables overriding configuration keys,
/// e.g. `IV_CURVE_PASSWORD`.
pub const ENV_PREFIX: &str = "IV_CURVE";

/// Content of `configuration.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_name: String,
    pub user: String,
    pub password: String,
    pub host: String,
    /// Exported as `FRAMEWORK_PATH`.
    pub framework_path: String,
    /// libpq style `sslmode` ("disable", "prefer", "require", ...);
    /// TLS is tried first and plaintext accepted when absent.
    #[serde(default)]
    pub sslmode: Option<String>,
}

impl Settings {
    /// Read the YAML file at `path`, then apply `IV_CURVE_*` overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Settings, Error> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()).format(FileFormat::Yaml))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    pub fn connect_options(&self) -> Result<PgConnectOptions, Error> {
        let ssl_mode = match &self.sslmode {
            Some(mode) => mode.parse()?,
            None => PgSslMode::Prefer,
        };
        Ok(PgConnectOptions::new()
            .host(&self.host)
            .port(DB_PORT)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database_name)
            .ssl_mode(ssl_mode))
    }

    /// Make the framework location known to child processes and
    /// libraries looking for it.
    pub fn export_framework_path(&self) {
        std::env::set_var("FRAMEWORK_PATH", &self.framework_path);
    }
}

/// Filter directive for a `LOG_LEVEL` value; INFO when unset.
pub fn log_directive(level: Option<&str>) -> Result<&'static str, Error> {
    match level {
        None | Some("INFO") => Ok("info"),
        Some("DEBUG") => Ok("debug"),
        Some("WARNING") => Ok("warn"),
        Some(other) => Err(Error::LogLevel(other.to_string())),
    }
}

/// Log to stdout at the verbosity given by `LOG_LEVEL`.
pub fn init_logging() -> Result<(), Error> {
    let level = std::env::var("LOG_LEVEL").ok();
    let directive = log_directive(level.as_deref())?;
    tracing_subscriber::registry()
        .with(EnvFilter::new(directive))
        .with(fmt::layer()
              .with_writer(std::io::stdout)
              .with_target(false)
              .with_file(true)
              .with_line_number(true))
        .try_init()?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use std::io::Write;
    use super::*;

    const CONFIG: &str = "\
database_name: hgcal
user: reader
password: secret
host: db.example.org
framework_path: /opt/framework
";

    fn config_file(content: &str) -> Result<tempfile::NamedTempFile, Error> {
        let mut f = tempfile::Builder::new().suffix(".yaml").tempfile()?;
        f.write_all(content.as_bytes())?;
        Ok(f)
    }

    #[test]
    fn load_yaml() -> Result<(), Error> {
        let f = config_file(CONFIG)?;
        let s = Settings::load(f.path())?;
        assert_eq!(s.database_name, "hgcal");
        assert_eq!(s.user, "reader");
        assert_eq!(s.host, "db.example.org");
        assert_eq!(s.framework_path, "/opt/framework");
        let options = s.connect_options()?;
        assert_eq!(options.get_host(), "db.example.org");
        assert_eq!(options.get_port(), DB_PORT);
        assert_eq!(options.get_database(), Some("hgcal"));
        assert!(matches!(options.get_ssl_mode(), PgSslMode::Prefer));
        Ok(())
    }

    #[test]
    fn sslmode() -> Result<(), Error> {
        let f = config_file(&format!("{CONFIG}sslmode: require\n"))?;
        let options = Settings::load(f.path())?.connect_options()?;
        assert!(matches!(options.get_ssl_mode(), PgSslMode::Require));

        let f = config_file(&format!("{CONFIG}sslmode: sometimes\n"))?;
        let s = Settings::load(f.path())?;
        assert!(matches!(s.connect_options(), Err(Error::Database(_))));
        Ok(())
    }

    #[test]
    fn framework_path_exported() -> Result<(), Error> {
        let f = config_file(CONFIG)?;
        Settings::load(f.path())?.export_framework_path();
        assert_eq!(std::env::var("FRAMEWORK_PATH").as_deref(),
                   Ok("/opt/framework"));
        Ok(())
    }

    #[test]
    fn missing_key() -> Result<(), Error> {
        let f = config_file("database_name: hgcal\nuser: reader\n")?;
        assert!(matches!(Settings::load(f.path()), Err(Error::Config(_))));
        Ok(())
    }

    #[test]
    fn missing_file() {
        let r = Settings::load("/nonexistent/configuration.yaml");
        assert!(matches!(r, Err(Error::Config(_))));
    }

    #[test]
    fn log_levels() {
        assert_eq!(log_directive(None).unwrap(), "info");
        assert_eq!(log_directive(Some("DEBUG")).unwrap(), "debug");
        assert_eq!(log_directive(Some("WARNING")).unwrap(), "warn");
        assert!(matches!(log_directive(Some("LOUD")), Err(Error::LogLevel(_))));
    }
}
