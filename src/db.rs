//! Measurements read from the PostgreSQL test database.

use std::sync::Arc;
use sqlx::{
    postgres::{PgConnectOptions, PgConnection},
    Connection,
};
use tokio::runtime::{Builder, Runtime};
use tracing::debug;
use crate::{
    measurement::{IvMeasurement, MeasurementSource, TempPredicate},
    report::Connect,
    Error,
};

/// Query of all IV tests of a module satisfying a temperature
/// comparison, oldest first.  `$1` is the module name, `$2` the
/// temperature threshold.
pub fn iv_query(predicate: TempPredicate) -> String {
    format!(
        "SELECT mod_ivtest_no::BIGINT AS mod_ivtest_no, \
                program_v::FLOAT8[] AS program_v, \
                meas_i::FLOAT8[] AS meas_i, \
                temp_c::FLOAT8 AS temp_c, \
                rel_hum::FLOAT8 AS rel_hum \
         FROM public.module_iv_test \
         WHERE module_name = $1 AND (temp_c::REAL) {} $2 \
         ORDER BY mod_ivtest_no ASC",
        predicate.sql_operator())
}

/// Opens one connection per module with fixed credentials.
///
/// sqlx is asynchronous; every call is driven to completion on a
/// private current-thread runtime so the rest of the program stays
/// sequential.
pub struct PgConnector {
    options: PgConnectOptions,
    runtime: Arc<Runtime>,
}

impl PgConnector {
    pub fn new(options: PgConnectOptions) -> Result<Self, Error> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(PgConnector { options, runtime: Arc::new(runtime) })
    }
}

impl Connect for PgConnector {
    type Source = PgSession;

    fn connect(&self) -> Result<PgSession, Error> {
        let conn = self.runtime
            .block_on(PgConnection::connect_with(&self.options))?;
        debug!(host = self.options.get_host(), "connected to the database");
        Ok(PgSession { conn, runtime: self.runtime.clone() })
    }
}

/// An open database connection.  Dropping it closes the socket,
/// [`MeasurementSource::close`] also tells the server.
pub struct PgSession {
    conn: PgConnection,
    runtime: Arc<Runtime>,
}

impl MeasurementSource for PgSession {
    fn measurements(
        &mut self, module: &str, predicate: TempPredicate
    ) -> Result<Vec<IvMeasurement>, Error> {
        let query = iv_query(predicate);
        let rows = self.runtime.block_on(
            sqlx::query_as::<_, IvMeasurement>(&query)
                .bind(module)
                .bind(predicate.threshold())
                .fetch_all(&mut self.conn))?;
        Ok(rows)
    }

    fn close(self) -> Result<(), Error> {
        self.runtime.block_on(self.conn.close())?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::Band;

    #[test]
    fn query_per_band() {
        let room = iv_query(Band::Room.predicate());
        assert!(room.contains("WHERE module_name = $1 AND (temp_c::REAL) > $2"));
        assert!(room.ends_with("ORDER BY mod_ivtest_no ASC"));
        let cold = iv_query(Band::Minus40.predicate());
        assert!(cold.contains("(temp_c::REAL) = $2"));
        assert_eq!(cold, iv_query(Band::Plus20.predicate()));
    }

    #[test]
    fn query_selects_measurement_columns() {
        let q = iv_query(TempPredicate::default());
        for column in ["mod_ivtest_no", "program_v", "meas_i", "temp_c", "rel_hum"] {
            assert!(q.contains(&format!("AS {column}")), "{column} in {q}");
        }
        assert!(q.contains("FROM public.module_iv_test"));
    }
}
