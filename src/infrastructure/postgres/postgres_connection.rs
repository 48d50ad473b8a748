use anyhow::{Context, Result};
use diesel::{
    Connection, PgConnection,
    connection::CacheSize,
    r2d2::{ConnectionManager, CustomizeConnection, Error as R2d2Error, Pool},
};

use crate::config::config_model::Database;

/// Transaction-pooling proxies reject named prepared statements.
#[derive(Debug, Default)]
struct DisablePreparedStatements;

impl CustomizeConnection<PgConnection, R2d2Error> for DisablePreparedStatements {
    fn on_acquire(&self, conn: &mut PgConnection) -> std::result::Result<(), R2d2Error> {
        conn.set_prepared_statement_cache_size(CacheSize::Disabled);
        Ok(())
    }
}

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

pub fn establish_connection(database: &Database) -> Result<PgPool> {
    let manager = ConnectionManager::<PgConnection>::new(&database.url);
    let mut builder = Pool::builder()
        .connection_customizer(Box::new(DisablePreparedStatements));

    if let Some(max_connections) = database.max_connections {
        builder = builder.max_size(max_connections);
    }

    builder
        .build(manager)
        .context("failed to build postgres connection pool")
}
