use anyhow::{Context, Result};

use crate::application::usecases::subscriptions::DEFAULT_DAY_RANGE;

use super::config_model::{Database, DotEnvyConfig, Sweep};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let database = Database {
        url: std::env::var("DATABASE_URL").context("DATABASE_URL is invalid")?,
        max_connections: optional_var("DATABASE_MAX_CONNECTIONS")?,
    };

    let sweep = Sweep {
        trial_day_range: optional_var("SWEEP_TRIAL_DAY_RANGE")?.unwrap_or(DEFAULT_DAY_RANGE),
        period_day_range: optional_var("SWEEP_PERIOD_DAY_RANGE")?.unwrap_or(DEFAULT_DAY_RANGE),
    };

    Ok(DotEnvyConfig { database, sweep })
}

fn optional_var<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{key} is invalid")),
        _ => Ok(None),
    }
}
