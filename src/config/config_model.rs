#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub database: Database,
    pub sweep: Sweep,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
    pub max_connections: Option<u32>,
}

/// Look-ahead windows, in days, for the renewal sweep reports.
#[derive(Debug, Clone)]
pub struct Sweep {
    pub trial_day_range: i64,
    pub period_day_range: i64,
}
