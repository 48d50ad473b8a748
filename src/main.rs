use anyhow::Result;
use plan_subscriptions::{
    application::usecases::subscriptions::SubscriptionUseCase,
    config::config_loader,
    domain::{errors::SubscriptionError, value_objects::clock::SystemClock},
    infrastructure::postgres::{
        postgres_connection,
        repositories::{plans::PlanPostgres, subscriptions::SubscriptionPostgres},
    },
    observability,
};
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        error!("Renewal sweep exited with error: {}", error);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    observability::init_observability("renewal-sweep")?;

    let config = config_loader::load()?;
    info!("ENV has been loaded");

    let postgres_pool = Arc::new(postgres_connection::establish_connection(&config.database)?);
    info!("Postgres connection has been established");

    let subscriptions = SubscriptionUseCase::new(
        Arc::new(PlanPostgres::new(Arc::clone(&postgres_pool))),
        Arc::new(SubscriptionPostgres::new(Arc::clone(&postgres_pool))),
        Arc::new(SystemClock),
    );

    let ending_trials = subscriptions.ending_trial(config.sweep.trial_day_range).await?;
    for subscription in &ending_trials {
        info!(
            subscription_id = %subscription.id,
            trial_ends_at = ?subscription.trial_ends_at,
            "sweep: trial ending soon"
        );
    }

    let ending_periods = subscriptions
        .ending_period(config.sweep.period_day_range, None)
        .await?;
    info!(count = ending_periods.len(), "sweep: periods ending soon");

    let mut renewed = 0usize;
    let mut skipped = 0usize;
    for mut subscription in subscriptions.renewable().await? {
        if subscription.is_suspended() {
            skipped += 1;
            continue;
        }

        match subscriptions.renew(&mut subscription).await {
            Ok(()) => renewed += 1,
            Err(SubscriptionError::Renewal) => skipped += 1,
            Err(SubscriptionError::Conflict(subscription_id)) => {
                warn!(%subscription_id, "sweep: subscription changed during renewal, left for next run");
                skipped += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }

    info!(renewed, skipped, "sweep: renewal finished");
    Ok(())
}
