use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;

pub struct GlobalState {
    pub config: AppConfig,
    pub db: sqlx::PgPool,
    pub shutdown: CancellationToken,
}

impl GlobalState {
    pub fn new(config: AppConfig, db: sqlx::PgPool) -> Self {
        Self {
            config,
            db,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn live_margin(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.config.events.live_margin_minutes)
    }
}
