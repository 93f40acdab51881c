//! Shared handler state.

use sqlx::PgPool;

use crate::config::Config;
use crate::email::Mailer;
use crate::storage::ObjectStore;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub storage: ObjectStore,
    pub mailer: Mailer,
    pub nats: Option<async_nats::Client>,
    pub config: Config,
}

impl AppState {
    pub fn new(
        db: PgPool,
        storage: ObjectStore,
        mailer: Mailer,
        nats: Option<async_nats::Client>,
        config: Config,
    ) -> Self {
        Self { db, storage, mailer, nats, config }
    }
}
