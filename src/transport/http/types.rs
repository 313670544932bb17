use crate::infra::config::{Config, Environment};
use crate::storage::ContactStore;
use crate::transport::http::session::{SessionStore, SESSION_LIFETIME};
use std::sync::Arc;

/// Dependencies shared by every handler, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub contacts: Arc<dyn ContactStore>,
    pub sessions: SessionStore,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(contacts: Arc<dyn ContactStore>, config: Config) -> Self {
        let secure_cookie = config.environment == Environment::Production;
        Self {
            contacts,
            sessions: SessionStore::new(SESSION_LIFETIME, secure_cookie),
            config: Arc::new(config),
        }
    }
}
