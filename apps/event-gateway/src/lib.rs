pub mod config;
pub mod error;
pub mod gateway;
pub mod routes;
pub mod store;

use std::sync::Arc;

use config::Config;
use gateway::{ConnectionDirectory, Dispatcher, EventRegistry};
use store::{AudienceStore, IdentityResolver};

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub directory: Arc<ConnectionDirectory>,
    pub dispatcher: Arc<Dispatcher>,
    pub identity: Arc<dyn IdentityResolver>,
}

impl AppState {
    /// Wire the directory, the standard event registry and the dispatcher
    /// around the given collaborators.
    pub fn new(
        config: Config,
        identity: Arc<dyn IdentityResolver>,
        audience: Arc<dyn AudienceStore>,
    ) -> Self {
        let directory = Arc::new(ConnectionDirectory::new());
        let registry = Arc::new(EventRegistry::standard());
        let dispatcher = Arc::new(Dispatcher::new(registry, directory.clone(), audience));
        Self {
            config: Arc::new(config),
            directory,
            dispatcher,
            identity,
        }
    }
}
