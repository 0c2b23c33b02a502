use std::sync::Arc;

use twilight_http::Client;

use sweeper_store::ConfigStore;
use sweeper_utils::confirm::ConfirmationGate;

/// The recurring auto-cleanup task.
pub mod scheduler;
/// Environment-driven process settings.
pub mod settings;

pub use scheduler::CleanupScheduler;
pub use settings::Settings;

/// Shared application context passed into command handlers.
///
/// Cheap to clone because it only stores reference-counted shared state.
#[derive(Clone)]
pub struct Context {
    pub http: Arc<Client>,
    pub store: ConfigStore,
    pub scheduler: CleanupScheduler,
    pub confirmations: ConfirmationGate,
}

impl Context {
    /// Create a new application context.
    pub fn new(http: Arc<Client>, store: ConfigStore, scheduler: CleanupScheduler) -> Self {
        Self {
            http,
            store,
            scheduler,
            confirmations: ConfirmationGate::new(),
        }
    }
}
