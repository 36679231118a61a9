//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. The
//! presence registry, broadcast router, and pointer throttle are in-process
//! services; documents and identities sit behind traits so the server runs
//! with or without Postgres.

use std::sync::Arc;

use crate::config::Config;
use crate::services::broadcast::BroadcastRouter;
use crate::services::document::DocumentStore;
use crate::services::identity::IdentityProvider;
use crate::services::presence::PresenceRegistry;
use crate::throttle::PointerThrottle;

/// Clone is required by Axum; every field is `Arc`-backed.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub presence: PresenceRegistry,
    pub router: BroadcastRouter,
    pub pointer_throttle: PointerThrottle,
    pub documents: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    #[must_use]
    pub fn new(config: Config, documents: Arc<dyn DocumentStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        let presence = PresenceRegistry::new();
        Self {
            pointer_throttle: PointerThrottle::new(config.pointer_throttle),
            router: BroadcastRouter::new(presence.clone()),
            presence,
            config: Arc::new(config),
            documents,
            identity,
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;
    use crate::services::document::MemoryDocumentStore;
    use crate::services::identity::DevIdentity;

    /// In-memory documents, dev identities, default tuning.
    #[must_use]
    pub fn test_app_state() -> AppState {
        test_app_state_with(Config::default())
    }

    #[must_use]
    pub fn test_app_state_with(config: Config) -> AppState {
        AppState::new(config, Arc::new(MemoryDocumentStore::new()), Arc::new(DevIdentity))
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
