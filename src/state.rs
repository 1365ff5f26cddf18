use std::sync::Arc;

use crate::database::store::Datastore;
use crate::revalidate::Revalidator;
use crate::services::IdentityService;
use crate::storage::FileStore;

/// Application dependencies, constructed once at startup and threaded
/// to every handler through axum state - nothing re-instantiates its
/// own data-access client ad hoc.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Datastore>,
    pub files: Arc<dyn FileStore>,
    pub revalidator: Arc<dyn Revalidator>,
    pub identity: IdentityService,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Datastore>,
        files: Arc<dyn FileStore>,
        revalidator: Arc<dyn Revalidator>,
    ) -> Self {
        let identity = IdentityService::new(store.clone());
        Self { store, files, revalidator, identity }
    }
}
