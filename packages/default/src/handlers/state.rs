use crate::auth::IdentityVerifier;
use crate::cloud::CredentialSource;
use crate::reconciler::SnapshotReconciler;
use crate::store::InventoryStore;
use axum::extract::FromRef;
use std::sync::Arc;

/// Shared server state handed to every route.
#[derive(Clone)]
pub struct AppState {
    reconciler: Arc<SnapshotReconciler>,
    store: Arc<dyn InventoryStore>,
    verifier: Arc<dyn IdentityVerifier>,
    credentials: Arc<dyn CredentialSource>,
}

impl AppState {
    pub fn new(
        reconciler: Arc<SnapshotReconciler>,
        store: Arc<dyn InventoryStore>,
        verifier: Arc<dyn IdentityVerifier>,
        credentials: Arc<dyn CredentialSource>,
    ) -> Self {
        Self {
            reconciler,
            store,
            verifier,
            credentials,
        }
    }

    pub fn reconciler(&self) -> &SnapshotReconciler {
        &self.reconciler
    }

    pub fn store(&self) -> &dyn InventoryStore {
        self.store.as_ref()
    }

    pub fn credentials(&self) -> &dyn CredentialSource {
        self.credentials.as_ref()
    }
}

impl FromRef<AppState> for Arc<dyn IdentityVerifier> {
    fn from_ref(state: &AppState) -> Arc<dyn IdentityVerifier> {
        state.verifier.clone()
    }
}
