use tracing::warn;

use crate::error::{ClientError, StoreError};
use crate::session::{Session, SessionToken};
use crate::settings::ClientSettings;
use crate::store::RecordStore;

/// Everything a page operation needs besides its own state.
///
/// Passed explicitly to every operation; pages never reach for a global session.
pub struct AppContext<S> {
    pub store: S,
    pub session: Session,
    pub settings: ClientSettings,
}

impl<S: RecordStore> AppContext<S> {
    pub fn new(store: S, session: Session, settings: ClientSettings) -> Self {
        Self {
            store,
            session,
            settings,
        }
    }

    /// Token for the next store call.
    pub(crate) fn token(&self) -> Result<SessionToken, ClientError> {
        self.session.token().cloned()
    }

    /// Invalidates the session when `err` is an authorization failure.
    ///
    /// Returns `true` when the caller must reset its state.
    pub(crate) fn absorb_auth_failure(&mut self, err: &StoreError) -> bool {
        if err.is_unauthorized() {
            warn!("Store refused the session token");
            self.session.invalidate();
            true
        } else {
            false
        }
    }
}
