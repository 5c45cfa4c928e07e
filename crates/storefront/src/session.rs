//! Session identity: which user, if any, is logged in.
//!
//! One [`SessionIdentity`] is created per running application and handed to
//! everything that reads or writes it. It is never persisted, so a restart
//! always begins logged out.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use gameverse_core::UserId;

/// Shared slot holding the authenticated user's id.
///
/// Clones share the slot. Subscribers are woken only when the value actually
/// changes; setting the current value again is a no-op.
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    tx: Arc<watch::Sender<Option<UserId>>>,
}

impl SessionIdentity {
    /// Create a logged-out session.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tx: Arc::new(watch::Sender::new(None)),
        }
    }

    /// The current user id.
    #[must_use]
    pub fn get(&self) -> Option<UserId> {
        *self.tx.borrow()
    }

    /// Replace the current user id. Returns whether it changed.
    pub fn set(&self, id: Option<UserId>) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current == id {
                return false;
            }
            *current = id;
            true
        });
        if changed {
            debug!(user_id = ?id, "Session identity changed");
        }
        changed
    }

    /// Log out. Equivalent to `set(None)`.
    pub fn clear(&self) -> bool {
        self.set(None)
    }

    /// Receive every future change of the identity.
    ///
    /// The current value counts as already seen.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<UserId>> {
        self.tx.subscribe()
    }
}

impl Default for SessionIdentity {
    fn default() -> Self {
        Self::new()
    }
}
