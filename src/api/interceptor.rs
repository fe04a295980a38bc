//! Response interceptors.

use std::sync::Arc;

use reqwest::{Method, StatusCode};

use crate::bus::event_types::MSG_SESSION_EXPIRED;
use crate::bus::EventBus;
use crate::routes::Navigator;
use crate::session::SessionStore;

/// Sees the status of every response before the caller gets its result.
/// Interceptors cannot swallow or rewrite the outcome.
pub trait ResponseInterceptor: Send + Sync {
    fn on_response(&self, method: &Method, path: &str, status: StatusCode);
}

/// Ends the session on any 401: clears it, sends the user to sign-in and
/// tells them why.
pub struct SessionExpiryInterceptor {
    session: Arc<SessionStore>,
    navigator: Arc<Navigator>,
    bus: Arc<EventBus>,
}

impl SessionExpiryInterceptor {
    pub fn new(session: Arc<SessionStore>, navigator: Arc<Navigator>, bus: Arc<EventBus>) -> Self {
        Self {
            session,
            navigator,
            bus,
        }
    }
}

impl ResponseInterceptor for SessionExpiryInterceptor {
    fn on_response(&self, method: &Method, path: &str, status: StatusCode) {
        if status != StatusCode::UNAUTHORIZED {
            return;
        }

        tracing::warn!("{method} {path} returned 401; ending session");
        let was_signed_in = match self.session.expire() {
            Ok(was_signed_in) => was_signed_in,
            Err(e) => {
                // The in-memory state is already cleared at this point.
                tracing::error!("failed to clear persisted session: {e}");
                true
            }
        };

        self.navigator.redirect_to_sign_in();
        // A rejected sign-in attempt is not an expiry.
        if was_signed_in {
            self.bus.error(MSG_SESSION_EXPIRED);
        }
    }
}
