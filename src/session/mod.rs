//! Authenticated session state.
//!
//! A single `SessionStore` instance is shared (behind `Arc`) by everything
//! that needs to know who is signed in. Only three entry points mutate it:
//! `sign_in`, `sign_out` and `expire` (the 401 path). Every mutation is
//! persisted to local storage and announced on the UI bus.

pub mod auth;

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::bus::{EventBus, UiEventKind};
use crate::db::{queries, Database, DbError};

/// Local storage key holding the persisted session.
pub const SESSION_STORAGE_KEY: &str = "auth-storage";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub name: String,
    pub cpf: String,
}

/// Persisted shape: `{ "user": {name, cpf} | null, "isAuthenticated": bool }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    #[serde(default)]
    pub user: Option<SessionUser>,
    #[serde(default)]
    pub is_authenticated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    SignedOut,
    SignedIn,
}

impl SessionState {
    pub fn phase(&self) -> SessionPhase {
        if self.is_authenticated && self.user.is_some() {
            SessionPhase::SignedIn
        } else {
            SessionPhase::SignedOut
        }
    }
}

pub struct SessionStore {
    db: Arc<Database>,
    bus: Arc<EventBus>,
    state: RwLock<SessionState>,
}

impl SessionStore {
    /// Restore the persisted session. A corrupt entry is discarded and the
    /// store starts signed out.
    pub fn load(db: Arc<Database>, bus: Arc<EventBus>) -> Result<Self, DbError> {
        let state = match queries::get_json::<SessionState>(&db, SESSION_STORAGE_KEY) {
            Ok(Some(state)) if state.phase() == SessionPhase::SignedIn => state,
            Ok(_) => SessionState::default(),
            Err(DbError::Corrupt { reason, .. }) => {
                tracing::warn!("discarding unreadable persisted session: {reason}");
                queries::remove_item(&db, SESSION_STORAGE_KEY)?;
                SessionState::default()
            }
            Err(e) => return Err(e),
        };

        Ok(Self {
            db,
            bus,
            state: RwLock::new(state),
        })
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.read().expect("session lock poisoned").clone()
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.read().expect("session lock poisoned").phase()
    }

    pub fn is_authenticated(&self) -> bool {
        self.phase() == SessionPhase::SignedIn
    }

    pub fn user(&self) -> Option<SessionUser> {
        self.state.read().expect("session lock poisoned").user.clone()
    }

    /// SignedOut/SignedIn → SignedIn.
    pub fn sign_in(&self, user: SessionUser) -> Result<(), DbError> {
        tracing::info!("session started for {}", user.name);
        self.replace(SessionState {
            user: Some(user),
            is_authenticated: true,
        })?;
        Ok(())
    }

    /// Explicit sign-out action.
    pub fn sign_out(&self) -> Result<(), DbError> {
        if self.replace(SessionState::default())? {
            tracing::info!("session ended by sign-out");
        }
        Ok(())
    }

    /// Forced expiry after the server rejected our credentials. Returns
    /// whether a live session was actually cleared.
    pub fn expire(&self) -> Result<bool, DbError> {
        let was_signed_in = self.replace(SessionState::default())?;
        if was_signed_in {
            tracing::info!("session expired by server");
        }
        Ok(was_signed_in)
    }

    /// Persist `next`, swap it in and announce the transition. Returns
    /// whether the previous state was signed in.
    ///
    /// A sign-in that cannot be persisted leaves the store untouched. A
    /// clear always takes effect in memory; the storage error is still
    /// returned.
    fn replace(&self, next: SessionState) -> Result<bool, DbError> {
        let authenticated = next.phase() == SessionPhase::SignedIn;
        let mut guard = self.state.write().expect("session lock poisoned");

        let persisted = if authenticated {
            queries::set_json(&self.db, SESSION_STORAGE_KEY, &next)
        } else {
            queries::remove_item(&self.db, SESSION_STORAGE_KEY).map(|_| ())
        };
        let persisted = match (authenticated, persisted) {
            (true, Err(e)) => return Err(e),
            (false, Err(e)) => {
                tracing::warn!("session cleared in memory only: {e}");
                Err(e)
            }
            (_, ok) => ok,
        };

        let previous = std::mem::replace(&mut *guard, next.clone());
        drop(guard);

        let was_signed_in = previous.phase() == SessionPhase::SignedIn;
        if was_signed_in != authenticated || previous.user != next.user {
            self.bus.emit(UiEventKind::SessionChanged { authenticated });
        }
        persisted.map(|()| was_signed_in)
    }
}
