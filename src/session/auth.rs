//! Sign-in and sign-out flows.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{SessionStore, SessionUser};
use crate::api::{ApiClient, ApiError};
use crate::bus::event_types::MSG_SIGNED_OUT;
use crate::bus::{EventBus, ToastLevel};
use crate::forms::{FormState, SubmitOptions};
use crate::routes::{Navigator, Route};
use crate::AppError;

pub const MSG_WELCOME: &str = "Login realizado com sucesso";
pub const MSG_BAD_CREDENTIALS: &str = "CPF ou senha inválidos";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInRequest {
    pub cpf: String,
    pub password: String,
}

/// The backend answers either `{ "user": {...} }` or the user itself.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SignInResponse {
    WithUser { user: SessionUser },
    Bare(SessionUser),
}

impl SignInResponse {
    pub fn into_user(self) -> SessionUser {
        match self {
            SignInResponse::WithUser { user } => user,
            SignInResponse::Bare(user) => user,
        }
    }
}

pub struct AuthFlow {
    api: Arc<ApiClient>,
    session: Arc<SessionStore>,
    navigator: Arc<Navigator>,
    bus: Arc<EventBus>,
}

impl AuthFlow {
    pub fn new(
        api: Arc<ApiClient>,
        session: Arc<SessionStore>,
        navigator: Arc<Navigator>,
        bus: Arc<EventBus>,
    ) -> Self {
        Self {
            api,
            session,
            navigator,
            bus,
        }
    }

    /// Submit the sign-in form. On success the session is stored and the
    /// user lands on the dashboard.
    pub async fn sign_in(
        &self,
        form: &mut FormState<SignInRequest>,
    ) -> Result<SessionUser, AppError> {
        let api = self.api.clone();
        let result = form
            .submit(SubmitOptions::new(&self.bus, MSG_WELCOME), |credentials| async move {
                api.sign_in(&credentials).await
            })
            .await;

        let response = match result {
            Ok(response) => response,
            Err(ApiError::Unauthorized) => {
                // 401 here means wrong credentials, not an expired session.
                self.bus.error(MSG_BAD_CREDENTIALS);
                return Err(ApiError::Unauthorized.into());
            }
            Err(e) => return Err(e.into()),
        };

        let user = response.into_user();
        self.session.sign_in(user.clone())?;
        form.reset();
        self.navigator.navigate(Route::Dashboard);
        Ok(user)
    }

    /// End the session. Local state is cleared even when the server call
    /// fails; the failure is only logged.
    pub async fn sign_out(&self) -> Result<(), AppError> {
        if let Err(e) = self.api.sign_out().await {
            tracing::warn!("server sign-out failed, clearing local session anyway: {e}");
        }
        self.session.sign_out()?;
        self.navigator.navigate(Route::SignIn);
        self.bus.toast(ToastLevel::Info, MSG_SIGNED_OUT);
        Ok(())
    }
}
