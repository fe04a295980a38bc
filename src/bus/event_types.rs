//! Event categories and the user-facing notification texts.

use super::event_bus::{UiEvent, UiEventKind};

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

pub const CATEGORY_TOAST: &str = "toast";
pub const CATEGORY_NAVIGATION: &str = "navigation";
pub const CATEGORY_SESSION: &str = "session";

// ---------------------------------------------------------------------------
// Notification texts
// ---------------------------------------------------------------------------

pub const MSG_SEARCHING: &str = "Buscando...";
pub const MSG_SEARCH_DONE: &str = "Busca realizada com sucesso";
pub const MSG_SESSION_EXPIRED: &str = "Sessão expirada, faça login novamente";
pub const MSG_FETCH_FAILED: &str = "Não foi possível carregar os dados";
pub const MSG_UNEXPECTED: &str = "Ocorreu um erro inesperado";
pub const MSG_SIGNED_OUT: &str = "Sessão encerrada";

/// Category string for an event, used when logging or persisting it.
pub fn category_of(event: &UiEvent) -> &'static str {
    match event.kind {
        UiEventKind::Toast(_) | UiEventKind::Dismiss { .. } => CATEGORY_TOAST,
        UiEventKind::Navigate { .. } => CATEGORY_NAVIGATION,
        UiEventKind::SessionChanged { .. } => CATEGORY_SESSION,
    }
}
