//! UI event bus.
//!
//! Everything the view layer reacts to without asking for it flows through
//! here: transient notifications (toasts), navigation requests and session
//! transitions.
//!
//! # Architecture
//!
//! Producers (search coordinator, fetch controller, 401 interceptor, form
//! submission) publish onto `EventBus`; the view layer holds a receiver from
//! `subscribe()` and renders what arrives. Events carry a monotonically
//! increasing `seq` so a consumer that lags can tell what it missed.

mod event_bus;
pub mod event_types;

pub use event_bus::{EventBus, Toast, ToastLevel, UiEvent, UiEventKind};
