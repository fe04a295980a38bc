//! Dashboard routes and the navigation guard.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

use crate::bus::EventBus;
use crate::model::Id;
use crate::session::SessionStore;

/// Named routes of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    SignIn,
    Dashboard,
    Admins,
    AdminNew,
    AdminEdit { id: Id },
    Companies,
    CompanyNew,
    Events,
    EventNew,
    EventEdit { id: Id },
    EventDay { event_id: Id, day_id: Id },
    EventDayAttendance { event_id: Id, day_id: Id },
    Workers,
    WorkerNew,
    WorkersImport,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::SignIn => "/sign-in".to_string(),
            Route::Dashboard => "/".to_string(),
            Route::Admins => "/admins".to_string(),
            Route::AdminNew => "/admins/new".to_string(),
            Route::AdminEdit { id } => format!("/admins/{id}"),
            Route::Companies => "/companies".to_string(),
            Route::CompanyNew => "/companies/new".to_string(),
            Route::Events => "/events".to_string(),
            Route::EventNew => "/events/new".to_string(),
            Route::EventEdit { id } => format!("/events/{id}"),
            Route::EventDay { event_id, day_id } => format!("/events/{event_id}/days/{day_id}"),
            Route::EventDayAttendance { event_id, day_id } => {
                format!("/events/{event_id}/days/{day_id}/ponto")
            }
            Route::Workers => "/workers".to_string(),
            Route::WorkerNew => "/workers/new".to_string(),
            Route::WorkersImport => "/workers/import".to_string(),
        }
    }

    /// Every route but the sign-in page needs an authenticated session.
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Route::SignIn)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

fn parse_id(raw: &str, path: &str) -> Result<Id, String> {
    raw.parse::<Id>()
        .map_err(|_| format!("invalid id {raw:?} in route {path}"))
}

impl FromStr for Route {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let path = s.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path
            .trim_matches('/')
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();

        match segments.as_slice() {
            [] => Ok(Route::Dashboard),
            ["sign-in"] => Ok(Route::SignIn),
            ["admins"] => Ok(Route::Admins),
            ["admins", "new"] => Ok(Route::AdminNew),
            ["admins", id] => Ok(Route::AdminEdit {
                id: parse_id(id, s)?,
            }),
            ["companies"] => Ok(Route::Companies),
            ["companies", "new"] => Ok(Route::CompanyNew),
            ["events"] => Ok(Route::Events),
            ["events", "new"] => Ok(Route::EventNew),
            ["events", id] => Ok(Route::EventEdit {
                id: parse_id(id, s)?,
            }),
            ["events", event_id, "days", day_id] => Ok(Route::EventDay {
                event_id: parse_id(event_id, s)?,
                day_id: parse_id(day_id, s)?,
            }),
            ["events", event_id, "days", day_id, "ponto"] => Ok(Route::EventDayAttendance {
                event_id: parse_id(event_id, s)?,
                day_id: parse_id(day_id, s)?,
            }),
            ["workers"] => Ok(Route::Workers),
            ["workers", "new"] => Ok(Route::WorkerNew),
            ["workers", "import"] => Ok(Route::WorkersImport),
            _ => Err(format!("unknown route: {s}")),
        }
    }
}

impl serde::Serialize for Route {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.path())
    }
}

impl<'de> serde::Deserialize<'de> for Route {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Route::from_str(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Navigator
// ---------------------------------------------------------------------------

/// Tracks the current route and applies the auth guard on every transition.
pub struct Navigator {
    current: RwLock<Route>,
    session: Arc<SessionStore>,
    bus: Arc<EventBus>,
}

impl Navigator {
    pub fn new(session: Arc<SessionStore>, bus: Arc<EventBus>) -> Self {
        let initial = if session.is_authenticated() {
            Route::Dashboard
        } else {
            Route::SignIn
        };
        Self {
            current: RwLock::new(initial),
            session,
            bus,
        }
    }

    pub fn current(&self) -> Route {
        *self.current.read().expect("navigator lock poisoned")
    }

    /// Where a request for `target` actually lands given the session.
    pub fn resolve(&self, target: Route) -> Route {
        let authenticated = self.session.is_authenticated();
        if target.requires_auth() && !authenticated {
            Route::SignIn
        } else if target == Route::SignIn && authenticated {
            Route::Dashboard
        } else {
            target
        }
    }

    /// Navigate to `target` (or wherever the guard sends it) and return the
    /// route that was actually entered.
    pub fn navigate(&self, target: Route) -> Route {
        let route = self.resolve(target);
        if route != target {
            tracing::debug!("route guard redirected {target} to {route}");
        }
        self.enter(route);
        route
    }

    /// Unconditional jump to the sign-in page.
    pub fn redirect_to_sign_in(&self) {
        self.enter(Route::SignIn);
    }

    fn enter(&self, route: Route) {
        *self.current.write().expect("navigator lock poisoned") = route;
        self.bus.navigate(route);
    }
}
