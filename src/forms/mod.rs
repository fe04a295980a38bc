//! Form state, validation and server error mapping.
//!
//! Validation runs before any request is made; a form that fails it never
//! reaches the network. Field errors coming back from the server land on the
//! same fields, so the view renders both kinds identically.

mod schemas;
pub mod validators;

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;

use serde::Serialize;

use crate::api::ApiError;
use crate::bus::EventBus;
use crate::routes::{Navigator, Route};

pub use schemas::Validate;

/// Field name → first error message for that field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors(BTreeMap<String, String>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error unless the field already has one.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// What happens around a submission besides the request itself.
pub struct SubmitOptions<'a> {
    pub bus: &'a EventBus,
    pub success_message: &'a str,
    pub reset_on_success: bool,
    /// Navigate here after a successful submission.
    pub redirect: Option<(&'a Navigator, Route)>,
}

impl<'a> SubmitOptions<'a> {
    pub fn new(bus: &'a EventBus, success_message: &'a str) -> Self {
        Self {
            bus,
            success_message,
            reset_on_success: false,
            redirect: None,
        }
    }

    pub fn reset_on_success(mut self) -> Self {
        self.reset_on_success = true;
        self
    }

    pub fn redirect_to(mut self, navigator: &'a Navigator, route: Route) -> Self {
        self.redirect = Some((navigator, route));
        self
    }
}

#[derive(Debug, Clone)]
pub struct FormState<T> {
    values: T,
    errors: FormErrors,
    submitting: bool,
}

impl<T> FormState<T>
where
    T: Validate + Clone + Default,
{
    pub fn new(values: T) -> Self {
        Self {
            values,
            errors: FormErrors::new(),
            submitting: false,
        }
    }

    pub fn values(&self) -> &T {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut T {
        &mut self.values
    }

    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }

    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.errors.get(field)
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn reset(&mut self) {
        self.values = T::default();
        self.errors.clear();
        self.submitting = false;
    }

    /// Run the local validators; errors replace the current ones.
    pub fn validate(&mut self) -> bool {
        self.errors = self.values.validate();
        self.errors.is_empty()
    }

    /// Put a failed submission's field errors on the form. Returns whether
    /// any field was touched.
    pub fn apply_error(&mut self, error: &ApiError) -> bool {
        match error {
            ApiError::Validation(errors) => {
                self.errors = errors.clone();
                true
            }
            ApiError::FieldErrors { errors, .. } => {
                self.errors.clear();
                for e in errors {
                    self.errors.add(e.field.clone(), e.message.clone());
                }
                !errors.is_empty()
            }
            _ => false,
        }
    }

    /// Validate, run `action` with the current values and react to the
    /// outcome. Values are only reset and navigation only happens on success.
    pub async fn submit<R, F, Fut>(
        &mut self,
        options: SubmitOptions<'_>,
        action: F,
    ) -> Result<R, ApiError>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Result<R, ApiError>>,
    {
        if !self.validate() {
            tracing::debug!("form rejected locally: {}", self.errors);
            return Err(ApiError::Validation(self.errors.clone()));
        }

        self.submitting = true;
        let result = action(self.values.clone()).await;
        self.submitting = false;

        match result {
            Ok(value) => {
                self.errors.clear();
                options.bus.success(options.success_message);
                if options.reset_on_success {
                    self.reset();
                }
                if let Some((navigator, route)) = options.redirect {
                    navigator.navigate(route);
                }
                Ok(value)
            }
            Err(error) => {
                self.apply_error(&error);
                if !error.is_handled_globally() {
                    options.bus.error(error.user_message());
                }
                Err(error)
            }
        }
    }
}
