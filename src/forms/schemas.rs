use std::collections::HashSet;

use super::validators::{
    is_blank, is_valid_cnpj, is_valid_cpf, is_valid_email, is_valid_phone, normalize_cep,
    MIN_PASSWORD_LEN, MSG_INVALID_CEP, MSG_INVALID_CNPJ, MSG_INVALID_CPF, MSG_INVALID_EMAIL,
    MSG_INVALID_PHONE, MSG_REQUIRED, MSG_SHORT_PASSWORD,
};
use super::FormErrors;
use crate::model::{AdminInput, BulkWorkersInput, CompanyInput, EventInput, WorkerInput};
use crate::session::auth::SignInRequest;

/// Declarative field rules for a form's values.
pub trait Validate {
    fn validate(&self) -> FormErrors;
}

fn required(errors: &mut FormErrors, field: &str, value: &str) -> bool {
    if is_blank(value) {
        errors.add(field, MSG_REQUIRED);
        return false;
    }
    true
}

fn cpf(errors: &mut FormErrors, field: &str, value: &str) {
    if required(errors, field, value) && !is_valid_cpf(value) {
        errors.add(field, MSG_INVALID_CPF);
    }
}

fn optional_email(errors: &mut FormErrors, field: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !is_blank(v)) {
        if !is_valid_email(value) {
            errors.add(field, MSG_INVALID_EMAIL);
        }
    }
}

fn optional_phone(errors: &mut FormErrors, field: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !is_blank(v)) {
        if !is_valid_phone(value) {
            errors.add(field, MSG_INVALID_PHONE);
        }
    }
}

impl Validate for SignInRequest {
    fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::new();
        cpf(&mut errors, "cpf", &self.cpf);
        required(&mut errors, "password", &self.password);
        errors
    }
}

impl Validate for AdminInput {
    fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::new();
        required(&mut errors, "name", &self.name);
        cpf(&mut errors, "cpf", &self.cpf);
        optional_email(&mut errors, "email", self.email.as_deref());
        if let Some(password) = self.password.as_deref() {
            if password.chars().count() < MIN_PASSWORD_LEN {
                errors.add("password", MSG_SHORT_PASSWORD);
            }
        }
        errors
    }
}

impl Validate for CompanyInput {
    fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::new();
        required(&mut errors, "name", &self.name);
        if required(&mut errors, "cnpj", &self.cnpj) && !is_valid_cnpj(&self.cnpj) {
            errors.add("cnpj", MSG_INVALID_CNPJ);
        }
        optional_email(&mut errors, "email", self.email.as_deref());
        optional_phone(&mut errors, "phone", self.phone.as_deref());
        errors
    }
}

impl Validate for WorkerInput {
    fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::new();
        required(&mut errors, "name", &self.name);
        cpf(&mut errors, "cpf", &self.cpf);
        optional_phone(&mut errors, "phone", self.phone.as_deref());
        errors
    }
}

impl Validate for BulkWorkersInput {
    fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::new();
        if self.workers.is_empty() {
            errors.add("workers", MSG_REQUIRED);
        }
        let mut seen = HashSet::new();
        for (idx, worker) in self.workers.iter().enumerate() {
            for (field, message) in worker.validate().iter() {
                errors.add(format!("workers.{idx}.{field}"), message);
            }
            let digits = super::validators::only_digits(&worker.cpf);
            if !digits.is_empty() && !seen.insert(digits) {
                errors.add(format!("workers.{idx}.cpf"), "CPF repetido na planilha");
            }
        }
        errors
    }
}

impl Validate for EventInput {
    fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::new();
        required(&mut errors, "name", &self.name);
        if self.days.is_empty() {
            errors.add("days", "Informe ao menos um dia");
        }
        let mut dates = HashSet::new();
        for (idx, day) in self.days.iter().enumerate() {
            if !dates.insert(day.date) {
                errors.add(format!("days.{idx}.date"), "Data repetida");
            }
        }
        if let Some(address) = &self.address {
            if normalize_cep(&address.cep).is_none() {
                errors.add("address.cep", MSG_INVALID_CEP);
            }
            required(&mut errors, "address.street", &address.street);
            required(&mut errors, "address.city", &address.city);
            required(&mut errors, "address.state", &address.state);
        }
        errors
    }
}
