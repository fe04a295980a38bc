//! Typed endpoints of the dashboard API.

use serde::de::DeserializeOwned;

use super::client::ApiClient;
use super::error::ApiError;
use crate::cache::QueryCache;
use crate::forms::validators::normalize_cep;
use crate::forms::FormErrors;
use crate::model::{
    Address, Admin, AdminInput, BulkWorkersInput, Company, CompanyInput, DayWorker, Event,
    EventInput, Id, Paginated, Worker, WorkerInput,
};
use crate::session::auth::{SignInRequest, SignInResponse};

pub const RESOURCE_ADMINS: &str = "admins";
pub const RESOURCE_COMPANIES: &str = "companies";
pub const RESOURCE_EVENTS: &str = "events";
pub const RESOURCE_WORKERS: &str = "workers";

/// Query string of a list endpoint: `q`, `page`, optional `per_page` and
/// fixed filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    pub q: String,
    pub page: u32,
    pub per_page: Option<u32>,
    pub filters: Vec<(String, String)>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            q: String::new(),
            page: 1,
            per_page: None,
            filters: Vec::new(),
        }
    }
}

impl ListParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, q: impl Into<String>) -> Self {
        self.q = q.into();
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((key.into(), value.into()));
        self
    }

    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = vec![
            ("q".to_string(), self.q.clone()),
            ("page".to_string(), self.page.max(1).to_string()),
        ];
        if let Some(per_page) = self.per_page {
            query.push(("per_page".to_string(), per_page.to_string()));
        }
        query.extend(self.filters.iter().cloned());
        query
    }
}

impl ApiClient {
    /// Cached GET of a paginated list.
    async fn list<T: DeserializeOwned>(
        &self,
        resource: &str,
        params: &ListParams,
    ) -> Result<Paginated<T>, ApiError> {
        let mut params = params.clone();
        if params.per_page.is_none() {
            params.per_page = self.page_size;
        }
        let query = params.to_query();
        let key = QueryCache::key(resource, &query);

        let value = match self.cache.get(&key) {
            Some(value) => {
                tracing::trace!("cache hit for {key}");
                value
            }
            None => {
                let epoch = self.cache.epoch();
                let value = self.get_json(resource, &query).await?;
                if !self.cache.put_if_current(key, value.clone(), epoch) {
                    tracing::debug!("not caching {resource}: invalidated while in flight");
                }
                value
            }
        };

        serde_json::from_value(value).map_err(|e| ApiError::Decode(format!("{resource}: {e}")))
    }

    // -----------------------------------------------------------------------
    // Auth
    // -----------------------------------------------------------------------

    pub async fn sign_in(&self, credentials: &SignInRequest) -> Result<SignInResponse, ApiError> {
        self.post("auth/signin", credentials).await
    }

    pub async fn sign_out(&self) -> Result<(), ApiError> {
        let result = self.delete("auth/signoff").await;
        self.cache.clear();
        result
    }

    // -----------------------------------------------------------------------
    // Admins
    // -----------------------------------------------------------------------

    pub async fn list_admins(&self, params: &ListParams) -> Result<Paginated<Admin>, ApiError> {
        self.list(RESOURCE_ADMINS, params).await
    }

    pub async fn create_admin(&self, input: &AdminInput) -> Result<Admin, ApiError> {
        let admin = self.post(RESOURCE_ADMINS, input).await?;
        self.cache.invalidate(RESOURCE_ADMINS);
        Ok(admin)
    }

    pub async fn get_admin(&self, id: Id) -> Result<Admin, ApiError> {
        self.get(&format!("{RESOURCE_ADMINS}/{id}"), &[]).await
    }

    pub async fn update_admin(&self, id: Id, input: &AdminInput) -> Result<Admin, ApiError> {
        let admin = self.put(&format!("{RESOURCE_ADMINS}/{id}"), input).await?;
        self.cache.invalidate(RESOURCE_ADMINS);
        Ok(admin)
    }

    // -----------------------------------------------------------------------
    // Companies
    // -----------------------------------------------------------------------

    pub async fn list_companies(
        &self,
        params: &ListParams,
    ) -> Result<Paginated<Company>, ApiError> {
        self.list(RESOURCE_COMPANIES, params).await
    }

    pub async fn create_company(&self, input: &CompanyInput) -> Result<Company, ApiError> {
        let company = self.post(RESOURCE_COMPANIES, input).await?;
        self.cache.invalidate(RESOURCE_COMPANIES);
        Ok(company)
    }

    pub async fn delete_company(&self, id: Id) -> Result<(), ApiError> {
        self.delete(&format!("{RESOURCE_COMPANIES}/{id}")).await?;
        self.cache.invalidate(RESOURCE_COMPANIES);
        self.cache.invalidate(RESOURCE_WORKERS);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    pub async fn list_events(&self, params: &ListParams) -> Result<Paginated<Event>, ApiError> {
        self.list(RESOURCE_EVENTS, params).await
    }

    pub async fn create_event(&self, input: &EventInput) -> Result<Event, ApiError> {
        let event = self.post(RESOURCE_EVENTS, input).await?;
        self.cache.invalidate(RESOURCE_EVENTS);
        Ok(event)
    }

    pub async fn get_event(&self, id: Id) -> Result<Event, ApiError> {
        self.get(&format!("{RESOURCE_EVENTS}/{id}"), &[]).await
    }

    pub async fn update_event(&self, id: Id, input: &EventInput) -> Result<Event, ApiError> {
        let event = self.put(&format!("{RESOURCE_EVENTS}/{id}"), input).await?;
        self.cache.invalidate(RESOURCE_EVENTS);
        Ok(event)
    }

    pub async fn list_day_workers(
        &self,
        event_id: Id,
        day_id: Id,
        params: &ListParams,
    ) -> Result<Paginated<DayWorker>, ApiError> {
        let resource = format!("{RESOURCE_EVENTS}/{event_id}/days/{day_id}/workers");
        self.list(&resource, params).await
    }

    /// Swap `outgoing` for `incoming` on one day of an event.
    pub async fn replace_day_worker(
        &self,
        event_id: Id,
        day_id: Id,
        outgoing: Id,
        incoming: Id,
    ) -> Result<Event, ApiError> {
        let event = self.get_event(event_id).await?;
        let input = event
            .with_replacement(day_id, outgoing, incoming)
            .map_err(|e| {
                let mut errors = FormErrors::new();
                errors.add("worker_id", e.to_string());
                ApiError::Validation(errors)
            })?;
        self.update_event(event_id, &input).await
    }

    // -----------------------------------------------------------------------
    // Workers
    // -----------------------------------------------------------------------

    pub async fn list_workers(&self, params: &ListParams) -> Result<Paginated<Worker>, ApiError> {
        self.list(RESOURCE_WORKERS, params).await
    }

    pub async fn create_worker(&self, input: &WorkerInput) -> Result<Worker, ApiError> {
        let worker = self.post(RESOURCE_WORKERS, input).await?;
        self.cache.invalidate(RESOURCE_WORKERS);
        Ok(worker)
    }

    pub async fn bulk_create_workers(
        &self,
        input: &BulkWorkersInput,
    ) -> Result<Vec<Worker>, ApiError> {
        let workers = self
            .post(&format!("{RESOURCE_WORKERS}/bulk"), input)
            .await?;
        self.cache.invalidate(RESOURCE_WORKERS);
        Ok(workers)
    }

    pub async fn update_worker(&self, id: Id, input: &WorkerInput) -> Result<Worker, ApiError> {
        let worker = self.put(&format!("{RESOURCE_WORKERS}/{id}"), input).await?;
        self.cache.invalidate(RESOURCE_WORKERS);
        self.cache.invalidate(RESOURCE_EVENTS);
        Ok(worker)
    }

    pub async fn delete_worker(&self, id: Id) -> Result<(), ApiError> {
        self.delete(&format!("{RESOURCE_WORKERS}/{id}")).await?;
        self.cache.invalidate(RESOURCE_WORKERS);
        self.cache.invalidate(RESOURCE_EVENTS);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Postal lookup
    // -----------------------------------------------------------------------

    /// Look a CEP up on ViaCEP. Malformed CEPs fail validation without a
    /// request; unknown ones come back as `NotFound`.
    pub async fn lookup_cep(&self, cep: &str) -> Result<Address, ApiError> {
        let Some(digits) = normalize_cep(cep) else {
            let mut errors = FormErrors::new();
            errors.add("cep", crate::forms::validators::MSG_INVALID_CEP);
            return Err(ApiError::Validation(errors));
        };

        let url = format!(
            "{}/{}/json/",
            self.viacep_url,
            urlencoding::encode(&digits)
        );
        let value = self.get_external_json(&url).await?;

        // ViaCEP answers 200 with `{"erro": true}` (or `"true"`) for unknown CEPs.
        let missing = match value.get("erro") {
            Some(serde_json::Value::Bool(flag)) => *flag,
            Some(serde_json::Value::String(flag)) => flag == "true",
            _ => false,
        };
        if missing {
            return Err(ApiError::NotFound(format!("CEP {digits}")));
        }

        serde_json::from_value(value).map_err(|e| ApiError::Decode(format!("viacep: {e}")))
    }
}
