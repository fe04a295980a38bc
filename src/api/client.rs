use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::interceptor::ResponseInterceptor;
use crate::cache::QueryCache;
use crate::config::ClientConfig;

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    pub(super) viacep_url: String,
    pub(super) page_size: Option<u32>,
    pub(super) cache: QueryCache,
    interceptors: Vec<Arc<dyn ResponseInterceptor>>,
}

/// Single-entity responses come either bare or wrapped in `{ "data": ... }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum MaybeWrapped<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> MaybeWrapped<T> {
    fn into_inner(self) -> T {
        match self {
            MaybeWrapped::Wrapped { data } => data,
            MaybeWrapped::Bare(value) => value,
        }
    }
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Transport(format!("failed to build http client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            viacep_url: config.viacep_url.trim_end_matches('/').to_string(),
            page_size: config.page_size,
            cache: QueryCache::new(config.cache_ttl),
            interceptors: Vec::new(),
        })
    }

    /// Register a hook that sees every response before the caller does.
    pub fn with_interceptor(mut self, interceptor: Arc<dyn ResponseInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, ApiError> {
        let request = self.http.get(self.url(path)).query(query);
        let body = self.execute(Method::GET, path, request).await?;
        decode(path, &body)
    }

    /// GET returning the raw JSON document, without unwrapping `data`.
    pub async fn get_json(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<serde_json::Value, ApiError> {
        let request = self.http.get(self.url(path)).query(query);
        let body = self.execute(Method::GET, path, request).await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(format!("{path}: {e}")))
    }

    /// GET against a third-party service. The backend's interceptors do not
    /// see the response: a 401 from elsewhere says nothing about our session.
    pub async fn get_external_json(&self, url: &str) -> Result<serde_json::Value, ApiError> {
        let request = self.http.get(url);
        let body = self.dispatch(Method::GET, url, request, &[]).await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(format!("{url}: {e}")))
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.http.post(self.url(path)).json(body);
        let text = self.execute(Method::POST, path, request).await?;
        decode(path, &text)
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.http.put(self.url(path)).json(body);
        let text = self.execute(Method::PUT, path, request).await?;
        decode(path, &text)
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let request = self.http.delete(self.url(path));
        self.execute(Method::DELETE, path, request).await?;
        Ok(())
    }

    /// Send, run the interceptors, and hand back the body of a 2xx response.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        request: RequestBuilder,
    ) -> Result<String, ApiError> {
        self.dispatch(method, path, request, &self.interceptors).await
    }

    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        request: RequestBuilder,
        interceptors: &[Arc<dyn ResponseInterceptor>],
    ) -> Result<String, ApiError> {
        tracing::debug!("{method} {path}");
        let response = request.send().await.map_err(|e| {
            tracing::warn!("{method} {path} failed without a response: {e}");
            ApiError::from(e)
        })?;

        let status = response.status();
        for interceptor in interceptors {
            interceptor.on_response(&method, path, status);
        }

        let text = response.text().await?;
        tracing::debug!("{method} {path} -> {status}");

        if !status.is_success() {
            return Err(ApiError::from_response(status.as_u16(), &text));
        }
        Ok(text)
    }
}

/// Decode a success body; an empty body decodes as JSON `null`.
pub(super) fn decode<T: DeserializeOwned>(path: &str, body: &str) -> Result<T, ApiError> {
    let result = if body.trim().is_empty() {
        serde_json::from_value(serde_json::Value::Null)
    } else {
        serde_json::from_str::<MaybeWrapped<T>>(body).map(MaybeWrapped::into_inner)
    };
    result.map_err(|e| ApiError::Decode(format!("{path}: {e}")))
}
