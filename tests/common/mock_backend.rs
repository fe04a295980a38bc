// tests/common/mock_backend.rs
//! A mocked dashboard backend plus a client context pointed at it.

use std::path::Path;

use httpmock::prelude::*;
use serde_json::json;

use eventstaff_lib::config::ClientConfig;
use eventstaff_lib::AppContext;

pub const USER_NAME: &str = "Maria Souza";
pub const USER_CPF: &str = "52998224725";
pub const PASSWORD: &str = "secret";

pub struct MockBackend {
    pub server: MockServer,
}

impl MockBackend {
    /// Start a server that accepts the test user's credentials.
    pub async fn start() -> Self {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/signin").json_body(json!({
                    "cpf": USER_CPF,
                    "password": PASSWORD
                }));
                then.status(200)
                    .header("set-cookie", "session=live; Path=/")
                    .json_body(json!({ "user": { "name": USER_NAME, "cpf": USER_CPF } }));
            })
            .await;
        Self { server }
    }

    pub fn config(&self, data_dir: &Path) -> ClientConfig {
        let mut config = ClientConfig::new(self.server.base_url());
        config.data_dir = data_dir.to_path_buf();
        config
    }

    /// A fresh client context over `data_dir`, as after an app restart.
    pub fn client(&self, data_dir: &Path) -> AppContext {
        AppContext::bootstrap(self.config(data_dir)).expect("bootstrap client")
    }
}
