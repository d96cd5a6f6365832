//! Typed REST client.
//!
//! Every call goes to `{api_url}/api/v1{endpoint}`, carries the stored bearer
//! token when there is one, and unwraps the `{success, data, error,
//! message}` envelope. Failures are mapped to [`ApiError`]; nothing is
//! retried here.

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use vv_protocol::api_models::{ApiResponse, CreateRunRequest, PageRequest, Paginated};
use vv_protocol::auth_models::{AuthSession, LoginRequest};
use vv_protocol::prompt_models::{Prompt, PromptDraft};
use vv_protocol::run_models::Run;

use crate::config::ClientConfig;
use crate::gateway::credentials::CredentialStore;
use crate::gateway::error::{ApiError, ApiResult};

const API_PREFIX: &str = "/api/v1";

/// REST client for prompts, runs and auth.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    credentials: CredentialStore,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, credentials: CredentialStore) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            base_url: format!("{}{API_PREFIX}", config.api_url.trim_end_matches('/')),
            credentials,
        }
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    // Prompts

    pub async fn create_prompt(&self, draft: &PromptDraft) -> ApiResult<Prompt> {
        self.execute(self.request(Method::POST, "/prompts").json(draft)).await
    }

    pub async fn get_prompt(&self, id: &str) -> ApiResult<Prompt> {
        self.execute(self.request(Method::GET, &format!("/prompts/{id}"))).await
    }

    /// Update a prompt; only the fields set in `draft` are sent.
    pub async fn update_prompt(&self, id: &str, draft: &PromptDraft) -> ApiResult<Prompt> {
        self.execute(self.request(Method::PUT, &format!("/prompts/{id}")).json(draft))
            .await
    }

    pub async fn delete_prompt(&self, id: &str) -> ApiResult<()> {
        self.execute_empty(self.request(Method::DELETE, &format!("/prompts/{id}")))
            .await
    }

    pub async fn list_prompts(&self, page: PageRequest) -> ApiResult<Paginated<Prompt>> {
        self.execute(self.request(Method::GET, "/prompts").query(&page_query(page)))
            .await
    }

    // Runs

    pub async fn create_run(&self, request: &CreateRunRequest) -> ApiResult<Run> {
        self.execute(self.request(Method::POST, "/runs").json(request)).await
    }

    pub async fn get_run(&self, id: &str) -> ApiResult<Run> {
        self.execute(self.request(Method::GET, &format!("/runs/{id}"))).await
    }

    pub async fn list_runs(&self, page: PageRequest) -> ApiResult<Paginated<Run>> {
        self.execute(self.request(Method::GET, "/runs").query(&page_query(page)))
            .await
    }

    pub async fn cancel_run(&self, id: &str) -> ApiResult<Run> {
        self.execute(self.request(Method::POST, &format!("/runs/{id}/cancel")))
            .await
    }

    pub async fn retry_run(&self, id: &str) -> ApiResult<Run> {
        self.execute(self.request(Method::POST, &format!("/runs/{id}/retry")))
            .await
    }

    // Auth

    /// Log in and store the returned token.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthSession> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let session: AuthSession = self
            .execute(self.request(Method::POST, "/auth/login").json(&body))
            .await?;
        self.credentials.save(&session.token)?;
        tracing::info!(user = %session.user.email, "logged in");
        Ok(session)
    }

    /// Exchange the current token for a fresh one and store it.
    pub async fn refresh(&self) -> ApiResult<AuthSession> {
        let session: AuthSession = self
            .execute(self.request(Method::POST, "/auth/refresh"))
            .await?;
        self.credentials.save(&session.token)?;
        Ok(session)
    }

    /// Log out on the server and forget the local token.
    ///
    /// The local token is removed even when the server call fails; the
    /// server's error is still returned.
    pub async fn logout(&self) -> ApiResult<()> {
        let result = self
            .execute_empty(self.request(Method::POST, "/auth/logout"))
            .await;
        self.credentials.clear()?;
        result
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let url = format!("{}{endpoint}", self.base_url);
        tracing::debug!(%method, %url, "api request");

        let request = self.http.request(method, url);
        match self.credentials.load() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let envelope: ApiResponse<T> = self.send(request).await?;
        envelope
            .data
            .ok_or_else(|| ApiError::Parse("response carried no data".to_string()))
    }

    /// Like `execute` for endpoints whose envelope carries no data.
    async fn execute_empty(&self, request: RequestBuilder) -> ApiResult<()> {
        let _: ApiResponse<serde_json::Value> = self.send(request).await?;
        Ok(())
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<ApiResponse<T>> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Connectivity(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Connectivity(e.to_string()))?;

        if !status.is_success() {
            let error = ApiError::from_status(status.as_u16(), &body);
            tracing::debug!(status = status.as_u16(), error = %error, "api request failed");
            return Err(error);
        }

        let envelope: ApiResponse<T> =
            serde_json::from_str(&body).map_err(|e| ApiError::Parse(e.to_string()))?;
        if !envelope.success {
            let reason = envelope.reason().unwrap_or("no reason given").to_string();
            return Err(ApiError::Rejected(reason));
        }
        Ok(envelope)
    }
}

#[derive(Serialize)]
struct PageQuery {
    page: u32,
    limit: u32,
}

fn page_query(page: PageRequest) -> PageQuery {
    PageQuery {
        page: page.page,
        limit: page.limit,
    }
}
