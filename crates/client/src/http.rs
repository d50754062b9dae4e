use std::time::Duration;

use agentdesk_core::config::ApiConfig;
use agentdesk_core::domain::ids::{AgentId, CompanyId, SectorId, TemplateId};
use agentdesk_core::domain::instance::AgentInstance;
use agentdesk_core::domain::requests::{ActivationRequest, SettingsPatch, ToggleRequest};
use agentdesk_core::domain::sector::Sector;
use agentdesk_core::domain::template::AgentTemplate;
use agentdesk_core::errors::ServiceError;
use agentdesk_core::services::{CatalogService, InstanceService};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::envelope::{InstanceList, MutationReply, SectorList, TemplateList};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Catalog and instance services backed by the agent management HTTP API.
#[derive(Clone)]
pub struct HttpAgentService {
    base_url: String,
    http: reqwest::Client,
    auth_token: Option<SecretString>,
}

impl HttpAgentService {
    pub fn new(base_url: &str) -> Result<Self, ServiceError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder().timeout(timeout).build().map_err(transport)?;
        Ok(Self { base_url: base_url.trim_end_matches('/').to_string(), http, auth_token: None })
    }

    pub fn from_config(api: &ApiConfig) -> Result<Self, ServiceError> {
        let service = Self::with_timeout(&api.base_url, Duration::from_secs(api.timeout_secs))?;
        Ok(match &api.auth_token {
            Some(token) => service.with_auth_token(token.clone()),
            None => service,
        })
    }

    /// Sends `Authorization: Bearer <token>` on every request.
    pub fn with_auth_token(mut self, token: SecretString) -> Self {
        self.auth_token = Some(token);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let request = self.http.request(method, url);
        match &self.auth_token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ServiceError> {
        let response = self.request(Method::GET, path).send().await.map_err(transport)?;
        handle_response(response).await
    }

    async fn send<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ServiceError> {
        let response = self.request(method, path).json(body).send().await.map_err(transport)?;
        handle_response(response).await
    }
}

#[async_trait]
impl CatalogService for HttpAgentService {
    async fn list_sectors(&self) -> Result<Vec<Sector>, ServiceError> {
        let list: SectorList = self.get("/sectors").await?;
        debug!(
            event_name = "agents.client.sectors_listed",
            count = list.sectors.len(),
            total = ?list.total,
            "sector list received"
        );
        Ok(list.sectors)
    }

    async fn list_templates(
        &self,
        sector_id: &SectorId,
    ) -> Result<Vec<AgentTemplate>, ServiceError> {
        let list: TemplateList = self.get(&format!("/sectors/{sector_id}/templates")).await?;
        debug!(
            event_name = "agents.client.templates_listed",
            sector_id = %sector_id,
            count = list.templates.len(),
            total = ?list.total,
            "template list received"
        );
        Ok(list.templates)
    }
}

#[async_trait]
impl InstanceService for HttpAgentService {
    async fn list_instances(
        &self,
        company_id: &CompanyId,
    ) -> Result<Vec<AgentInstance>, ServiceError> {
        let list: InstanceList = self.get(&format!("/company/{company_id}/agents")).await?;
        debug!(
            event_name = "agents.client.instances_listed",
            company_id = %company_id,
            count = list.agents.len(),
            total = ?list.total,
            active_count = ?list.active_count,
            "instance list received"
        );
        Ok(list.agents)
    }

    async fn activate(
        &self,
        company_id: &CompanyId,
        template_id: &TemplateId,
        request: &ActivationRequest,
    ) -> Result<AgentInstance, ServiceError> {
        let path = format!("/company/{company_id}/activate/{template_id}");
        let reply: MutationReply = self.send(Method::POST, &path, request).await?;
        reply.into_agent()
    }

    async fn update(
        &self,
        company_id: &CompanyId,
        agent_id: &AgentId,
        patch: &SettingsPatch,
    ) -> Result<AgentInstance, ServiceError> {
        let path = format!("/company/{company_id}/agents/{agent_id}");
        let reply: MutationReply = self.send(Method::PUT, &path, patch).await?;
        reply.into_agent()
    }

    async fn toggle(
        &self,
        company_id: &CompanyId,
        agent_id: &AgentId,
        is_active: bool,
    ) -> Result<AgentInstance, ServiceError> {
        let path = format!("/company/{company_id}/agents/{agent_id}/toggle");
        let reply: MutationReply =
            self.send(Method::PUT, &path, &ToggleRequest { is_active }).await?;
        reply.into_agent()
    }
}

async fn handle_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ServiceError> {
    let status = response.status();

    if status == StatusCode::NOT_FOUND {
        return Err(ServiceError::NotFound);
    }

    let body = response.text().await.map_err(transport)?;
    if !status.is_success() {
        return Err(ServiceError::Status { status: status.as_u16(), message: error_message(&body) });
    }

    serde_json::from_str(&body).map_err(|error| ServiceError::Decode(error.to_string()))
}

/// Prefers the `message`/`detail` field of a JSON error body over the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "detail", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(|v| v.as_str()).map(str::to_owned))
        })
        .unwrap_or_else(|| body.trim().to_owned())
}

fn transport(error: reqwest::Error) -> ServiceError {
    if error.is_decode() {
        ServiceError::Decode(error.to_string())
    } else {
        ServiceError::Transport(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{error_message, HttpAgentService};

    #[test]
    fn base_url_loses_trailing_slash() {
        let service = HttpAgentService::new("http://localhost:8000/api/").expect("client builds");
        assert_eq!(service.base_url(), "http://localhost:8000/api");
    }

    #[test]
    fn error_message_prefers_structured_fields() {
        assert_eq!(error_message(r#"{"detail": "company not found"}"#), "company not found");
        assert_eq!(error_message("  upstream timeout \n"), "upstream timeout");
    }
}
