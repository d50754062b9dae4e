pub mod activate;
pub mod agents;
pub mod config;
pub mod sectors;
pub mod toggle;
pub mod update;

use std::sync::Arc;

use agentdesk_client::HttpAgentService;
use agentdesk_core::config::AppConfig;
use agentdesk_core::domain::ids::SectorId;
use agentdesk_core::domain::instance::AgentInstance;
use agentdesk_core::domain::view::AgentViewModel;
use agentdesk_core::errors::{AgentError, InterfaceError};
use agentdesk_core::lifecycle::LifecycleController;
use agentdesk_core::services::{CatalogService, InstanceService, Readiness, StaticCompanyId};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            correlation_id: None,
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            correlation_id: None,
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Maps a controller error onto the operator-facing payload and exit code.
    pub fn from_agent_error(command: &str, error: AgentError) -> Self {
        let exit_code = if error.is_load_failure() { 4 } else { 5 };
        let detail = error.to_string();
        let interface = error.into_interface(Uuid::new_v4().to_string());
        Self::interface_failure(command, &interface, detail, exit_code)
    }

    pub fn not_ready(command: &str) -> Self {
        let interface = InterfaceError::not_ready(Uuid::new_v4().to_string());
        let detail = interface.to_string();
        Self::interface_failure(command, &interface, detail, 3)
    }

    fn interface_failure(
        command: &str,
        interface: &InterfaceError,
        detail: String,
        exit_code: u8,
    ) -> Self {
        let error_class = match interface {
            InterfaceError::BadRequest { .. } => "bad_request",
            InterfaceError::ServiceUnavailable { .. } => "service_unavailable",
            InterfaceError::NotReady { .. } => "not_ready",
        };
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: format!("{} ({detail})", interface.user_message()),
            correlation_id: Some(interface.correlation_id().to_string()),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) fn to_data<T: Serialize>(value: &T) -> Option<Value> {
    serde_json::to_value(value).ok()
}

/// Builds a controller talking to the configured backend for the configured company.
pub(crate) fn connect(
    command: &str,
    config: &AppConfig,
) -> Result<LifecycleController, CommandResult> {
    let http = HttpAgentService::from_config(&config.api).map_err(|error| {
        CommandResult::failure(
            command,
            "client_init",
            format!("could not build the HTTP client: {error}"),
            2,
        )
    })?;
    let http = Arc::new(http);
    let catalog: Arc<dyn CatalogService> = http.clone();
    let instances: Arc<dyn InstanceService> = http;
    let company = Arc::new(StaticCompanyId::new(config.session.company_id()));
    Ok(LifecycleController::new(catalog, instances, company))
}

/// Loads sectors, the sector's templates and the company's instances.
pub(crate) async fn load_sector(
    command: &str,
    controller: &LifecycleController,
    sector_id: &SectorId,
) -> Result<(), CommandResult> {
    let fail = |error| CommandResult::from_agent_error(command, error);
    controller.load_sectors().await.map_err(fail)?;
    if controller.catalog().sector(sector_id).await.is_none() {
        return Err(CommandResult::failure(
            command,
            "unknown_sector",
            format!("sector `{sector_id}` is not in the catalog"),
            4,
        ));
    }
    controller.load_templates(sector_id).await.map_err(fail)?;
    match controller.load_instances().await.map_err(fail)? {
        Readiness::Ready(_) => Ok(()),
        Readiness::NotReady => Err(CommandResult::not_ready(command)),
    }
}

pub(crate) async fn view_of(
    controller: &LifecycleController,
    sector_id: &SectorId,
    instance: &AgentInstance,
) -> Option<AgentViewModel> {
    controller
        .agents(sector_id)
        .await
        .into_iter()
        .find(|agent| agent.agent_id().as_ref() == Some(&instance.id))
}

/// Shared tail of the mutating commands: report the reconciled view of the confirmed agent.
pub(crate) async fn mutation_result(
    command: &str,
    controller: &LifecycleController,
    sector_id: &SectorId,
    outcome: Result<Readiness<AgentInstance>, AgentError>,
) -> CommandResult {
    match outcome {
        Ok(Readiness::Ready(instance)) => {
            let view = view_of(controller, sector_id, &instance).await;
            let state = if instance.is_active { "active" } else { "inactive" };
            CommandResult::success_with_data(
                command,
                format!("agent `{}` is {state}", instance.id),
                view.as_ref().and_then(to_data),
            )
        }
        Ok(Readiness::NotReady) => CommandResult::not_ready(command),
        Err(error) => CommandResult::from_agent_error(command, error),
    }
}
