use std::fmt;

use thiserror::Error;

use crate::domain::ids::{AgentId, TemplateId};
use crate::lifecycle::states::LifecycleState;

/// Failure reported by a catalog or instance service implementation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("service returned status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("resource not found")]
    NotFound,
    #[error("service rejected the request: {message}")]
    Rejected { message: String },
    #[error("could not decode service response: {0}")]
    Decode(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadResource {
    Sectors,
    Templates,
    Instances,
}

impl fmt::Display for LoadResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sectors => "sectors",
            Self::Templates => "templates",
            Self::Instances => "instances",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationKind {
    Activate,
    Toggle,
    Update,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Activate => "activate",
            Self::Toggle => "toggle",
            Self::Update => "update",
        })
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AgentError {
    #[error("loading {resource} failed: {source}")]
    LoadFailure { resource: LoadResource, source: ServiceError },
    #[error("{operation} of `{target}` failed: {source}")]
    MutationFailure { operation: MutationKind, target: String, source: ServiceError },
    #[error("template `{0}` is not in the loaded catalog")]
    UnknownTemplate(TemplateId),
    #[error("agent `{0}` is not in the loaded instance set")]
    UnknownAgent(AgentId),
    #[error("invalid lifecycle transition from {from:?} to {to:?}")]
    InvalidTransition { from: LifecycleState, to: LifecycleState },
}

impl AgentError {
    pub fn is_load_failure(&self) -> bool {
        matches!(self, Self::LoadFailure { .. })
    }

    pub fn is_mutation_failure(&self) -> bool {
        matches!(self, Self::MutationFailure { .. })
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("not ready: {message}")]
    NotReady { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn not_ready(correlation_id: impl Into<String>) -> Self {
        Self::NotReady {
            message: "no company id is available yet".to_owned(),
            correlation_id: correlation_id.into(),
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check the agent and try again."
            }
            Self::ServiceUnavailable { .. } => {
                "The agent service is temporarily unavailable. Please retry shortly."
            }
            Self::NotReady { .. } => "Your session is still initializing. Please retry shortly.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::NotReady { correlation_id, .. } => correlation_id,
        }
    }
}

impl AgentError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::NotReady { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<AgentError> for InterfaceError {
    fn from(value: AgentError) -> Self {
        let message = value.to_string();
        match value {
            AgentError::UnknownTemplate(_)
            | AgentError::UnknownAgent(_)
            | AgentError::InvalidTransition { .. } => {
                Self::BadRequest { message, correlation_id: "unassigned".to_owned() }
            }
            AgentError::MutationFailure {
                source: ServiceError::Rejected { .. } | ServiceError::NotFound,
                ..
            } => Self::BadRequest { message, correlation_id: "unassigned".to_owned() },
            AgentError::LoadFailure { .. } | AgentError::MutationFailure { .. } => {
                Self::ServiceUnavailable { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::ids::{AgentId, TemplateId};
    use crate::errors::{AgentError, InterfaceError, LoadResource, MutationKind, ServiceError};

    #[test]
    fn unknown_template_maps_to_bad_request_with_correlation_id() {
        let interface = AgentError::UnknownTemplate(TemplateId("t-404".to_owned()))
            .into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest { ref correlation_id, ref message }
                if correlation_id == "req-1" && message.contains("t-404")
        ));
    }

    #[test]
    fn load_failure_maps_to_service_unavailable() {
        let interface = AgentError::LoadFailure {
            resource: LoadResource::Instances,
            source: ServiceError::Transport("connection reset".to_owned()),
        }
        .into_interface("req-2");

        assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
        assert_eq!(
            interface.user_message(),
            "The agent service is temporarily unavailable. Please retry shortly."
        );
        assert_eq!(interface.correlation_id(), "req-2");
    }

    #[test]
    fn rejected_mutation_is_a_bad_request_but_a_timeout_is_not() {
        let rejected = AgentError::MutationFailure {
            operation: MutationKind::Toggle,
            target: AgentId("a1".to_owned()).to_string(),
            source: ServiceError::Rejected { message: "quota exceeded".to_owned() },
        };
        assert!(rejected.is_mutation_failure());
        assert!(matches!(rejected.into_interface("req-3"), InterfaceError::BadRequest { .. }));

        let unavailable = AgentError::MutationFailure {
            operation: MutationKind::Update,
            target: "a1".to_owned(),
            source: ServiceError::Status { status: 503, message: "busy".to_owned() },
        };
        assert!(matches!(
            unavailable.into_interface("req-4"),
            InterfaceError::ServiceUnavailable { .. }
        ));
    }

    #[test]
    fn not_ready_has_user_safe_message() {
        let interface = InterfaceError::not_ready("req-5");
        assert_eq!(
            interface.user_message(),
            "Your session is still initializing. Please retry shortly."
        );
    }
}
