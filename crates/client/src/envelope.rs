use agentdesk_core::domain::instance::AgentInstance;
use agentdesk_core::domain::sector::Sector;
use agentdesk_core::domain::template::AgentTemplate;
use agentdesk_core::errors::ServiceError;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct SectorList {
    pub sectors: Vec<Sector>,
    #[serde(default)]
    pub total: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TemplateList {
    pub templates: Vec<AgentTemplate>,
    #[serde(default)]
    pub total: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InstanceList {
    pub agents: Vec<AgentInstance>,
    #[serde(default)]
    pub total: Option<usize>,
    #[serde(default)]
    pub active_count: Option<usize>,
}

/// `{success, agent, message?}` reply of every mutation endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct MutationReply {
    pub success: bool,
    #[serde(default)]
    pub agent: Option<AgentInstance>,
    #[serde(default)]
    pub message: Option<String>,
}

impl MutationReply {
    pub fn into_agent(self) -> Result<AgentInstance, ServiceError> {
        match (self.success, self.agent) {
            (true, Some(agent)) => Ok(agent),
            (true, None) => {
                Err(ServiceError::Decode("successful reply did not include the agent".to_owned()))
            }
            (false, _) => Err(ServiceError::Rejected {
                message: self.message.unwrap_or_else(|| "request was not accepted".to_owned()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::MutationReply;
    use agentdesk_core::errors::ServiceError;

    #[test]
    fn unsuccessful_reply_becomes_rejection() {
        let reply: MutationReply =
            serde_json::from_str(r#"{"success": false, "message": "quota exceeded"}"#)
                .expect("valid reply");
        assert_eq!(
            reply.into_agent(),
            Err(ServiceError::Rejected { message: "quota exceeded".to_owned() })
        );
    }

    #[test]
    fn successful_reply_without_agent_is_a_decode_error() {
        let reply: MutationReply = serde_json::from_str(r#"{"success": true}"#).expect("valid");
        assert!(matches!(reply.into_agent(), Err(ServiceError::Decode(_))));
    }
}
