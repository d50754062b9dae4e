use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{AgentId, TemplateId};
use super::template::{CommunicationType, IntegrationConfigs, VoiceSelection};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BaseSettings {
    pub custom_name: String,
    pub language: String,
    pub custom_prompt: Option<String>,
    pub enable_analytics: bool,
    pub integration_configs: IntegrationConfigs,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    #[serde(flatten)]
    pub base: BaseSettings,
    /// `None` means no voice has been selected yet, which is a valid state.
    pub voice: Option<VoiceSelection>,
    pub personality: String,
    pub response_speed: String,
    pub max_session_duration: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatSettings {
    #[serde(flatten)]
    pub base: BaseSettings,
    pub response_style: Option<String>,
}

/// Settings shape selected by [`CommunicationType`]: voice and hybrid agents carry
/// [`VoiceSettings`], chat agents carry [`ChatSettings`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AgentSettings {
    Voice(VoiceSettings),
    Chat(ChatSettings),
}

impl AgentSettings {
    pub fn base(&self) -> &BaseSettings {
        match self {
            Self::Voice(settings) => &settings.base,
            Self::Chat(settings) => &settings.base,
        }
    }

    pub fn language(&self) -> &str {
        &self.base().language
    }

    pub fn as_voice(&self) -> Option<&VoiceSettings> {
        match self {
            Self::Voice(settings) => Some(settings),
            Self::Chat(_) => None,
        }
    }
}

/// Render-ready agent: either a company-owned instance merged with its template, or a
/// template that has not been activated yet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentViewModel {
    /// Instance id for company agents, template id for available ones.
    pub id: String,
    pub name: String,
    pub original_name: String,
    pub description: String,
    pub icon: String,
    pub color: String,
    pub category: String,
    pub communication_type: CommunicationType,
    pub is_active: bool,
    pub last_updated: Option<DateTime<Utc>>,
    pub required_integrations: Vec<String>,
    pub agent_template_id: TemplateId,
    pub is_company_agent: bool,
    pub settings: AgentSettings,
}

impl AgentViewModel {
    pub fn agent_id(&self) -> Option<AgentId> {
        self.is_company_agent.then(|| AgentId(self.id.clone()))
    }
}
