use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ids::{SectorId, TemplateId};

pub type IntegrationConfigs = BTreeMap<String, Value>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommunicationType {
    Voice,
    Chat,
    Hybrid,
}

impl CommunicationType {
    pub fn has_voice(self) -> bool {
        matches!(self, Self::Voice | Self::Hybrid)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Voice => "voice",
            Self::Chat => "chat",
            Self::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for CommunicationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A voice as the backend identifies it. Only `id` is mandatory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceSelection {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// Catalog-defined agent definition. Read-only from the console's point of view.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentTemplate {
    pub id: TemplateId,
    pub sector_id: SectorId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    pub communication_type: CommunicationType,
    #[serde(default)]
    pub required_integrations: Vec<String>,
    #[serde(default)]
    pub default_prompt: Option<String>,
    #[serde(default)]
    pub default_language: Option<String>,
    #[serde(default)]
    pub default_voice: Option<VoiceSelection>,
    #[serde(default)]
    pub default_personality: Option<String>,
    #[serde(default)]
    pub default_response_speed: Option<String>,
    #[serde(default)]
    pub default_max_session_duration: Option<u32>,
    #[serde(default)]
    pub default_integrations: IntegrationConfigs,
}
