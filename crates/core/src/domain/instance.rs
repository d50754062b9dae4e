use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ids::{AgentId, CompanyId, TemplateId};

pub type Configuration = BTreeMap<String, Value>;

/// A template activated for one company, carrying that company's overrides.
///
/// Every optional field left as `None` inherits the template default when reconciled.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentInstance {
    pub id: AgentId,
    pub company_id: CompanyId,
    pub agent_template_id: TemplateId,
    #[serde(default)]
    pub custom_name: Option<String>,
    #[serde(default)]
    pub custom_prompt: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub selected_voice_id: Option<String>,
    #[serde(default)]
    pub voice_name: Option<String>,
    #[serde(default)]
    pub voice_provider: Option<String>,
    #[serde(default)]
    pub personality: Option<String>,
    #[serde(default)]
    pub response_speed: Option<String>,
    #[serde(default)]
    pub max_session_duration: Option<u32>,
    #[serde(default)]
    pub configuration: Configuration,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AgentInstance {
    pub fn has_voice_fields(&self) -> bool {
        self.selected_voice_id.is_some()
            || self.voice_name.is_some()
            || self.voice_provider.is_some()
    }
}
