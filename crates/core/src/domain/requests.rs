use serde::{Deserialize, Serialize};

use super::instance::{AgentInstance, Configuration};
use super::template::{AgentTemplate, IntegrationConfigs};
use crate::reconcile::language::normalize_language;

/// Body of `POST /company/{company}/activate/{template}`.
///
/// Callers pass the explicit overrides in this shape; the controller fills the gaps from the
/// template via [`ActivationRequest::with_template_defaults`] before sending.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_voice_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<Configuration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrations: Option<IntegrationConfigs>,
}

impl ActivationRequest {
    pub fn with_template_defaults(self, template: &AgentTemplate) -> Self {
        let language = self.language.or_else(|| template.default_language.clone());
        let selected_voice_id = self
            .selected_voice_id
            .or_else(|| template.default_voice.as_ref().map(|voice| voice.id.clone()));
        let integrations = self.integrations.or_else(|| {
            (!template.default_integrations.is_empty())
                .then(|| template.default_integrations.clone())
        });

        Self {
            custom_name: self.custom_name.or_else(|| Some(template.name.clone())),
            custom_prompt: self.custom_prompt.or_else(|| template.default_prompt.clone()),
            selected_voice_id: selected_voice_id.filter(|_| template.communication_type.has_voice()),
            language: Some(normalize_language(language.as_deref().unwrap_or_default())),
            configuration: self.configuration,
            integrations,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleRequest {
    pub is_active: bool,
}

/// Partial settings body of `PUT /company/{company}/agents/{agent}`.
///
/// Absent fields are left untouched by the backend and by [`SettingsPatch::apply_to`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_voice_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_speed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_session_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<Configuration>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Normalizes the language code in place so the backend only ever sees `xx-XX` values.
    pub fn normalized(mut self) -> Self {
        if let Some(language) = self.language.take() {
            self.language = Some(normalize_language(&language));
        }
        self
    }

    /// Field-wise merge; `configuration` keys are merged one level deep.
    pub fn apply_to(&self, instance: &mut AgentInstance) {
        fn set<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
            if let Some(value) = value {
                *target = Some(value.clone());
            }
        }

        set(&mut instance.custom_name, &self.custom_name);
        set(&mut instance.custom_prompt, &self.custom_prompt);
        set(&mut instance.language, &self.language);
        set(&mut instance.selected_voice_id, &self.selected_voice_id);
        set(&mut instance.voice_name, &self.voice_name);
        set(&mut instance.voice_provider, &self.voice_provider);
        set(&mut instance.personality, &self.personality);
        set(&mut instance.response_speed, &self.response_speed);
        set(&mut instance.max_session_duration, &self.max_session_duration);

        if let Some(configuration) = &self.configuration {
            for (key, value) in configuration {
                instance.configuration.insert(key.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use crate::domain::fixtures::{instance, template};
    use crate::domain::requests::{ActivationRequest, SettingsPatch};
    use crate::domain::template::{CommunicationType, VoiceSelection};

    #[test]
    fn activation_overrides_win_over_template_defaults_per_field() {
        let mut template = template("t1", CommunicationType::Voice);
        template.default_prompt = Some("You answer rental questions.".to_owned());
        template.default_language = Some("English".to_owned());
        template.default_voice =
            Some(VoiceSelection { id: "v-default".to_owned(), name: None, provider: None });

        let request = ActivationRequest {
            custom_name: Some("Front desk".to_owned()),
            language: Some("Deutsch".to_owned()),
            ..ActivationRequest::default()
        }
        .with_template_defaults(&template);

        assert_eq!(request.custom_name.as_deref(), Some("Front desk"));
        assert_eq!(request.custom_prompt.as_deref(), Some("You answer rental questions."));
        assert_eq!(request.language.as_deref(), Some("de-DE"));
        assert_eq!(request.selected_voice_id.as_deref(), Some("v-default"));
    }

    #[test]
    fn chat_templates_never_send_a_voice() {
        let template = template("t-chat", CommunicationType::Chat);
        let request = ActivationRequest {
            selected_voice_id: Some("v-9".to_owned()),
            ..ActivationRequest::default()
        }
        .with_template_defaults(&template);

        assert_eq!(request.selected_voice_id, None);
        assert_eq!(request.language.as_deref(), Some("en-US"));
    }

    #[test]
    fn empty_activation_body_serializes_without_null_fields() {
        let body = serde_json::to_value(ActivationRequest::default()).expect("serialize");
        assert_eq!(body, json!({}));
    }

    #[test]
    fn settings_patch_only_touches_present_fields() {
        let mut agent = instance("a1", "t1", true);
        agent.custom_prompt = Some("keep me".to_owned());
        agent.configuration.insert("enable_analytics".to_owned(), json!(false));

        let patch = SettingsPatch {
            custom_name: Some("Renamed".to_owned()),
            configuration: Some(BTreeMap::from([("response_style".to_owned(), json!("brief"))])),
            ..SettingsPatch::default()
        };
        patch.apply_to(&mut agent);

        assert_eq!(agent.custom_name.as_deref(), Some("Renamed"));
        assert_eq!(agent.custom_prompt.as_deref(), Some("keep me"));
        assert_eq!(agent.configuration.get("enable_analytics"), Some(&json!(false)));
        assert_eq!(agent.configuration.get("response_style"), Some(&json!("brief")));
    }

    #[test]
    fn normalized_patch_rewrites_language_names() {
        let patch =
            SettingsPatch { language: Some("turkish".to_owned()), ..SettingsPatch::default() }
                .normalized();
        assert_eq!(patch.language.as_deref(), Some("tr-TR"));
        assert!(!patch.is_empty());
        assert!(SettingsPatch::default().is_empty());
    }
}
