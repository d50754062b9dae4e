use crate::domain::instance::AgentInstance;
use crate::domain::template::{
    AgentTemplate, CommunicationType, IntegrationConfigs, VoiceSelection,
};
use crate::domain::view::{AgentSettings, BaseSettings, ChatSettings, VoiceSettings};
use crate::reconcile::language::{normalize_language, DEFAULT_LANGUAGE};

pub const DEFAULT_AGENT_NAME: &str = "Untitled agent";
pub const DEFAULT_ICON: &str = "bot";
pub const DEFAULT_COLOR: &str = "#6366F1";
pub const DEFAULT_PERSONALITY: &str = "professional";
pub const DEFAULT_RESPONSE_SPEED: &str = "normal";
/// Minutes.
pub const DEFAULT_MAX_SESSION_DURATION: u32 = 30;

const ANALYTICS_KEY: &str = "enable_analytics";
const INTEGRATIONS_KEY: &str = "integrations";
const RESPONSE_STYLE_KEY: &str = "response_style";

/// Display grouping derived from a slug: everything before the first hyphen.
pub fn derive_category(slug: &str) -> String {
    match slug.split_once('-') {
        Some((head, _)) => head.to_owned(),
        None => slug.to_owned(),
    }
}

/// Instance-selected voice, then the template default, then no voice at all.
pub fn resolve_voice(
    instance: Option<&AgentInstance>,
    template: Option<&AgentTemplate>,
) -> Option<VoiceSelection> {
    let template_voice = template.and_then(|template| template.default_voice.as_ref());

    if let Some(selected) = instance.and_then(|instance| instance.selected_voice_id.as_ref()) {
        let matching_default = template_voice.filter(|voice| &voice.id == selected);
        return Some(VoiceSelection {
            id: selected.clone(),
            name: instance
                .and_then(|instance| instance.voice_name.clone())
                .or_else(|| matching_default.and_then(|voice| voice.name.clone())),
            provider: instance
                .and_then(|instance| instance.voice_provider.clone())
                .or_else(|| matching_default.and_then(|voice| voice.provider.clone())),
        });
    }

    template_voice.cloned()
}

/// Builds the settings variant for `communication_type`, resolving every field as instance
/// value, then template default, then built-in fallback.
pub fn synthesize_settings(
    communication_type: CommunicationType,
    instance: Option<&AgentInstance>,
    template: Option<&AgentTemplate>,
) -> AgentSettings {
    let base = base_settings(instance, template);

    match communication_type {
        CommunicationType::Voice | CommunicationType::Hybrid => {
            AgentSettings::Voice(VoiceSettings {
                base,
                voice: resolve_voice(instance, template),
                personality: instance
                    .and_then(|instance| instance.personality.clone())
                    .or_else(|| template.and_then(|template| template.default_personality.clone()))
                    .unwrap_or_else(|| DEFAULT_PERSONALITY.to_owned()),
                response_speed: instance
                    .and_then(|instance| instance.response_speed.clone())
                    .or_else(|| {
                        template.and_then(|template| template.default_response_speed.clone())
                    })
                    .unwrap_or_else(|| DEFAULT_RESPONSE_SPEED.to_owned()),
                max_session_duration: instance
                    .and_then(|instance| instance.max_session_duration)
                    .or_else(|| template.and_then(|template| template.default_max_session_duration))
                    .unwrap_or(DEFAULT_MAX_SESSION_DURATION),
            })
        }
        CommunicationType::Chat => AgentSettings::Chat(ChatSettings {
            base,
            response_style: instance.and_then(|instance| {
                instance
                    .configuration
                    .get(RESPONSE_STYLE_KEY)
                    .and_then(|value| value.as_str())
                    .map(str::to_owned)
            }),
        }),
    }
}

fn base_settings(instance: Option<&AgentInstance>, template: Option<&AgentTemplate>) -> BaseSettings {
    let language = instance
        .and_then(|instance| instance.language.as_deref())
        .or_else(|| template.and_then(|template| template.default_language.as_deref()))
        .unwrap_or(DEFAULT_LANGUAGE);

    BaseSettings {
        custom_name: instance
            .and_then(|instance| instance.custom_name.clone())
            .or_else(|| template.map(|template| template.name.clone()))
            .unwrap_or_else(|| DEFAULT_AGENT_NAME.to_owned()),
        language: normalize_language(language),
        custom_prompt: instance
            .and_then(|instance| instance.custom_prompt.clone())
            .or_else(|| template.and_then(|template| template.default_prompt.clone())),
        enable_analytics: instance
            .and_then(|instance| instance.configuration.get(ANALYTICS_KEY))
            .and_then(|value| value.as_bool())
            .unwrap_or(true),
        integration_configs: integration_configs(instance, template),
    }
}

fn integration_configs(
    instance: Option<&AgentInstance>,
    template: Option<&AgentTemplate>,
) -> IntegrationConfigs {
    let from_instance = instance
        .and_then(|instance| instance.configuration.get(INTEGRATIONS_KEY))
        .and_then(|value| value.as_object())
        .map(|object| object.iter().map(|(key, value)| (key.clone(), value.clone())).collect());

    from_instance
        .or_else(|| template.map(|template| template.default_integrations.clone()))
        .unwrap_or_default()
}
