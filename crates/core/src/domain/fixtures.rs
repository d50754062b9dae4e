use chrono::{TimeZone, Utc};

use super::ids::{AgentId, CompanyId, SectorId, TemplateId};
use super::instance::AgentInstance;
use super::sector::Sector;
use super::template::{AgentTemplate, CommunicationType};

pub(crate) fn sector(slug: &str) -> Sector {
    Sector { id: SectorId(format!("sec-{slug}")), slug: slug.to_owned(), name: slug.to_owned() }
}

pub(crate) fn template(id: &str, communication_type: CommunicationType) -> AgentTemplate {
    AgentTemplate {
        id: TemplateId(id.to_owned()),
        sector_id: SectorId("sec-car-rental".to_owned()),
        name: format!("Template {id}"),
        description: format!("Description of {id}"),
        icon: Some("phone".to_owned()),
        color: Some("#0EA5E9".to_owned()),
        communication_type,
        required_integrations: vec!["crm".to_owned()],
        default_prompt: None,
        default_language: None,
        default_voice: None,
        default_personality: None,
        default_response_speed: None,
        default_max_session_duration: None,
        default_integrations: Default::default(),
    }
}

pub(crate) fn instance(id: &str, template_id: &str, is_active: bool) -> AgentInstance {
    let stamp = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).single().unwrap_or_else(Utc::now);
    AgentInstance {
        id: AgentId(id.to_owned()),
        company_id: CompanyId("c1".to_owned()),
        agent_template_id: TemplateId(template_id.to_owned()),
        custom_name: None,
        custom_prompt: None,
        language: None,
        selected_voice_id: None,
        voice_name: None,
        voice_provider: None,
        personality: None,
        response_speed: None,
        max_session_duration: None,
        configuration: Default::default(),
        is_active,
        created_at: stamp,
        updated_at: stamp,
    }
}
