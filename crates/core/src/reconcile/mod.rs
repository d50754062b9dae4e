//! Merges the sector catalog with the company's activated instances.
//!
//! Everything in here is pure: no I/O, no shared state, no failure path. Anomalies in the
//! input are reported as [`MergeDiagnostic`] values next to the result.

pub mod language;
pub mod settings;

use std::collections::HashMap;

use serde::Serialize;

use crate::domain::ids::{AgentId, TemplateId};
use crate::domain::instance::AgentInstance;
use crate::domain::sector::Sector;
use crate::domain::template::{AgentTemplate, CommunicationType};
use crate::domain::view::AgentViewModel;

use self::settings::{
    derive_category, synthesize_settings, DEFAULT_AGENT_NAME, DEFAULT_COLOR, DEFAULT_ICON,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MergeDiagnostic {
    /// The instance points at a template that is not in the loaded catalog.
    MissingTemplate { agent_id: AgentId, template_id: TemplateId },
    /// More than one instance for the same template; only `kept` is shown.
    DuplicateInstance { template_id: TemplateId, kept: AgentId, dropped: AgentId },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Reconciliation {
    pub agents: Vec<AgentViewModel>,
    pub diagnostics: Vec<MergeDiagnostic>,
}

pub fn reconcile(
    sector: &Sector,
    templates: &[AgentTemplate],
    instances: &[AgentInstance],
) -> Vec<AgentViewModel> {
    reconcile_with_diagnostics(sector, templates, instances).agents
}

/// Company-owned agents come first, then available templates. Both groups follow catalog
/// order; instances whose template is unknown trail the company group in backend order.
pub fn reconcile_with_diagnostics(
    sector: &Sector,
    templates: &[AgentTemplate],
    instances: &[AgentInstance],
) -> Reconciliation {
    let mut diagnostics = Vec::new();
    let category = derive_category(&sector.slug);

    let mut by_template: HashMap<&TemplateId, &AgentInstance> = HashMap::new();
    let mut owned: Vec<&AgentInstance> = Vec::new();
    for instance in instances {
        match by_template.get(&instance.agent_template_id) {
            Some(kept) => diagnostics.push(MergeDiagnostic::DuplicateInstance {
                template_id: instance.agent_template_id.clone(),
                kept: kept.id.clone(),
                dropped: instance.id.clone(),
            }),
            None => {
                by_template.insert(&instance.agent_template_id, instance);
                owned.push(instance);
            }
        }
    }

    let catalog: HashMap<&TemplateId, (usize, &AgentTemplate)> = templates
        .iter()
        .enumerate()
        .map(|(position, template)| (&template.id, (position, template)))
        .collect();

    let mut company: Vec<(Option<usize>, AgentViewModel)> = owned
        .into_iter()
        .map(|instance| match catalog.get(&instance.agent_template_id) {
            Some((position, template)) => {
                (Some(*position), company_agent(instance, Some(*template), &category))
            }
            None => {
                diagnostics.push(MergeDiagnostic::MissingTemplate {
                    agent_id: instance.id.clone(),
                    template_id: instance.agent_template_id.clone(),
                });
                (None, company_agent(instance, None, &category))
            }
        })
        .collect();
    company.sort_by_key(|(position, _)| position.map_or((1, 0), |position| (0, position)));

    let mut agents: Vec<AgentViewModel> = company.into_iter().map(|(_, agent)| agent).collect();
    agents.extend(
        templates
            .iter()
            .filter(|template| !by_template.contains_key(&template.id))
            .map(|template| available_agent(template, &category)),
    );

    Reconciliation { agents, diagnostics }
}

fn company_agent(
    instance: &AgentInstance,
    template: Option<&AgentTemplate>,
    category: &str,
) -> AgentViewModel {
    let communication_type = match template {
        Some(template) => template.communication_type,
        None if instance.has_voice_fields() => CommunicationType::Voice,
        None => CommunicationType::Chat,
    };
    let settings = synthesize_settings(communication_type, Some(instance), template);

    AgentViewModel {
        id: instance.id.0.clone(),
        name: settings.base().custom_name.clone(),
        original_name: template
            .map(|template| template.name.clone())
            .or_else(|| instance.custom_name.clone())
            .unwrap_or_else(|| DEFAULT_AGENT_NAME.to_owned()),
        description: template.map(|template| template.description.clone()).unwrap_or_default(),
        icon: template
            .and_then(|template| template.icon.clone())
            .unwrap_or_else(|| DEFAULT_ICON.to_owned()),
        color: template
            .and_then(|template| template.color.clone())
            .unwrap_or_else(|| DEFAULT_COLOR.to_owned()),
        category: category.to_owned(),
        communication_type,
        is_active: instance.is_active,
        last_updated: Some(instance.updated_at),
        required_integrations: template
            .map(|template| template.required_integrations.clone())
            .unwrap_or_default(),
        agent_template_id: instance.agent_template_id.clone(),
        is_company_agent: true,
        settings,
    }
}

fn available_agent(template: &AgentTemplate, category: &str) -> AgentViewModel {
    AgentViewModel {
        id: template.id.0.clone(),
        name: template.name.clone(),
        original_name: template.name.clone(),
        description: template.description.clone(),
        icon: template.icon.clone().unwrap_or_else(|| DEFAULT_ICON.to_owned()),
        color: template.color.clone().unwrap_or_else(|| DEFAULT_COLOR.to_owned()),
        category: category.to_owned(),
        communication_type: template.communication_type,
        is_active: false,
        last_updated: None,
        required_integrations: template.required_integrations.clone(),
        agent_template_id: template.id.clone(),
        is_company_agent: false,
        settings: synthesize_settings(template.communication_type, None, Some(template)),
    }
}
