use agentdesk_core::config::AppConfig;
use agentdesk_core::reconcile::settings::derive_category;
use serde::Serialize;

use crate::commands::{connect, to_data, CommandResult};

#[derive(Debug, Serialize)]
struct SectorRow {
    id: String,
    slug: String,
    name: String,
    category: String,
}

pub async fn run(config: &AppConfig) -> CommandResult {
    let controller = match connect("sectors", config) {
        Ok(controller) => controller,
        Err(result) => return result,
    };

    if let Err(error) = controller.load_sectors().await {
        return CommandResult::from_agent_error("sectors", error);
    }

    let rows: Vec<SectorRow> = controller
        .catalog()
        .sectors()
        .await
        .into_iter()
        .map(|sector| SectorRow {
            id: sector.id.to_string(),
            category: derive_category(&sector.slug),
            slug: sector.slug,
            name: sector.name,
        })
        .collect();

    CommandResult::success_with_data("sectors", format!("{} sectors", rows.len()), to_data(&rows))
}
