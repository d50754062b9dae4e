use agentdesk_core::config::AppConfig;
use agentdesk_core::domain::ids::SectorId;
use clap::Args;

use crate::commands::{connect, load_sector, to_data, CommandResult};

#[derive(Debug, Clone, Args)]
pub struct AgentsArgs {
    #[arg(long, help = "Sector whose catalog is reconciled")]
    pub sector: String,
}

pub async fn run(config: &AppConfig, args: &AgentsArgs) -> CommandResult {
    let controller = match connect("agents", config) {
        Ok(controller) => controller,
        Err(result) => return result,
    };
    let sector_id = SectorId::from(args.sector.as_str());
    if let Err(result) = load_sector("agents", &controller, &sector_id).await {
        return result;
    }

    let agents = controller.agents(&sector_id).await;
    let active = agents.iter().filter(|agent| agent.is_active).count();
    CommandResult::success_with_data(
        "agents",
        format!("{} agents, {active} active", agents.len()),
        to_data(&agents),
    )
}
