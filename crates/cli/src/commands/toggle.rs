use agentdesk_core::config::AppConfig;
use agentdesk_core::domain::ids::{AgentId, SectorId, TemplateId};
use clap::{ArgGroup, Args};

use crate::commands::{connect, load_sector, mutation_result, CommandResult};

#[derive(Debug, Clone, Args)]
#[command(group(ArgGroup::new("state").required(true).args(["on", "off"])))]
pub struct ToggleArgs {
    #[arg(help = "Agent instance id")]
    pub agent: String,
    #[arg(long)]
    pub sector: String,
    #[arg(long)]
    pub on: bool,
    #[arg(long)]
    pub off: bool,
    #[arg(long, help = "Template id; with --on, activates the template if it has no instance")]
    pub template: Option<String>,
}

pub async fn run(config: &AppConfig, args: &ToggleArgs) -> CommandResult {
    let controller = match connect("toggle", config) {
        Ok(controller) => controller,
        Err(result) => return result,
    };
    let sector_id = SectorId::from(args.sector.as_str());
    if let Err(result) = load_sector("toggle", &controller, &sector_id).await {
        return result;
    }

    let template_id = args.template.as_deref().map(TemplateId::from);
    let outcome = controller
        .toggle(&AgentId::from(args.agent.as_str()), args.on, template_id.as_ref())
        .await;
    mutation_result("toggle", &controller, &sector_id, outcome).await
}
