use agentdesk_core::config::AppConfig;
use agentdesk_core::domain::ids::{SectorId, TemplateId};
use agentdesk_core::domain::requests::ActivationRequest;
use clap::Args;

use crate::commands::{connect, load_sector, mutation_result, CommandResult};

#[derive(Debug, Clone, Args)]
pub struct ActivateArgs {
    #[arg(help = "Template to activate for the company")]
    pub template: String,
    #[arg(long)]
    pub sector: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub prompt: Option<String>,
    #[arg(long, help = "Language name or xx-XX code")]
    pub language: Option<String>,
    #[arg(long, help = "Voice id, ignored for chat templates")]
    pub voice: Option<String>,
}

impl ActivateArgs {
    fn overrides(&self) -> ActivationRequest {
        ActivationRequest {
            custom_name: self.name.clone(),
            custom_prompt: self.prompt.clone(),
            selected_voice_id: self.voice.clone(),
            language: self.language.clone(),
            ..ActivationRequest::default()
        }
    }
}

pub async fn run(config: &AppConfig, args: &ActivateArgs) -> CommandResult {
    let controller = match connect("activate", config) {
        Ok(controller) => controller,
        Err(result) => return result,
    };
    let sector_id = SectorId::from(args.sector.as_str());
    if let Err(result) = load_sector("activate", &controller, &sector_id).await {
        return result;
    }

    let template_id = TemplateId::from(args.template.as_str());
    let outcome = controller.activate(&template_id, args.overrides()).await;
    mutation_result("activate", &controller, &sector_id, outcome).await
}
