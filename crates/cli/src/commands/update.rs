use agentdesk_core::config::AppConfig;
use agentdesk_core::domain::ids::{AgentId, SectorId};
use agentdesk_core::domain::requests::SettingsPatch;
use agentdesk_core::lifecycle::RollbackPolicy;
use clap::Args;

use crate::commands::{connect, load_sector, mutation_result, CommandResult};

#[derive(Debug, Clone, Args)]
pub struct UpdateArgs {
    #[arg(help = "Agent instance id")]
    pub agent: String,
    #[arg(long)]
    pub sector: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub prompt: Option<String>,
    #[arg(long)]
    pub language: Option<String>,
    #[arg(long)]
    pub voice: Option<String>,
    #[arg(long)]
    pub personality: Option<String>,
    #[arg(long)]
    pub response_speed: Option<String>,
    #[arg(long, help = "Maximum session length in minutes")]
    pub max_session_duration: Option<u32>,
    #[arg(long, help = "Keep the local edit when the backend rejects it")]
    pub keep_optimistic: bool,
}

impl UpdateArgs {
    fn patch(&self) -> SettingsPatch {
        SettingsPatch {
            custom_name: self.name.clone(),
            custom_prompt: self.prompt.clone(),
            language: self.language.clone(),
            selected_voice_id: self.voice.clone(),
            personality: self.personality.clone(),
            response_speed: self.response_speed.clone(),
            max_session_duration: self.max_session_duration,
            ..SettingsPatch::default()
        }
    }

    fn policy(&self) -> RollbackPolicy {
        if self.keep_optimistic {
            RollbackPolicy::KeepOptimistic
        } else {
            RollbackPolicy::Refetch
        }
    }
}

pub async fn run(config: &AppConfig, args: &UpdateArgs) -> CommandResult {
    let patch = args.patch();
    if patch.is_empty() {
        return CommandResult::failure(
            "update",
            "invalid_arguments",
            "nothing to update; pass at least one setting flag",
            2,
        );
    }

    let controller = match connect("update", config) {
        Ok(controller) => controller,
        Err(result) => return result,
    };
    let sector_id = SectorId::from(args.sector.as_str());
    if let Err(result) = load_sector("update", &controller, &sector_id).await {
        return result;
    }

    let outcome = controller
        .update_with_policy(&AgentId::from(args.agent.as_str()), patch, args.policy())
        .await;
    mutation_result("update", &controller, &sector_id, outcome).await
}
