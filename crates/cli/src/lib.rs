pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use agentdesk_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};
use clap::{Parser, Subcommand};

use crate::commands::activate::ActivateArgs;
use crate::commands::agents::AgentsArgs;
use crate::commands::toggle::ToggleArgs;
use crate::commands::update::UpdateArgs;
use crate::commands::CommandResult;

#[derive(Debug, Parser)]
#[command(
    name = "agentdesk",
    about = "Agent catalog operator CLI",
    long_about = "Browse sector agent catalogs and activate, toggle, or reconfigure a company's agents.",
    after_help = "Examples:\n  agentdesk sectors\n  agentdesk agents --sector sec-1 --company c1\n  agentdesk toggle a1 --sector sec-1 --off"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to an agentdesk.toml config file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Company id, overrides session.company_id")]
    company: Option<String>,
    #[arg(long, global = true, help = "Backend base URL, overrides api.base_url")]
    base_url: Option<String>,
    #[arg(long, global = true, help = "Log level, overrides logging.level")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "List the sectors in the catalog")]
    Sectors,
    #[command(about = "Show the reconciled agents of a sector for the company")]
    Agents(AgentsArgs),
    #[command(about = "Activate a template for the company")]
    Activate(ActivateArgs),
    #[command(about = "Enable or disable a company agent")]
    Toggle(ToggleArgs),
    #[command(about = "Change settings of a company agent")]
    Update(UpdateArgs),
    #[command(about = "Inspect effective configuration with source attribution and redaction")]
    Config,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Sectors => "sectors",
            Self::Agents(_) => "agents",
            Self::Activate(_) => "activate",
            Self::Toggle(_) => "toggle",
            Self::Update(_) => "update",
            Self::Config => "config",
        }
    }
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                api_base_url: self.base_url.clone(),
                company_id: self.company.clone(),
                log_level: self.log_level.clone(),
                ..ConfigOverrides::default()
            },
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let result = execute(&cli);

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Runs one parsed invocation to completion on a private runtime.
pub fn execute(cli: &Cli) -> CommandResult {
    let options = cli.load_options();
    if let Command::Config = cli.command {
        return commands::config::run(&options);
    }

    let command = cli.command.name();
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                command,
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };
    init_logging(&config);

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                command,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                1,
            );
        }
    };

    tracing::debug!(event_name = "cli.command.started", command, "running command");
    runtime.block_on(async {
        match &cli.command {
            Command::Sectors => commands::sectors::run(&config).await,
            Command::Agents(args) => commands::agents::run(&config, args).await,
            Command::Activate(args) => commands::activate::run(&config, args).await,
            Command::Toggle(args) => commands::toggle::run(&config, args).await,
            Command::Update(args) => commands::update::run(&config, args).await,
            Command::Config => commands::config::run(&cli.load_options()),
        }
    })
}

/// Logs go to stderr; stdout carries only the JSON command result.
fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    // a second invocation in the same process keeps the first subscriber
    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
