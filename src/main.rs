use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;
use tracing::info;

use tourassist_client::app::{logging, AppConfig, AppState, IngestReport};
use tourassist_client::console::{shell, ConsoleSink, ShellCommand, TerminalProgress, Theme};
use tourassist_client::platform::AppPaths;

mod cli;

use cli::{Cli, Commands, TenantAction};

async fn load_config(cli: &Cli, paths: &AppPaths) -> anyhow::Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => AppConfig::load(paths)
            .await
            .context("Failed to load configuration")?,
    };

    if let Some(base_url) = &cli.base_url {
        config.service.base_url = base_url.clone();
    }
    if cli.no_color {
        config.ui.color = false;
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize directories and configuration
    let paths = AppPaths::new().context("Failed to resolve application directories")?;
    paths
        .ensure_dirs_exist()
        .context("Failed to create application directories")?;
    let config = load_config(&cli, &paths).await?;

    // Initialize logging
    let _log_guard = logging::init(&config.logging, &paths, cli.debug)?;
    info!("Starting TourAssist console v{}", env!("CARGO_PKG_VERSION"));

    // Initialize application state and restore the saved session
    let theme = Theme::for_color(config.ui.color);
    let state = AppState::new(config, paths).context("Failed to initialize application state")?;
    let mut bench = state
        .workbench(ConsoleSink::stdout(theme.clone()), TerminalProgress::stderr(theme))
        .await
        .context("Failed to restore session")?;

    let succeeded = match cli.command() {
        Commands::Shell => {
            shell::run(&mut bench).await?;
            true
        }
        Commands::Session {
            tenant,
            api_key,
            session,
        } => {
            if tenant.is_none() && api_key.is_none() && session.is_none() {
                shell::handle(&mut bench, ShellCommand::ShowSession).await;
                true
            } else {
                let current = bench.session().record().clone();
                bench
                    .save_session(
                        tenant.as_deref().unwrap_or(&current.tenant_id),
                        api_key.as_deref().unwrap_or(&current.api_key),
                        session.as_deref().unwrap_or(&current.session_id),
                    )
                    .await
                    .is_some()
            }
        }
        Commands::Tenant {
            action: TenantAction::Create { tenant_id },
        } => bench.create_tenant(&tenant_id).await.is_some(),
        Commands::Ingest { paths: inputs } => {
            match shell::ingest_selection(&mut bench, &inputs).await {
                Some(IngestReport::Single { result, .. }) => result.is_ok(),
                Some(IngestReport::Batch(summary)) => summary.ingested_count > 0,
                None => false,
            }
        }
        Commands::Chat { message } => match bench.chat(&message).await {
            Some(exchange) => {
                bench.sink_mut().print_exchange(&exchange);
                true
            }
            None => false,
        },
    };

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
