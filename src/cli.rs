use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tourassist")]
#[command(about = "Operator console for a TourAssist retrieval-augmented chat service")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Override the service base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Show or save the tenant, API key and session id
    Session {
        #[arg(long)]
        tenant: Option<String>,

        #[arg(long)]
        api_key: Option<String>,

        #[arg(long)]
        session: Option<String>,
    },

    /// Manage tenants
    Tenant {
        #[command(subcommand)]
        action: TenantAction,
    },

    /// Upload files or directories for indexing ('-' reads stdin)
    Ingest {
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Send one message and print the answer
    Chat {
        message: String,
    },

    /// Start the interactive shell
    Shell,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum TenantAction {
    /// Create a tenant and start a new session with its API key
    Create { tenant_id: String },
}

impl Cli {
    /// The shell runs when no subcommand is given.
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Shell)
    }
}
