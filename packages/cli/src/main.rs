mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use client::{ClientAppConfig, HttpBackend, ResourceSession, SortField, SortOrder, auth};
use tracing::info;
use tracing_subscriber::EnvFilter;
use workflow::ResourceStatus;

#[derive(Parser)]
#[command(name = "reshare")]
#[command(about = "Browse, review and rate shared resources")]
#[command(after_help = concat!(
    "Environment:\n",
    "  RESHARE_CONFIG        Config file path (without extension)\n",
    "  RESHARE__AUTH__TOKEN  Bearer token\n",
    "  RUST_LOG              Log filter",
))]
struct Cli {
    /// Config file path, without extension.
    #[arg(long, global = true, env = "RESHARE_CONFIG")]
    config: Option<String>,
    /// Override the configured bearer token.
    #[arg(long, global = true, env = "RESHARE_TOKEN", hide_env_values = true)]
    token: Option<String>,
    /// Override the configured API base URL.
    #[arg(long, global = true)]
    base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Show the signed-in identity and its permissions.
    Whoami,
    /// List resources visible to you.
    List {
        #[arg(long)]
        status: Option<ResourceStatus>,
        #[arg(long)]
        owner: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = client::ListQuery::DEFAULT_PER_PAGE)]
        per_page: u32,
        #[arg(long, value_enum, default_value_t = SortFieldCli::CreatedAt)]
        sort: SortFieldCli,
        #[arg(long, value_enum, default_value_t = SortOrderCli::Desc)]
        order: SortOrderCli,
    },
    /// Show one resource.
    Show { id: String },
    /// Actions you could take on a resource right now.
    Actions { id: String },
    /// Send an uploaded resource for review.
    Submit { id: String },
    Approve {
        id: String,
        #[arg(long)]
        comment: Option<String>,
    },
    Reject {
        id: String,
        #[arg(long)]
        comment: String,
    },
    Deactivate {
        id: String,
        #[arg(long)]
        comment: String,
    },
    Reactivate {
        id: String,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Put a reviewed resource back into the review queue.
    Resubmit { id: String },
    /// Rate a resource from 1 to 5.
    Rate { id: String, value: u8 },
    Delete { id: String },
}

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum SortFieldCli {
    CreatedAt,
    Title,
    AverageRating,
}

impl From<SortFieldCli> for SortField {
    fn from(value: SortFieldCli) -> Self {
        match value {
            SortFieldCli::CreatedAt => SortField::CreatedAt,
            SortFieldCli::Title => SortField::Title,
            SortFieldCli::AverageRating => SortField::AverageRating,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum SortOrderCli {
    Asc,
    Desc,
}

impl From<SortOrderCli> for SortOrder {
    fn from(value: SortOrderCli) -> Self {
        match value {
            SortOrderCli::Asc => SortOrder::Asc,
            SortOrderCli::Desc => SortOrder::Desc,
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<ClientAppConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientAppConfig::load_from(path),
        None => ClientAppConfig::load(),
    }
    .context("Failed to load config")?;

    if let Some(token) = &cli.token {
        config.auth.token = Some(token.clone());
    }
    if let Some(base_url) = &cli.base_url {
        config.backend.base_url = base_url.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    info!(base_url = %config.backend.base_url, "Connecting");

    let auth = auth::context_from_config(&config.auth).context("Invalid auth token")?;
    let backend = HttpBackend::new(&config.backend, &auth).context("Failed to build HTTP client")?;
    let session = ResourceSession::connect(backend, auth)
        .await
        .context("Failed to establish session")?;

    let output = commands::run(&session, cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
