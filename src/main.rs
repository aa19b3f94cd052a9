use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use mcegen::cli::{
    deliver, format_defaults, format_flavor_details, format_flavor_list,
    format_generation_summary, format_sites, format_vendors, format_versions, generate_cluster,
    generate_from_flavor, Cli, Commands, FlavorsAction,
};
use mcegen::config::{load_settings, SettingsOverrides};
use mcegen::server::{create_router, AppState};
use mcegen::service::ClusterService;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load .env file before anything reads the environment
    if let Some(ref env_file) = cli.env_file {
        if let Err(e) = dotenvy::from_path(env_file) {
            eprintln!("Failed to load env file {}: {}", env_file.display(), e);
            process::exit(1);
        }
    }

    // Initialize logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let overrides = match &cli.command {
        Commands::Serve(args) => args.overrides(),
        Commands::Generate(args) => args.overrides(),
        Commands::Preview(args) => SettingsOverrides {
            data_dir: args.data.data_dir.clone(),
            ..SettingsOverrides::default()
        },
        Commands::Flavors(args) => args.overrides(),
        _ => SettingsOverrides::default(),
    };

    let mut settings = load_settings(cli.config.as_deref()).context("Failed to load settings")?;
    settings.apply(overrides);
    settings.expand_paths();

    let service = ClusterService::from_settings(&settings)?;

    let output = match cli.command {
        Commands::Serve(_) => return serve(AppState::new(service, settings)).await,
        Commands::Generate(args) => {
            let generation = generate_cluster(&service, &args.cluster)?;
            deliver(&service, &settings, &generation, &args.output)?
        }
        Commands::Preview(args) => {
            let generation = generate_cluster(&service, &args)?;
            format!(
                "{}\n{}",
                format_generation_summary(&generation),
                generation.yaml()
            )
        }
        Commands::Vendors => format_vendors(&service.vendors()),
        Commands::Versions => format_versions(&service.versions()),
        Commands::Defaults => format_defaults(&service.defaults()),
        Commands::Sites => format_sites(&service.sites()),
        Commands::Flavors(args) => match args.action {
            FlavorsAction::List => format_flavor_list(&service.list_flavors()),
            FlavorsAction::Show { name } => format_flavor_details(&service.flavor_details(&name)?),
            FlavorsAction::Generate {
                name,
                cluster_name,
                site,
                dns_domain,
                output,
            } => {
                let generation =
                    generate_from_flavor(&service, &name, &cluster_name, &site, dns_domain)?;
                deliver(&service, &settings, &generation, &output)?
            }
        },
    };

    print!("{}", output);
    Ok(())
}

async fn serve(state: AppState) -> Result<()> {
    let addr = state.settings.bind_address();

    info!(
        "Loaded {} flavor(s), {} OCP version(s)",
        state.service.flavor_catalog().len(),
        state.service.versions().total
    );
    if state.settings.gitops.repo_path.is_none() {
        info!("GitOps publishing disabled (no repository configured)");
    }

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("mcegen listening on {}", addr);
    info!("Endpoints:");
    info!("  GET  /health                          - Health check");
    info!("  GET  /api/v1/clusters/defaults        - Defaults catalogue");
    info!("  POST /api/v1/clusters/generate        - Generate (and commit) a cluster");
    info!("  POST /api/v1/clusters/preview         - Preview a cluster");
    info!("  GET  /api/v1/clusters/flavors         - List flavors");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
