use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    catalog::{template_cards, RecoveryAction},
    config::load_settings,
    presenter::{present_failure, present_result, DebugInfo},
    SwapClient, WorkflowContext, WorkflowDriver, WorkflowEvent,
};
use shared::domain::TemplateId;
use tracing_subscriber::EnvFilter;

mod input;

#[derive(Parser, Debug)]
#[command(name = "gifswap", about = "Put your face on an animated template")]
struct Args {
    /// Origin that relative template and result paths resolve against.
    #[arg(long, global = true)]
    origin: Option<String>,
    /// API root; derived from the origin when omitted.
    #[arg(long, global = true)]
    api_base_url: Option<String>,
    /// Print the final workflow state as JSON.
    #[arg(long, global = true)]
    state_json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the templates the backend offers.
    Templates,
    /// Submit a photo against a template and optionally save the result.
    Swap {
        #[arg(long)]
        template: String,
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Ask the backend to generate its demo templates.
    CreateDemos,
    Health,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(origin) = args.origin {
        settings.origin = origin;
    }
    if let Some(api_base_url) = args.api_base_url {
        settings.api_base_url = Some(api_base_url);
    }
    let endpoints = settings.endpoints()?;
    tracing::info!(origin = %endpoints.origin, api_base = %endpoints.api_base, "gifswap starting");
    let client = Arc::new(SwapClient::from_endpoints(&endpoints));
    let ctx = WorkflowContext::new(&endpoints.origin, settings.max_image_bytes);

    match args.command {
        Command::Templates => {
            let mut driver = WorkflowDriver::new(client.clone(), ctx);
            load_catalog(&mut driver).await;

            let state = driver.state();
            for card in template_cards(&state.catalog, None, driver.context().origin()) {
                println!("{:<24} {:<32} {}", card.id, card.name, card.thumbnail_url);
            }
            print_recovery_hints(&state.catalog.recovery_actions());
            println!("{}", DebugInfo::from_state(state, client.api_base()));
            print_state(&driver, args.state_json)?;
        }
        Command::Swap {
            template,
            image,
            output,
        } => {
            let mut driver = WorkflowDriver::new(client.clone(), ctx);
            load_catalog(&mut driver).await;
            let actions = driver.state().catalog.recovery_actions();
            if !actions.is_empty() {
                print_recovery_hints(&actions);
                bail!("no templates to choose from");
            }

            driver.dispatch(WorkflowEvent::TemplateSelected(TemplateId::new(template)));
            println!("{}", driver.state().status);
            if driver.state().selected_template.is_none() {
                bail!("{}", driver.state().status);
            }

            let file = input::read_image_file(&image).await?;
            driver.dispatch(WorkflowEvent::FileSelected(file));
            driver.settle().await;
            println!("{}", driver.state().status);
            if driver.state().user_image.is_none() {
                bail!("{}", driver.state().status);
            }

            driver.dispatch(WorkflowEvent::SubmitRequested);
            println!("{}", driver.state().status);
            driver.settle().await;
            println!("{}", driver.state().status);

            if let Some(view) = present_result(driver.state(), &settings.download_name) {
                println!("Result: {}", view.result_url);
                let target = output.unwrap_or_else(|| PathBuf::from(&view.download.file_name));
                let bytes = client.download_artifact(&view.download.url).await?;
                tokio::fs::write(&target, &bytes)
                    .await
                    .with_context(|| format!("failed to write {}", target.display()))?;
                println!("Saved {} bytes to {}", bytes.len(), target.display());
            }
            print_state(&driver, args.state_json)?;
            if let Some(error) = present_failure(driver.state()) {
                bail!("swap failed: {error}");
            }
        }
        Command::CreateDemos => {
            let response = client.create_demos().await?;
            println!("{}", response.summary());
            for demo in &response.templates {
                println!("{:<24} {}", demo.id, demo.name);
            }
            if !response.success {
                bail!("{}", response.summary());
            }
        }
        Command::Health => {
            let health = client.health().await?;
            match health.version {
                Some(version) => println!("{} (version {version})", health.status),
                None => println!("{}", health.status),
            }
        }
    }

    Ok(())
}

async fn load_catalog(driver: &mut WorkflowDriver) {
    driver.dispatch(WorkflowEvent::CatalogRequested);
    driver.settle().await;
    println!("{}", driver.state().status);
}

fn print_recovery_hints(actions: &[RecoveryAction]) {
    if actions.is_empty() {
        return;
    }
    println!("No templates available or the catalog failed to load.");
    for action in actions {
        match action {
            RecoveryAction::Reload => println!("  reload:       gifswap templates"),
            RecoveryAction::CreateDemos => println!("  create demos: gifswap create-demos"),
        }
    }
}

fn print_state(driver: &WorkflowDriver, enabled: bool) -> Result<()> {
    if enabled {
        println!("{}", serde_json::to_string_pretty(driver.state())?);
    }
    Ok(())
}
