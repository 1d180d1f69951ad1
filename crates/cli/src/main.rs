use std::env;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reqwest::Client;
use scout_agents::{
    Dispatcher, KeywordRouter, ModelClient, ModelConfig, ModelPolicy, ModelRouter, Planner,
    RulePolicy, TurnExecutor, TurnRouter,
};
use scout_core::{ChatInput, ProviderKind, ResponderRegistry};
use scout_observability::{init_tracing, AppMetrics};
use scout_providers::{ProviderConfig, ProviderRegistry, ProviderSet};
use scout_storage::Store;

type Executor = TurnExecutor<Planner, ProviderRegistry, Store>;

#[derive(Debug, Parser)]
#[command(name = "cityscout")]
#[command(about = "CityScout assistant CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive chat session.
    Chat,
    /// One turn, printed as JSON.
    Ask {
        message: String,
        #[arg(long)]
        session: Option<String>,
    },
    /// Call a single information provider directly.
    Lookup { provider: String, place: String },
    /// Resolve a place name to coordinates.
    Geo { place: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("scout_cli");
    let cli = Cli::parse();

    let (executor, providers) = build_executor().await?;

    match cli.command {
        Command::Chat => run_chat(executor).await?,
        Command::Ask { message, session } => {
            let outcome = executor
                .handle_turn(ChatInput {
                    session_id: session,
                    message,
                })
                .await
                .map_err(anyhow::Error::from)?;

            println!("{}", serde_json::to_string_pretty(&outcome.result)?);
        }
        Command::Lookup { provider, place } => {
            let kind = ProviderKind::parse(&provider)
                .with_context(|| format!("unknown provider '{provider}'"))?;
            println!("{}", providers.lookup(kind, &place).await);
        }
        Command::Geo { place } => {
            let coordinate = providers.geo().resolve(&place).await;
            println!("{}", serde_json::to_string_pretty(&coordinate)?);
        }
    }

    Ok(())
}

async fn run_chat(executor: Executor) -> Result<()> {
    let mut session_id: Option<String> = None;

    println!("CityScout chat mode. type 'exit' to quit.");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        io::stdin().read_line(&mut line)?;

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        if message.is_empty() {
            continue;
        }

        let outcome = executor
            .handle_turn(ChatInput {
                session_id: session_id.clone(),
                message: message.to_string(),
            })
            .await
            .map_err(anyhow::Error::from)?;

        session_id = Some(outcome.session_id);

        println!("\n[{}]", outcome.responder);
        println!("{}\n", outcome.result.response);
    }

    Ok(())
}

async fn build_executor() -> Result<(Executor, Arc<ProviderRegistry>)> {
    let metrics = AppMetrics::shared();

    let http = Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(5))
        .build()
        .context("failed to build HTTP client")?;

    let providers = Arc::new(ProviderRegistry::new(
        http.clone(),
        ProviderConfig::from_env(),
    ));
    let registry = Arc::new(ResponderRegistry::standard());

    let (router, planner) = match ModelConfig::from_env() {
        Some(config) => {
            let client = ModelClient::new(http, config);
            (
                TurnRouter::Model(ModelRouter::new(client.clone())),
                Planner::Model(ModelPolicy::new(client)),
            )
        }
        None => (
            TurnRouter::Keyword(KeywordRouter),
            Planner::Rules(RulePolicy),
        ),
    };

    let store = if let Ok(database_url) = env::var("SCOUT_DATABASE_URL") {
        Store::sqlite(&database_url).await?
    } else {
        Store::memory()
    };

    let executor = TurnExecutor::new(
        Dispatcher::new(registry, router),
        planner,
        providers.clone(),
        Arc::new(store),
        metrics,
    );

    Ok((executor, providers))
}
