use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use ragqa::{
    AppState, Assistant, ConfigManager, RagqaConfig,
    api::routes::create_router,
    cli::{
        Cli, Commands,
        init::{self, InitConfig, InitResult},
        output::Output,
    },
    types::{ApiCredential, AskResponse},
    utils::toml_config::ServerConfig,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    match cli.command {
        Some(Commands::Init {
            path,
            force,
            host,
            port,
        }) => {
            let result = init::run(
                InitConfig {
                    path,
                    force,
                    host,
                    port,
                },
                &output,
            );
            if let InitResult::Error(e) = result {
                anyhow::bail!("init failed: {}", e);
            }
            Ok(())
        }
        Some(Commands::Config { full, validate }) => show_config(&cli.config, full, validate, &output),
        Some(Commands::Ask {
            query,
            api_key,
            json,
        }) => {
            let config_manager = load_config_manager(&cli.config)?;
            init_tracing(&config_manager.config().server, cli.verbose)?;
            ask_once(Arc::new(config_manager), &query, api_key.as_deref(), json, &output).await
        }
        Some(Commands::Serve { host, port }) => {
            let config_manager = load_config_manager(&cli.config)?;
            init_tracing(&config_manager.config().server, cli.verbose)?;
            serve(config_manager, host, port).await
        }
        None => {
            let config_manager = load_config_manager(&cli.config)?;
            init_tracing(&config_manager.config().server, cli.verbose)?;
            serve(config_manager, None, None).await
        }
    }
}

/// A missing file is not an error: every setting has a default.
fn load_config_manager(path: &Path) -> anyhow::Result<ConfigManager> {
    if path.exists() {
        ConfigManager::new(path).with_context(|| format!("failed to load {}", path.display()))
    } else {
        eprintln!(
            "{} not found, using built-in defaults (run `ragqa-server init` to create one)",
            path.display()
        );
        Ok(ConfigManager::from_config(RagqaConfig::default()))
    }
}

fn init_tracing(server: &ServerConfig, verbose: bool) -> anyhow::Result<()> {
    let default_level = if verbose {
        "debug"
    } else {
        server.log_level.as_str()
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .context("invalid log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = if server.log_format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {}", e))
}

async fn serve(
    mut config_manager: ConfigManager,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    config_manager
        .start_watching()
        .context("failed to watch the configuration file")?;
    let config_manager = Arc::new(config_manager);
    let config = config_manager.config();
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    if config.env_api_key().is_none() {
        tracing::warn!(
            env = %config.llm.api_key_env,
            "No server-side API key; every request must supply its own"
        );
    }

    let assistant = Assistant::from_config(Arc::clone(&config_manager))?;
    let state = AppState {
        config_manager,
        assistant: Arc::new(assistant),
    };
    let app = create_router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!(
        %addr,
        model = %config.llm.model,
        source = %config.rag.source_url,
        router = ?config.router.policy,
        index = ?config.rag.index_policy,
        "ragqa-server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}

async fn ask_once(
    config_manager: Arc<ConfigManager>,
    query: &str,
    api_key: Option<&str>,
    json: bool,
    output: &Output,
) -> anyhow::Result<()> {
    let assistant = Assistant::from_config(config_manager)?;
    let outcome = assistant
        .ask(query, ApiCredential::from_input(api_key))
        .await?;

    if json {
        let response = AskResponse::from(outcome);
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    output.header("The Final answer");
    output.block(&outcome.attribution.answer);
    output.subheader("Tool Used");
    output.list_item(outcome.attribution.label.as_str());

    if outcome.attribution.show_documents() {
        output.subheader("Retrieved Documents");
        for doc in outcome.documents.iter().flatten() {
            output.kv(
                &format!("chunk {}", doc.metadata.chunk_index),
                &format!("score {:.3}", doc.score),
            );
            output.block(&doc.content);
        }
    }
    output.newline();
    Ok(())
}

fn show_config(path: &Path, full: bool, validate: bool, output: &Output) -> anyhow::Result<()> {
    output.header("Configuration");
    output.kv("file", &path.display().to_string());

    let config = if path.exists() {
        match RagqaConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                output.error(&e.to_string());
                anyhow::bail!("invalid configuration");
            }
        }
    } else {
        output.warning("file not found, showing built-in defaults");
        RagqaConfig::default()
    };

    if validate {
        config.validate()?;
        output.success("Configuration is valid");
    }

    output.subheader("Summary");
    output.kv("server", &format!("{}:{}", config.server.host, config.server.port));
    output.kv("model", &config.llm.model);
    output.kv("embedding model", &config.llm.embedding_model);
    output.kv("api key env", &config.llm.api_key_env);
    output.kv(
        "api key present",
        if config.env_api_key().is_some() {
            "yes"
        } else {
            "no"
        },
    );
    output.kv("source url", &config.rag.source_url);
    output.kv("index policy", &format!("{:?}", config.rag.index_policy));
    output.kv("router policy", &format!("{:?}", config.router.policy));

    if full {
        output.subheader("Resolved");
        output.block(&config.to_toml_string()?);
    }
    Ok(())
}
