//! Init command implementation
//!
//! Writes a commented `ragqa.toml`, an `.env.example` and a `.gitignore`.

use super::output::Output;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of the init operation
#[derive(Debug, PartialEq, Eq)]
pub enum InitResult {
    Success,
    /// `ragqa.toml` exists and `--force` was not given
    AlreadyExists,
    Error(String),
}

pub struct InitConfig {
    pub path: PathBuf,
    pub force: bool,
    pub host: String,
    pub port: u16,
}

pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.banner();
    output.header("Initializing ragqa");

    let base_path = &config.path;
    if !base_path.exists() {
        if let Err(e) = fs::create_dir_all(base_path) {
            output.error(&format!("Failed to create {}: {}", base_path.display(), e));
            return InitResult::Error(e.to_string());
        }
    }

    let config_path = base_path.join("ragqa.toml");
    if config_path.exists() && !config.force {
        output.warning("ragqa.toml already exists!");
        output.hint("Use --force to overwrite existing files");
        return InitResult::AlreadyExists;
    }

    output.subheader("Creating configuration files");

    if let Err(e) = fs::write(&config_path, generate_ragqa_toml(&config)) {
        output.error(&format!("Failed to create ragqa.toml: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("config", "ragqa.toml");

    let env_example_path = base_path.join(".env.example");
    match write_if_absent(&env_example_path, ENV_EXAMPLE, config.force) {
        Ok(true) => output.created("env", ".env.example"),
        Ok(false) => output.skipped(".env.example", "already exists"),
        Err(e) => {
            output.error(&format!("Failed to create .env.example: {}", e));
            return InitResult::Error(e.to_string());
        }
    }

    let gitignore_path = base_path.join(".gitignore");
    match write_if_absent(&gitignore_path, GITIGNORE, false) {
        Ok(true) => output.created("file", ".gitignore"),
        Ok(false) => output.skipped(".gitignore", "already exists"),
        Err(e) => output.warning(&format!("Failed to create .gitignore: {}", e)),
    }

    output.complete("ragqa initialized successfully!");

    output.header("Next Steps");
    output.newline();
    output.info("1. Provide an OpenAI API key (or paste one into the form):");
    output.command("cp .env.example .env");
    output.newline();
    output.info("2. Start the server:");
    output.command("ragqa-server");

    output.hint(&format!(
        "The form will be available at http://{}:{}/",
        config.host, config.port
    ));

    InitResult::Success
}

/// Returns whether the file was written.
fn write_if_absent(path: &Path, content: &str, force: bool) -> std::io::Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    fs::write(path, content)?;
    Ok(true)
}

fn generate_ragqa_toml(config: &InitConfig) -> String {
    format!(
        r#"# ragqa configuration
# Every key is optional; omitted keys fall back to the values shown here.

[server]
host = "{host}"
port = {port}
log_level = "info"
# "pretty" or "json"
log_format = "pretty"
body_limit = 65536

[llm]
api_base = "https://api.openai.com/v1"
model = "gpt-3.5-turbo-0125"
temperature = 0.0
# Consulted only when a request does not carry its own key
api_key_env = "OPENAI_API_KEY"
embedding_model = "text-embedding-ada-002"
timeout_secs = 60

[agent]
system_prompt = "You are a helpful assistant"
max_iterations = 15
tool_timeout_secs = 30
parallel_tools = true

[rag]
source_url = "https://docs.smith.langchain.com/"
chunk_size = 1000
chunk_overlap = 200
top_k = 4
# "rebuild" fetches and embeds the page on every request, "cached" keeps it
index_policy = "rebuild"
cache_capacity = 4
embedding_batch_size = 256

[tools.wikipedia]
api_url = "https://en.wikipedia.org/w/api.php"
top_k_results = 1
doc_content_chars_max = 200

[tools.document_search]
name = "Langsmith_search"
description = "Search for information about Langsmith.For any questions about Langsmith you must use this tool"

[router]
# "keyword" or "legacy"
policy = "keyword"
document_keyword = "langsmith"
"#,
        host = config.host,
        port = config.port,
    )
}

const ENV_EXAMPLE: &str = r#"# Used when a request does not supply its own key
OPENAI_API_KEY=

# Overrides server.log_level, e.g. ragqa=debug,tower_http=debug
# RUST_LOG=info
"#;

const GITIGNORE: &str = r#"/target
.env
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::router::RoutingPolicy;
    use crate::rag::store::IndexPolicy;
    use crate::utils::toml_config::RagqaConfig;

    fn init_config(path: &Path, force: bool) -> InitConfig {
        InitConfig {
            path: path.to_path_buf(),
            force,
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }

    #[test]
    fn test_generated_config_parses_and_validates() {
        let content = generate_ragqa_toml(&init_config(Path::new("."), false));
        let config = RagqaConfig::from_toml_str(&content).unwrap();

        config.validate().unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.router.policy, RoutingPolicy::Keyword);
        assert_eq!(config.rag.index_policy, IndexPolicy::Rebuild);
        assert_eq!(config.tools.wikipedia.doc_content_chars_max, 200);
    }

    #[test]
    fn test_init_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let output = Output::no_color();

        let result = run(init_config(dir.path(), false), &output);

        assert_eq!(result, InitResult::Success);
        assert!(dir.path().join("ragqa.toml").exists());
        assert!(dir.path().join(".env.example").exists());
        assert!(dir.path().join(".gitignore").exists());
    }

    #[test]
    fn test_init_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let output = Output::no_color();
        fs::write(dir.path().join("ragqa.toml"), "# mine").unwrap();

        let result = run(init_config(dir.path(), false), &output);
        assert_eq!(result, InitResult::AlreadyExists);
        assert_eq!(
            fs::read_to_string(dir.path().join("ragqa.toml")).unwrap(),
            "# mine"
        );

        let result = run(init_config(dir.path(), true), &output);
        assert_eq!(result, InitResult::Success);
        assert!(fs::read_to_string(dir.path().join("ragqa.toml"))
            .unwrap()
            .contains("[router]"));
    }
}
