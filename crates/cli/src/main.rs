//! TagClaw CLI: the main entry point.
//!
//! `tagclaw "task"` runs a single task; `tagclaw` alone starts an
//! interactive session. `--memory-file` turns on the persistent memory
//! tools.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tagclaw_agent::{build_system_prompt, AgentLoop, TaskMode};
use tagclaw_config::{AppConfig, CliOverrides, DEFAULT_MEMORY_FILE};
use tagclaw_core::memory::MemoryStore;
use tagclaw_memory::FileNodeStore;
use tagclaw_providers::OpenAiCompatProvider;

mod console;
mod interrupt;
mod session;

/// Conventional status for a process stopped by SIGINT.
const INTERRUPTED_EXIT: i32 = 130;

#[derive(Parser)]
#[command(
    name = "tagclaw",
    about = "TagClaw: a CLI agent with approval-gated tools and tagged memory",
    version
)]
struct Cli {
    /// Task to run. If omitted, starts an interactive session
    prompt: Option<String>,

    /// API key (or set OPENAI_API_KEY)
    #[arg(short = 'k', long)]
    api_key: Option<String>,

    /// API base URL for OpenAI-compatible providers (or set OPENAI_BASE_URL)
    #[arg(short, long)]
    base_url: Option<String>,

    /// Model name
    #[arg(short, long)]
    model: Option<String>,

    /// Sampling temperature
    #[arg(short, long)]
    temperature: Option<f32>,

    /// Nucleus sampling top_p
    #[arg(short = 'p', long)]
    top_p: Option<f32>,

    /// JSON file for persistent memory; memory is off unless given
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = DEFAULT_MEMORY_FILE)]
    memory_file: Option<PathBuf>,

    /// Config file (defaults to ~/.tagclaw/config.toml)
    #[arg(long, env = "TAGCLAW_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
            top_p: self.top_p,
            memory_file: self.memory_file.clone(),
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let path = cli
        .config
        .clone()
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));
    let mut config = AppConfig::load_with_env(&path).context("Failed to load config")?;
    config.apply_cli(cli.overrides());
    config.validate()?;

    if !config.has_api_key() {
        bail!("API key required via --api-key or environment variable $OPENAI_API_KEY.");
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Logs go to stderr so they never mix with answers on stdout
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = load_config(&cli)?;
    tracing::debug!(?config, "Configuration loaded");

    let store = match &config.memory_file {
        Some(path) => {
            let store = FileNodeStore::open(path)
                .with_context(|| format!("Failed to open memory file {}", path.display()))?;
            Some(Arc::new(store))
        }
        None => None,
    };

    let memory = store.clone().map(|s| s as Arc<dyn MemoryStore>);
    let tools = Arc::new(tagclaw_tools::default_registry(memory));

    let api_key = config.api_key.clone().unwrap_or_default();
    let provider = Arc::new(OpenAiCompatProvider::new("openai", &config.base_url, api_key)?);

    let mode = if cli.prompt.is_some() {
        TaskMode::SinglePass
    } else {
        TaskMode::Interactive
    };
    let system_prompt = build_system_prompt(mode, &tools.names(), config.memory_enabled());

    let interrupt = interrupt::Interrupt::ctrl_c();
    let mut agent = AgentLoop::new(
        provider,
        &config.model,
        config.temperature,
        config.top_p,
        tools,
        Arc::new(console::ConsoleApproval::new(interrupt.clone())),
    )
    .with_system_prompt(system_prompt)
    .with_observer(Arc::new(console::ConsoleObserver));
    if let Some(max) = config.max_tokens {
        agent = agent.with_max_tokens(max);
    }

    let summary = format!(
        "(Model: {}, Temp: {}, Top-P: {}, OS: {})",
        config.model,
        config.temperature,
        config.top_p,
        tagclaw_agent::os_info()
    );

    let code = match &cli.prompt {
        Some(task) => {
            println!("Running single prompt {summary}");
            print_session_notes(store.as_deref());
            match session::run_single_pass(&agent, task, &interrupt).await {
                Ok(_) => ExitCode::SUCCESS,
                Err(_) => ExitCode::FAILURE,
            }
        }
        None => {
            println!("Starting interactive session {summary}");
            print_session_notes(store.as_deref());
            println!("Type 'quit' or 'exit' to end.");
            session::run_interactive(&agent, console::stdin_prompter(), &interrupt).await;
            ExitCode::SUCCESS
        }
    };

    if let Some(store) = &store {
        match store.flush().await {
            Ok(()) => println!("\nMemory saved to {}", store.path().display()),
            Err(e) => console::print_error(&format!("Could not save memory: {e}")),
        }
    }

    if interrupt.is_set() {
        // A stdin read may still be blocked on its own thread; returning
        // would wait for it during runtime shutdown.
        std::process::exit(INTERRUPTED_EXIT);
    }
    Ok(code)
}

fn print_session_notes(store: Option<&FileNodeStore>) {
    if let Some(store) = store {
        println!("Using memory file: {}", store.path().display());
    }
    console::print_warning(
        "Review ALL actions requiring approval VERY carefully, especially code/shell execution.",
    );
    if cfg!(target_os = "windows") {
        console::print_warning("Ensure requested shell commands use cmd.exe syntax (e.g., 'dir', 'copy').");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_file_flag_without_value_uses_default() {
        let cli = Cli::try_parse_from(["tagclaw", "--memory-file"]).unwrap();
        assert_eq!(cli.memory_file, Some(PathBuf::from(DEFAULT_MEMORY_FILE)));
        assert!(cli.prompt.is_none());
    }

    #[test]
    fn memory_file_flag_with_value_and_prompt() {
        let cli = Cli::try_parse_from([
            "tagclaw",
            "--memory-file",
            "notes.json",
            "-t",
            "0.2",
            "-p",
            "0.5",
            "summarise the repo",
        ])
        .unwrap();
        assert_eq!(cli.memory_file, Some(PathBuf::from("notes.json")));
        assert_eq!(cli.prompt.as_deref(), Some("summarise the repo"));

        let overrides = cli.overrides();
        assert_eq!(overrides.temperature, Some(0.2));
        assert_eq!(overrides.top_p, Some(0.5));
    }

    #[test]
    fn memory_is_off_by_default() {
        let cli = Cli::try_parse_from(["tagclaw", "-k", "sk-test", "-m", "gpt-4o"]).unwrap();
        assert!(cli.memory_file.is_none());
        assert_eq!(cli.api_key.as_deref(), Some("sk-test"));
        assert_eq!(cli.model.as_deref(), Some("gpt-4o"));
    }
}
