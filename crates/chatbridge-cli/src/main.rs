//! chatbridge - route chat prompts to LLM providers and stream the answers
//!
//! A thin front-end over `chatbridge-core`:
//! - `ask` plays the UI side of the bridge in the terminal
//! - `serve` hosts the dispatch side over stdin/stdout NDJSON
//! - `models` and `config` inspect the registry and the persisted settings

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::fmt;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use chatbridge_core::ai::models;
use chatbridge_core::ai::retry::{with_retry, IsRetryable, RetryConfig};
use chatbridge_core::{
    classify, paths, ApiError, Bridge, ConfigStore, Dispatcher, ErrorKind, GenerationParams,
    ProviderFamily, Session, StreamEvent,
};

/// chatbridge - one prompt, one provider, one stream
#[derive(Parser)]
#[command(name = "chatbridge")]
#[command(about = "Route chat prompts to LLM providers and stream the answers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a question and stream the answer to stdout
    Ask {
        /// Model key (defaults to the configured `modelName`)
        #[arg(short, long)]
        model: Option<String>,

        #[arg(short, long)]
        temperature: Option<f32>,

        #[arg(long)]
        max_tokens: Option<u32>,

        /// Re-ask on rate limits and network errors, only before any output
        #[arg(long, default_value_t = 0)]
        retries: u32,

        prompt: String,
    },

    /// Host the dispatch side of the bridge over stdin/stdout
    ///
    /// Reads `GENERATE`/`STOP` frames, one JSON object per line, and writes
    /// stream events the same way. Closing stdin lets the streams already
    /// requested finish before the command exits.
    Serve,

    /// List supported model keys
    Models {
        /// Only list one provider family (e.g. claude, ollama, openrouter)
        #[arg(short, long)]
        family: Option<String>,
    },

    /// Inspect or change the persisted configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the configuration with API keys masked
    Show,
    /// Set one key (values are parsed as JSON, else taken as a string)
    Set { key: String, value: String },
    /// Print the config file location
    Path,
}

/// Why an `ask` attempt ended without an answer
#[derive(Debug)]
struct AskFailure {
    kind: ErrorKind,
    message: String,
    retryable: bool,
    /// Tokens already printed; a retry would duplicate them
    tokens_shown: usize,
}

impl fmt::Display for AskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl IsRetryable for AskFailure {
    fn is_retryable(&self) -> bool {
        self.retryable && self.tokens_shown == 0
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl From<ApiError> for AskFailure {
    fn from(err: ApiError) -> Self {
        Self {
            retryable: err.retryable(),
            kind: err.kind,
            message: err.message,
            tokens_shown: 0,
        }
    }
}

/// How a successful attempt ended
enum AskOutcome {
    Done,
    Cancelled,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Ask {
            model,
            temperature,
            max_tokens,
            retries,
            prompt,
        } => {
            let store = Arc::new(ConfigStore::open_default()?);
            let model = model.unwrap_or_else(|| store.snapshot().model_name.clone());
            let session = Session::new(model, prompt).with_params(GenerationParams {
                temperature,
                max_tokens,
            });
            tracing::info!(
                "ask: model={} family={}",
                session.model_key,
                classify(&session).as_str()
            );

            let bridge = Bridge::new(Dispatcher::new(), store);
            let retry = RetryConfig::with_max_retries(retries);
            let result = with_retry(&retry, || {
                let mut port = bridge.connect();
                let session = session.clone();
                async move { ask_once(&mut port, session).await }
            })
            .await;

            match result {
                Ok(AskOutcome::Done) => println!(),
                Ok(AskOutcome::Cancelled) => eprintln!("\n[cancelled]"),
                Err(failure) => {
                    if failure.tokens_shown > 0 {
                        println!();
                    }
                    return Err(anyhow!("{}", failure));
                }
            }
        }
        Commands::Serve => {
            let store = Arc::new(ConfigStore::open_default()?);
            let bridge = Bridge::new(Dispatcher::new(), store);
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let result = bridge.serve_io(stdin, tokio::io::stdout()).await;
            bridge.shutdown();
            result?;
        }
        Commands::Models { family } => {
            let family = family
                .map(|name| {
                    ProviderFamily::from_name(&name)
                        .ok_or_else(|| anyhow!("unknown provider family: {}", name))
                })
                .transpose()?;
            let families: Vec<ProviderFamily> = match family {
                Some(family) => vec![family],
                None => ProviderFamily::all().to_vec(),
            };
            for family in families {
                println!("{} ({})", family, family.as_str());
                for entry in models::models_for(family) {
                    let name = if entry.name.is_empty() {
                        "<user-configured>"
                    } else {
                        entry.name
                    };
                    println!("  {:<48} {:<44} {}", entry.key, name, entry.desc);
                }
            }
        }
        Commands::Config { action } => {
            let store = ConfigStore::open_default()?;
            match action {
                ConfigCommands::Show => {
                    let config = store.snapshot().redacted();
                    println!("{}", serde_json::to_string_pretty(&config)?);
                }
                ConfigCommands::Set { key, value } => {
                    let current = serde_json::to_value(&*store.snapshot())?;
                    let value = match current.get(&key) {
                        Some(Value::String(_)) => Value::String(value),
                        _ => serde_json::from_str(&value).unwrap_or(Value::String(value)),
                    };
                    store.set_value(&key, value)?;
                    println!("Set {}", key);
                }
                ConfigCommands::Path => {
                    let path = store.path().map(|p| p.to_path_buf()).unwrap_or_else(paths::config_file);
                    println!("{}", path.display());
                }
            }
        }
    }

    Ok(())
}

/// Stream one attempt to stdout; Ctrl-C sends STOP
async fn ask_once(
    port: &mut chatbridge_core::ContentPort,
    session: Session,
) -> Result<AskOutcome, AskFailure> {
    port.post_session(session)
        .map_err(|e| ApiError::protocol(e.to_string()))?;

    let mut stdout = std::io::stdout();
    let mut tokens_shown = 0;
    let mut stopping = false;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c, if !stopping => {
                stopping = true;
                if port.stop().is_err() {
                    return Ok(AskOutcome::Cancelled);
                }
            }
            event = port.next_event() => match event {
                Some(StreamEvent::Token { text }) => {
                    tokens_shown += 1;
                    let _ = write!(stdout, "{}", text);
                    let _ = stdout.flush();
                }
                Some(StreamEvent::Done { finish_reason }) => {
                    tracing::info!("ask finished: {}", finish_reason);
                    return Ok(AskOutcome::Done);
                }
                Some(StreamEvent::Cancelled) => return Ok(AskOutcome::Cancelled),
                Some(StreamEvent::Error { kind, message, retryable }) => {
                    return Err(AskFailure {
                        kind,
                        message,
                        retryable,
                        tokens_shown,
                    });
                }
                None => {
                    return Err(ApiError::protocol("bridge closed before the answer finished").into());
                }
            }
        }
    }
}

/// Log to `~/.chatbridge/logs/chatbridge.log`; stdout carries answers and frames
fn init_logging() {
    let log_dir = paths::logs_dir();
    std::fs::create_dir_all(&log_dir).ok();

    let Ok(log_file) = std::fs::File::create(log_dir.join("chatbridge.log")) else {
        return;
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::sync::Mutex::new(log_file))
        .with_ansi(false)
        .init();
}
