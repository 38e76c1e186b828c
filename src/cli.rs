use crate::api::{ApiClient, ClientConfig};
use crate::logging::{self, LogTarget};
use crate::model::{ExperimentCreate, ExperimentUpdate, LaunchRequest};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "modeleval-dash",
    version,
    about = "Launch model evaluation runs and compare arms on quality and cost"
)]
pub struct Cli {
    /// Base URL of the evaluation backend
    #[arg(
        long,
        env = "MODELEVAL_API_URL",
        default_value = "http://localhost:8000",
        global = true
    )]
    pub base_url: String,

    /// Dashboard log file (defaults to a timestamped file in the data dir)
    #[arg(long, env = "MODELEVAL_LOG_FILE", global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Open the interactive dashboard (default)
    Dashboard,
    /// Check backend health
    Health,
    /// Manage experiments
    #[command(subcommand)]
    Experiments(ExperimentsCommand),
    /// Launch and inspect runs
    #[command(subcommand)]
    Runs(RunsCommand),
}

#[derive(Debug, Subcommand, Clone)]
pub enum ExperimentsCommand {
    /// List experiments
    List,
    /// Show one experiment
    Get { experiment_id: String },
    /// Create an experiment from a JSON payload file
    Create {
        #[arg(long, short)]
        file: PathBuf,
    },
    /// Patch an experiment from a JSON file of changed fields
    Update {
        experiment_id: String,
        #[arg(long, short)]
        file: PathBuf,
    },
    /// Delete an experiment and its runs
    Delete { experiment_id: String },
}

#[derive(Debug, Subcommand, Clone)]
pub enum RunsCommand {
    /// Launch a run and collect its detail, summary and attempts
    Launch {
        experiment_id: String,
        #[arg(long)]
        seed: Option<i64>,
        /// Fraction of failed attempts tolerated before the run fails
        #[arg(long, default_value_t = 0.5, value_parser = parse_threshold)]
        failure_threshold: f64,
        /// Print a text report instead of JSON
        #[arg(long)]
        text: bool,
    },
    /// Show one run
    Get { run_id: String },
    /// Show a run's summary envelope
    Summary { run_id: String },
    /// List a run's attempts
    Attempts {
        run_id: String,
        #[arg(long)]
        model_arm: Option<String>,
    },
}

fn parse_threshold(s: &str) -> std::result::Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("`{s}` is not a number"))?;
    if (0.0..=1.0).contains(&v) {
        Ok(v)
    } else {
        Err(format!("{v} is not in 0..=1"))
    }
}

impl Cli {
    /// The dashboard owns the terminal and logs to a file; subcommands log to stderr.
    pub fn opens_dashboard(&self) -> bool {
        matches!(self.command, None | Some(Command::Dashboard))
    }
}

/// Build a `ClientConfig` from CLI arguments.
pub fn build_client_config(args: &Cli) -> ClientConfig {
    ClientConfig {
        base_url: args.base_url.clone(),
        user_agent: format!("modeleval-dash/{}", env!("CARGO_PKG_VERSION")),
    }
}

pub async fn run(args: Cli) -> Result<()> {
    let cfg = build_client_config(&args);
    if args.opens_dashboard() {
        if let Err(e) = logging::init(LogTarget::File(args.log_file.clone())) {
            eprintln!("logging disabled: {e}");
        }
        return run_dashboard(cfg).await;
    }
    if let Err(e) = logging::init(LogTarget::Stderr) {
        eprintln!("logging disabled: {e}");
    }
    let client = ApiClient::new(&cfg)?;
    match args.command {
        Some(cmd) => run_command(&client, cmd).await,
        None => Ok(()),
    }
}

#[cfg(feature = "tui")]
async fn run_dashboard(cfg: ClientConfig) -> Result<()> {
    crate::tui::run(cfg).await
}

#[cfg(not(feature = "tui"))]
async fn run_dashboard(_cfg: ClientConfig) -> Result<()> {
    anyhow::bail!("built without the `tui` feature; use a subcommand (see --help)")
}

async fn run_command(client: &ApiClient, cmd: Command) -> Result<()> {
    let (out_tx, out_handle) = spawn_output_writer();
    let result = dispatch(client, cmd, &out_tx).await;
    drop(out_tx);
    let _ = out_handle.await;
    result
}

async fn dispatch(
    client: &ApiClient,
    cmd: Command,
    out: &mpsc::UnboundedSender<OutputLine>,
) -> Result<()> {
    match cmd {
        Command::Dashboard => Ok(()),
        Command::Health => print_json(out, &client.health().await?),
        Command::Experiments(sub) => match sub {
            ExperimentsCommand::List => print_json(out, &client.list_experiments().await?),
            ExperimentsCommand::Get { experiment_id } => {
                print_json(out, &client.get_experiment(&experiment_id).await?)
            }
            ExperimentsCommand::Create { file } => {
                let payload: ExperimentCreate = load_json_file(&file)?;
                print_json(out, &client.create_experiment(&payload).await?)
            }
            ExperimentsCommand::Update {
                experiment_id,
                file,
            } => {
                let payload: ExperimentUpdate = load_json_file(&file)?;
                print_json(
                    out,
                    &client.update_experiment(&experiment_id, &payload).await?,
                )
            }
            ExperimentsCommand::Delete { experiment_id } => {
                client.delete_experiment(&experiment_id).await?;
                let _ = out.send(OutputLine::Stderr(format!(
                    "deleted experiment {experiment_id}"
                )));
                Ok(())
            }
        },
        Command::Runs(sub) => match sub {
            RunsCommand::Launch {
                experiment_id,
                seed,
                failure_threshold,
                text,
            } => {
                let request = LaunchRequest {
                    seed,
                    failure_threshold: Some(failure_threshold),
                };
                let progress = out.clone();
                let bundle = crate::orchestrator::launch_and_collect(
                    client,
                    &experiment_id,
                    &request,
                    |phase| {
                        let _ = progress.send(OutputLine::Stderr(format!("== {} ==", phase.label())));
                    },
                )
                .await
                .inspect_err(|e| tracing::warn!(status = ?e.status(), "launch chain failed"))?;
                if text {
                    for line in crate::text_summary::build_text_summary(&bundle).lines {
                        let _ = out.send(OutputLine::Stdout(line));
                    }
                    Ok(())
                } else {
                    print_json(out, &bundle)
                }
            }
            RunsCommand::Get { run_id } => print_json(out, &client.get_run(&run_id).await?),
            RunsCommand::Summary { run_id } => {
                print_json(out, &client.get_run_summary(&run_id).await?)
            }
            RunsCommand::Attempts { run_id, model_arm } => print_json(
                out,
                &client.list_attempts(&run_id, model_arm.as_deref()).await?,
            ),
        },
    }
}

fn print_json<T: Serialize>(out: &mpsc::UnboundedSender<OutputLine>, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    let _ = out.send(OutputLine::Stdout(text));
    Ok(())
}

fn load_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid JSON payload in {}", path.display()))
}
