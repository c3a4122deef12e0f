use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client_core::{
    speech::{
        CommandRecognizer, CommandSynthesizer, MissingSpeechRecognizer, MissingSpeechSynthesizer,
        SpeechRecognizer, SpeechSynthesizer,
    },
    ClientError, ClientEvent, HttpStudyApi, ProfileStore, Screen, StudyApi, StudyClient, SyllabusFile,
};
use shared::domain::{Language, TaskId};
use storage::Storage;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod console;
mod render;

use config::{command_parts, load_settings, Settings};
use console::{Console, ConsolePrompter};

/// How long one-shot commands wait for background requests before exiting.
const BACKGROUND_GRACE: Duration = Duration::from_secs(10);

const SHELL_HELP: &str = "\
Commands:
  today                 show today's plan
  overall               show the cached overall schedule
  generate              generate a new plan from a subject list
  syllabus [path]       upload a syllabus file, or enter subjects by hand
  hours <n>             set daily study hours for syllabus plans
  complete <task id>    mark a task done
  doubt <question>      ask the doubt solver
  tutor                 start a tutor session
  say <text>            answer the tutor
  mic                   start or stop voice input
  stats                 refresh streak, progress and motivation
  profile               show the server-side profile
  health                check the server and local storage
  logout                forget the local profile
  quit                  leave the shell";

#[derive(Parser, Debug)]
#[command(name = "saathi", about = "Study Saathi terminal client")]
struct Cli {
    /// Config file; defaults to ./saathi.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    api_base: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the local profile.
    Setup {
        name: String,
        #[arg(long, default_value = "english")]
        language: Language,
    },
    /// Remove the local profile.
    Logout,
    /// Check that the server is reachable.
    Health,
    /// Show the server's copy of the local profile.
    Profile,
    /// Interactive dashboard (default).
    Shell,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(api_base) = cli.api_base {
        settings.api_base = api_base;
    }
    info!(api_base = %settings.api_base, database_url = %settings.database_url, "starting saathi");

    let storage = Storage::new(&settings.database_url).await?;
    let console = Arc::new(Console::new());
    let client = build_client(&settings, storage.clone(), Arc::clone(&console))?;

    match cli.command.unwrap_or(Command::Shell) {
        Command::Setup { name, language } => {
            let mut events = client.subscribe_events();
            client.setup(&name, language).await?;
            client.settle_background(BACKGROUND_GRACE).await;
            print_pending(&mut events);
        }
        Command::Logout => {
            let mut events = client.subscribe_events();
            client.logout().await?;
            print_pending(&mut events);
        }
        Command::Health => {
            let report = render::health_report(client.health().await, storage.health_check().await);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Profile => {
            let Some(profile) = storage.load().await? else {
                bail!("no profile is set up; run `saathi setup <name>` first");
            };
            let api = HttpStudyApi::new(&settings.api_base)?;
            let lookup = api.fetch_profile(&profile.id).await?;
            println!("{}", serde_json::to_string_pretty(&lookup)?);
        }
        Command::Shell => {
            let printer = spawn_event_printer(client.subscribe_events());
            let result = run_shell(&client, &storage, &console, settings.daily_hours).await;
            printer.abort();
            result?;
        }
    }

    Ok(())
}

fn build_client(
    settings: &Settings,
    storage: Storage,
    console: Arc<Console>,
) -> Result<Arc<StudyClient>> {
    let api = HttpStudyApi::new(&settings.api_base)?;

    let synthesizer: Arc<dyn SpeechSynthesizer> =
        match settings.tts_command.as_deref().and_then(command_parts) {
            Some((program, args)) => Arc::new(CommandSynthesizer::new(
                program,
                args,
                settings.tts_voices.clone(),
            )),
            None => Arc::new(MissingSpeechSynthesizer),
        };
    let recognizer: Arc<dyn SpeechRecognizer> =
        match settings.stt_command.as_deref().and_then(command_parts) {
            Some((program, args)) => Arc::new(CommandRecognizer::new(program, args)),
            None => Arc::new(MissingSpeechRecognizer),
        };

    Ok(StudyClient::new_with_dependencies(
        Arc::new(api),
        Arc::new(storage),
        Arc::new(ConsolePrompter::new(console)),
        synthesizer,
        recognizer,
    ))
}

fn print_event(event: &ClientEvent) {
    for line in render::describe(event) {
        println!("{line}");
    }
}

fn print_pending(events: &mut broadcast::Receiver<ClientEvent>) {
    loop {
        match events.try_recv() {
            Ok(event) => print_event(&event),
            Err(TryRecvError::Lagged(skipped)) => warn!(skipped, "dropped client events"),
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

fn spawn_event_printer(mut events: broadcast::Receiver<ClientEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => print_event(&event),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "dropped client events"),
                Err(RecvError::Closed) => break,
            }
        }
    })
}

async fn onboard(client: &Arc<StudyClient>, console: &Console) -> Result<()> {
    loop {
        let Some(name) = console.read_line("Your name: ").await else {
            bail!("input closed before a profile was set up");
        };
        let language = console
            .read_line("Language (english/hindi/hinglish) [english]: ")
            .await
            .unwrap_or_default();
        let language = if language.trim().is_empty() {
            Language::default()
        } else {
            match language.parse::<Language>() {
                Ok(language) => language,
                Err(err) => {
                    println!("{err}");
                    continue;
                }
            }
        };

        client.setup(&name, language).await?;
        if matches!(client.snapshot().await.screen, Screen::Dashboard { .. }) {
            return Ok(());
        }
    }
}

async fn run_shell(
    client: &Arc<StudyClient>,
    storage: &Storage,
    console: &Console,
    mut daily_hours: f64,
) -> Result<()> {
    client.load().await?;
    if client.snapshot().await.screen == Screen::Setup {
        onboard(client, console).await?;
    }
    println!("{SHELL_HELP}");

    while let Some(line) = console.read_line("saathi> ").await {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (command, rest) = line
            .split_once(char::is_whitespace)
            .map(|(command, rest)| (command, rest.trim()))
            .unwrap_or((line, ""));

        match command {
            "help" => println!("{SHELL_HELP}"),
            "today" => client.show_daily_view().await,
            "overall" => client.show_overall_view().await,
            "generate" => {
                client.generate_new_plan().await;
            }
            "syllabus" => {
                let file = if rest.is_empty() {
                    None
                } else {
                    match SyllabusFile::from_path(Path::new(rest)).await {
                        Ok(file) => Some(file),
                        Err(err) => {
                            println!("{err}");
                            continue;
                        }
                    }
                };
                client.submit_syllabus(daily_hours, file).await;
            }
            "hours" => match rest.parse::<f64>() {
                Ok(hours) if hours.is_finite() && hours > 0.0 => {
                    daily_hours = hours;
                    println!("Daily hours set to {daily_hours}.");
                }
                _ => println!("usage: hours <positive number>"),
            },
            "complete" => match rest.parse::<i64>() {
                Ok(task_id) => client.complete_task(&TaskId(task_id)).await,
                Err(_) => println!("usage: complete <task id>"),
            },
            "doubt" => client.solve_doubt(rest).await,
            "tutor" => client.start_tutor().await,
            "say" => {
                if rest.is_empty() {
                    println!("usage: say <text>");
                } else {
                    client.submit_tutor_text(rest).await;
                }
            }
            "mic" => match client.toggle_microphone().await {
                // already surfaced as an alert
                Ok(()) | Err(ClientError::RecognitionUnavailable) => {}
                Err(err) => println!("{err}"),
            },
            "stats" => {
                tokio::join!(client.load_stats(), client.load_motivation());
            }
            "profile" => match client.fetch_server_profile().await {
                Ok(lookup) => println!("{}", serde_json::to_string_pretty(&lookup)?),
                Err(err) => println!("{err}"),
            },
            "health" => {
                let report =
                    render::health_report(client.health().await, storage.health_check().await);
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            "logout" => {
                client.logout().await?;
                onboard(client, console).await?;
            }
            "quit" | "exit" => break,
            other => println!("unknown command '{other}'; type 'help'"),
        }
    }

    Ok(())
}
