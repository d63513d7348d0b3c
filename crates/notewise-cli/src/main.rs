use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use notewise_common::notify::{self, NotificationReceiver, NotificationSender};
use notewise_common::telemetry::{self, TelemetryConfig};
use notewise_common::{
    ApiConfig, FileStore, HttpNotesApi, NoteId, NotesApi, Notification, Notifier, QuizQuestion,
    messages,
};
use notewise_editor_core::{EditorConfig, EditorSync, NoteDraft};
use notewise_quiz::{QuizController, QuizPhase, ScoreBand, generate_summary};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

#[derive(Parser)]
#[command(version, about = "Notewise - notes, quizzes and summaries from the terminal", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Base URL of the notes API
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Bearer token for the notes API
    #[arg(long, global = true)]
    token: Option<String>,

    /// Path to a .toml or .json config file
    #[arg(long, global = true, env = "NOTEWISE_CONFIG")]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a note's title, counts and HTML
    Show {
        id: String,

        /// Print the structured tree instead of HTML
        #[arg(long)]
        tree: bool,
    },
    /// Generate a quiz for a note and take it
    Quiz { id: String },
    /// Print an AI summary of a note
    Summary { id: String },
    /// Print the PDF export URL of a note
    Pdf { id: String },
    /// Create or update a note from an HTML file
    Import {
        file: PathBuf,

        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        subject: String,

        /// Update this note instead of creating one
        #[arg(long)]
        id: Option<String>,
    },
    /// Delete a note
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_miette()?;
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut telemetry_config = TelemetryConfig::from_env("notewise-cli");
    if cli.verbose {
        telemetry_config = telemetry_config.with_level(tracing::Level::DEBUG);
    }
    telemetry::init(telemetry_config);

    let config = resolve_config(&cli).await?;
    tracing::debug!(endpoint = %config.endpoint, "using notes api");
    let api = Arc::new(HttpNotesApi::new(&config)?);
    let (notifier, mut notifications) = notify::channel();

    let outcome = match cli.command {
        Commands::Show { id, tree } => show_note(&*api, NoteId::from(id), tree, &notifier).await,
        Commands::Quiz { id } => {
            run_quiz(api, NoteId::from(id), notifier.clone(), &mut notifications).await
        }
        Commands::Summary { id } => {
            let summary = generate_summary(&*api, &NoteId::from(id), &notifier).await;
            if let Some(summary) = summary {
                println!("{}", summary.summary);
            }
            Ok(())
        }
        Commands::Pdf { id } => {
            export_pdf(&*api, &NoteId::from(id), &notifier).await;
            Ok(())
        }
        Commands::Import {
            file,
            title,
            subject,
            id,
        } => import_note(&*api, &file, title, subject, id.map(NoteId::from), &notifier).await,
        Commands::Delete { id } => {
            let id = NoteId::from(id);
            api.delete_note(&id).await?;
            println!("✓ Deleted {id}");
            Ok(())
        }
    };

    print_notifications(&mut notifications);
    outcome
}

/// Config file, then `NOTEWISE_*` variables, then command-line flags.
async fn resolve_config(cli: &Cli) -> Result<ApiConfig> {
    let file = cli.config.clone().or_else(|| {
        default_config_path().filter(|path| path.exists())
    });
    let base = match file {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config file");
            ApiConfig::load(&FileStore::new(path)).await?
        }
        None => ApiConfig::default(),
    };
    let config = base.with_env_overrides()?;
    Ok(apply_flags(config, cli.endpoint.clone(), cli.token.clone()))
}

fn apply_flags(mut config: ApiConfig, endpoint: Option<String>, token: Option<String>) -> ApiConfig {
    if let Some(endpoint) = endpoint {
        config.endpoint = endpoint;
    }
    if let Some(token) = token {
        config.token = Some(token);
    }
    config
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("notewise").join("config.toml"))
}

async fn show_note(
    api: &impl NotesApi,
    id: NoteId,
    as_tree: bool,
    notifier: &NotificationSender,
) -> Result<()> {
    let Some(draft) = NoteDraft::load(api, &id, notifier).await else {
        return Ok(());
    };
    let title = draft.title.clone();
    let editor = draft.into_editor(EditorConfig::default());
    let state = editor.state();

    println!("{title}");
    println!(
        "{} characters · {} words",
        state.character_count(),
        state.word_count()
    );
    println!();
    if as_tree {
        println!("{}", serde_json::to_string_pretty(editor.tree()).into_diagnostic()?);
    } else if let Some(placeholder) = state.placeholder() {
        println!("({placeholder})");
    } else {
        println!("{}", editor.html());
    }
    Ok(())
}

async fn export_pdf(api: &impl NotesApi, id: &NoteId, notifier: &NotificationSender) {
    match api.export_pdf(id).await {
        Ok(Some(url)) => println!("{url}"),
        Ok(None) => {
            tracing::warn!(%id, "pdf export returned no url");
            notifier.notify(Notification::error(messages::PDF_FAILED));
        }
        Err(err) => {
            tracing::warn!(%id, error = %err, "pdf export failed");
            notifier.notify(Notification::error(messages::PDF_FAILED));
        }
    }
}

async fn import_note(
    api: &impl NotesApi,
    file: &Path,
    title: String,
    subject: String,
    id: Option<NoteId>,
    notifier: &NotificationSender,
) -> Result<()> {
    let html = std::fs::read_to_string(file).into_diagnostic()?;
    let editor = EditorSync::initialize(&html, EditorConfig::default(), ());
    let mut draft = NoteDraft::new(title, subject);
    draft.capture(&editor);

    if let Some(id) = draft.save(api, id.as_ref(), notifier).await {
        println!("✓ Saved {id}");
    }
    Ok(())
}

async fn run_quiz(
    api: Arc<HttpNotesApi>,
    note_id: NoteId,
    notifier: NotificationSender,
    notifications: &mut NotificationReceiver,
) -> Result<()> {
    let mut controller = QuizController::new(api, note_id, notifier);
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut pending = Vec::new();

    println!("→ Generating quiz...");
    controller.generate().await;

    loop {
        print_notifications(notifications);
        match controller.session().phase() {
            QuizPhase::Idle => {
                println!("No quiz available for this note.");
                break;
            }
            QuizPhase::InProgress { index } => {
                let session = controller.session();
                let Some(question) = session.current_question() else {
                    break;
                };
                println!();
                println!("Question {} of {}", index + 1, session.total());
                print_question(question);
                let Some(line) = read_line(&mut input).await? else {
                    break;
                };
                match parse_choice(&line, question) {
                    Some(option) => {
                        if let Some(handle) = controller.select_option(&option) {
                            pending.push(handle);
                        }
                    }
                    None => println!("Pick a number from 1 to {}.", question.options.len()),
                }
            }
            QuizPhase::Revealed { .. } => {
                let session = controller.session();
                if let (Some(question), Some(selected)) =
                    (session.current_question(), session.selected_option())
                {
                    if question.is_correct(selected) {
                        println!("✓ Correct!");
                    } else {
                        println!("✗ Incorrect. The answer is: {}", question.correct_option);
                    }
                }
                let last = session.current_index() + 1 == session.total();
                println!(
                    "Press Enter for {}.",
                    if last { "your results" } else { "the next question" }
                );
                if read_line(&mut input).await?.is_none() {
                    break;
                }
                controller.advance();
            }
            QuizPhase::Finished => {
                print_results(&controller);
                println!("Type r to try a new quiz, or press Enter to quit.");
                let Some(line) = read_line(&mut input).await? else {
                    break;
                };
                if !line.trim().eq_ignore_ascii_case("r") {
                    break;
                }
                println!("→ Generating a new quiz...");
                controller.restart().await;
            }
        }
    }

    // let outstanding attempts finish before exiting
    for handle in pending {
        if let Err(err) = handle.await {
            tracing::warn!(error = %err, "attempt task did not complete");
        }
    }
    Ok(())
}

fn print_question(question: &QuizQuestion) {
    println!("{}", question.prompt);
    for (i, option) in question.options.iter().enumerate() {
        println!("  {}. {option}", i + 1);
    }
}

fn print_results<A: NotesApi + 'static>(controller: &QuizController<A>) {
    let session = controller.session();
    let percentage = session.percentage_score().unwrap_or_default();
    let band = session.band().unwrap_or(ScoreBand::NeedsWork);
    println!();
    println!("{}", band.headline());
    println!(
        "{}/{} correct · {percentage}% ({band})",
        session.score(),
        session.total()
    );
    println!("{}", band.encouragement());
    for (i, record) in session.answer_log().iter().enumerate() {
        let mark = if record.was_correct { "✓" } else { "✗" };
        println!("  {mark} {}. {}", i + 1, record.prompt);
    }
}

/// Map a typed option number to the option text.
fn parse_choice(line: &str, question: &QuizQuestion) -> Option<String> {
    let n: usize = line.trim().parse().ok()?;
    n.checked_sub(1)
        .and_then(|i| question.options.get(i))
        .cloned()
}

async fn read_line(input: &mut Lines<BufReader<Stdin>>) -> Result<Option<String>> {
    input.next_line().await.into_diagnostic()
}

fn print_notifications(notifications: &mut NotificationReceiver) {
    for notification in notifications.drain() {
        if notification.is_error() {
            eprintln!("✗ {}", notification.message);
        } else {
            eprintln!("✓ {}", notification.message);
        }
    }
}

fn init_miette() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    miette::set_panic_hook();
    Ok(())
}
