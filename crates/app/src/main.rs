use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use exam_core::model::{
    AnswerResponse, Attempt, AttemptId, AttemptMode, CefrLevel, Question, QuestionId,
    QuestionOption, QuestionType, SubmitTrigger, WordId,
};
use services::{AttemptLoopService, Clock, Ticker, VocabularyService};
use storage::repository::{InMemoryRepository, Storage};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidAttemptId { raw: String },
    InvalidMode { raw: String },
    InvalidTimeLimit { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidAttemptId { raw } => write!(f, "invalid --attempt-id value: {raw:?}"),
            ArgsError::InvalidMode { raw } => write!(f, "invalid --mode value: {raw}"),
            ArgsError::InvalidTimeLimit { raw } => write!(f, "invalid --time-limit value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!(
        "  cargo run -p app -- run [--db <sqlite_url>] [--attempt-id <id>] [--mode <mode>] [--time-limit <secs>]"
    );
    eprintln!();
    eprintln!("Defaults for run:");
    eprintln!("  --db sqlite://drafts.sqlite3");
    eprintln!("  --attempt-id demo-exam");
    eprintln!("  --mode exam            (practice | exam | speed_drill)");
    eprintln!("  --time-limit 600       (exam mode only; 0 disables the timer)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EXAM_DRAFT_DB_URL, EXAM_ATTEMPT_ID, EXAM_MODE, EXAM_TIME_LIMIT_SECS, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Run,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "run" => Some(Self::Run),
            _ => None,
        }
    }
}

const DEFAULT_EXAM_TIME_LIMIT_SECS: u32 = 600;

#[derive(Debug)]
struct Args {
    db_url: String,
    attempt_id: AttemptId,
    mode: AttemptMode,
    time_limit_secs: Option<u32>,
}

fn parse_mode(raw: String) -> Result<AttemptMode, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidMode { raw })
}

fn parse_attempt_id(raw: String) -> Result<AttemptId, ArgsError> {
    raw.parse()
        .map_err(|_| ArgsError::InvalidAttemptId { raw })
}

fn parse_time_limit(raw: String) -> Result<Option<u32>, ArgsError> {
    let secs: u32 = raw
        .trim()
        .parse()
        .map_err(|_| ArgsError::InvalidTimeLimit { raw: raw.clone() })?;
    Ok((secs > 0).then_some(secs))
}

impl Args {
    fn parse_run(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("EXAM_DRAFT_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://drafts.sqlite3".into(), normalize_sqlite_url);
        let mut attempt_id = match std::env::var("EXAM_ATTEMPT_ID") {
            Ok(value) => parse_attempt_id(value)?,
            Err(_) => AttemptId::new("demo-exam"),
        };
        let mut mode = match std::env::var("EXAM_MODE") {
            Ok(value) => parse_mode(value)?,
            Err(_) => AttemptMode::Exam,
        };
        let mut time_limit_secs = match std::env::var("EXAM_TIME_LIMIT_SECS") {
            Ok(value) => Some(parse_time_limit(value)?),
            Err(_) => None,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--attempt-id" => {
                    attempt_id = parse_attempt_id(require_value(args, "--attempt-id")?)?;
                }
                "--mode" => {
                    mode = parse_mode(require_value(args, "--mode")?)?;
                }
                "--time-limit" => {
                    time_limit_secs = Some(parse_time_limit(require_value(args, "--time-limit")?)?);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let time_limit_secs = if mode.is_timed() {
            time_limit_secs.unwrap_or(Some(DEFAULT_EXAM_TIME_LIMIT_SECS))
        } else {
            None
        };

        Ok(Self {
            db_url,
            attempt_id,
            mode,
            time_limit_secs,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Register a small French placement attempt with the in-memory Attempt service.
fn seed_demo_attempt(
    repo: &InMemoryRepository,
    args: &Args,
    clock: &Clock,
) -> Result<(), Box<dyn std::error::Error>> {
    let questions = vec![
        Question::new(
            QuestionId::new("listening-1"),
            1,
            QuestionType::Listening,
            "Où Marie attend-elle son frère ?",
        )?
        .with_level(CefrLevel::A2)
        .with_audio_url("audio/listening-1.mp3")
        .with_options(vec![
            QuestionOption::new("a", "À la gare"),
            QuestionOption::new("b", "Au marché"),
            QuestionOption::new("c", "Devant l'école"),
        ])?,
        Question::new(
            QuestionId::new("reading-1"),
            2,
            QuestionType::Reading,
            "Quel jour la bibliothèque est-elle fermée ?",
        )?
        .with_level(CefrLevel::B1)
        .with_passage("La bibliothèque municipale ouvre du mardi au samedi, de 9 h à 18 h.")
        .with_options(vec![
            QuestionOption::new("a", "Le samedi"),
            QuestionOption::new("b", "Le lundi"),
            QuestionOption::new("c", "Le mercredi"),
        ])?,
        Question::new(
            QuestionId::new("writing-1"),
            3,
            QuestionType::Writing,
            "Décrivez votre quartier en quelques phrases.",
        )?
        .with_level(CefrLevel::B1),
    ];
    let answer_key = HashMap::from([
        (QuestionId::new("listening-1"), "a".to_string()),
        (QuestionId::new("reading-1"), "b".to_string()),
    ]);

    let total = u32::try_from(questions.len())?;
    let attempt = Attempt::new(
        args.attempt_id.clone(),
        args.mode,
        total,
        clock.now(),
        args.time_limit_secs,
    )?;
    repo.seed_attempt(attempt, questions, answer_key)?;
    Ok(())
}

async fn run_attempt(
    args: &Args,
    clock: Clock,
    storage: &Storage,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = AttemptLoopService::new(
        clock,
        Arc::clone(&storage.attempts),
        Arc::clone(&storage.drafts),
    );
    let mut session = service.start_attempt(&args.attempt_id).await?;

    let (ticker, mut ticks) = Ticker::spawn(args.attempt_id.clone(), clock, Ticker::DEFAULT_PERIOD);
    if let Some(event) = ticks.recv().await {
        let report = service.on_tick(&mut session, &event).await?;
        tracing::info!(outcome = ?report.outcome, "first tick");
    }

    let listening = service
        .answer(
            &mut session,
            &QuestionId::new("listening-1"),
            AnswerResponse::Choice("a".into()),
        )
        .await?;
    if let Some(correct) = listening.is_correct() {
        println!("listening-1: {}", if correct { "correct" } else { "incorrect" });
    }
    session.go_next();

    let reading = service
        .answer(
            &mut session,
            &QuestionId::new("reading-1"),
            AnswerResponse::Choice("c".into()),
        )
        .await?;
    if let Some(correct) = reading.is_correct() {
        println!("reading-1: {}", if correct { "correct" } else { "incorrect" });
    }
    if session.toggle_flag(2) {
        println!("flagged question 2 for review");
    }

    let mut vocabulary = VocabularyService::load(Arc::clone(&storage.vocabulary)).await?;
    vocabulary.toggle(WordId::new(1)).await?;
    println!("bookmarked words: {}", vocabulary.bookmarks().len());
    session.go_next();

    service
        .set_essay(
            &mut session,
            "1",
            "J'habite dans un quartier calme, près d'un parc et d'une boulangerie.",
        )
        .await?;
    println!("essay words: {}", session.essays().total_words());

    let progress = session.progress();
    println!(
        "progress: {}/{} answered, {} flagged",
        progress.answered, progress.total, progress.flagged
    );
    if let Some(remaining) = session.remaining_seconds(clock.now()) {
        println!("time remaining: {remaining}s");
    }

    let receipt = service.submit(&mut session, SubmitTrigger::Manual).await?;
    ticker.cancel();

    println!(
        "submitted {} ({}): {}/{} correct at {}",
        receipt.attempt_id,
        receipt.status.as_str(),
        receipt.correct,
        receipt.graded,
        receipt.submitted_at.to_rfc3339()
    );
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => Command::Run,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Run,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = match cmd {
        Command::Run => Args::parse_run(&mut iter),
    }
    .map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    init_tracing();
    tracing::info!(
        db = %parsed.db_url,
        attempt_id = %parsed.attempt_id,
        mode = %parsed.mode,
        "starting"
    );

    prepare_sqlite_file(&parsed.db_url)?;
    let clock = Clock::system();
    let backend = InMemoryRepository::new();
    seed_demo_attempt(&backend, &parsed, &clock)?;
    let storage = Storage::from_in_memory(&backend)
        .with_sqlite_drafts(&parsed.db_url)
        .await?;

    match cmd {
        Command::Run => run_attempt(&parsed, clock, &storage).await,
    }
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        let mut iter = args.iter().map(|s| (*s).to_string());
        Args::parse_run(&mut iter)
    }

    #[test]
    fn flags_override_defaults() {
        let args = parse(&[
            "--db",
            "sqlite::memory:",
            "--attempt-id",
            "A-42",
            "--mode",
            "practice",
            "--time-limit",
            "0",
        ])
        .unwrap();
        assert_eq!(args.db_url, "sqlite::memory:");
        assert_eq!(args.attempt_id.as_str(), "A-42");
        assert_eq!(args.mode, AttemptMode::Practice);
        assert_eq!(args.time_limit_secs, None);
    }

    #[test]
    fn only_exam_runs_default_to_a_time_limit() {
        let exam = parse(&["--mode", "exam"]).unwrap();
        assert_eq!(exam.time_limit_secs, Some(DEFAULT_EXAM_TIME_LIMIT_SECS));

        let practice = parse(&["--mode", "practice"]).unwrap();
        assert_eq!(practice.time_limit_secs, None);

        let drill = parse(&["--mode", "speed_drill", "--time-limit", "120"]).unwrap();
        assert_eq!(drill.time_limit_secs, None);

        let custom = parse(&["--time-limit", "90", "--mode", "exam"]).unwrap();
        assert_eq!(custom.time_limit_secs, Some(90));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            parse(&["--mode", "quiz"]),
            Err(ArgsError::InvalidMode { .. })
        ));
        assert!(matches!(
            parse(&["--time-limit", "soon"]),
            Err(ArgsError::InvalidTimeLimit { .. })
        ));
        assert!(matches!(
            parse(&["--attempt-id", "  "]),
            Err(ArgsError::InvalidAttemptId { .. })
        ));
        assert!(matches!(
            parse(&["--db"]),
            Err(ArgsError::MissingValue { flag: "--db" })
        ));
        assert!(matches!(parse(&["--verbose"]), Err(ArgsError::UnknownArg(_))));
    }

    #[test]
    fn relative_sqlite_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:drafts.sqlite3".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("drafts.sqlite3"));
        assert_eq!(
            normalize_sqlite_url("sqlite://x.db".into()),
            "sqlite://x.db"
        );
    }
}
