use std::fmt;

use chrono::{DateTime, Utc};
use lesson_core::model::{Lesson, LessonId, StepId, UnitId, Unit, UserId};
use serde_json::json;
use storage::repository::{ProgressStore, StepRecord};
use storage::sqlite::SqliteRepository;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("LESSON_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value })?;
                    now = Some(parsed.with_timezone(&Utc));
                }
                "-h" | "--help" => {
                    print_usage();
                    std::process::exit(0);
                }
                other => return Err(ArgsError::UnknownArg(other.to_string())),
            }
        }

        Ok(Self { db_url, now })
    }
}

fn print_usage() {
    eprintln!("Seed a development database with a sample course.");
    eprintln!();
    eprintln!("Usage: seed [options]");
    eprintln!("  --db <url>     SQLite URL (default: sqlite:dev.sqlite3)");
    eprintln!("  --now <ts>     Fixed RFC3339 timestamp for seeded rows");
    eprintln!("  -h, --help     Show this help");
    eprintln!();
    eprintln!("Environment (same as flags): LESSON_DB_URL");
}

struct StepSeed {
    kind: &'static str,
    title: Option<&'static str>,
    content: Option<&'static str>,
    metadata: Option<serde_json::Value>,
}

fn sample_steps() -> Vec<StepSeed> {
    vec![
        StepSeed {
            kind: "read",
            title: Some("What is trade?"),
            content: Some("Trade is the exchange of goods and services.\\nIt predates money."),
            metadata: Some(json!({"image_keyword": "trade"})),
        },
        StepSeed {
            kind: "quiz",
            title: None,
            content: None,
            metadata: Some(json!({
                "question": "Which of these is a medium of exchange?",
                "options": [
                    {"id": "a", "text": "A contract"},
                    {"id": "b", "text": "Money"},
                    {"id": "c", "text": "A warehouse"}
                ],
                "correct_option_id": "b",
                "explanation": "Money exists precisely to make exchange easier."
            })),
        },
        StepSeed {
            kind: "flashcard",
            title: None,
            content: Some("Barter"),
            metadata: Some(json!({
                "front_text": "Barter",
                "back_text": "Exchanging goods directly, without money."
            })),
        },
        StepSeed {
            kind: "audio",
            title: Some("Listen: a market day"),
            content: None,
            metadata: Some(json!({
                "audio_url": "https://cdn.example.com/lessons/market-day.mp3",
                "text": "A short narration about a historical market."
            })),
        },
    ]
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let repo = SqliteRepository::connect(&args.db_url).await?;
    repo.migrate().await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let units = [
        ("Basics of Trade", "From barter to money"),
        ("Money and Markets", "How prices come to be"),
    ];

    let mut step_id = 1_u64;
    let mut lesson_id = 1_u64;
    for (unit_index, (title, description)) in units.iter().enumerate() {
        let unit_id = UnitId::new(unit_index as u64 + 1);
        let unit = Unit::new(
            unit_id,
            *title,
            Some((*description).to_string()),
            unit_index as u32,
        )?;
        repo.insert_unit(&unit).await?;

        for lesson_index in 0..2_u32 {
            let lesson = Lesson::new(
                LessonId::new(lesson_id),
                unit_id,
                format!("{title}, lesson {}", lesson_index + 1),
                None,
                lesson_index,
            )?;
            repo.insert_lesson(&lesson).await?;

            for (order_index, seed) in sample_steps().into_iter().enumerate() {
                let record = StepRecord {
                    id: StepId::new(step_id),
                    lesson_id: lesson.id(),
                    order_index: order_index as u32,
                    kind: seed.kind.to_string(),
                    title: seed.title.map(str::to_string),
                    content: seed.content.map(str::to_string),
                    metadata: seed.metadata,
                };
                repo.insert_step_record(&record).await?;
                step_id += 1;
            }
            lesson_id += 1;
        }
    }

    // A demo learner with the first lesson already behind them, so the
    // gating path shows something other than a fully locked course.
    let demo_user = UserId::random();
    repo.upsert_completion(demo_user, LessonId::new(1), now)
        .await?;

    println!(
        "Seeded {} units ({} lessons) into {}; demo user {}",
        units.len(),
        lesson_id - 1,
        args.db_url,
        demo_user
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
