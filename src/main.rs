//! Commits a JSON-lines file of annotated records.
//!
//! ```text
//! labelcommit <category|span|text|span_and_category|relation> <records.jsonl>
//! ```
//!
//! Each line holds `{"data": {...}, "label": [...], "meta": {...}}`.

use std::env;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::process::ExitCode;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use labelcommit::config::Settings;
use labelcommit::data::Data;
use labelcommit::label::Label;
use labelcommit::persist;
use labelcommit::pipeline::{ExampleKind, LabeledExamples};
use labelcommit::record::Record;
use labelcommit::{CommitError, Result};

const USAGE: &str = "usage: labelcommit <category|span|text|span_and_category|relation> <records.jsonl>";

#[derive(Deserialize)]
struct Line {
    data: Data,
    #[serde(default)]
    label: Vec<Label>,
    #[serde(default)]
    meta: Map<String, Value>,
}

fn main() -> ExitCode {
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(&settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "import failed");
            ExitCode::FAILURE
        }
    }
}

fn run(settings: &Settings) -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let [kind, path] = args.as_slice() else {
        return Err(CommitError::Input { message: USAGE.to_string(), line: None });
    };
    let kind: ExampleKind = kind.parse()?;
    let records = read_records(path)?;
    info!(%kind, path = %path, records = records.len(), "records read");

    let mut batch = LabeledExamples::new(kind, records);
    let cleaner = kind.cleaner(&settings.project);
    for warning in batch.clean(cleaner.as_ref()) {
        println!("{warning}");
    }

    let mut connection = persist::open(&settings.database.mode())?;
    let summary = batch.create(&mut connection, settings.project.id, settings.user.id)?;
    let report = serde_json::to_string(&summary).map_err(|e| CommitError::Invariant(e.to_string()))?;
    println!("{report}");
    Ok(())
}

fn read_records(path: &str) -> Result<Vec<Record>> {
    let file = File::open(path).map_err(|e| CommitError::Input {
        message: format!("{path}: {e}"),
        line: None,
    })?;
    let mut records = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line_num = index + 1;
        let line = line.map_err(|e| CommitError::Input {
            message: e.to_string(),
            line: Some(line_num),
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let parsed: Line = serde_json::from_str(&line).map_err(|e| CommitError::Input {
            message: format!("{path}, line {line_num}: {e}"),
            line: Some(line_num),
        })?;
        records.push(Record::new(parsed.data, parsed.label, parsed.meta, Some(line_num)));
    }
    Ok(records)
}
