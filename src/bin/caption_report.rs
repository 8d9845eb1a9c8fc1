use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use caption_align::alignment::report::{
    aggregate_reports, compute_case_report, CaseReport, Meta, Report, REPORT_SCHEMA_VERSION,
};
use caption_align::{
    flatten_entries, AlignedCaption, AlignerConfig, AlignmentInput, CaptionAligner,
    CaptionAlignerBuilder, MatchStrategy, MergeRuleTable, TranscriptEntry, WhisperOutput,
};
use chrono::Utc;
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;

#[path = "caption_report/captions_formatter.rs"]
mod captions_formatter;
#[path = "caption_report/json_report_formatter.rs"]
mod json_report_formatter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    /// One `<case>.captions.json` per case instead of a report.
    Captions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StrategyChoice {
    Windowed,
    Global,
}

impl StrategyChoice {
    fn strategy(self) -> MatchStrategy {
        match self {
            Self::Windowed => MatchStrategy::Windowed,
            Self::Global => MatchStrategy::Global,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "caption_report")]
#[command(about = "Align caption cases and report timing quality")]
struct Args {
    #[arg(
        long,
        env = "CAPTION_REPORT_CASES_DIR",
        default_value = "test-data/scenarios"
    )]
    cases_dir: PathBuf,
    #[arg(long, env = "CAPTION_REPORT_OUT")]
    out: Option<PathBuf>,
    #[arg(long, env = "CAPTION_REPORT_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, env = "CAPTION_REPORT_RULES")]
    rules: Option<PathBuf>,
    #[arg(long, env = "CAPTION_REPORT_STRATEGY", value_enum)]
    strategy: Option<StrategyChoice>,
    #[arg(
        long,
        env = "CAPTION_REPORT_FORMAT",
        value_enum,
        default_value_t = OutputFormat::Json
    )]
    output_format: OutputFormat,
    #[arg(long, env = "CAPTION_REPORT_LIMIT")]
    limit: Option<usize>,
    #[arg(long, env = "CAPTION_REPORT_OFFSET", default_value_t = 0)]
    offset: usize,
    #[arg(long, env = "CAPTION_REPORT_LOG", default_value = "warn")]
    log: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CaseTranscript {
    Whisper(WhisperOutput),
    Entries(Vec<TranscriptEntry>),
}

#[derive(Debug, Deserialize)]
struct CaseFile {
    #[serde(default)]
    id: Option<String>,
    script: String,
    transcript: CaseTranscript,
    #[serde(default)]
    total_duration_ms: Option<u64>,
    #[serde(default)]
    config: Option<AlignerConfig>,
    #[serde(default)]
    reference: Option<Vec<AlignedCaption>>,
}

#[derive(Debug)]
struct Case {
    id: String,
    input: AlignmentInput,
    config: Option<AlignerConfig>,
    reference: Option<Vec<AlignedCaption>>,
}

fn main() {
    if let Err(message) = run() {
        eprintln!("{message}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args = Args::parse();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(args.log.as_str())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    let repo_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let cases_dir = resolve_path(&repo_root, &args.cases_dir);

    let mut base_config = match args.config.as_ref() {
        Some(path) => AlignerConfig::load(&resolve_path(&repo_root, path))
            .map_err(|err| format!("Failed to load aligner config: {err}"))?,
        None => AlignerConfig::default(),
    };
    if let Some(strategy) = args.strategy {
        base_config.strategy = strategy.strategy();
    }
    let rules = match args.rules.as_ref() {
        Some(path) => Some(
            MergeRuleTable::load(&resolve_path(&repo_root, path))
                .map_err(|err| format!("Failed to load merge rules: {err}"))?,
        ),
        None => None,
    };

    let mut cases = load_cases(&cases_dir)?;
    if args.offset > 0 {
        cases = cases.into_iter().skip(args.offset).collect();
    }
    if let Some(limit) = args.limit {
        cases.truncate(limit);
    }
    if cases.is_empty() {
        return Err("No cases selected after applying offset/limit.".to_string());
    }

    let shared_aligner = build_aligner(base_config.clone(), rules.clone())?;
    let progress = ProgressBar::new(cases.len() as u64);
    progress.set_style(
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta}) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-"),
    );
    progress.set_message("starting...");

    let started = Instant::now();
    let mut case_reports: Vec<CaseReport> = Vec::with_capacity(cases.len());
    let mut written_captions = 0usize;
    let mut failed = 0usize;
    let captions_dir = resolve_captions_dir(&repo_root, args.out.as_ref());

    for case in &cases {
        progress.set_message(case.id.clone());

        let case_aligner;
        let aligner = match case.config.as_ref() {
            Some(config) => {
                let mut config = config.clone();
                if let Some(strategy) = args.strategy {
                    config.strategy = strategy.strategy();
                }
                case_aligner = build_aligner(config, rules.clone())?;
                &case_aligner
            }
            None => &shared_aligner,
        };

        let output = match aligner.align(&case.input) {
            Ok(output) => output,
            Err(err) => {
                tracing::warn!(case = case.id.as_str(), error = %err, "alignment failed");
                failed += 1;
                progress.inc(1);
                continue;
            }
        };

        match args.output_format {
            OutputFormat::Json => {
                let duration_ms = case
                    .input
                    .total_duration_ms
                    .or_else(|| output.captions.last().map(|c| c.end_ms))
                    .unwrap_or(0);
                let report = compute_case_report(
                    &case.id,
                    &output,
                    case.reference.as_deref(),
                    duration_ms,
                )
                .map_err(|err| format!("Failed to score case '{}': {err}", case.id))?;
                case_reports.push(report);
            }
            OutputFormat::Captions => {
                captions_formatter::write_captions(&captions_dir, &case.id, &output.captions)?;
                written_captions += 1;
            }
        }
        progress.inc(1);
    }
    progress.finish_with_message("done");

    eprintln!(
        "aligned {} case(s) in {:.2}s, {failed} failed",
        cases.len() - failed,
        started.elapsed().as_secs_f64()
    );

    match args.output_format {
        OutputFormat::Json => {
            let aggregates = aggregate_reports(&case_reports);
            let report = Report {
                schema_version: REPORT_SCHEMA_VERSION,
                meta: Meta {
                    generated_at: Utc::now().to_rfc3339(),
                    strategy: shared_aligner.strategy().as_str().to_string(),
                    rules_version: shared_aligner.rules_version(),
                    case_count: case_reports.len(),
                },
                cases: case_reports,
                aggregates,
            };
            let out_path = resolve_out_path(&repo_root, args.out.as_ref());
            json_report_formatter::write_report(&out_path, &report)?;
            println!("{}", out_path.display());
        }
        OutputFormat::Captions => {
            println!(
                "Wrote {written_captions} caption file(s) to {}",
                captions_dir.display()
            );
        }
    }
    Ok(())
}

fn build_aligner(
    config: AlignerConfig,
    rules: Option<MergeRuleTable>,
) -> Result<CaptionAligner, String> {
    let mut builder = CaptionAlignerBuilder::new(config);
    if let Some(rules) = rules {
        builder = builder.with_merge_rules(rules);
    }
    builder
        .build()
        .map_err(|err| format!("Failed to build CaptionAligner: {err}"))
}

fn load_cases(cases_dir: &Path) -> Result<Vec<Case>, String> {
    require_path_exists(cases_dir, "Missing cases directory.")?;
    let mut paths = Vec::new();
    let entries = fs::read_dir(cases_dir)
        .map_err(|err| format!("Failed to read '{}': {err}", cases_dir.display()))?;
    for entry in entries {
        let path = entry
            .map_err(|err| format!("Failed to read entry in '{}': {err}", cases_dir.display()))?
            .path();
        if path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();
    paths.iter().map(|path| parse_case(path)).collect()
}

fn parse_case(path: &Path) -> Result<Case, String> {
    let data = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read case '{}': {err}", path.display()))?;
    let file: CaseFile = serde_json::from_str(&data)
        .map_err(|err| format!("Failed to parse case '{}': {err}", path.display()))?;

    let id = file.id.unwrap_or_else(|| {
        path.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    let (words, whisper_duration) = match file.transcript {
        CaseTranscript::Whisper(output) => {
            let duration = output.duration_ms();
            (output.into_transcribed_words(), duration)
        }
        CaseTranscript::Entries(entries) => (flatten_entries(&entries), None),
    };

    Ok(Case {
        id,
        input: AlignmentInput {
            script: file.script,
            words,
            total_duration_ms: file.total_duration_ms.or(whisper_duration),
        },
        config: file.config,
        reference: file.reference,
    })
}

fn resolve_out_path(repo_root: &Path, out: Option<&PathBuf>) -> PathBuf {
    if let Some(path) = out {
        return resolve_path(repo_root, path);
    }

    let run_id = Utc::now().format("%Y%m%dT%H%M%SZ");
    repo_root
        .join("target")
        .join("caption_reports")
        .join(format!("caption-report-{run_id}.json"))
}

fn resolve_captions_dir(repo_root: &Path, out: Option<&PathBuf>) -> PathBuf {
    match out {
        Some(path) => resolve_path(repo_root, path),
        None => repo_root.join("target").join("captions"),
    }
}

fn resolve_path(repo_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        repo_root.join(path)
    }
}

fn require_path_exists(path: &Path, message: &str) -> Result<(), String> {
    if path.exists() {
        return Ok(());
    }
    Err(format!("{message} Missing path: {}", path.display()))
}
