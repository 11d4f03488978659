// src/main.rs
mod config;
mod extractors;
mod grades;
mod narrative;
mod report;
mod storage;
mod utils;

use clap::Parser;
use config::{LayoutVariant, ReportConfig};
use extractors::section::SectionExtractor;
use grades::{collect_interactive, format_score, GradeCollector, GradesFile, GradesReport};
use narrative::{LlmConfig, NarrativeContext, NarrativeImprover};
use report::chart::SvgChartRenderer;
use report::composer::{Metadata, ReportComposer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use storage::StorageManager;
use utils::error::StorageError;
use utils::AppError;

const NARRATIVE_FILE: &str = "middle.txt";
const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Builds a bilingual after-action report from a free-text exercise narrative
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Raw narrative text file
    #[arg(short, long, default_value = "input.txt")]
    input: PathBuf,

    /// Output directory for the report and intermediate files
    #[arg(short, long, default_value = "./output")]
    output_dir: PathBuf,

    /// File name of the rendered report
    #[arg(long, default_value = "combat_report.html")]
    output_name: String,

    /// TOML report configuration (aliases, labels, rubric, branding, style)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Layout override
    #[arg(long, value_enum)]
    layout: Option<LayoutVariant>,

    /// Grades JSON file; grades are asked for on the console otherwise
    #[arg(short, long, conflicts_with = "no_grades")]
    grades: Option<PathBuf>,

    /// Build the report without a grades section
    #[arg(long)]
    no_grades: bool,

    /// Use the input text as is instead of asking the language model to improve it
    #[arg(long)]
    skip_improve: bool,

    /// Report title (defaults to the configured title)
    #[arg(long)]
    title: Option<String>,

    /// Signature line for the closing page
    #[arg(long)]
    signature: Option<String>,

    /// Exercise manager's name
    #[arg(long, default_value = "")]
    manager: String,

    /// Name of the trained force
    #[arg(long, default_value = "")]
    force: String,

    /// Exercise location
    #[arg(long, default_value = "")]
    location: String,

    /// Chat-completions model name
    #[arg(long)]
    model: Option<String>,

    /// Chat-completions endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// Language model request timeout in seconds
    #[arg(long, default_value = "120")]
    timeout_secs: u64,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

fn load_grades_file(path: &Path, config: &ReportConfig) -> Result<GradesReport, AppError> {
    let raw = std::fs::read_to_string(path)?;
    let file: GradesFile = serde_json::from_str(&raw)
        .map_err(|e| StorageError::SerializationError(format!("{}: {}", path.display(), e)))?;
    let report = file.into_report(&config.score_range)?;
    tracing::info!("Loaded {} rubric parts from {}", report.parts().len(), path.display());
    Ok(report)
}

async fn improve_narrative(args: &Args, config: &ReportConfig, raw_text: &str, date: &str) -> String {
    let mut llm = LlmConfig {
        api_key: std::env::var(API_KEY_VAR).ok(),
        timeout: Duration::from_secs(args.timeout_secs),
        ..LlmConfig::default()
    };
    if let Some(model) = &args.model {
        llm.model = model.clone();
    }
    if let Some(endpoint) = &args.endpoint {
        llm.endpoint = endpoint.clone();
    }

    let improver = match NarrativeImprover::new(llm, config.sections.clone()) {
        Ok(improver) => improver,
        Err(e) => {
            tracing::error!("Failed to build language model client: {}", e);
            return String::new();
        }
    };

    let ctx = NarrativeContext {
        date: date.to_string(),
        manager_name: args.manager.clone(),
        force_name: args.force.clone(),
        location: args.location.clone(),
    };
    improver.improve(raw_text, &ctx).await
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Parse CLI Arguments and set up logging (reads RUST_LOG env var)
    let args = Args::parse();
    utils::logging::setup_logging(args.verbose);
    tracing::info!("Starting processing for args: {:?}", args);

    // 2. Load report configuration
    let mut config = match &args.config {
        Some(path) => ReportConfig::load(path)?,
        None => ReportConfig::default(),
    };
    if let Some(layout) = args.layout {
        config.layout = layout;
    }
    std::fs::create_dir_all(&config.chart_dir)?;
    tracing::debug!("Using layout '{}', charts in {}", config.layout.as_str(), config.chart_dir.display());

    // 3. Initialize storage and the section extractor
    let storage = StorageManager::new(&args.output_dir)?;
    let section_extractor = SectionExtractor::new(&config.sections)?;

    // 4. Read the raw narrative and derive the exercise date
    let raw_text = std::fs::read_to_string(&args.input)?;
    tracing::info!("Read {} bytes from {}", raw_text.len(), args.input.display());
    let date = narrative::derive_date(&raw_text, chrono::Local::now().date_naive());
    tracing::info!("Exercise date: {}", date);

    // 5. Improve the narrative
    let improved = if args.skip_improve {
        raw_text.clone()
    } else {
        improve_narrative(&args, &config, &raw_text, &date).await
    };
    if improved.trim().is_empty() {
        tracing::warn!("Narrative is empty, the report will have no sections");
    }

    // 6. Round-trip through the intermediate file, then extract sections
    let narrative_path = storage.write_narrative(NARRATIVE_FILE, &improved)?;
    let narrative_text = storage.read_narrative(&narrative_path)?;
    let sections = section_extractor.extract(&narrative_text);
    tracing::info!("Extracted {} of 4 sections", sections.populated().len());
    tracing::debug!("Extracted narrative:\n{}", section_extractor.render_narrative(&sections));

    // 7. Collect grades
    let grades = if args.no_grades {
        None
    } else if let Some(path) = &args.grades {
        Some(load_grades_file(path, &config)?)
    } else {
        let collector = GradeCollector::new(config.rubric.clone(), config.score_range)?;
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        Some(collect_interactive(collector, stdin.lock(), stdout.lock())?)
    };
    if let Some(final_grade) = grades.as_ref().and_then(GradesReport::final_grade) {
        tracing::info!("Final grade: {}", format_score(final_grade));
    }

    // 8. Compose the report
    let meta = Metadata {
        title: Some(args.title.clone().unwrap_or_else(|| config.labels.default_title.clone())),
        date: Some(date),
        signature: args.signature.clone(),
    };
    let renderer = SvgChartRenderer::new(config.style.font_family.clone());
    let composer = ReportComposer::new(&config, &renderer);
    let blocks = composer.compose(&sections, grades.as_ref(), &meta)?;
    tracing::debug!("Composed {} document blocks", blocks.len());

    // 9. Save the report and its metadata
    let report_path = storage.save_report(&blocks, &config.style, &args.output_name)?;
    let stem = Path::new(&args.output_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".to_string());
    storage.save_report_metadata(
        &format!("{}_meta.json", stem),
        &meta,
        config.layout,
        &sections,
        grades.as_ref(),
    )?;

    tracing::info!("Report saved to {}", report_path.display());
    Ok(())
}
