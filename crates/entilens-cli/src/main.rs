//! EntiLens CLI - Command-line interface
//!
//! Usage:
//!   entilens extract report.pdf --labels PERSON,ORG
//!   entilens extract --text "Barack Obama visited Berlin." --format json
//!   cat notes.txt | entilens extract - --format stats
//!   entilens labels
//!   entilens models

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use entilens_core::{AppConfig, EntityLabel, LabelSelection};
use entilens_extractor::{ExtractionOutcome, ExtractionPipeline, ExtractionRequest};
use entilens_render::{
    render_document, EntityTable, ExportFormat, SortColumn, SortOrder, NO_STATS_MESSAGE,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "entilens")]
#[command(about = "Find named entities in text, PDF and DOCX documents")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true, env = "ENTILENS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract entities from a document or text
    Extract(ExtractArgs),
    /// List entity types with their colours
    Labels,
    /// List configured models and whether they can be used
    Models,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// File to read (TXT, PDF, DOCX), `-` for stdin, or the text itself with --text
    input: String,

    /// Treat INPUT as the text to analyze
    #[arg(long)]
    text: bool,

    /// Entity types to keep, comma separated (default: all)
    #[arg(long, value_delimiter = ',')]
    labels: Option<Vec<String>>,

    /// Model name (default: configured default model)
    #[arg(long)]
    model: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Write output to a file instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Sort column: text, start, end or label
    #[arg(long)]
    sort: Option<SortColumn>,

    /// Sort in descending order
    #[arg(long, requires = "sort")]
    desc: bool,

    /// Do not run OCR on scanned PDFs
    #[arg(long)]
    no_ocr: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Table,
    Csv,
    Json,
    Html,
    Stats,
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,entilens_cli={level},entilens_extractor={level},entilens_ocr={level}",
            level = config.logging.level
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&config);

    match cli.command {
        Commands::Extract(args) => run_extract(&config, args).await,
        Commands::Labels => {
            print!("{}", format_labels());
            Ok(())
        }
        Commands::Models => run_models(&config).await,
    }
}

async fn run_extract(config: &AppConfig, args: ExtractArgs) -> anyhow::Result<()> {
    let pipeline = ExtractionPipeline::from_config(config)?;

    let selection = match &args.labels {
        Some(names) => LabelSelection::parse(names.iter())?,
        None => LabelSelection::all(),
    };

    let (text, source) = if args.text {
        (args.input.clone(), None)
    } else if args.input == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        (text, None)
    } else {
        let path = Path::new(&args.input);
        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| args.input.clone());

        let extracted = pipeline
            .extract_document(&file_name, bytes, !args.no_ocr)
            .await?;
        if extracted.ocr_applied {
            eprintln!("Text was recovered with OCR.");
        }
        (extracted.text, Some(file_name))
    };

    tracing::debug!(chars = text.chars().count(), format = ?args.format, "Running extraction");

    let mut request = ExtractionRequest::new(text, selection);
    request.model = args.model.clone();
    request.source = source;

    let outcome = pipeline.run(request).await?;
    eprintln!("{}", outcome.message());

    let rendered = render_outcome(&outcome, &args)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{rendered}"),
    }

    Ok(())
}

async fn run_models(config: &AppConfig) -> anyhow::Result<()> {
    let pipeline = ExtractionPipeline::from_config(config)?;
    let registry = pipeline.recognizers();

    for (name, available) in registry.availability().await {
        let marker = if name == registry.default_model() { "*" } else { " " };
        let status = if available { "available" } else { "unavailable" };
        println!("{marker} {name:<24} {status}");
    }
    println!(
        "OCR for scanned PDFs: {}",
        if pipeline.ocr_available() { "available" } else { "unavailable" }
    );

    Ok(())
}

fn render_outcome(outcome: &ExtractionOutcome, args: &ExtractArgs) -> anyhow::Result<String> {
    let mut table = EntityTable::from_entities(&outcome.entities);
    if let Some(column) = args.sort {
        let order = if args.desc { SortOrder::Desc } else { SortOrder::Asc };
        table.sort(column, order);
    }

    let rendered = match args.format {
        OutputFormat::Table => format_table(&table),
        OutputFormat::Csv => table.export(ExportFormat::Csv)?,
        OutputFormat::Json => {
            let mut json = table.export(ExportFormat::Json)?;
            json.push('\n');
            json
        }
        OutputFormat::Html => render_document(&outcome.text, &outcome.entities),
        OutputFormat::Stats => format_stats(outcome),
    };
    Ok(rendered)
}

/// Plain text table with aligned columns
fn format_table(table: &EntityTable) -> String {
    if table.is_empty() {
        return String::new();
    }

    let headers = ["Text", "Start", "End", "Label"];
    let cells: Vec<[String; 4]> = table
        .rows()
        .iter()
        .map(|row| {
            [
                row.text.replace('\n', " "),
                row.start.to_string(),
                row.end.to_string(),
                row.label.to_string(),
            ]
        })
        .collect();

    let mut widths = headers.map(|h| h.chars().count());
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let mut push_line = |values: [&str; 4]| {
        let line: Vec<String> = values
            .iter()
            .zip(widths)
            .map(|(value, width)| format!("{value:<width$}"))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    };

    push_line(headers);
    let rule = widths.map(|w| "-".repeat(w));
    push_line([rule[0].as_str(), &rule[1], &rule[2], &rule[3]]);
    for row in &cells {
        push_line([row[0].as_str(), &row[1], &row[2], &row[3]]);
    }
    out
}

/// Counts per label with a text bar
fn format_stats(outcome: &ExtractionOutcome) -> String {
    if outcome.counts.is_empty() {
        return format!("{NO_STATS_MESSAGE}\n");
    }

    let max = outcome.counts.iter().map(|c| c.count).max().unwrap_or(1);
    let mut out = String::new();
    for count in &outcome.counts {
        let bar = "#".repeat((count.count * 40).div_ceil(max));
        out.push_str(&format!(
            "{:<12} {:>5}  {bar}\n",
            count.label.as_str(),
            count.count
        ));
    }
    out
}

fn format_labels() -> String {
    EntityLabel::ALL
        .iter()
        .map(|label| {
            format!(
                "{:<12} {}  {}\n",
                label.as_str(),
                label.solid_color(),
                label.description()
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use entilens_core::EntityOccurrence;
    use entilens_extractor::ExtractionStatus;

    fn outcome() -> ExtractionOutcome {
        let entities = vec![
            EntityOccurrence::new("Barack Obama", 0, 12, EntityLabel::Person),
            EntityOccurrence::new("Berlin", 21, 27, EntityLabel::Gpe),
        ];
        ExtractionOutcome {
            model: "builtin".to_string(),
            text: "Barack Obama visited Berlin.".to_string(),
            selection: LabelSelection::all(),
            counts: entilens_core::count_labels(&entities),
            raw_entity_count: entities.len(),
            entities,
            status: ExtractionStatus::Success,
            source: None,
        }
    }

    fn extract_args(argv: &[&str]) -> ExtractArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Commands::Extract(args) => args,
            other => panic!("expected extract, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_extract_args() {
        let args = extract_args(&[
            "entilens",
            "extract",
            "report.pdf",
            "--labels",
            "PERSON,ORG",
            "--format",
            "csv",
            "--sort",
            "label",
            "--desc",
            "--no-ocr",
        ]);

        assert_eq!(args.input, "report.pdf");
        assert_eq!(
            args.labels,
            Some(vec!["PERSON".to_string(), "ORG".to_string()])
        );
        assert_eq!(args.format, OutputFormat::Csv);
        assert_eq!(args.sort, Some(SortColumn::Label));
        assert!(args.desc);
        assert!(args.no_ocr);
        assert!(!args.text);
    }

    #[test]
    fn test_parse_defaults() {
        let args = extract_args(&["entilens", "extract", "--text", "Hello Berlin"]);

        assert!(args.text);
        assert_eq!(args.input, "Hello Berlin");
        assert_eq!(args.format, OutputFormat::Table);
        assert!(args.labels.is_none());
        assert!(args.model.is_none());
    }

    #[test]
    fn test_desc_requires_sort() {
        assert!(Cli::try_parse_from(["entilens", "extract", "a.txt", "--desc"]).is_err());
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(Cli::try_parse_from(["entilens", "extract", "a.txt", "--format", "xml"]).is_err());
    }

    #[test]
    fn test_format_table_aligns_columns() {
        let table = EntityTable::from_entities(&outcome().entities);
        let text = format_table(&table);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Text          Start  End  Label");
        assert_eq!(lines[2], "Barack Obama  0      12   PERSON");
        assert_eq!(lines[3], "Berlin        21     27   GPE");
    }

    #[test]
    fn test_render_sorted_csv() {
        let args = extract_args(&[
            "entilens", "extract", "x.txt", "--format", "csv", "--sort", "text", "--desc",
        ]);
        let csv = render_outcome(&outcome(), &args).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "Text,Start,End,Label");
        assert_eq!(lines[1], "Berlin,21,27,GPE");
        assert_eq!(lines[2], "Barack Obama,0,12,PERSON");
    }

    #[test]
    fn test_format_stats() {
        let stats = format_stats(&outcome());
        assert!(stats.starts_with("PERSON"));
        assert!(stats.contains("GPE"));

        let mut empty = outcome();
        empty.entities.clear();
        empty.counts.clear();
        assert_eq!(format_stats(&empty), format!("{NO_STATS_MESSAGE}\n"));
    }

    #[test]
    fn test_format_labels_lists_taxonomy() {
        let labels = format_labels();
        assert_eq!(labels.lines().count(), EntityLabel::ALL.len());
        assert!(labels.starts_with("PERSON"));
    }
}
