//! Process command - extract data from a single invoice file.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use fapiao_core::{
    source_for, ChineseInvoiceParser, ExtractionResult, InvoiceParser, InvoiceRecord, TextSource,
};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF with a text layer, or recognized text as .txt)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Skip cross-checking against the written (大写) amount
    #[arg(long)]
    no_reconcile: bool,

    /// Show extraction warnings
    #[arg(long)]
    show_warnings: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::config::load(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let text = source_for(&args.input)?.read_text(&args.input)?;
    debug!("Recognized text:\n{}", text);

    let parser = ChineseInvoiceParser::from_config(&config.extraction)
        .with_reconciliation(config.extraction.reconcile_written_amount && !args.no_reconcile);
    let result = parser.parse_document(&file_name(&args.input), &text);

    let output = format_result(&result, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_warnings && !result.warnings.is_empty() {
        eprintln!("{}", style("Extraction warnings:").yellow());
        for warning in &result.warnings {
            eprintln!("  - {}", warning);
        }
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// File name component used as the record's source name.
pub fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn format_result(result: &ExtractionResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Csv => format_record_csv(&result.record),
        OutputFormat::Text => Ok(format_record_text(&result.record)),
    }
}

/// Column headers of the exported spreadsheet.
pub const RECORD_HEADERS: [&str; 6] = ["开票日期", "发票代码", "发票号码", "商品名称", "金额(小写)", "_文件名"];

/// One record as spreadsheet cells, in [`RECORD_HEADERS`] order.
pub fn record_cells(record: &InvoiceRecord) -> [String; 6] {
    [
        record.issue_date_text(),
        record.invoice_code.clone().unwrap_or_default(),
        record.invoice_number.clone().unwrap_or_default(),
        record.item_name.clone().unwrap_or_default(),
        record.amount_text(),
        record.source_name.clone(),
    ]
}

fn format_record_csv(record: &InvoiceRecord) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(RECORD_HEADERS)?;
    wtr.write_record(record_cells(record))?;
    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_record_text(record: &InvoiceRecord) -> String {
    let mut output = String::new();

    output.push_str(&format!("File:    {}\n", record.source_name));
    for (header, value) in RECORD_HEADERS.iter().zip(record_cells(record)).take(5) {
        let value = if value.is_empty() { "-".to_string() } else { value };
        output.push_str(&format!("{}: {}\n", header, value));
    }

    output
}
