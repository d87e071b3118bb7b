//! Batch processing command for multiple invoice files.
//!
//! Text extraction runs concurrently; records are then fed to the duplicate
//! grouper one by one in file-name order so group ids and merges are
//! reproducible.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use futures_util::stream::{self, StreamExt};
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use fapiao_core::models::config::FapiaoConfig;
use fapiao_core::{
    renamed_file_name, source_for, ChineseInvoiceParser, DuplicateGrouper, ExtractionResult,
    InvoiceParser, TextSource,
};

use super::process::{file_name, record_cells, RECORD_HEADERS};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory for the summary spreadsheet
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Number of parallel workers (default: from configuration)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Copy fully extracted files into this directory under a descriptive name
    #[arg(long)]
    copy_renamed: Option<PathBuf>,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    name: String,
    extraction: Result<ExtractionResult, String>,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::config::load(config_path)?;

    let files = collect_files(&args.input, &config)?;
    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    fs::create_dir_all(&args.output_dir)?;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let parser = Arc::new(ChineseInvoiceParser::from_config(&config.extraction));
    let jobs = args.jobs.unwrap_or(config.batch.jobs).max(1);

    // `buffered` yields results in input order, so the grouper below sees
    // files sorted by name regardless of which extraction finishes first.
    let names = source_names(&files);
    let results: Vec<ProcessResult> = stream::iter(files.into_iter().zip(names))
        .map(|(path, name)| {
            let parser = Arc::clone(&parser);
            async move { extract_file(path, name, parser).await }
        })
        .buffered(jobs)
        .inspect(|_| pb.inc(1))
        .collect()
        .await;

    pb.finish_and_clear();

    let mut grouper = DuplicateGrouper::new();
    for result in &results {
        match &result.extraction {
            Ok(extraction) => {
                let outcome = grouper.add(&extraction.record);
                if outcome.duplicate {
                    println!(
                        "{} {} looks like a duplicate (group {})",
                        style("⚠").yellow(),
                        result.name,
                        outcome.group_id.unwrap_or_default()
                    );
                }
            }
            Err(message) if args.continue_on_error => {
                warn!("Failed to process {}: {}", result.path.display(), message);
            }
            Err(message) => {
                error!("Failed to process {}: {}", result.path.display(), message);
                anyhow::bail!("Processing failed for {}: {}", result.path.display(), message);
            }
        }
    }

    let summary_path = args.output_dir.join(&config.output.summary_file);
    write_summary(&summary_path, &results, &grouper, config.output.bom)?;
    println!(
        "{} Summary written to {}",
        style("✓").green(),
        summary_path.display()
    );

    let copy_dir = args.copy_renamed.clone().or_else(|| {
        config
            .output
            .copy_renamed
            .then(|| args.output_dir.join("renamed"))
    });
    if let Some(dir) = copy_dir {
        let copied = copy_renamed(&dir, &results)?;
        println!(
            "{} Copied {} files to {}",
            style("✓").green(),
            copied,
            dir.display()
        );
    }

    let successful = results.iter().filter(|r| r.extraction.is_ok()).count();
    let failed: Vec<_> = results.iter().filter(|r| r.extraction.is_err()).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful).green(),
        style(failed.len()).red()
    );

    let duplicates = grouper.duplicate_groups();
    if !duplicates.is_empty() {
        println!();
        println!("{}", style("Duplicate invoices:").yellow());
        for (id, members) in &duplicates {
            println!("  - group {}: {}", id, members.join(", "));
        }
    }

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.extraction.as_ref().err().map_or("unknown error", String::as_str)
            );
        }
    }

    Ok(())
}

/// Expand the pattern and keep accepted extensions, sorted by file name.
fn collect_files(pattern: &str, config: &FapiaoConfig) -> anyhow::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = glob(pattern)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| config.accepts_extension(ext))
        })
        .collect();

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()).then_with(|| a.cmp(b)));
    Ok(files)
}

/// Source name of each file, unique within the run.
///
/// Files are known by their file name. When several share one, they are
/// named by their path below the common directory of all inputs instead,
/// e.g. `jan/invoice.txt` and `feb/invoice.txt`.
fn source_names(files: &[PathBuf]) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for path in files {
        *counts.entry(file_name(path)).or_default() += 1;
    }
    let root = common_parent(files);

    files
        .iter()
        .map(|path| {
            let name = file_name(path);
            if counts.get(&name).copied().unwrap_or_default() < 2 {
                return name;
            }
            let relative = root
                .as_deref()
                .and_then(|r| path.strip_prefix(r).ok())
                .unwrap_or(path);
            relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect()
}

/// Deepest directory containing every file.
fn common_parent(files: &[PathBuf]) -> Option<PathBuf> {
    let mut parents = files.iter().filter_map(|p| p.parent());
    let mut root = parents.next()?.to_path_buf();

    for parent in parents {
        while !parent.starts_with(&root) {
            if !root.pop() {
                return None;
            }
        }
    }

    Some(root)
}

async fn extract_file(
    path: PathBuf,
    name: String,
    parser: Arc<ChineseInvoiceParser>,
) -> ProcessResult {
    let task_path = path.clone();
    let task_name = name.clone();

    let joined = tokio::task::spawn_blocking(move || -> anyhow::Result<ExtractionResult> {
        let text = source_for(&task_path)?.read_text(&task_path)?;
        debug!("Recognized text of {}:\n{}", task_name, text);
        Ok(parser.parse_document(&task_name, &text))
    })
    .await;

    let extraction = match joined {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(e)) => Err(e.to_string()),
        Err(e) => Err(format!("extraction task failed: {}", e)),
    };

    ProcessResult { path, name, extraction }
}

fn write_summary(
    path: &Path,
    results: &[ProcessResult],
    grouper: &DuplicateGrouper,
    bom: bool,
) -> anyhow::Result<()> {
    let mut file = File::create(path)?;
    if bom {
        file.write_all("\u{feff}".as_bytes())?;
    }
    let mut wtr = csv::Writer::from_writer(file);

    let mut headers: Vec<&str> = RECORD_HEADERS.to_vec();
    headers.extend(["重复组", "状态", "错误"]);
    wtr.write_record(&headers)?;

    for result in results {
        match &result.extraction {
            Ok(extraction) => {
                let record = &extraction.record;
                let group = grouper
                    .group_of(&record.source_name)
                    .filter(|id| grouper.members(*id).is_some_and(|m| m.len() >= 2))
                    .map(|id| id.to_string())
                    .unwrap_or_default();

                let mut row: Vec<String> = record_cells(record).to_vec();
                row.extend([group, "ok".to_string(), String::new()]);
                wtr.write_record(&row)?;
            }
            Err(message) => {
                let mut row = vec![String::new(); RECORD_HEADERS.len()];
                row[RECORD_HEADERS.len() - 1] = result.name.clone();
                row.extend([String::new(), "error".to_string(), message.clone()]);
                wtr.write_record(&row)?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}

/// Copy every fully extracted file to `dir` under its descriptive name.
fn copy_renamed(dir: &Path, results: &[ProcessResult]) -> anyhow::Result<usize> {
    fs::create_dir_all(dir)?;
    let mut copied = 0;

    for result in results {
        let Ok(extraction) = &result.extraction else {
            continue;
        };
        let extension = result
            .path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("pdf");
        let Some(new_name) = renamed_file_name(&extraction.record, extension) else {
            debug!("{}: incomplete record, not copied", result.name);
            continue;
        };

        let target = unique_path(&dir.join(new_name));
        fs::copy(&result.path, &target)?;
        debug!("Copied {} to {}", result.path.display(), target.display());
        copied += 1;
    }

    Ok(copied)
}

/// `name.ext`, or `name_2.ext`, `name_3.ext`... if taken.
fn unique_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("invoice");
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    (2..)
        .map(|n| path.with_file_name(format!("{}_{}.{}", stem, n, extension)))
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}
