//! Configuration structures for the extraction pipeline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{FapiaoError, Result};

/// Main configuration for the fapiao pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FapiaoConfig {
    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Batch processing configuration.
    pub batch: BatchConfig,

    /// Output configuration.
    pub output: OutputConfig,
}

/// Field extraction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Cross-check the digit-form amount against the written (大写) amount.
    pub reconcile_written_amount: bool,

    /// The written amount replaces the digit amount when they differ by
    /// strictly more than this.
    pub amount_tolerance: Decimal,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            reconcile_written_amount: true,
            amount_tolerance: Decimal::new(1, 2),
        }
    }
}

/// Batch processing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// File extensions picked up by batch runs (lowercase, no dot).
    pub extensions: Vec<String>,

    /// Number of documents extracted concurrently.
    pub jobs: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["pdf".to_string(), "txt".to_string()],
            jobs: 4,
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// File name of the batch summary spreadsheet.
    pub summary_file: String,

    /// Prefix the summary with a UTF-8 byte-order mark.
    pub bom: bool,

    /// Copy each fully extracted document under a descriptive name.
    pub copy_renamed: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            summary_file: "output.csv".to_string(),
            bom: true,
            copy_renamed: false,
        }
    }
}

impl FapiaoConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.extraction.amount_tolerance.is_sign_negative() {
            return Err(FapiaoError::Config(format!(
                "amount_tolerance must not be negative, got {}",
                self.extraction.amount_tolerance
            )));
        }
        if self.batch.jobs == 0 {
            return Err(FapiaoError::Config("batch.jobs must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Whether a file extension is picked up by batch runs.
    pub fn accepts_extension(&self, extension: &str) -> bool {
        let extension = extension.to_lowercase();
        self.batch.extensions.iter().any(|e| *e == extension)
    }
}
