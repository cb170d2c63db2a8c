use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use serde::Serialize;
use tracing::{info, warn};

use crate::align::DEFAULT_ALIGNER;
use crate::cli::OutputFormat;
use crate::config::RunConfig;
use crate::core::types::DbSource;
use crate::filter::ncbi::{final_combined_input, FinalDataset};
use crate::utils::error_log::ErrorLog;

#[derive(Args)]
pub struct SelectArgs {
    /// Gene symbols to process
    pub symbols: Vec<String>,

    /// File with one gene symbol per line ('#' starts a comment)
    #[arg(long)]
    pub symbols_file: Option<PathBuf>,

    /// Run directory holding input/, output/ and summary/
    #[arg(long, required = true)]
    pub run_dir: PathBuf,

    /// NCBI taxonomy ID of the species whose NCBI records are selected
    #[arg(long, required = true)]
    pub ncbi_taxid: String,

    /// Scientific name of that species, as written in NCBI descriptions
    #[arg(long, required = true)]
    pub ncbi_tax_name: String,

    /// OrthoDB taxid NCBI candidates are compared against
    #[arg(long, required = true)]
    pub odb_test_taxid: String,

    /// Comma-separated OrthoDB taxids to keep
    #[arg(long, required = true, value_delimiter = ',')]
    pub tax_subset: Vec<String>,

    /// Comma-separated OrthoDB taxids resolved first (default: all of --tax-subset)
    #[arg(long, value_delimiter = ',')]
    pub known_species: Vec<String>,

    /// Alignment program reading FASTA on stdin and writing the alignment to stdout
    #[arg(long, default_value = DEFAULT_ALIGNER)]
    pub aligner: PathBuf,

    /// Extra argument passed to the aligner (repeatable)
    #[arg(long = "aligner-arg", allow_hyphen_values = true)]
    pub aligner_args: Vec<String>,

    /// Re-run symbols already present in the error log
    #[arg(long)]
    pub retry_errors: bool,
}

impl SelectArgs {
    fn config(&self) -> RunConfig {
        RunConfig {
            run_dir: self.run_dir.clone(),
            ncbi_taxid: self.ncbi_taxid.clone(),
            ncbi_tax_name: self.ncbi_tax_name.clone(),
            odb_test_taxid: self.odb_test_taxid.clone(),
            tax_subset: self.tax_subset.clone(),
            known_species: self.known_species.clone(),
            aligner: self.aligner.clone(),
            aligner_args: self.aligner_args.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Selected,
    Skipped,
    Failed,
}

/// Result of one symbol in a run
#[derive(Debug, Clone, Serialize)]
pub struct SymbolOutcome {
    pub symbol: String,
    pub status: Status,
    pub records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ncbi_record: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records_tsv: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SymbolOutcome {
    fn selected(dataset: &FinalDataset) -> Self {
        let ncbi = dataset
            .table
            .iter()
            .find(|r| r.db_source == Some(DbSource::Ncbi));
        Self {
            symbol: dataset.symbol.clone(),
            status: Status::Selected,
            records: dataset.table.len(),
            ncbi_record: ncbi.map(|r| r.record_id.clone()),
            selection_type: ncbi.and_then(|r| r.selection_type).map(|s| s.to_string()),
            records_tsv: Some(dataset.records_tsv.clone()),
            error_type: None,
            message: None,
        }
    }

    fn other(symbol: &str, status: Status, error_type: Option<&str>, message: String) -> Self {
        Self {
            symbol: symbol.to_string(),
            status,
            records: 0,
            ncbi_record: None,
            selection_type: None,
            records_tsv: None,
            error_type: error_type.map(str::to_string),
            message: Some(message),
        }
    }
}

/// Read gene symbols from a file, one per line
fn read_symbols_file(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read symbols file {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Execute select subcommand
///
/// Symbols whose input data is missing or malformed are written to the run's
/// error log and skipped; any other failure stops the run.
///
/// # Errors
///
/// Returns an error if no symbols are given, the error log cannot be read or
/// written, or a symbol fails for a reason other than its input data.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: SelectArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let mut symbols = args.symbols.clone();
    if let Some(path) = &args.symbols_file {
        symbols.extend(read_symbols_file(path)?);
    }
    if symbols.is_empty() {
        anyhow::bail!("No gene symbols given; pass symbols or --symbols-file");
    }

    let config = args.config();
    let paths = config.paths();
    let aligner = config.aligner();
    let mut error_log = ErrorLog::load(&paths.errors_tsv())
        .with_context(|| format!("Failed to read error log {}", paths.errors_tsv().display()))?;

    if verbose {
        eprintln!(
            "Processing {} symbols in {} (aligner: {})",
            symbols.len(),
            config.run_dir.display(),
            aligner.program().display()
        );
    }

    let mut outcomes = Vec::with_capacity(symbols.len());
    for symbol in &symbols {
        if !args.retry_errors && error_log.contains(symbol) {
            info!("{symbol}: skipped, already in the error log");
            outcomes.push(SymbolOutcome::other(
                symbol,
                Status::Skipped,
                None,
                "already in the error log".to_string(),
            ));
            continue;
        }

        match final_combined_input(&config, symbol, &aligner) {
            Ok(dataset) => outcomes.push(SymbolOutcome::selected(&dataset)),
            Err(e) if e.is_data_error() => {
                warn!("{symbol}: {e}");
                error_log
                    .record(symbol, e.error_type(), &e.to_string())
                    .with_context(|| format!("Failed to write {}", error_log.path().display()))?;
                outcomes.push(SymbolOutcome::other(
                    symbol,
                    Status::Failed,
                    Some(e.error_type()),
                    e.to_string(),
                ));
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to process {symbol}")),
        }
    }

    match format {
        OutputFormat::Text => print_text_results(&outcomes),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcomes)?),
        OutputFormat::Tsv => print_tsv_results(&outcomes),
    }

    Ok(())
}

fn print_text_results(outcomes: &[SymbolOutcome]) {
    for o in outcomes {
        match o.status {
            Status::Selected => {
                println!(
                    "{}: {} records, NCBI {} ({})",
                    o.symbol,
                    o.records,
                    o.ncbi_record.as_deref().unwrap_or("-"),
                    o.selection_type.as_deref().unwrap_or("-")
                );
                if let Some(path) = &o.records_tsv {
                    println!("    {}", path.display());
                }
            }
            Status::Skipped => {
                println!("{}: skipped ({})", o.symbol, o.message.as_deref().unwrap_or(""));
            }
            Status::Failed => println!(
                "{}: {} - {}",
                o.symbol,
                o.error_type.as_deref().unwrap_or("error"),
                o.message.as_deref().unwrap_or("")
            ),
        }
    }

    let count = |status: Status| outcomes.iter().filter(|o| o.status == status).count();
    println!();
    println!(
        "{} selected, {} failed, {} skipped",
        count(Status::Selected),
        count(Status::Failed),
        count(Status::Skipped)
    );
}

fn print_tsv_results(outcomes: &[SymbolOutcome]) {
    println!("symbol\tstatus\trecords\tncbi_record\tselection_type\terror_type\tmessage");
    for o in outcomes {
        let status = match o.status {
            Status::Selected => "selected",
            Status::Skipped => "skipped",
            Status::Failed => "failed",
        };
        println!(
            "{}\t{status}\t{}\t{}\t{}\t{}\t{}",
            o.symbol,
            o.records,
            o.ncbi_record.as_deref().unwrap_or(""),
            o.selection_type.as_deref().unwrap_or(""),
            o.error_type.as_deref().unwrap_or(""),
            o.message.as_deref().unwrap_or("").replace(['\t', '\n'], " ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_symbols_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"ATP5MC1\n\n# header comment\n  CALM1  \n").unwrap();
        file.flush().unwrap();

        let symbols = read_symbols_file(file.path()).unwrap();
        assert_eq!(symbols, vec!["ATP5MC1".to_string(), "CALM1".to_string()]);
    }

    #[test]
    fn test_failed_outcome_serialization() {
        let outcome = SymbolOutcome::other(
            "CALM1",
            Status::Failed,
            Some("SequenceDataError"),
            "no records".to_string(),
        );
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error_type"], "SequenceDataError");
        assert!(json.get("ncbi_record").is_none());
    }
}
