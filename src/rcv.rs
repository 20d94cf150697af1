use log::{debug, error, info, warn};

use rcv_ledger::*;
use rust_decimal::Decimal;
use snafu::{prelude::*, Snafu};

use std::path::{Path, PathBuf};

use crate::rcv::config_reader::*;
use crate::rcv::io_clear_ballot::{read_clear_ballot, IngestReport};
use crate::rcv::io_summary::*;

pub mod config_reader;
mod io_clear_ballot;
mod io_common;
mod io_summary;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RcvError {
    // Ingestion of cast vote record files
    #[snafu(display("No header row found in cast vote record file {path}"))]
    MissingHeader { path: String },
    #[snafu(display("No choice columns found in cast vote record file {path}: {found} columns"))]
    TooFewColumns { path: String, found: usize },
    #[snafu(display(
        "Wrong number of choice header fields in cast vote record file {path}, column {column}: {header:?}"
    ))]
    MalformedChoiceHeader {
        path: String,
        column: usize,
        header: String,
    },
    #[snafu(display("Candidate {candidate:?} from cast vote record file {path} not found in config"))]
    UnknownCandidate { path: String, candidate: String },
    #[snafu(display("Invalid rank {rank:?} in column {column} of cast vote record file {path}"))]
    InvalidRank {
        path: String,
        column: usize,
        rank: String,
    },
    #[snafu(display("Rank {rank} in {path} exceeds max rankings allowed in config: {max}"))]
    RankExceedsMax { path: String, rank: u32, max: u32 },
    #[snafu(display("Cast vote record file not found: {path}"))]
    FileNotFound { path: String },
    #[snafu(display("Error reading file {path}"))]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[snafu(display("Error parsing delimited file {path}"))]
    CsvRead { path: String, source: csv::Error },
    #[snafu(display(
        "Line {lineno} of {path} has {found} fields, expected {expected} from the header"
    ))]
    RowFieldCountMismatch {
        path: String,
        lineno: u64,
        expected: usize,
        found: usize,
    },

    // Configuration
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        path: String,
        source: std::io::Error,
    },
    #[snafu(display("Error parsing JSON content"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Could not find the parent directory of the configuration"))]
    MissingParentDir {},
    #[snafu(display("Provider not implemented {provider:?}"))]
    UnsupportedProvider { provider: String },
    #[snafu(display("Missing contestId for file source {path}"))]
    MissingContestId { path: String },
    #[snafu(display("Failed to understand maxRankingsAllowed option: {value}"))]
    InvalidMaxRankings { value: String },
    #[snafu(display("Unknown rowErrorPolicy option: {policy:?}"))]
    InvalidRowErrorPolicy { policy: String },
    #[snafu(display("No file sources detected"))]
    NoSources {},

    // Outputs
    #[snafu(display("Error writing file {path}"))]
    WritingOutput {
        path: String,
        source: std::io::Error,
    },
    #[snafu(display("Error serializing JSON output"))]
    SerializingJson { source: serde_json::Error },
    #[snafu(display("Difference detected between the transfers and the reference {path}"))]
    ReferenceMismatch { path: String },
    #[snafu(display("{count} cast vote record source(s) could not be read"))]
    SourcesFailed { count: usize },
}

impl RcvError {
    /// Failures to access a source, as opposed to invalid content.
    /// A multi-file run may go on with the other sources after such a failure.
    pub fn is_source_access(&self) -> bool {
        matches!(self, RcvError::FileNotFound { .. } | RcvError::Io { .. })
    }
}

pub type RcvResult<T> = Result<T, RcvError>;

/// Records the initial count of every ballot as round 1 transfers.
///
/// Ballots with a clear first choice go to that candidate. Blank ballots, and
/// ballots overvoted at their first rank, are exhausted from the start.
fn record_initial_count(records: &[CastVoteRecord], ledger: &mut TransferLedger) {
    for cvr in records.iter() {
        let target = cvr.first_choice();
        if target.is_none() {
            debug!(
                "record_initial_count: ballot {:?}: no first choice: {:?}",
                cvr.ballot_id(),
                cvr.rankings()
            );
        }
        ledger.record(1, None, target, Decimal::ONE);
    }
}

fn read_source(
    root_p: &Path,
    cfs: &FileSource,
    roster: &ContestRoster,
    records_before: usize,
) -> RcvResult<IngestReport> {
    cfs.check_provider()?;
    let contest_id = cfs.contest_id()?;
    let policy = cfs.row_error_policy()?;
    let p: PathBuf = root_p.join(&cfs.file_path);
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read cast vote record file {:?}", p2);
    read_clear_ballot(&p2, contest_id, roster, policy, records_before)
}

fn output_location(out: Option<String>, config: &RcvConfig, root_p: &Path) -> Option<PathBuf> {
    match out.or_else(|| config.output_settings.output_directory.clone()) {
        Some(s) if s == "stdout" => None,
        Some(s) => Some(root_p.join(s)),
        None => Some(root_p.to_path_buf()),
    }
}

/// Reads all the cast vote records of a contest configuration, and writes
/// the parsed records and the initial count transfers.
///
/// The sources that cannot be opened are skipped, unless `strict` is set.
/// Invalid content always stops the run.
pub fn run_ingestion(
    config_path: String,
    out: Option<String>,
    reference_path: Option<String>,
    strict: bool,
) -> RcvResult<()> {
    let config = read_config(&config_path)?;
    info!("config: {:?}", config);

    let roster = ContestRoster::from_config(&config)?;

    ensure!(!config.cvr_file_sources.is_empty(), NoSourcesSnafu {});

    let config_p = Path::new(config_path.as_str());
    let root_p = config_p.parent().context(MissingParentDirSnafu {})?;

    let mut records: Vec<CastVoteRecord> = Vec::new();
    let mut failed_sources: usize = 0;
    for cfs in config.cvr_file_sources.iter() {
        match read_source(root_p, cfs, &roster, records.len()) {
            Ok(mut report) => {
                if !report.skipped.is_empty() {
                    warn!(
                        "{}: skipped {} malformed rows",
                        cfs.file_path,
                        report.skipped.len()
                    );
                }
                records.append(&mut report.records);
            }
            Err(e) if e.is_source_access() && !strict => {
                error!("{}", e);
                failed_sources += 1;
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        "Read {} cast vote records for contest {:?}",
        records.len(),
        config.output_settings.contest_name
    );

    let mut ledger = TransferLedger::new();
    record_initial_count(&records, &mut ledger);

    let records_js = records_to_json(&records);
    let transfers_js = ledger_to_json(&ledger);

    match output_location(out, &config, root_p) {
        None => {
            write_json_stdout("cvr_records", &records_js)?;
            write_json_stdout("transfers", &transfers_js)?;
        }
        Some(dir) => {
            write_json_file(&dir.join("cvr_records.json"), &records_js)?;
            write_json_file(&dir.join("transfers.json"), &transfers_js)?;
        }
    }

    if let Some(ref_p) = reference_path {
        check_reference(&ref_p, &transfers_js)?;
    }

    ensure!(
        failed_sources == 0,
        SourcesFailedSnafu {
            count: failed_sources
        }
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(name: &str) -> String {
        format!("{}/test_data/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    fn cvr(ballot_id: &str, rankings: Vec<Ranking>) -> CastVoteRecord {
        CastVoteRecord::new("Mayor", "TAB", ballot_id, "P1", "S1", rankings)
    }

    #[test]
    fn initial_count() {
        let records = vec![
            cvr("1", vec![Ranking::new(1, "A"), Ranking::new(2, "B")]),
            cvr("2", vec![Ranking::new(2, "A")]),
            cvr("3", vec![]),
            cvr("4", vec![Ranking::new(1, "A"), Ranking::new(1, "B")]),
            cvr("5", vec![Ranking::new(1, "B")]),
        ];
        let mut ledger = TransferLedger::new();
        record_initial_count(&records, &mut ledger);
        assert_eq!(ledger.rounds(), vec![1]);
        let round = ledger.transfers_for_round(1).unwrap();
        let uncounted = &round[&TransferSource::Uncounted];
        assert_eq!(
            uncounted[&TransferTarget::Candidate("A".to_string())],
            Decimal::from(2)
        );
        assert_eq!(
            uncounted[&TransferTarget::Candidate("B".to_string())],
            Decimal::ONE
        );
        assert_eq!(uncounted[&TransferTarget::Exhausted], Decimal::from(2));
        assert_eq!(
            ledger.total_from(1, &TransferSource::Uncounted),
            Decimal::from(records.len() as u64)
        );
    }

    #[test]
    fn run_clear_ballot_stdout() {
        let res = run_ingestion(
            test_config("clear_ballot_basic/clear_ballot_basic_config.json"),
            Some("stdout".to_string()),
            Some(test_config(
                "clear_ballot_basic/clear_ballot_basic_expected_transfers.json",
            )),
            false,
        );
        assert!(res.is_ok(), "{:?}", res);
    }

    #[test]
    fn run_missing_source() {
        let config = test_config("missing_source/missing_source_config.json");
        let res = run_ingestion(config.clone(), Some("stdout".to_string()), None, false);
        assert!(
            matches!(res, Err(RcvError::SourcesFailed { count: 1 })),
            "{:?}",
            res
        );
        let res = run_ingestion(config, Some("stdout".to_string()), None, true);
        assert!(matches!(res, Err(RcvError::FileNotFound { .. })), "{:?}", res);
    }

    #[test]
    fn run_missing_config() {
        let res = run_ingestion(test_config("nothing_here.json"), None, None, false);
        assert!(matches!(res, Err(RcvError::OpeningJson { .. })), "{:?}", res);
    }
}
