// Reader for the Clear Ballot cast vote record exports (ClearVote RCV format).
//
// The first line is a header. The first columns hold the metadata of each
// ballot, the remaining ones are choice columns: one column per
// (contest, rank, candidate), and a ballot has a 1 in that column if the voter
// marked this candidate at this rank.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};

use csv::{ReaderBuilder, StringRecord};
use log::{debug, info, warn};
use rcv_ledger::{CastVoteRecord, Ranking, Roster};
use snafu::prelude::*;

use crate::rcv::{
    io_common::{is_marked, report_progress, simplify_file_name},
    *,
};

// Metadata columns of the export.
const BALLOT_ID_COL: usize = 3;
const PRECINCT_ID_COL: usize = 4;
const BALLOT_STYLE_ID_COL: usize = 5;
const SCAN_COMPUTER_NAME_COL: usize = 7;
// RowNumber, BoxID, BoxPosition, BallotID, PrecinctID, BallotStyleID,
// PrecinctStyleName, ScanComputerName, Status, Remade
const CHOICES_BEGIN_COL: usize = 10;

// A choice column header looks like `Choice_1_1:Mayor:1:Number of Winners 1:Alice:NP`
const CHOICE_HEADER_SEPARATOR: char = ':';
const CHOICE_HEADER_FIELD_COUNT: usize = 6;
const CONTEST_NAME_FIELD: usize = 1;
const RANK_FIELD: usize = 2;
const CHOICE_NAME_FIELD: usize = 4;

/// What to do with a data row that does not match the header.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub enum RowErrorPolicy {
    /// The first malformed row fails the whole file.
    #[default]
    Abort,
    /// Malformed rows are skipped and returned in the report.
    SkipAndCollect,
}

/// A data row that was skipped.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RowIssue {
    pub lineno: u64,
    pub expected: usize,
    pub found: usize,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct IngestReport {
    pub records: Vec<CastVoteRecord>,
    pub skipped: Vec<RowIssue>,
}

// The ranking that a choice column stands for.
#[derive(Eq, PartialEq, Debug, Clone)]
struct ChoiceColumn {
    column: usize,
    rank: u32,
    candidate: String,
}

/// Reads all the cast vote records for the given contest in a Clear Ballot export.
///
/// Any problem with the header fails before the data rows are read.
/// `records_before` is the number of records already read from other sources
/// of the same contest, for the progress messages.
pub fn read_clear_ballot(
    path: &str,
    contest_id: &str,
    roster: &dyn Roster,
    policy: RowErrorPolicy,
    records_before: usize,
) -> RcvResult<IngestReport> {
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => RcvError::FileNotFound {
            path: path.to_string(),
        },
        _ => RcvError::Io {
            path: path.to_string(),
            source: e,
        },
    })?;
    read_clear_ballot_from(file, path, contest_id, roster, policy, records_before)
}

pub fn read_clear_ballot_from<R: Read>(
    reader: R,
    path: &str,
    contest_id: &str,
    roster: &dyn Roster,
    policy: RowErrorPolicy,
    records_before: usize,
) -> RcvResult<IngestReport> {
    let source_name = simplify_file_name(path);
    // One record per line. The csv reader alone would drop the blank lines.
    let mut lines = BufReader::new(reader).split(b'\n');

    let header: StringRecord = match lines.next() {
        Some(l) => parse_line(&l.context(IoSnafu { path })?, path)?,
        None => return MissingHeaderSnafu { path }.fail(),
    };
    let choice_columns = read_choice_columns(&header, path, contest_id, roster)?;
    debug!(
        "read_clear_ballot: {}: contest {:?}: choice columns: {:?}",
        source_name, contest_id, choice_columns
    );

    let mut res = IngestReport::default();
    for (idx, line_r) in lines.enumerate() {
        let lineno = (idx + 2) as u64;
        let row = parse_line(&line_r.context(IoSnafu { path })?, path)?;

        if row.len() < header.len() {
            let issue = RowIssue {
                lineno,
                expected: header.len(),
                found: row.len(),
            };
            match policy {
                RowErrorPolicy::Abort => {
                    return RowFieldCountMismatchSnafu {
                        path,
                        lineno,
                        expected: issue.expected,
                        found: issue.found,
                    }
                    .fail();
                }
                RowErrorPolicy::SkipAndCollect => {
                    warn!(
                        "{}: skipping line {}: {} fields, expected {}",
                        source_name, lineno, issue.found, issue.expected
                    );
                    res.skipped.push(issue);
                    continue;
                }
            }
        }

        let rankings: Vec<Ranking> = choice_columns
            .iter()
            .filter(|cc| is_marked(&row[cc.column]))
            .map(|cc| Ranking::new(cc.rank, &cc.candidate))
            .collect();

        let cvr = CastVoteRecord::new(
            contest_id,
            &row[SCAN_COMPUTER_NAME_COL],
            &row[BALLOT_ID_COL],
            &row[PRECINCT_ID_COL],
            &row[BALLOT_STYLE_ID_COL],
            rankings,
        );
        debug!("read_clear_ballot: line {}: {:?}", lineno, cvr);
        res.records.push(cvr);
        report_progress(&source_name, records_before + res.records.len());
    }

    info!(
        "{}: read {} cast vote records, skipped {} rows",
        source_name,
        res.records.len(),
        res.skipped.len()
    );
    Ok(res)
}

// Splits one line into fields. A blank line has no fields.
fn parse_line(line: &[u8], path: &str) -> RcvResult<StringRecord> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let mut record = StringRecord::new();
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line)
        .read_record(&mut record)
        .context(CsvReadSnafu { path })?;
    Ok(record)
}

// Resolves which columns are rankings for the contest.
fn read_choice_columns(
    header: &StringRecord,
    path: &str,
    contest_id: &str,
    roster: &dyn Roster,
) -> RcvResult<Vec<ChoiceColumn>> {
    ensure!(
        header.len() >= CHOICES_BEGIN_COL,
        TooFewColumnsSnafu {
            path,
            found: header.len()
        }
    );
    let max_rank = roster.max_rankings_allowed();
    let mut res: Vec<ChoiceColumn> = Vec::new();
    for (column, cell) in header.iter().enumerate().skip(CHOICES_BEGIN_COL) {
        let fields: Vec<&str> = cell.split(CHOICE_HEADER_SEPARATOR).collect();
        ensure!(
            fields.len() == CHOICE_HEADER_FIELD_COUNT,
            MalformedChoiceHeaderSnafu {
                path,
                column,
                header: cell
            }
        );
        if fields[CONTEST_NAME_FIELD] != contest_id {
            continue;
        }
        let candidate = fields[CHOICE_NAME_FIELD];
        ensure!(
            roster.is_valid_candidate(candidate),
            UnknownCandidateSnafu { path, candidate }
        );
        let rank = fields[RANK_FIELD]
            .parse::<u32>()
            .ok()
            .filter(|r| *r >= 1)
            .context(InvalidRankSnafu {
                path,
                column,
                rank: fields[RANK_FIELD],
            })?;
        ensure!(
            rank <= max_rank,
            RankExceedsMaxSnafu {
                path,
                rank,
                max: max_rank
            }
        );
        res.push(ChoiceColumn {
            column,
            rank,
            candidate: candidate.to_string(),
        });
    }
    Ok(res)
}
