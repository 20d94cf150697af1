// JSON outputs: the parsed cast vote records and the vote transfers.

use std::fs;
use std::path::Path;

use log::{debug, info, warn};
use rcv_ledger::{CastVoteRecord, TransferLedger};
use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use snafu::prelude::*;
use text_diff::print_diff;

use crate::rcv::*;

pub fn records_to_json(records: &[CastVoteRecord]) -> JSValue {
    let l: Vec<JSValue> = records
        .iter()
        .map(|cvr| {
            let rankings: Vec<JSValue> = cvr
                .rankings()
                .iter()
                .map(|r| json!({"rank": r.rank, "candidate": r.candidate}))
                .collect();
            json!({
                "contestId": cvr.contest_id(),
                "tabulatorId": cvr.tabulator_id(),
                "ballotId": cvr.ballot_id(),
                "precinctId": cvr.precinct_id(),
                "ballotStyleId": cvr.ballot_style_id(),
                "rankings": rankings,
            })
        })
        .collect();
    JSValue::Array(l)
}

/// round -> source -> target -> value, with the values as decimal strings.
pub fn ledger_to_json(ledger: &TransferLedger) -> JSValue {
    let mut res: JSMap<String, JSValue> = JSMap::new();
    for round in ledger.rounds() {
        let mut sources: JSMap<String, JSValue> = JSMap::new();
        if let Some(round_transfers) = ledger.transfers_for_round(round) {
            for (source, targets) in round_transfers.iter() {
                let mut transfers: JSMap<String, JSValue> = JSMap::new();
                for (target, value) in targets.iter() {
                    transfers.insert(target.to_string(), json!(value.to_string()));
                }
                sources.insert(source.to_string(), JSValue::Object(transfers));
            }
        }
        res.insert(round.to_string(), JSValue::Object(sources));
    }
    JSValue::Object(res)
}

pub fn write_json_file(path: &Path, js: &JSValue) -> RcvResult<()> {
    let p = path.display().to_string();
    let pretty = serde_json::to_string_pretty(js).context(SerializingJsonSnafu {})?;
    fs::write(path, pretty).context(WritingOutputSnafu { path: p.clone() })?;
    info!("Successfully saved file: {}", p);
    Ok(())
}

pub fn write_json_stdout(name: &str, js: &JSValue) -> RcvResult<()> {
    let pretty = serde_json::to_string_pretty(js).context(SerializingJsonSnafu {})?;
    println!("{}:{}", name, pretty);
    Ok(())
}

/// Compares the transfers with a reference file and prints the differences.
pub fn check_reference(reference_path: &str, transfers_js: &JSValue) -> RcvResult<()> {
    let contents = fs::read_to_string(reference_path).context(OpeningJsonSnafu {
        path: reference_path,
    })?;
    let reference: JSValue = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    debug!("check_reference: reference: {:?}", reference);

    let pretty_ref = serde_json::to_string_pretty(&reference).context(SerializingJsonSnafu {})?;
    let pretty_stats = serde_json::to_string_pretty(transfers_js).context(SerializingJsonSnafu {})?;
    if pretty_ref != pretty_stats {
        warn!("Found differences with the reference string");
        print_diff(pretty_ref.as_str(), pretty_stats.as_str(), "\n");
        return ReferenceMismatchSnafu {
            path: reference_path,
        }
        .fail();
    }
    Ok(())
}
