use crate::rcv::io_clear_ballot::RowErrorPolicy;
use crate::rcv::*;

use log::debug;
use rcv_ledger::Roster;
use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use std::collections::HashSet;
use std::fs;

/// The name of the Clear Ballot provider in the configuration files.
pub const CLEAR_BALLOT_PROVIDER: &str = "clearBallot";

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "contestDate")]
    pub contest_date: Option<String>,
    #[serde(rename = "contestJurisdiction")]
    pub contest_juridiction: Option<String>,
    #[serde(rename = "contestOffice")]
    pub contest_office: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "contestId")]
    pub contest_id: Option<String>,
    // New option: what to do with the malformed data rows.
    #[serde(rename = "rowErrorPolicy")]
    pub row_error_policy: Option<String>,
}

impl FileSource {
    pub fn contest_id(&self) -> RcvResult<&str> {
        self.contest_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .context(MissingContestIdSnafu {
                path: self.file_path.clone(),
            })
    }

    pub fn row_error_policy(&self) -> RcvResult<RowErrorPolicy> {
        match self.row_error_policy.as_deref() {
            None | Some("abort") => Ok(RowErrorPolicy::Abort),
            Some("skip") => Ok(RowErrorPolicy::SkipAndCollect),
            Some(x) => InvalidRowErrorPolicySnafu {
                policy: x.to_string(),
            }
            .fail(),
        }
    }

    pub fn check_provider(&self) -> RcvResult<()> {
        ensure!(
            self.provider == CLEAR_BALLOT_PROVIDER,
            UnsupportedProviderSnafu {
                provider: self.provider.clone()
            }
        );
        Ok(())
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RcvCandidate {
    pub name: String,
    pub code: Option<String>,
    pub excluded: Option<bool>,
}

impl RcvCandidate {
    /// The code used in the cast vote records. Defaults to the name.
    pub fn code(&self) -> &str {
        match self.code.as_deref() {
            Some(c) if !c.is_empty() => c,
            _ => self.name.as_str(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RcvRules {
    #[serde(rename = "maxRankingsAllowed")]
    pub max_rankings_allowed: JSValue,
    #[serde(rename = "rulesDescription")]
    pub rules_description: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RcvConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "cvrFileSources")]
    pub cvr_file_sources: Vec<FileSource>,
    pub candidates: Vec<RcvCandidate>,
    pub rules: RcvRules,
}

pub fn read_config(path: &str) -> RcvResult<RcvConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu {
        path: path.to_string(),
    })?;
    let config: RcvConfig = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    Ok(config)
}

/// The candidates and rank limit of a contest, validated from the configuration.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ContestRoster {
    candidate_codes: HashSet<String>,
    max_rankings: u32,
}

impl ContestRoster {
    pub fn from_config(config: &RcvConfig) -> RcvResult<ContestRoster> {
        let candidate_codes: HashSet<String> = config
            .candidates
            .iter()
            .map(|c| c.code().to_string())
            .collect();
        let max_rankings = match &config.rules.max_rankings_allowed {
            // "max" means as many ranks as there are candidates
            JSValue::String(s) if s == "max" => candidate_codes.len() as u32,
            x => read_js_int(x)?,
        };
        ensure!(
            max_rankings > 0,
            InvalidMaxRankingsSnafu {
                value: config.rules.max_rankings_allowed.to_string()
            }
        );
        debug!(
            "ContestRoster: {} candidates, max rankings: {}",
            candidate_codes.len(),
            max_rankings
        );
        Ok(ContestRoster {
            candidate_codes,
            max_rankings,
        })
    }
}

impl Roster for ContestRoster {
    fn is_valid_candidate(&self, code: &str) -> bool {
        self.candidate_codes.contains(code)
    }

    fn max_rankings_allowed(&self) -> u32 {
        self.max_rankings
    }
}

fn read_js_int(x: &JSValue) -> RcvResult<u32> {
    let res = match x {
        JSValue::Number(n) => n.as_u64().and_then(|x| u32::try_from(x).ok()),
        JSValue::String(s) => s.parse::<u32>().ok(),
        _ => None,
    };
    res.context(InvalidMaxRankingsSnafu {
        value: x.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_rankings: &str) -> RcvConfig {
        let js = format!(
            r#"{{
            "outputSettings": {{ "contestName": "Mayor" }},
            "cvrFileSources": [
                {{ "provider": "clearBallot", "filePath": "cvr.csv", "contestId": "Mayor" }}
            ],
            "candidates": [
                {{ "name": "Alice Adams", "code": "ALICE" }},
                {{ "name": "Bob" }},
                {{ "name": "Carol", "code": "", "excluded": true }}
            ],
            "rules": {{ "maxRankingsAllowed": {} }}
        }}"#,
            max_rankings
        );
        serde_json::from_str(&js).unwrap()
    }

    #[test]
    fn candidate_codes() {
        let roster = ContestRoster::from_config(&config("3")).unwrap();
        assert!(roster.is_valid_candidate("ALICE"));
        assert!(!roster.is_valid_candidate("Alice Adams"));
        assert!(roster.is_valid_candidate("Bob"));
        assert!(roster.is_valid_candidate("Carol"));
        assert!(!roster.is_valid_candidate("Dave"));
    }

    #[test]
    fn max_rankings_forms() {
        let r = ContestRoster::from_config(&config("2")).unwrap();
        assert_eq!(r.max_rankings_allowed(), 2);
        let r = ContestRoster::from_config(&config("\"5\"")).unwrap();
        assert_eq!(r.max_rankings_allowed(), 5);
        let r = ContestRoster::from_config(&config("\"max\"")).unwrap();
        assert_eq!(r.max_rankings_allowed(), 3);
    }

    #[test]
    fn max_rankings_invalid() {
        for x in ["0", "\"zero\"", "-1", "null"] {
            let res = ContestRoster::from_config(&config(x));
            assert!(
                matches!(res, Err(RcvError::InvalidMaxRankings { .. })),
                "{}: {:?}",
                x,
                res
            );
        }
    }

    #[test]
    fn file_source_options() {
        let c = config("3");
        let fs = &c.cvr_file_sources[0];
        assert!(fs.check_provider().is_ok());
        assert_eq!(fs.contest_id().unwrap(), "Mayor");
        assert_eq!(fs.row_error_policy().unwrap(), RowErrorPolicy::Abort);

        let mut other = fs.clone();
        other.provider = "ess".to_string();
        other.contest_id = None;
        other.row_error_policy = Some("skip".to_string());
        assert!(matches!(
            other.check_provider(),
            Err(RcvError::UnsupportedProvider { .. })
        ));
        assert!(matches!(
            other.contest_id(),
            Err(RcvError::MissingContestId { .. })
        ));
        assert_eq!(
            other.row_error_policy().unwrap(),
            RowErrorPolicy::SkipAndCollect
        );
        other.row_error_policy = Some("ignore".to_string());
        assert!(other.row_error_policy().is_err());
    }
}
