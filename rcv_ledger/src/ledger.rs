use log::debug;
use rust_decimal::Decimal;

use std::collections::BTreeMap;
use std::fmt::Display;

// ******** Output data structures *********

pub type RoundId = u32;

/// Where some vote value came from during a round.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub enum TransferSource {
    /// Votes that had no prior recipient: the initial count of a ballot.
    Uncounted,
    Candidate(String),
}

/// Where some vote value went during a round.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub enum TransferTarget {
    Candidate(String),
    /// The vote value cannot go to any remaining candidate.
    Exhausted,
}

impl From<Option<&str>> for TransferSource {
    fn from(code: Option<&str>) -> Self {
        match code {
            Some(c) => TransferSource::Candidate(c.to_string()),
            None => TransferSource::Uncounted,
        }
    }
}

impl From<Option<&str>> for TransferTarget {
    fn from(code: Option<&str>) -> Self {
        match code {
            Some(c) => TransferTarget::Candidate(c.to_string()),
            None => TransferTarget::Exhausted,
        }
    }
}

impl Display for TransferSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferSource::Uncounted => write!(f, "uncounted"),
            TransferSource::Candidate(c) => write!(f, "{}", c),
        }
    }
}

impl Display for TransferTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferTarget::Exhausted => write!(f, "exhausted"),
            TransferTarget::Candidate(c) => write!(f, "{}", c),
        }
    }
}

/// All the transfers of one round: source -> (target -> cumulated value).
pub type RoundTransfers = BTreeMap<TransferSource, BTreeMap<TransferTarget, Decimal>>;

/// Summary of the vote transfers that happened in each round of a tabulation.
///
/// The ledger only accumulates: recording a transfer for an existing
/// (round, source, target) adds to the stored value, and nothing is ever removed.
/// It is mostly used as the input of transfer (Sankey) visualizations, and to
/// cross-check the bookkeeping of the tabulation.
///
/// ```
/// use rcv_ledger::{TransferLedger, TransferSource, TransferTarget};
/// use rust_decimal::Decimal;
///
/// let mut ledger = TransferLedger::new();
/// ledger.record(1, None, Some("Alice"), Decimal::from(100));
/// ledger.record(1, None, Some("Alice"), Decimal::from(50));
/// ledger.record(2, Some("Bob"), None, Decimal::from(30));
///
/// let round1 = ledger.transfers_for_round(1).unwrap();
/// let alice = TransferTarget::Candidate("Alice".to_string());
/// assert_eq!(round1[&TransferSource::Uncounted][&alice], Decimal::from(150));
/// assert!(ledger.transfers_for_round(99).is_none());
/// ```
#[derive(PartialEq, Debug, Clone, Default)]
pub struct TransferLedger {
    rounds: BTreeMap<RoundId, RoundTransfers>,
}

impl TransferLedger {
    pub fn new() -> TransferLedger {
        TransferLedger::default()
    }

    /// Adds a transfer of `value` in the given round.
    ///
    /// A missing source means the initial count of the votes, a missing
    /// target means that the votes got exhausted.
    pub fn record(
        &mut self,
        round: RoundId,
        source: Option<&str>,
        target: Option<&str>,
        value: Decimal,
    ) {
        self.record_transfer(round, source.into(), target.into(), value)
    }

    pub fn record_transfer(
        &mut self,
        round: RoundId,
        source: TransferSource,
        target: TransferTarget,
        value: Decimal,
    ) {
        debug_assert!(round >= 1, "rounds start at 1");
        debug_assert!(!value.is_sign_negative(), "negative transfer {}", value);
        debug!(
            "record_transfer: round {:?}: {} -> {}: {}",
            round, source, target, value
        );
        let cell = self
            .rounds
            .entry(round)
            .or_default()
            .entry(source)
            .or_default()
            .entry(target)
            .or_insert(Decimal::ZERO);
        *cell += value;
    }

    /// The transfers recorded for this round, or None if nothing was recorded.
    pub fn transfers_for_round(&self, round: RoundId) -> Option<&RoundTransfers> {
        self.rounds.get(&round)
    }

    /// The rounds with recorded transfers, in increasing order.
    pub fn rounds(&self) -> Vec<RoundId> {
        self.rounds.keys().cloned().collect()
    }

    /// Total value that left the given source in this round.
    pub fn total_from(&self, round: RoundId, source: &TransferSource) -> Decimal {
        self.rounds
            .get(&round)
            .and_then(|rt| rt.get(source))
            .map(|targets| targets.values().sum::<Decimal>())
            .unwrap_or(Decimal::ZERO)
    }

    /// Total value received by the given target in this round.
    pub fn total_into(&self, round: RoundId, target: &TransferTarget) -> Decimal {
        self.rounds
            .get(&round)
            .map(|rt| {
                rt.values()
                    .filter_map(|targets| targets.get(target))
                    .sum::<Decimal>()
            })
            .unwrap_or(Decimal::ZERO)
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn cand(name: &str) -> TransferTarget {
        TransferTarget::Candidate(name.to_string())
    }

    fn src(name: &str) -> TransferSource {
        TransferSource::Candidate(name.to_string())
    }

    #[test]
    fn initial_count_accumulates() {
        init();
        let mut ledger = TransferLedger::new();
        ledger.record(1, None, Some("Alice"), dec!(100));
        ledger.record(1, None, Some("Alice"), dec!(50));
        let round = ledger.transfers_for_round(1).unwrap();
        assert_eq!(round[&TransferSource::Uncounted][&cand("Alice")], dec!(150));
    }

    #[test]
    fn missing_target_is_exhausted() {
        init();
        let mut ledger = TransferLedger::new();
        ledger.record(2, Some("Bob"), None, dec!(30));
        let round = ledger.transfers_for_round(2).unwrap();
        assert_eq!(round[&src("Bob")][&TransferTarget::Exhausted], dec!(30));
    }

    #[test]
    fn unknown_round_is_none() {
        let mut ledger = TransferLedger::new();
        assert!(ledger.transfers_for_round(99).is_none());
        ledger.record(1, None, Some("Alice"), dec!(1));
        assert!(ledger.transfers_for_round(99).is_none());
        assert_eq!(ledger.total_from(99, &TransferSource::Uncounted), dec!(0));
    }

    #[test]
    fn candidates_named_like_sentinels() {
        let mut ledger = TransferLedger::new();
        ledger.record(1, Some("uncounted"), Some("exhausted"), dec!(2));
        ledger.record(1, None, None, dec!(5));
        let round = ledger.transfers_for_round(1).unwrap();
        assert_eq!(round.len(), 2);
        assert_eq!(round[&src("uncounted")][&cand("exhausted")], dec!(2));
        assert_eq!(
            round[&TransferSource::Uncounted][&TransferTarget::Exhausted],
            dec!(5)
        );
    }

    #[test]
    fn fractional_values_are_exact() {
        let mut ledger = TransferLedger::new();
        for _ in 0..10 {
            ledger.record(3, Some("Carol"), Some("Alice"), dec!(0.1));
        }
        ledger.record(3, Some("Carol"), None, dec!(0.3333));
        assert_eq!(
            ledger.transfers_for_round(3).unwrap()[&src("Carol")][&cand("Alice")],
            dec!(1.0)
        );
        assert_eq!(ledger.total_from(3, &src("Carol")), dec!(1.3333));
    }

    #[test]
    fn totals_cross_check() {
        let mut ledger = TransferLedger::new();
        ledger.record(2, Some("Carol"), Some("Alice"), dec!(12));
        ledger.record(2, Some("Carol"), Some("Bob"), dec!(7));
        ledger.record(2, Some("Carol"), None, dec!(3));
        ledger.record(2, Some("Dave"), Some("Alice"), dec!(4));
        assert_eq!(ledger.total_from(2, &src("Carol")), dec!(22));
        assert_eq!(ledger.total_into(2, &cand("Alice")), dec!(16));
        assert_eq!(ledger.total_into(2, &TransferTarget::Exhausted), dec!(3));
        assert_eq!(ledger.total_into(1, &cand("Alice")), dec!(0));
    }

    #[test]
    fn rounds_are_ordered() {
        let mut ledger = TransferLedger::new();
        assert!(ledger.is_empty());
        ledger.record(3, Some("A"), None, dec!(1));
        ledger.record(1, None, Some("A"), dec!(1));
        ledger.record(2, Some("B"), Some("A"), dec!(1));
        assert_eq!(ledger.rounds(), vec![1, 2, 3]);
        assert!(!ledger.is_empty());
    }

    #[test]
    fn labels() {
        assert_eq!(TransferSource::Uncounted.to_string(), "uncounted");
        assert_eq!(TransferTarget::Exhausted.to_string(), "exhausted");
        assert_eq!(src("Bob").to_string(), "Bob");
        assert_eq!(cand("Alice").to_string(), "Alice");
    }
}
