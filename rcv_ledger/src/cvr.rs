// ********* Input data structures ***********

/// A preference marked by a voter: the candidate code at a given rank.
///
/// Ranks start at 1 (first choice).
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Ranking {
    pub rank: u32,
    pub candidate: String,
}

impl Ranking {
    pub fn new(rank: u32, candidate: &str) -> Ranking {
        Ranking {
            rank,
            candidate: candidate.to_string(),
        }
    }
}

/// The data of one ballot for one contest, as read from a cast vote record export.
///
/// A record is immutable once built. The rankings are kept sorted by rank, and
/// rankings sharing the same rank (overvotes) stay in the order in which they
/// were given.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CastVoteRecord {
    contest_id: String,
    tabulator_id: String,
    ballot_id: String,
    precinct_id: String,
    ballot_style_id: String,
    rankings: Vec<Ranking>,
}

impl CastVoteRecord {
    pub fn new(
        contest_id: &str,
        tabulator_id: &str,
        ballot_id: &str,
        precinct_id: &str,
        ballot_style_id: &str,
        mut rankings: Vec<Ranking>,
    ) -> CastVoteRecord {
        // Stable sort: overvotes keep their column order.
        rankings.sort_by_key(|r| r.rank);
        CastVoteRecord {
            contest_id: contest_id.to_string(),
            tabulator_id: tabulator_id.to_string(),
            ballot_id: ballot_id.to_string(),
            precinct_id: precinct_id.to_string(),
            ballot_style_id: ballot_style_id.to_string(),
            rankings,
        }
    }

    pub fn contest_id(&self) -> &str {
        &self.contest_id
    }

    /// The scan computer (tabulator) that read this ballot.
    pub fn tabulator_id(&self) -> &str {
        &self.tabulator_id
    }

    pub fn ballot_id(&self) -> &str {
        &self.ballot_id
    }

    pub fn precinct_id(&self) -> &str {
        &self.precinct_id
    }

    pub fn ballot_style_id(&self) -> &str {
        &self.ballot_style_id
    }

    /// All the rankings of this ballot, sorted by rank.
    pub fn rankings(&self) -> &[Ranking] {
        &self.rankings
    }

    /// The candidate marked at the lowest rank.
    ///
    /// Returns None if the ballot is blank for this contest, or if several
    /// distinct candidates share the lowest rank (overvote).
    pub fn first_choice(&self) -> Option<&str> {
        let first = self.rankings.first()?;
        let overvoted = self
            .rankings
            .iter()
            .take_while(|r| r.rank == first.rank)
            .any(|r| r.candidate != first.candidate);
        if overvoted {
            None
        } else {
            Some(first.candidate.as_str())
        }
    }
}

// ********* Roster **********

/// The authoritative list of candidates and the rank depth for a contest.
///
/// Implemented by the contest configuration of the caller.
pub trait Roster {
    fn is_valid_candidate(&self, code: &str) -> bool;

    fn max_rankings_allowed(&self) -> u32;
}
