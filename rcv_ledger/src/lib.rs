/*!
Data structures shared by the cast vote record readers and the tabulation.

- [`CastVoteRecord`] and [`Ranking`] hold the normalized content of one ballot
  for one contest. The rankings of a record are always sorted by rank.
- [`Roster`] is the view of the contest configuration needed to validate
  ballots: which candidate codes exist, and how many ranks a ballot may have.
- [`TransferLedger`] accumulates, round by round, the vote value moving between
  candidates. The initial count comes from [`TransferSource::Uncounted`] and
  the votes that cannot be transferred go to [`TransferTarget::Exhausted`].

All the vote values are exact decimals ([`rust_decimal::Decimal`]).
*/

mod cvr;
mod ledger;

pub use crate::cvr::*;
pub use crate::ledger::*;
