//! The tracker logic that does not depend on storage: the [ledger::CompletionLedger], the
//! [visibility] computation of the main list and the day count label.

pub mod day_count;
pub mod ledger;
pub mod visibility;
