pub mod vote;

pub use vote::{Verdict, VoteAggregator, WindowPolicy};
