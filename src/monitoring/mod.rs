pub mod history;
pub mod reporter;

pub use history::{VerdictHistory, VerdictRecord};
pub use reporter::VerdictReporter;
