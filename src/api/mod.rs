pub mod classifier;
pub mod types;

pub use classifier::{Classify, ClassifierClient, ClassifierError};
pub use types::*;
