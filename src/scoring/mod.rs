//! Candidate scoring: fuses ANN score, per-field cosine similarity, keyword overlap and
//! token boosts into a single normalized ranking score, in two selectable variants.

pub mod error;
pub mod scorer;
pub mod types;

pub use error::ScoringError;
pub use scorer::{CandidateScorer, ScoringInput};
pub use types::Candidate;
