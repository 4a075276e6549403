//! Query-time ranking of the catalog for the discover page.

mod algorithm;
mod engine;
mod random;

pub use algorithm::Algorithm;
pub use engine::{discover, mixed_score, Candidate, DiscoveryError, DiscoveryRequest, DISCOVERY_LIMIT};
pub use random::{RandomSource, SequenceRandomSource, ThreadRandomSource};
