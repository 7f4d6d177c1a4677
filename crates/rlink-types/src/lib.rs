//! Shared types: the standardized record shape, match configuration, pass
//! identity, score vectors, and the pair types that flow through the
//! pipeline from blocking to resolution.

pub mod config;
pub mod pair;
pub mod pass;
pub mod record;
pub mod schema;
pub mod score;

pub use config::MatchConfig;
pub use pair::{AcceptFlags, AcceptedPair, CandidatePair, Strictness};
pub use pass::{PassId, PassSchema};
pub use record::{FieldValue, Record, RecordTable};
pub use schema::ColumnMap;
pub use score::ScoreVector;
