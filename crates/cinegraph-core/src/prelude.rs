//! Convenience re-exports.

pub use crate::types::{
    ContextBundle, MovieId, MovieRecord, Rater, RatingStats, Relation, RelationshipPath,
    NO_PLOT, UNKNOWN,
};
