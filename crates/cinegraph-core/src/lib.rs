//! # Cinegraph Core
//!
//! Shared data model for graph-augmented retrieval.
//!
//! Every stage of the pipeline speaks in these types:
//! - [`MovieRecord`] - one entity with attributes, relationship name lists
//!   and aggregated rating statistics
//! - [`RelationshipPath`] - a textual edge rendering used only in prompts
//! - [`ContextBundle`] - the per-query aggregation handed to the composer

pub mod prelude;
pub mod types;

pub use types::{
    ContextBundle, MovieId, MovieRecord, Rater, RatingStats, Relation, RelationshipPath,
    NO_PLOT, UNKNOWN,
};
