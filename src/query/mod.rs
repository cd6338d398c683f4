//! Queries over a built graph: search, neighborhood expansion, impact,
//! shortest paths and summary statistics.

pub mod service;
pub mod traverse;
pub mod types;

pub use service::{
    module_group, ExpandOptions, GraphQueryService, NO_PATH_FOUND, SOURCE_OR_TARGET_NOT_FOUND,
};
pub use traverse::EdgeFilter;
pub use types::{
    ClusterSize, Direction, EdgeView, ExpansionResult, GraphMetadata, Hub, ImpactResult,
    ModuleCount, PathMatches, PathResult, SearchResult, StatsResult,
};
