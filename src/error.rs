/*
 * Error Module
 *
 * Configuration errors raised while building a simulation. Everything that
 * can go wrong at runtime (degenerate headings, obstacles without samples)
 * is recovered inside the step, so construction is the only fallible point.
 */

use thiserror::Error;

use crate::agent::AgentId;

/// Errors that can occur when loading a configuration or constructing a simulation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A value that must be strictly positive (and finite) was not.
    #[error("{field} must be positive and finite, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    /// A value fell outside its allowed range.
    #[error("{field} must lie in {range}, got {value}")]
    OutOfRange {
        field: &'static str,
        range: &'static str,
        value: f64,
    },

    /// The crowding sector must fit inside the neighborhood sector.
    #[error("crowding radius {crowding} exceeds neighborhood radius {neighborhood}")]
    CrowdingExceedsNeighborhood { crowding: f64, neighborhood: f64 },

    /// Both heading blend weights are zero, so the blend is undefined.
    #[error("w_self + w_avg must be positive")]
    ZeroWeights,

    /// Two agents share an id.
    #[error("duplicate agent id {0}")]
    DuplicateAgentId(AgentId),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}
