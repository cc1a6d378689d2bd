use thiserror::Error;

/// Error kinds surfaced by the simulation core.
///
/// None of these escape `run_simulation`: the boundary wrapper converts any
/// failure into an empty report carrying the rendered message.
#[derive(Debug, Error)]
pub enum SimError {
    /// An impact key was requested that is not in the reference table.
    #[error("unknown impact category: {0}")]
    UnknownCategory(String),

    /// Sampling failed for one category. Fatal to the run; partial reports
    /// are never emitted.
    #[error("sampling failed for {category}: {cause}")]
    Sampler { category: String, cause: String },

    /// Reserved. The normaliser defaults silently today, so this is never
    /// constructed by the current contract.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The cancellation flag was raised between categories.
    #[error("simulation cancelled")]
    Cancelled,

    /// A study was driven through an illegal state transition.
    #[error("invalid study transition: {from} -> {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
}
