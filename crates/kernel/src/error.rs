//! Provisioning error types.

use thiserror::Error;

use crate::provision::VersionError;

/// Errors raised by sequencing and the store boundary.
///
/// Step failures never appear here: both orchestrators translate them into
/// their boolean outcome at the run boundary.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Seed-step dependencies form a cycle and cannot be ordered.
    #[error("cyclic seed-step dependency involving: {}", names.join(", "))]
    CyclicDependency {
        /// Names of the steps still in progress when the cycle was hit.
        names: Vec<String>,
    },

    /// A stored account version could not be parsed.
    #[error("invalid stored data version")]
    InvalidVersion(#[from] VersionError),
}
