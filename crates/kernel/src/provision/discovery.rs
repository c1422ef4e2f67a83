//! Plugin discovery: built-ins plus installed extensions.
//!
//! Registration happens only at bootstrap. The fixed built-in namespace
//! (`provision::builtin`) contributes first, then every installed
//! extension in list order through [`ExtensionHooks`]. A hook that fails
//! is logged and skipped; it never aborts discovery of the remaining
//! extensions. Discovery is a pure function of its inputs, so running it
//! again yields the same registries.

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use crate::provision::builtin;
use crate::provision::descriptor::{InitializerDescriptor, UpdaterDescriptor};
use crate::provision::registry::{Registry, RegistryBuilder};

/// Hooks an installed extension may implement to contribute account steps.
///
/// Both hooks default to an empty list: an extension that ships no account
/// steps is not an error.
pub trait ExtensionHooks: Send + Sync {
    /// Extension machine name, used for logging only.
    fn name(&self) -> &str;

    fn account_initializers(&self) -> Result<Vec<InitializerDescriptor>> {
        Ok(Vec::new())
    }

    fn account_updaters(&self) -> Result<Vec<UpdaterDescriptor>> {
        Ok(Vec::new())
    }
}

/// Collect seed-step descriptors from built-ins and every extension.
pub fn discover_initializers(
    extensions: &[Arc<dyn ExtensionHooks>],
) -> Registry<InitializerDescriptor> {
    let mut builder = RegistryBuilder::new();

    for descriptor in builtin::initializers() {
        builder.register(descriptor);
    }

    for extension in extensions {
        match extension.account_initializers() {
            Ok(descriptors) => {
                debug!(
                    extension = extension.name(),
                    count = descriptors.len(),
                    "collected account initializers"
                );
                for descriptor in descriptors {
                    builder.register(descriptor);
                }
            }
            Err(err) => {
                warn!(
                    extension = extension.name(),
                    error = %err,
                    "skipping extension account initializers"
                );
            }
        }
    }

    builder.build()
}

/// Collect update-step descriptors from built-ins and every extension.
pub fn discover_updaters(extensions: &[Arc<dyn ExtensionHooks>]) -> Registry<UpdaterDescriptor> {
    let mut builder = RegistryBuilder::new();

    for descriptor in builtin::updaters() {
        builder.register(descriptor);
    }

    for extension in extensions {
        match extension.account_updaters() {
            Ok(descriptors) => {
                debug!(
                    extension = extension.name(),
                    count = descriptors.len(),
                    "collected account updaters"
                );
                for descriptor in descriptors {
                    builder.register(descriptor);
                }
            }
            Err(err) => {
                warn!(
                    extension = extension.name(),
                    error = %err,
                    "skipping extension account updaters"
                );
            }
        }
    }

    builder.build()
}
