//! Typed descriptors for capability plugins.
//!
//! A descriptor is static metadata plus a factory: sequencing works on the
//! metadata alone, and the orchestrators instantiate the step only when a
//! run actually reaches it.

use std::fmt;
use std::sync::Arc;

use crate::provision::step::{AccountInitializer, AccountUpdater};
use crate::provision::version::DataVersion;

/// Priority assigned when a plugin does not declare one. Higher priorities
/// run earlier among equal-dependency candidates.
pub const DEFAULT_PRIORITY: i32 = 100;

mod sealed {
    pub trait Sealed {}

    impl Sealed for super::InitializerDescriptor {}
    impl Sealed for super::UpdaterDescriptor {}
}

/// Common descriptor surface used by the registry and sequencers.
///
/// Sealed: the engine knows exactly two descriptor flavors, seed steps and
/// update steps.
pub trait Describe: sealed::Sealed + Send + Sync + 'static {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn priority(&self) -> i32;
}

type InitializerFactory = Arc<dyn Fn() -> Arc<dyn AccountInitializer> + Send + Sync>;
type UpdaterFactory = Arc<dyn Fn() -> Arc<dyn AccountUpdater> + Send + Sync>;

/// Descriptor for a seed step.
#[derive(Clone)]
pub struct InitializerDescriptor {
    name: String,
    description: String,
    priority: i32,
    dependencies: Vec<String>,
    factory: InitializerFactory,
}

impl InitializerDescriptor {
    pub fn new<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn AccountInitializer> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: String::new(),
            priority: DEFAULT_PRIORITY,
            dependencies: Vec::new(),
            factory: Arc::new(factory),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Names of seed steps that must run before this one.
    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Build a fresh step instance for this run.
    pub fn instantiate(&self) -> Arc<dyn AccountInitializer> {
        (self.factory)()
    }
}

impl Describe for InitializerDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

impl fmt::Debug for InitializerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitializerDescriptor")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

/// Descriptor for an update step: advances account data from exactly
/// `from_version` to `to_version`.
#[derive(Clone)]
pub struct UpdaterDescriptor {
    name: String,
    description: String,
    priority: i32,
    from_version: DataVersion,
    to_version: DataVersion,
    factory: UpdaterFactory,
}

impl UpdaterDescriptor {
    pub fn new<F>(
        name: impl Into<String>,
        from_version: DataVersion,
        to_version: DataVersion,
        factory: F,
    ) -> Self
    where
        F: Fn() -> Arc<dyn AccountUpdater> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: String::new(),
            priority: DEFAULT_PRIORITY,
            from_version,
            to_version,
            factory: Arc::new(factory),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn from_version(&self) -> &DataVersion {
        &self.from_version
    }

    pub fn to_version(&self) -> &DataVersion {
        &self.to_version
    }

    /// Build a fresh step instance for this run.
    pub fn instantiate(&self) -> Arc<dyn AccountUpdater> {
        (self.factory)()
    }
}

impl Describe for UpdaterDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

impl fmt::Debug for UpdaterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdaterDescriptor")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("from_version", &self.from_version)
            .field("to_version", &self.to_version)
            .finish_non_exhaustive()
    }
}
