//! Run-order resolution for seed and update steps.

use std::collections::HashMap;

use tracing::warn;

use crate::error::ProvisionError;
use crate::provision::descriptor::{Describe, InitializerDescriptor, UpdaterDescriptor};
use crate::provision::registry::Registry;

/// Marking for the dependency walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Compute the seed-step run order.
///
/// Candidates are seeded in priority-descending order (name ascending as a
/// deterministic tiebreak); each candidate's registered dependencies are
/// placed before it, even when a dependency's own priority is lower.
/// Dependencies that are not registered are skipped with a warning rather
/// than failing the run. A dependency cycle is a hard error.
pub fn initializer_order(
    registry: &Registry<InitializerDescriptor>,
) -> Result<Vec<InitializerDescriptor>, ProvisionError> {
    let mut seeds: Vec<&InitializerDescriptor> = registry.iter().collect();
    seeds.sort_by(|a, b| {
        b.priority()
            .cmp(&a.priority())
            .then_with(|| a.name().cmp(b.name()))
    });

    let mut marks: HashMap<&str, Mark> = HashMap::new();
    let mut order = Vec::with_capacity(registry.len());

    for descriptor in seeds {
        place(registry, descriptor, &mut marks, &mut order)?;
    }

    Ok(order)
}

fn place<'r>(
    registry: &'r Registry<InitializerDescriptor>,
    descriptor: &'r InitializerDescriptor,
    marks: &mut HashMap<&'r str, Mark>,
    order: &mut Vec<InitializerDescriptor>,
) -> Result<(), ProvisionError> {
    match marks.get(descriptor.name()) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::InProgress) => {
            let mut names: Vec<String> = marks
                .iter()
                .filter(|(_, mark)| **mark == Mark::InProgress)
                .map(|(name, _)| (*name).to_string())
                .collect();
            names.sort();
            return Err(ProvisionError::CyclicDependency { names });
        }
        None => {}
    }

    marks.insert(descriptor.name(), Mark::InProgress);

    for dependency in descriptor.dependencies() {
        match registry.get(dependency) {
            Some(dep_descriptor) => place(registry, dep_descriptor, marks, order)?,
            None => {
                warn!(
                    step = descriptor.name(),
                    dependency = %dependency,
                    "declared dependency is not registered; omitting it from the run"
                );
            }
        }
    }

    marks.insert(descriptor.name(), Mark::Done);
    order.push(descriptor.clone());
    Ok(())
}

/// Compute the update-step scan order: ascending by `(from_version,
/// priority)`, version first, name as a final deterministic tiebreak.
///
/// The result is monotonically non-decreasing in `from_version`, which the
/// chain-advance loop relies on.
pub fn updater_order(registry: &Registry<UpdaterDescriptor>) -> Vec<UpdaterDescriptor> {
    let mut steps: Vec<UpdaterDescriptor> = registry.iter().cloned().collect();
    steps.sort_by(|a, b| {
        a.from_version()
            .cmp(b.from_version())
            .then_with(|| a.priority().cmp(&b.priority()))
            .then_with(|| a.name().cmp(b.name()))
    });
    steps
}
