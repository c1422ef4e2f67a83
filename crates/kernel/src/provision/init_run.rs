//! Initialization orchestrator: ordered seed steps with saga compensation.
//!
//! There is deliberately no transaction around the whole run. Steps may
//! commit independently (some call non-transactional external systems), so
//! undo is a compensating walk over the steps that succeeded, in reverse,
//! each reversing only what it is known to have done.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::account::AccountId;
use crate::provision::context::ExecutionContext;
use crate::provision::descriptor::{Describe, InitializerDescriptor};
use crate::provision::registry::Registry;
use crate::provision::sequence;
use crate::provision::step::AccountInitializer;

/// Lifecycle of a single provisioning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Pending,
    Running,
    /// A step failed; previously succeeded steps are being compensated.
    Compensating,
    Succeeded,
    Failed,
}

/// Steps that completed, in execution order. Consumed only by the
/// compensation walk and dropped with the run.
type RunOutcome = Vec<(InitializerDescriptor, Arc<dyn AccountInitializer>)>;

pub(crate) async fn run(
    registry: &Registry<InitializerDescriptor>,
    account_id: AccountId,
    ctx: &mut ExecutionContext,
) -> bool {
    let mut state = RunState::Pending;
    debug!(account = %account_id, state = ?state, "seed run created");

    if registry.is_empty() {
        debug!(account = %account_id, "no seed steps registered; nothing to do");
        return true;
    }

    let order = match sequence::initializer_order(registry) {
        Ok(order) => order,
        Err(err) => {
            error!(account = %account_id, error = %err, "cannot sequence seed steps");
            return false;
        }
    };

    state = RunState::Running;
    debug!(account = %account_id, steps = order.len(), state = ?state, "starting seed run");

    let mut succeeded: RunOutcome = Vec::with_capacity(order.len());
    let mut failure: Option<String> = None;

    for descriptor in &order {
        let step = descriptor.instantiate();
        debug!(account = %account_id, step = descriptor.name(), "running seed step");

        match step.initialize(account_id, ctx).await {
            Ok(true) => succeeded.push((descriptor.clone(), step)),
            Ok(false) => {
                warn!(
                    account = %account_id,
                    step = descriptor.name(),
                    "seed step reported failure"
                );
                failure = Some(descriptor.name().to_string());
                break;
            }
            Err(err) => {
                warn!(
                    account = %account_id,
                    step = descriptor.name(),
                    error = %err,
                    "seed step failed"
                );
                failure = Some(descriptor.name().to_string());
                break;
            }
        }
    }

    let Some(failed_step) = failure else {
        state = RunState::Succeeded;
        info!(
            account = %account_id,
            steps = succeeded.len(),
            state = ?state,
            "account data initialized"
        );
        return true;
    };

    state = RunState::Compensating;
    info!(
        account = %account_id,
        failed_step = %failed_step,
        compensating = succeeded.len(),
        state = ?state,
        "compensating previously succeeded seed steps"
    );

    for (descriptor, step) in succeeded.iter().rev() {
        match step.cleanup(account_id, ctx).await {
            Ok(true) => {
                debug!(account = %account_id, step = descriptor.name(), "seed step compensated");
            }
            Ok(false) => {
                warn!(
                    account = %account_id,
                    step = descriptor.name(),
                    "cleanup reported failure; continuing compensation"
                );
            }
            Err(err) => {
                warn!(
                    account = %account_id,
                    step = descriptor.name(),
                    error = %err,
                    "cleanup failed; continuing compensation"
                );
            }
        }
    }

    state = RunState::Failed;
    warn!(account = %account_id, failed_step = %failed_step, state = ?state, "seed run failed");
    false
}
