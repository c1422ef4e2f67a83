//! Test fixtures shared by the orchestrator and sequencing tests.

// Tests are allowed to use unwrap/expect freely.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::account::AccountId;
use crate::provision::context::ExecutionContext;
use crate::provision::descriptor::{InitializerDescriptor, UpdaterDescriptor};
use crate::provision::step::{AccountInitializer, AccountUpdater};

/// Shared, ordered record of step invocations.
#[derive(Clone, Default)]
pub(crate) struct CallLog {
    calls: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub(crate) fn push(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

/// What a scripted step does when invoked.
#[derive(Clone, Copy)]
pub(crate) enum StepOutcome {
    Ok,
    ReportFalse,
    Error,
}

impl StepOutcome {
    fn into_result(self, step: &str) -> Result<bool> {
        match self {
            StepOutcome::Ok => Ok(true),
            StepOutcome::ReportFalse => Ok(false),
            StepOutcome::Error => Err(anyhow!("scripted failure in {step}")),
        }
    }
}

/// Initializer that always succeeds silently.
pub(crate) struct NoopInitializer;

#[async_trait]
impl AccountInitializer for NoopInitializer {
    async fn initialize(
        &self,
        _account_id: AccountId,
        _ctx: &mut ExecutionContext,
    ) -> Result<bool> {
        Ok(true)
    }
}

/// Updater that always succeeds silently.
pub(crate) struct NoopUpdater;

#[async_trait]
impl AccountUpdater for NoopUpdater {
    async fn apply(&self, _account_id: AccountId, _ctx: &mut ExecutionContext) -> Result<bool> {
        Ok(true)
    }
}

struct RecordingInitializer {
    name: String,
    log: CallLog,
    initialize: StepOutcome,
    cleanup: StepOutcome,
}

#[async_trait]
impl AccountInitializer for RecordingInitializer {
    async fn initialize(
        &self,
        _account_id: AccountId,
        _ctx: &mut ExecutionContext,
    ) -> Result<bool> {
        self.log.push(format!("{}.initialize", self.name));
        self.initialize.into_result(&self.name)
    }

    async fn cleanup(&self, _account_id: AccountId, _ctx: &mut ExecutionContext) -> Result<bool> {
        self.log.push(format!("{}.cleanup", self.name));
        self.cleanup.into_result(&self.name)
    }
}

struct RecordingUpdater {
    name: String,
    log: CallLog,
    apply: StepOutcome,
}

#[async_trait]
impl AccountUpdater for RecordingUpdater {
    async fn apply(&self, _account_id: AccountId, _ctx: &mut ExecutionContext) -> Result<bool> {
        self.log.push(format!("{}.apply", self.name));
        self.apply.into_result(&self.name)
    }

    async fn rollback(&self, _account_id: AccountId, _ctx: &mut ExecutionContext) -> Result<bool> {
        self.log.push(format!("{}.rollback", self.name));
        Ok(true)
    }
}

/// Descriptor for a scripted seed step whose cleanup always succeeds.
pub(crate) fn recording_initializer(
    name: &str,
    priority: i32,
    dependencies: Vec<&str>,
    log: &CallLog,
    initialize: StepOutcome,
) -> InitializerDescriptor {
    recording_initializer_with_cleanup(
        name,
        priority,
        dependencies,
        log,
        initialize,
        StepOutcome::Ok,
    )
}

/// Descriptor for a scripted seed step with a scripted cleanup as well.
pub(crate) fn recording_initializer_with_cleanup(
    name: &str,
    priority: i32,
    dependencies: Vec<&str>,
    log: &CallLog,
    initialize: StepOutcome,
    cleanup: StepOutcome,
) -> InitializerDescriptor {
    let step = Arc::new(RecordingInitializer {
        name: name.to_string(),
        log: log.clone(),
        initialize,
        cleanup,
    });

    InitializerDescriptor::new(name, move || {
        let instance: Arc<dyn AccountInitializer> = step.clone();
        instance
    })
    .with_priority(priority)
    .with_dependencies(dependencies)
}

/// Descriptor for a scripted update step.
pub(crate) fn recording_updater(
    name: &str,
    from: &str,
    to: &str,
    log: &CallLog,
    apply: StepOutcome,
) -> UpdaterDescriptor {
    let step = Arc::new(RecordingUpdater {
        name: name.to_string(),
        log: log.clone(),
        apply,
    });

    UpdaterDescriptor::new(name, from.parse().unwrap(), to.parse().unwrap(), move || {
        let instance: Arc<dyn AccountUpdater> = step.clone();
        instance
    })
}
