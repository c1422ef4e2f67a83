//! Execution context threaded through every step invocation.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use anyhow::Result;
use serde_json::Value as JsonValue;
use tracing::warn;

use crate::store::StoreSession;

/// Boxed future returned by [`ExecutionContext::with_transaction`] closures.
pub type ScopedFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Opaque bag handed to every step: a transactional store session plus
/// free-form extras forwarded unchanged from the entry point.
///
/// Steps must not assume anything about the session beyond the
/// [`StoreSession`] surface and the ability to hand it to collaborators.
pub struct ExecutionContext {
    session: Box<dyn StoreSession>,
    extra: HashMap<String, JsonValue>,
}

impl ExecutionContext {
    pub fn new(session: Box<dyn StoreSession>) -> Self {
        Self {
            session,
            extra: HashMap::new(),
        }
    }

    /// Attach a free-form extra forwarded to every step.
    pub fn with_extra(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn extra(&self) -> &HashMap<String, JsonValue> {
        &self.extra
    }

    pub fn session(&self) -> &dyn StoreSession {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> &mut dyn StoreSession {
        self.session.as_mut()
    }

    /// Run `f` inside a transaction scope, nesting automatically when the
    /// session already has one open. Commits on `Ok`, rolls back on `Err`.
    ///
    /// Step authors never branch on transaction state themselves; this is
    /// the only place that decides nested versus top-level.
    pub async fn with_transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        T: Send,
        F: for<'a> FnOnce(&'a mut ExecutionContext) -> ScopedFuture<'a, T>,
    {
        if self.session.in_transaction() {
            self.session.begin_nested().await?;
        } else {
            self.session.begin().await?;
        }

        let result = f(self).await;
        match result {
            Ok(value) => {
                self.session.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.session.rollback().await {
                    warn!(error = %rollback_err, "transaction rollback failed");
                }
                Err(err)
            }
        }
    }
}
