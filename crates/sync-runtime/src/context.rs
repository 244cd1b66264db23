use crate::error::SyncError;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

/// Execution handle the orchestrator runs its work on: the runtime that
/// enrichment tasks are spawned onto, plus the caller's cancellation scope.
///
/// Cancelling the context cancels every in-flight invocation that uses it.
#[derive(Debug, Clone)]
pub struct SyncContext {
    handle: Handle,
    cancel: CancellationToken,
}

impl SyncContext {
    pub fn new(handle: Handle, cancel: CancellationToken) -> Self {
        Self { handle, cancel }
    }

    /// Context on the current runtime with a fresh cancellation scope.
    pub fn current() -> Result<Self, SyncError> {
        Ok(Self::new(Handle::try_current()?, CancellationToken::new()))
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Scope for a single invocation: cancelled with the context, but
    /// cancelling it leaves the context untouched.
    pub(crate) fn invocation_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }
}
