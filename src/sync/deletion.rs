use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time;
use tracing::{info, warn};

use crate::clients::{ClientError, ResourceClient};

use super::reconciler::Reconciler;

/// Yes/no prompt shown to the operator before a stack is torn down.
#[async_trait]
pub trait Confirmation: Send + Sync {
    async fn confirm(&self, stack: &str) -> bool;
}

/// An answer given up front, e.g. by a `confirm=true` query parameter.
#[derive(Debug, Clone, Copy)]
pub struct Preconfirmed(pub bool);

#[async_trait]
impl Confirmation for Preconfirmed {
    async fn confirm(&self, _stack: &str) -> bool {
        self.0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteError {
    #[error("stack {0:?} is not on the dashboard")]
    UnknownStack(String),
    #[error("stack {0:?} is already being deleted")]
    AlreadyDeleting(String),
    #[error("deleting stack {name:?} failed: {source}")]
    Backend {
        name: String,
        #[source]
        source: ClientError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Declined,
    Deleted,
}

#[derive(Clone)]
pub struct DeletionCommander {
    client: Arc<dyn ResourceClient>,
    reconciler: Arc<Reconciler>,
    timeout: Duration,
}

impl DeletionCommander {
    pub fn new(
        client: Arc<dyn ResourceClient>,
        reconciler: Arc<Reconciler>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            reconciler,
            timeout,
        }
    }

    /// Deletes `name` once the operator confirms.
    ///
    /// A declined prompt changes nothing. A failed delete puts the entry back
    /// the way it was, with the error recorded on it.
    pub async fn request_delete(
        &self,
        name: &str,
        confirmation: &dyn Confirmation,
    ) -> Result<DeleteOutcome, DeleteError> {
        if self.reconciler.summary(name).is_none() {
            return Err(DeleteError::UnknownStack(name.to_string()));
        }

        if !confirmation.confirm(name).await {
            info!(stack = name, "deletion declined");
            return Ok(DeleteOutcome::Declined);
        }

        let summary = self.reconciler.begin_deletion(name)?;
        info!(stack = name, account = %summary.account, "deleting stack");

        let result = match time::timeout(self.timeout, self.client.delete_stack(&summary)).await {
            Ok(r) => r,
            Err(_) => Err(ClientError::Timeout(self.timeout)),
        };

        match result {
            Ok(()) => {
                self.reconciler.confirm_deletion(name);
                info!(stack = name, "stack deleted");
                Ok(DeleteOutcome::Deleted)
            }
            Err(e) => {
                warn!(stack = name, "delete failed: {}", e);
                self.reconciler.revert_deletion(name, e.to_string());
                Err(DeleteError::Backend {
                    name: name.to_string(),
                    source: e,
                })
            }
        }
    }
}
