use std::sync::Arc;

use tracing::info;

use crate::clients::ResourceClient;

use super::poller::{PollSettings, PollerHandle};
use super::reconciler::Reconciler;

/// Polls the stack collection and hands each membership to the reconciler.
///
/// A failed poll leaves the current membership alone; the next tick retries.
pub struct ListPoller {
    handle: PollerHandle,
}

impl ListPoller {
    pub fn start(
        client: Arc<dyn ResourceClient>,
        reconciler: &Arc<Reconciler>,
        settings: PollSettings,
    ) -> Self {
        let reconciler = Arc::downgrade(reconciler);
        let handle = PollerHandle::spawn(
            "list",
            settings,
            move || {
                let client = client.clone();
                async move { client.list_stacks().await }
            },
            move |seq, stacks| {
                let Some(reconciler) = reconciler.upgrade() else {
                    return;
                };
                if let Some(delta) = reconciler.apply_membership(stacks, Some(seq)) {
                    if !delta.is_empty() {
                        info!(
                            added = ?delta.added,
                            removed = ?delta.removed,
                            restarted = ?delta.restarted,
                            "stack membership changed"
                        );
                    }
                }
            },
        );

        Self { handle }
    }

    pub fn is_alive(&self) -> bool {
        self.handle.is_alive()
    }

    pub fn stop(&self) {
        self.handle.stop();
    }
}
