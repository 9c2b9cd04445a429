use std::sync::{Arc, Weak};

use crate::clients::ResourceClient;
use crate::models::stack::StackSummary;

use super::poller::{PollSettings, PollerHandle};
use super::reconciler::{DetailStamp, Reconciler};

/// Polls the detail record of exactly one stack.
///
/// `generation` tells the reconciler which incarnation of the entry a result
/// belongs to, so results from a retired poller never land on a newer entry
/// for the same name.
pub struct DetailPoller {
    generation: u64,
    handle: PollerHandle,
}

impl DetailPoller {
    pub fn start(
        client: Arc<dyn ResourceClient>,
        stack: StackSummary,
        generation: u64,
        settings: PollSettings,
        reconciler: Weak<Reconciler>,
    ) -> Self {
        let name = stack.name.clone();
        let handle = PollerHandle::spawn(
            format!("detail:{}", stack.name),
            settings,
            move || {
                let client = client.clone();
                let stack = stack.clone();
                async move { client.get_stack_detail(&stack).await }
            },
            move |seq, detail| {
                if let Some(reconciler) = reconciler.upgrade() {
                    let stamp = DetailStamp { generation, seq };
                    reconciler.apply_detail(&name, detail, Some(stamp));
                }
            },
        );

        Self { generation, handle }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_alive(&self) -> bool {
        self.handle.is_alive()
    }

    pub fn stop(&self) {
        self.handle.stop();
    }
}
