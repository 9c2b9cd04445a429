use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::watch;
use tracing::{debug, info};

use crate::clients::ResourceClient;
use crate::models::stack::{StackDetail, StackSummary};
use crate::models::views::{DetailState, StackView, ViewSnapshot};

use super::deletion::DeleteError;
use super::detail_poller::DetailPoller;
use super::poller::PollSettings;

/// Identifies the poll that produced a detail result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailStamp {
    pub generation: u64,
    pub seq: u64,
}

/// What a membership update changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MembershipDelta {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    /// Names whose account changed; their pollers were replaced.
    pub restarted: Vec<String>,
}

impl MembershipDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.restarted.is_empty()
    }
}

struct StackEntry {
    summary: StackSummary,
    detail: DetailState,
    detail_seq: u64,
    deletion_in_flight: bool,
    delete_error: Option<String>,
    poller: DetailPoller,
}

#[derive(Default)]
struct ViewState {
    entries: BTreeMap<String, StackEntry>,
    /// Names whose deletion succeeded but which the backend may still list.
    tombstones: BTreeSet<String>,
    membership_seq: u64,
    next_generation: u64,
    revision: u64,
    closed: bool,
}

/// Sole writer of the dashboard's view state.
///
/// Every operation runs under one lock and publishes a fresh snapshot before
/// releasing it, so subscribers only ever see complete states, in mutation
/// order. Detail pollers are owned here, one per entry.
pub struct Reconciler {
    client: Arc<dyn ResourceClient>,
    settings: PollSettings,
    state: Mutex<ViewState>,
    snapshots: watch::Sender<ViewSnapshot>,
    this: Weak<Reconciler>,
}

impl Reconciler {
    pub fn new(client: Arc<dyn ResourceClient>, settings: PollSettings) -> Arc<Self> {
        let (snapshots, _) = watch::channel(ViewSnapshot::default());
        Arc::new_cyclic(|this| Self {
            client,
            settings,
            state: Mutex::new(ViewState::default()),
            snapshots,
            this: this.clone(),
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn summary(&self, name: &str) -> Option<StackSummary> {
        let state = self.state.lock().unwrap();
        state.entries.get(name).map(|e| e.summary.clone())
    }

    /// Number of detail pollers currently running.
    pub fn active_pollers(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.entries.values().filter(|e| e.poller.is_alive()).count()
    }

    /// Makes the view's keys match `stacks`, minus tombstoned names.
    ///
    /// A stamped list is ignored unless it is newer than the last stamped
    /// list applied. Returns `None` when the list was ignored.
    pub fn apply_membership(
        &self,
        stacks: Vec<StackSummary>,
        seq: Option<u64>,
    ) -> Option<MembershipDelta> {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return None;
        }
        if let Some(seq) = seq {
            if seq <= state.membership_seq {
                debug!(seq, latest = state.membership_seq, "discarding stale stack list");
                return None;
            }
            state.membership_seq = seq;
        }
        Some(self.reconcile(&mut state, stacks))
    }

    /// Replaces the detail of `name`. Does nothing if `name` is not in the view.
    ///
    /// A stamped result only applies if it came from the entry's current
    /// poller and is newer than what the entry holds.
    pub fn apply_detail(
        &self,
        name: &str,
        detail: StackDetail,
        stamp: Option<DetailStamp>,
    ) -> bool {
        let mut state = self.state.lock().unwrap();
        let Some(entry) = state.entries.get_mut(name) else {
            debug!(stack = name, "discarding detail for retired stack");
            return false;
        };
        if let Some(stamp) = stamp {
            if entry.poller.generation() != stamp.generation {
                debug!(stack = name, "discarding detail from replaced poller");
                return false;
            }
            if stamp.seq <= entry.detail_seq {
                debug!(stack = name, seq = stamp.seq, "discarding stale detail");
                return false;
            }
            entry.detail_seq = stamp.seq;
        }
        Self::replace_detail(entry, detail) && self.publish(&mut state)
    }

    /// Marks `name` as being deleted. The entry stays visible and keeps polling.
    pub fn begin_deletion(&self, name: &str) -> Result<StackSummary, DeleteError> {
        let mut state = self.state.lock().unwrap();
        let entry = state
            .entries
            .get_mut(name)
            .ok_or_else(|| DeleteError::UnknownStack(name.to_string()))?;
        if entry.deletion_in_flight {
            return Err(DeleteError::AlreadyDeleting(name.to_string()));
        }
        entry.deletion_in_flight = true;
        entry.delete_error = None;
        let summary = entry.summary.clone();
        self.publish(&mut state);
        Ok(summary)
    }

    /// Retires `name` after a successful delete.
    pub fn confirm_deletion(&self, name: &str) -> bool {
        let mut state = self.state.lock().unwrap();
        let Some(entry) = state.entries.remove(name) else {
            return false;
        };
        entry.poller.stop();
        state.tombstones.insert(name.to_string());
        info!(stack = name, "stack retired after deletion");
        self.publish(&mut state)
    }

    /// Returns `name` to its pre-deletion state after a failed delete.
    pub fn revert_deletion(&self, name: &str, error: String) -> bool {
        let mut state = self.state.lock().unwrap();
        let Some(entry) = state.entries.get_mut(name) else {
            return false;
        };
        if !entry.deletion_in_flight {
            return false;
        }
        entry.deletion_in_flight = false;
        entry.delete_error = Some(error);
        self.publish(&mut state)
    }

    /// Stops every poller and empties the view. Later updates are ignored.
    pub fn shutdown(&self) {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return;
        }
        state.closed = true;
        for entry in std::mem::take(&mut state.entries).into_values() {
            entry.poller.stop();
        }
        state.tombstones.clear();
        self.publish(&mut state);
    }

    fn reconcile(&self, state: &mut ViewState, stacks: Vec<StackSummary>) -> MembershipDelta {
        let listed: BTreeMap<String, StackSummary> =
            stacks.into_iter().map(|s| (s.name.clone(), s)).collect();

        // A tombstone lives until the backend stops listing the name.
        state.tombstones.retain(|name| listed.contains_key(name));
        let wanted: BTreeMap<String, StackSummary> = listed
            .into_iter()
            .filter(|(name, _)| !state.tombstones.contains(name))
            .collect();

        let mut delta = MembershipDelta::default();

        let gone: Vec<String> = state
            .entries
            .keys()
            .filter(|name| !wanted.contains_key(*name))
            .cloned()
            .collect();
        for name in gone {
            if let Some(entry) = state.entries.remove(&name) {
                entry.poller.stop();
            }
            delta.removed.push(name);
        }

        for (name, summary) in wanted {
            match state.entries.entry(name) {
                Entry::Occupied(mut occupied) => {
                    let entry = occupied.get_mut();
                    if entry.summary == summary {
                        continue;
                    }
                    state.next_generation += 1;
                    entry.poller.stop();
                    entry.poller = self.start_poller(summary.clone(), state.next_generation);
                    entry.summary = summary;
                    entry.detail = DetailState::Pending;
                    entry.detail_seq = 0;
                    delta.restarted.push(occupied.key().clone());
                }
                Entry::Vacant(vacant) => {
                    state.next_generation += 1;
                    delta.added.push(vacant.key().clone());
                    let poller = self.start_poller(summary.clone(), state.next_generation);
                    vacant.insert(StackEntry {
                        summary,
                        detail: DetailState::Pending,
                        detail_seq: 0,
                        deletion_in_flight: false,
                        delete_error: None,
                        poller,
                    });
                }
            }
        }

        if !delta.is_empty() {
            self.publish(state);
        }
        delta
    }

    fn start_poller(&self, summary: StackSummary, generation: u64) -> DetailPoller {
        DetailPoller::start(
            self.client.clone(),
            summary,
            generation,
            self.settings,
            self.this.clone(),
        )
    }

    fn replace_detail(entry: &mut StackEntry, detail: StackDetail) -> bool {
        if entry.detail.ready() == Some(&detail) {
            return false;
        }
        entry.detail = DetailState::Ready(detail);
        true
    }

    fn publish(&self, state: &mut ViewState) -> bool {
        state.revision += 1;
        let stacks = state
            .entries
            .values()
            .map(|e| StackView {
                name: e.summary.name.clone(),
                account: e.summary.account.clone(),
                detail: e.detail.clone(),
                deletion_in_flight: e.deletion_in_flight,
                delete_error: e.delete_error.clone(),
            })
            .collect();
        self.snapshots.send_replace(ViewSnapshot {
            revision: state.revision,
            stacks,
        });
        true
    }
}
