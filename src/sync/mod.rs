//! Keeps the dashboard's view of the stack collection in step with the backend.
//!
//! The list poller reports membership, the reconciler spawns one detail poller
//! per member, and every result funnels through the reconciler, which is the
//! only writer of the view state.

pub mod deletion;
pub mod detail_poller;
pub mod list_poller;
pub mod poller;
pub mod reconciler;

pub use deletion::{DeleteError, DeleteOutcome, DeletionCommander, Preconfirmed};
pub use list_poller::ListPoller;
pub use poller::PollSettings;
pub use reconciler::Reconciler;
