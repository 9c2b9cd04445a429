use serde::Serialize;

use super::stack::StackDetail;

/// Detail half of a view entry: nothing fetched yet, or the latest snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "lowercase")]
pub enum DetailState {
    Pending,
    Ready(StackDetail),
}

impl DetailState {
    pub fn ready(&self) -> Option<&StackDetail> {
        match self {
            DetailState::Ready(d) => Some(d),
            DetailState::Pending => None,
        }
    }
}

/// One stack as presentation sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackView {
    pub name: String,
    pub account: String,
    pub detail: DetailState,
    pub deletion_in_flight: bool,
    pub delete_error: Option<String>,
}

/// Immutable copy of the view state, sorted by stack name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewSnapshot {
    pub revision: u64,
    pub stacks: Vec<StackView>,
}

#[cfg(test)]
impl ViewSnapshot {
    pub fn get(&self, name: &str) -> Option<&StackView> {
        self.stacks.iter().find(|s| s.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.stacks.iter().map(|s| s.name.as_str()).collect()
    }
}

// Pre-computed card for the dashboard template

#[derive(Debug, Clone, Default)]
pub struct LinkView {
    pub label: String,
    pub value: String,
    pub is_link: bool,
}

#[derive(Debug, Clone, Default)]
pub struct StackCard {
    pub name: String,
    pub account: String,
    pub pending: bool,
    pub deleting: bool,
    pub delete_error: String,
    pub created: String,
    pub age: String,
    pub address: String,
    pub cfstatus: String,
    pub status_class: String,
    pub links: Vec<LinkView>,
    pub cert_url: String,
}
