use serde::{Deserialize, Serialize};

/// Value the backend reports for an endpoint it could not reach yet.
pub const NOT_READY: &str = "Not Ready";

/// Identity of a stack as returned by the list endpoint.
///
/// The backend addresses stacks by `(account, name)`, but names are unique
/// across accounts in practice and the console keys its view by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackSummary {
    pub name: String,
    #[serde(default)]
    pub account: String,
}

impl StackSummary {
    pub fn new(name: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            account: account.into(),
        }
    }
}

/// Full detail record for one stack. Replaced as a whole on every successful
/// detail poll.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackDetail {
    pub name: String,
    pub created: String,
    pub address: String,
    pub account: String,
    pub cfstatus: String,
    pub kotsadm: String,
    pub login: String,
    pub api: String,
    pub ca: String,
    pub uptime: String,
    pub kubernetes: String,
    pub datastore: String,
    pub eventstream: String,
    pub media: String,
    pub cdn: String,
}

/// True when an endpoint field holds something worth linking to.
pub fn endpoint_ready(value: &str) -> bool {
    !value.is_empty() && value != NOT_READY
}
