use std::sync::RwLock;
use tokio::sync::watch;
use tracing::info;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("invalid operator token")]
    InvalidToken,
}

/// Explicit session context shared by the dashboard host and the HTTP layer.
///
/// Flipping `authenticated` is what mounts and unmounts the dashboard.
pub struct Session {
    required_token: Option<String>,
    token: RwLock<Option<String>>,
    authenticated: watch::Sender<bool>,
}

impl Session {
    pub fn new(required_token: Option<String>) -> Self {
        let (authenticated, _) = watch::channel(required_token.is_none());
        Self {
            required_token,
            token: RwLock::new(None),
            authenticated,
        }
    }

    /// A session that needs no credentials.
    #[cfg(test)]
    pub fn open() -> Self {
        Self::new(None)
    }

    pub fn is_authenticated(&self) -> bool {
        *self.authenticated.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.authenticated.subscribe()
    }

    /// Credential forwarded to the backend, if the operator logged in with one.
    pub fn token(&self) -> Option<String> {
        self.token.read().unwrap().clone()
    }

    pub fn login(&self, token: &str) -> Result<(), SessionError> {
        if let Some(required) = &self.required_token {
            if required != token {
                return Err(SessionError::InvalidToken);
            }
        }

        *self.token.write().unwrap() = (!token.is_empty()).then(|| token.to_string());
        self.authenticated.send_replace(true);
        info!("operator logged in");
        Ok(())
    }

    pub fn logout(&self) {
        self.token.write().unwrap().take();
        self.authenticated.send_replace(false);
        info!("operator logged out");
    }
}
