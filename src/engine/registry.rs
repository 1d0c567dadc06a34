//! Active-operation registry.
//!
//! Maps each running operation's token to the sender half of its
//! cancellation signal. Entries leave the map either through
//! [`OperationRegistry::cancel`] or when the operation finishes on its own.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use uuid::Uuid;

/// Unique identifier of one pull or build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperationToken(Uuid);

impl OperationToken {
    /// Generate a fresh random token.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OperationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OperationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for OperationToken {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Receiving half of a cancellation signal. Flips to `true` once.
pub type CancelReceiver = watch::Receiver<bool>;

/// Tokens of in-flight operations and their cancellation senders.
///
/// Cloning shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct OperationRegistry {
    entries: Arc<Mutex<HashMap<OperationToken, watch::Sender<bool>>>>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock leaves the map itself intact.
    fn lock(&self) -> MutexGuard<'_, HashMap<OperationToken, watch::Sender<bool>>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Create a token and register a fresh cancellation signal for it.
    pub fn register(&self) -> (OperationToken, CancelReceiver) {
        let token = OperationToken::new();
        let (tx, rx) = watch::channel(false);
        self.insert(token, tx);
        (token, rx)
    }

    /// Register `sender` under `token`, replacing any previous entry.
    pub fn insert(&self, token: OperationToken, sender: watch::Sender<bool>) {
        self.lock().insert(token, sender);
    }

    /// Drop the entry without signalling. Returns whether it was present.
    pub fn remove(&self, token: &OperationToken) -> bool {
        self.lock().remove(token).is_some()
    }

    /// Remove the entry and signal cancellation.
    ///
    /// Returns `false`, changing nothing, when the token is unknown or the
    /// operation already finished.
    pub fn cancel(&self, token: &OperationToken) -> bool {
        let sender = self.lock().remove(token);
        match sender {
            Some(sender) => {
                // No receiver left means the loop is already exiting.
                let _ = sender.send(true);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, token: &OperationToken) -> bool {
        self.lock().contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Tokens currently registered, in no particular order.
    pub fn tokens(&self) -> Vec<OperationToken> {
        self.lock().keys().copied().collect()
    }
}
