use std::fmt::Debug;
use std::sync::Arc;
use std::sync::Mutex;

use crate::domain::SubscriberEmail;
use crate::storage::CsvStorage;
use crate::storage::StorageError;
use crate::utils::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum SubscribeError {
    /// Expected outcome, not a fault; callers should map it to a conflict
    #[error("{0} is already subscribed")]
    AlreadySubscribed(String),
    #[error("stored subscriber is invalid: {0}")]
    InvalidRecord(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl Debug for SubscribeError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Keeps every email in the store at most once.
///
/// `subscribe` is read-then-append; clones share a lock so that two
/// concurrent calls in this process cannot both append the same email. Other
/// processes writing the same file are not guarded against.
#[derive(Clone, Debug)]
pub struct SubscriptionRegistry {
    storage: CsvStorage,
    write_lock: Arc<Mutex<()>>,
}

impl SubscriptionRegistry {
    pub fn new(storage: CsvStorage) -> Self {
        Self {
            storage,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    #[tracing::instrument(name = "Subscribing email", skip(self), fields(subscriber_email = %email))]
    pub fn subscribe(
        &self,
        email: &SubscriberEmail,
    ) -> Result<(), SubscribeError> {
        // the guarded value is (), so a poisoned lock is still usable
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if self.is_subscribed(email)? {
            return Err(SubscribeError::AlreadySubscribed(email.to_string()));
        }
        self.storage.append(&[email.as_ref()])?;
        Ok(())
    }

    /// Exact (case-sensitive) match on the stored email, trimmed the same way
    /// `SubscriberEmail::parse` trims it
    pub fn is_subscribed(
        &self,
        email: &SubscriberEmail,
    ) -> Result<bool, SubscribeError> {
        let found = self
            .storage
            .all_records()?
            .iter()
            .any(|r| r.first().map(|e| e.trim()) == Some(email.as_ref()));
        Ok(found)
    }

    /// All subscribers, oldest first
    #[tracing::instrument(name = "Getting list of subscribers", skip(self))]
    pub fn subscriptions(&self) -> Result<Vec<SubscriberEmail>, SubscribeError> {
        self.storage
            .all_records()?
            .into_iter()
            .map(|r| {
                let email = r.into_iter().next().unwrap_or_default();
                SubscriberEmail::parse(email).map_err(SubscribeError::InvalidRecord)
            })
            .collect()
    }
}
