mod file;
mod listeners;
mod memory;
pub(crate) use self::file::JsonDirBackend;
pub(crate) use self::memory::MemoryBackend;
use crate::datekit::Year;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use time::OffsetDateTime;

/// Stored form of one year's marked days
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct YearDocument {
    #[serde(default)]
    pub(crate) days: Vec<DayEntry>,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) updated_at: OffsetDateTime,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub(crate) struct DayEntry {
    pub(crate) date: String,
    pub(crate) color: String,
}

/// The ID of the document holding `year`'s marks
pub(crate) fn document_id(year: Year) -> String {
    year.get().to_string()
}

/// What a subscriber is told whenever a watched document changes
#[derive(Debug)]
pub(crate) enum DocumentEvent {
    /// The document's current contents; `None` if it does not exist
    Snapshot(Option<YearDocument>),
    Error(RemoteError),
}

pub(crate) type Listener = Box<dyn FnMut(&DocumentEvent)>;

/// A store of JSON documents grouped into collections, able to notify
/// subscribers of changes to individual documents.  A missing document is a
/// normal state, not an error.
pub(crate) trait RemoteDocuments {
    fn get_document(&self, collection: &str, id: &str) -> Result<Option<YearDocument>, RemoteError>;

    /// Replace the document wholesale, creating it if necessary
    fn set_document(
        &self,
        collection: &str,
        id: &str,
        document: &YearDocument,
    ) -> Result<(), RemoteError>;

    /// Remove the document.  Removing a document that does not exist
    /// succeeds.
    fn delete_document(&self, collection: &str, id: &str) -> Result<(), RemoteError>;

    /// Register `listener` for changes to the document.  The listener is
    /// called once with the document's current state before this returns,
    /// then again after every change, until the subscription is closed.
    fn subscribe(&self, collection: &str, id: &str, listener: Listener) -> Subscription;
}

/// Handle to an open subscription.  Closing it more than once, or closing one
/// that was never opened, does nothing.  Dropping the handle closes it.
pub(crate) struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub(crate) fn new<F: FnOnce() + 'static>(cancel: F) -> Subscription {
        Subscription {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub(crate) fn closed() -> Subscription {
        Subscription { cancel: None }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    pub(crate) fn unsubscribe(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

#[derive(Debug, Error)]
pub(crate) enum RemoteError {
    #[error("failed to access {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode document at {}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode document")]
    Encode(#[from] serde_json::Error),
    #[error("document store unavailable: {0}")]
    Unavailable(String),
}
