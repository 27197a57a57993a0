use super::listeners::Listeners;
use super::{DocumentEvent, Listener, RemoteDocuments, RemoteError, Subscription, YearDocument};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Document store kept entirely in process memory.  Clones share the same
/// documents and subscribers.
#[derive(Clone, Debug, Default)]
pub(crate) struct MemoryBackend {
    state: Rc<RefCell<MemoryState>>,
    listeners: Listeners,
}

#[derive(Debug, Default)]
struct MemoryState {
    documents: BTreeMap<(String, String), YearDocument>,
    failing_writes: Option<String>,
}

impl MemoryBackend {
    pub(crate) fn new() -> MemoryBackend {
        MemoryBackend::default()
    }

    /// Make every subsequent write or delete fail with `reason`, or succeed
    /// again if `None`
    #[cfg(test)]
    pub(crate) fn fail_writes(&self, reason: Option<&str>) {
        self.state.borrow_mut().failing_writes = reason.map(str::to_owned);
    }

    /// Report a subscription failure to the document's subscribers
    #[cfg(test)]
    pub(crate) fn break_subscription(&self, collection: &str, id: &str, reason: &str) {
        let event = DocumentEvent::Error(RemoteError::Unavailable(reason.to_owned()));
        self.listeners.notify(collection, id, event);
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.listeners.active()
    }

    fn check_writable(&self) -> Result<(), RemoteError> {
        match &self.state.borrow().failing_writes {
            Some(reason) => Err(RemoteError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }

    fn current(&self, collection: &str, id: &str) -> Option<YearDocument> {
        self.state
            .borrow()
            .documents
            .get(&(collection.to_owned(), id.to_owned()))
            .cloned()
    }
}

impl RemoteDocuments for MemoryBackend {
    fn get_document(&self, collection: &str, id: &str) -> Result<Option<YearDocument>, RemoteError> {
        Ok(self.current(collection, id))
    }

    fn set_document(
        &self,
        collection: &str,
        id: &str,
        document: &YearDocument,
    ) -> Result<(), RemoteError> {
        self.check_writable()?;
        self.state
            .borrow_mut()
            .documents
            .insert((collection.to_owned(), id.to_owned()), document.clone());
        let event = DocumentEvent::Snapshot(Some(document.clone()));
        self.listeners.notify(collection, id, event);
        Ok(())
    }

    fn delete_document(&self, collection: &str, id: &str) -> Result<(), RemoteError> {
        self.check_writable()?;
        self.state
            .borrow_mut()
            .documents
            .remove(&(collection.to_owned(), id.to_owned()));
        self.listeners
            .notify(collection, id, DocumentEvent::Snapshot(None));
        Ok(())
    }

    fn subscribe(&self, collection: &str, id: &str, listener: Listener) -> Subscription {
        let initial = DocumentEvent::Snapshot(self.current(collection, id));
        self.listeners.register(collection, id, listener, &initial)
    }
}
