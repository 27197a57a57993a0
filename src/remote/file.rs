use super::listeners::Listeners;
use super::{DocumentEvent, Listener, RemoteDocuments, RemoteError, Subscription, YearDocument};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Document store keeping each document as a JSON file at
/// `<root>/<collection>/<id>.json`.
///
/// Subscribers are notified of changes made through this backend (or its
/// clones) only; edits made to the files by other processes are picked up by
/// the next read.
#[derive(Clone, Debug)]
pub(crate) struct JsonDirBackend {
    root: PathBuf,
    listeners: Listeners,
}

impl JsonDirBackend {
    pub(crate) fn new<P: Into<PathBuf>>(root: P) -> JsonDirBackend {
        JsonDirBackend {
            root: root.into(),
            listeners: Listeners::default(),
        }
    }

    fn document_path(&self, collection: &str, id: &str) -> PathBuf {
        self.root.join(collection).join(format!("{id}.json"))
    }

    fn read(&self, path: &Path) -> Result<Option<YearDocument>, RemoteError> {
        match fs::read(path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|source| RemoteError::Decode {
                    path: path.to_owned(),
                    source,
                }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(RemoteError::Io {
                path: path.to_owned(),
                source,
            }),
        }
    }
}

impl RemoteDocuments for JsonDirBackend {
    fn get_document(&self, collection: &str, id: &str) -> Result<Option<YearDocument>, RemoteError> {
        self.read(&self.document_path(collection, id))
    }

    fn set_document(
        &self,
        collection: &str,
        id: &str,
        document: &YearDocument,
    ) -> Result<(), RemoteError> {
        let path = self.document_path(collection, id);
        let io_error = |source| RemoteError::Io {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let mut bytes = serde_json::to_vec_pretty(document)?;
        bytes.push(b'\n');
        // Write beside the target and rename over it so that readers never
        // see a partial document
        let staging = path.with_extension("json.tmp");
        if let Err(e) = fs::write(&staging, bytes).and_then(|()| fs::rename(&staging, &path)) {
            if let Err(cleanup) = fs::remove_file(&staging) {
                debug!(
                    path = %staging.display(),
                    error = %cleanup,
                    "could not remove staging file"
                );
            }
            return Err(io_error(e));
        }
        debug!(path = %path.display(), days = document.days.len(), "wrote document");
        let event = DocumentEvent::Snapshot(Some(document.clone()));
        self.listeners.notify(collection, id, event);
        Ok(())
    }

    fn delete_document(&self, collection: &str, id: &str) -> Result<(), RemoteError> {
        let path = self.document_path(collection, id);
        match fs::remove_file(&path) {
            Ok(()) => debug!(path = %path.display(), "deleted document"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => (),
            Err(source) => return Err(RemoteError::Io { path, source }),
        }
        self.listeners
            .notify(collection, id, DocumentEvent::Snapshot(None));
        Ok(())
    }

    fn subscribe(&self, collection: &str, id: &str, listener: Listener) -> Subscription {
        let initial = match self.get_document(collection, id) {
            Ok(doc) => DocumentEvent::Snapshot(doc),
            Err(e) => DocumentEvent::Error(e),
        };
        self.listeners.register(collection, id, listener, &initial)
    }
}
