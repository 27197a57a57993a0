use crate::datekit::{DateKey, Year};
use crate::palette::{ColorPicker, DayColor};
use crate::remote::{
    document_id, DayEntry, DocumentEvent, RemoteDocuments, RemoteError, Subscription,
    YearDocument,
};
use std::cell::{Ref, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::mem::take;
use std::rc::{Rc, Weak};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, error, warn};

/// Marked days and the colors they were given.  A day is marked if and only
/// if its key is present.
pub(crate) type ReadDayMap = BTreeMap<DateKey, DayColor>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Phase {
    /// No subscription has been opened
    Uninitialized,
    /// Subscribed, but nothing has been heard from the store yet
    Loading,
    /// At least one snapshot or error has arrived
    Ready,
}

/// What watchers of a [`ReadDayStore`] are told after each notification from
/// the document store
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum ReadDaysEvent {
    Snapshot(ReadDayMap),
    Error(String),
}

/// Outcome of a successful [`ReadDayStore::toggle_day`]
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Toggle {
    Marked(DayColor),
    Unmarked,
}

type Watcher = Box<dyn FnMut(&ReadDaysEvent)>;

struct Shared {
    read_days: ReadDayMap,
    phase: Phase,
    last_error: Option<String>,
    watchers: Vec<Watcher>,
    /// Events not yet handed to the watchers, oldest first
    pending: VecDeque<ReadDaysEvent>,
    notifying: bool,
}

impl fmt::Debug for Shared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shared")
            .field("read_days", &self.read_days)
            .field("phase", &self.phase)
            .field("last_error", &self.last_error)
            .field("watchers", &self.watchers.len())
            .field("pending", &self.pending.len())
            .finish()
    }
}

/// The set of read days for one year, kept in step with that year's document
/// in a [`RemoteDocuments`] store.
///
/// The document is the source of truth: every notification about it replaces
/// the local map outright.  Toggles are applied locally at once and then
/// written back as a complete document, so when two writers race the last
/// write wins.
#[derive(Debug)]
pub(crate) struct ReadDayStore<R, P> {
    remote: R,
    picker: P,
    collection: String,
    year: Option<Year>,
    shared: Rc<RefCell<Shared>>,
    subscription: Subscription,
}

impl<R: RemoteDocuments, P: ColorPicker> ReadDayStore<R, P> {
    pub(crate) fn new<S: Into<String>>(remote: R, picker: P, collection: S) -> Self {
        ReadDayStore {
            remote,
            picker,
            collection: collection.into(),
            year: None,
            shared: Rc::new(RefCell::new(Shared {
                read_days: ReadDayMap::new(),
                phase: Phase::Uninitialized,
                last_error: None,
                watchers: Vec::new(),
                pending: VecDeque::new(),
                notifying: false,
            })),
            subscription: Subscription::closed(),
        }
    }

    /// Start following the document for `year`, closing any previous
    /// subscription first.  Depending on the backend, the first snapshot may
    /// already have been applied by the time this returns.
    pub(crate) fn subscribe(&mut self, year: Year) {
        self.subscription.unsubscribe();
        self.year = Some(year);
        {
            let mut shared = self.shared.borrow_mut();
            if shared.phase == Phase::Uninitialized {
                shared.phase = Phase::Loading;
            }
        }
        let weak = Rc::downgrade(&self.shared);
        self.subscription = self.remote.subscribe(
            &self.collection,
            &document_id(year),
            Box::new(move |event: &DocumentEvent| on_document_event(&weak, event)),
        );
    }

    pub(crate) fn unsubscribe(&mut self) {
        self.subscription.unsubscribe();
    }

    /// Call `watcher` after every notification from the document store
    pub(crate) fn watch<F: FnMut(&ReadDaysEvent) + 'static>(&self, watcher: F) {
        self.shared.borrow_mut().watchers.push(Box::new(watcher));
    }

    /// Current marked days.  The returned guard must be released before
    /// calling [`toggle_day`](Self::toggle_day).
    pub(crate) fn read_days(&self) -> Ref<'_, ReadDayMap> {
        Ref::map(self.shared.borrow(), |s| &s.read_days)
    }

    pub(crate) fn color_of(&self, key: DateKey) -> Option<DayColor> {
        self.shared.borrow().read_days.get(&key).cloned()
    }

    pub(crate) fn phase(&self) -> Phase {
        self.shared.borrow().phase
    }

    pub(crate) fn is_loading(&self) -> bool {
        self.phase() != Phase::Ready
    }

    /// Message from the most recent subscription failure, cleared by the
    /// next successful snapshot
    pub(crate) fn last_error(&self) -> Option<String> {
        self.shared.borrow().last_error.clone()
    }

    /// Mark the day if it is unmarked, giving it a fresh color, or unmark it
    /// if it is marked, then write the whole year back to the store.  An empty
    /// year is written back by deleting its document.
    ///
    /// The local change is kept even if the write fails; the next snapshot
    /// from the store settles what is true.
    pub(crate) fn toggle_day(&self, key: DateKey) -> Result<Toggle, StoreError> {
        let year = self.year.ok_or(StoreError::NotSubscribed)?;
        let (toggle, read_days) = {
            let mut shared = self.shared.borrow_mut();
            let toggle = if shared.read_days.remove(&key).is_some() {
                Toggle::Unmarked
            } else {
                let color = self.picker.pick();
                shared.read_days.insert(key, color.clone());
                Toggle::Marked(color)
            };
            (toggle, shared.read_days.clone())
        };
        let id = document_id(year);
        let written = if read_days.is_empty() {
            self.remote.delete_document(&self.collection, &id)
        } else {
            let document = encode_read_days(&read_days, OffsetDateTime::now_utc());
            self.remote.set_document(&self.collection, &id, &document)
        };
        match written {
            Ok(()) => {
                debug!(%key, ?toggle, marked = read_days.len(), "saved read days");
                Ok(toggle)
            }
            Err(source) => {
                error!(%key, error = %source, "failed to save read days");
                Err(StoreError::Write { year, source })
            }
        }
    }

    /// Fetch the year's document directly and adopt it as if it had arrived
    /// through the subscription
    pub(crate) fn resync(&self) -> Result<(), StoreError> {
        let year = self.year.ok_or(StoreError::NotSubscribed)?;
        match self.remote.get_document(&self.collection, &document_id(year)) {
            Ok(document) => {
                on_document_event(
                    &Rc::downgrade(&self.shared),
                    &DocumentEvent::Snapshot(document),
                );
                Ok(())
            }
            Err(source) => {
                error!(error = %source, "failed to fetch read days");
                Err(StoreError::Read { year, source })
            }
        }
    }
}

fn on_document_event(shared: &Weak<RefCell<Shared>>, event: &DocumentEvent) {
    let Some(shared) = shared.upgrade() else {
        return;
    };
    {
        let mut state = shared.borrow_mut();
        state.phase = Phase::Ready;
        let outgoing = match event {
            DocumentEvent::Snapshot(document) => {
                let read_days = document.as_ref().map(decode_read_days).unwrap_or_default();
                debug!(marked = read_days.len(), "received read days");
                state.read_days = read_days.clone();
                state.last_error = None;
                ReadDaysEvent::Snapshot(read_days)
            }
            DocumentEvent::Error(e) => {
                warn!(error = %e, "read day subscription failed");
                let message = e.to_string();
                state.last_error = Some(message.clone());
                ReadDaysEvent::Error(message)
            }
        };
        state.pending.push_back(outgoing);
        if state.notifying {
            return;
        }
        state.notifying = true;
    }
    // Watchers are called without the state borrowed so that they can read
    // the store.  Anything they cause to arrive meanwhile waits in `pending`.
    loop {
        let (outgoing, mut watchers) = {
            let mut state = shared.borrow_mut();
            let Some(outgoing) = state.pending.pop_front() else {
                state.notifying = false;
                break;
            };
            (outgoing, take(&mut state.watchers))
        };
        for watcher in &mut watchers {
            watcher(&outgoing);
        }
        let mut state = shared.borrow_mut();
        watchers.append(&mut state.watchers);
        state.watchers = watchers;
    }
}

fn decode_read_days(document: &YearDocument) -> ReadDayMap {
    let mut read_days = ReadDayMap::new();
    for entry in &document.days {
        match entry.date.parse::<DateKey>() {
            Ok(key) => {
                read_days.insert(key, DayColor::from(entry.color.as_str()));
            }
            Err(e) => warn!(date = %entry.date, error = %e, "skipping malformed read day"),
        }
    }
    read_days
}

fn encode_read_days(read_days: &ReadDayMap, updated_at: OffsetDateTime) -> YearDocument {
    YearDocument {
        days: read_days
            .iter()
            .map(|(key, color)| DayEntry {
                date: key.to_string(),
                color: color.as_str().to_owned(),
            })
            .collect(),
        updated_at,
    }
}

#[derive(Debug, Error)]
pub(crate) enum StoreError {
    #[error("not following any year's read days")]
    NotSubscribed,
    #[error("failed to save read days for {year}")]
    Write {
        year: Year,
        #[source]
        source: RemoteError,
    },
    #[error("failed to load read days for {year}")]
    Read {
        year: Year,
        #[source]
        source: RemoteError,
    },
}
