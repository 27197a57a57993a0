use super::{DocumentEvent, Listener, Subscription};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// In-process subscriber registry shared by the backends
#[derive(Clone, Default)]
pub(super) struct Listeners(Rc<RefCell<Registry>>);

#[derive(Default)]
struct Registry {
    entries: Vec<Entry>,
    /// Events waiting to be delivered, oldest first
    queue: VecDeque<Notification>,
    delivering: bool,
}

struct Entry {
    collection: String,
    id: String,
    active: Rc<Cell<bool>>,
    listener: Rc<RefCell<Listener>>,
}

impl Entry {
    fn watches(&self, collection: &str, id: &str) -> bool {
        self.active.get() && self.collection == collection && self.id == id
    }
}

struct Notification {
    collection: String,
    id: String,
    event: DocumentEvent,
}

impl Listeners {
    /// Deliver `initial` to `listener`, then keep it registered for
    /// subsequent notifications on the document
    pub(super) fn register(
        &self,
        collection: &str,
        id: &str,
        mut listener: Listener,
        initial: &DocumentEvent,
    ) -> Subscription {
        listener(initial);
        let active = Rc::new(Cell::new(true));
        self.0.borrow_mut().entries.push(Entry {
            collection: collection.to_owned(),
            id: id.to_owned(),
            active: Rc::clone(&active),
            listener: Rc::new(RefCell::new(listener)),
        });
        let registry = Rc::downgrade(&self.0);
        Subscription::new(move || {
            active.set(false);
            if let Some(registry) = registry.upgrade() {
                if let Ok(mut registry) = registry.try_borrow_mut() {
                    registry.entries.retain(|e| e.active.get());
                }
            }
        })
    }

    /// Call every active listener on the document with `event`, in
    /// registration order.
    ///
    /// Listeners may subscribe, unsubscribe, or write to the backend while
    /// being called.  An event raised during delivery is queued and only
    /// handed out once the current event has reached every listener, so all
    /// listeners see events in the order they happened.
    pub(super) fn notify(&self, collection: &str, id: &str, event: DocumentEvent) {
        {
            let mut registry = self.0.borrow_mut();
            registry.queue.push_back(Notification {
                collection: collection.to_owned(),
                id: id.to_owned(),
                event,
            });
            if registry.delivering {
                return;
            }
            registry.delivering = true;
        }
        while let Some(note) = self.next_notification() {
            let targets = self
                .0
                .borrow()
                .entries
                .iter()
                .filter(|e| e.watches(&note.collection, &note.id))
                .map(|e| (Rc::clone(&e.active), Rc::clone(&e.listener)))
                .collect::<Vec<_>>();
            for (active, listener) in targets {
                // An earlier listener may have cancelled this one
                if !active.get() {
                    continue;
                }
                if let Ok(mut listener) = listener.try_borrow_mut() {
                    let callback: &mut Listener = &mut listener;
                    callback(&note.event);
                }
            }
        }
        self.0.borrow_mut().entries.retain(|e| e.active.get());
    }

    /// Pop the oldest queued event, ending delivery once none are left
    fn next_notification(&self) -> Option<Notification> {
        let mut registry = self.0.borrow_mut();
        let note = registry.queue.pop_front();
        if note.is_none() {
            registry.delivering = false;
        }
        note
    }

    pub(super) fn active(&self) -> usize {
        self.0
            .borrow()
            .entries
            .iter()
            .filter(|e| e.active.get())
            .count()
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("active", &self.active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{DayEntry, YearDocument};
    use time::macros::datetime;

    fn snapshot() -> DocumentEvent {
        DocumentEvent::Snapshot(None)
    }

    fn snapshot_of(days: u8) -> DocumentEvent {
        let days = (1..=days)
            .map(|d| DayEntry {
                date: format!("2026-01-{d:02}"),
                color: "#1C7C54".into(),
            })
            .collect();
        DocumentEvent::Snapshot(Some(YearDocument {
            days,
            updated_at: datetime!(2026-01-01 00:00 UTC),
        }))
    }

    fn day_count(event: &DocumentEvent) -> usize {
        match event {
            DocumentEvent::Snapshot(Some(doc)) => doc.days.len(),
            _ => 0,
        }
    }

    fn counting(count: &Rc<Cell<usize>>) -> Listener {
        let count = Rc::clone(count);
        Box::new(move |_| count.set(count.get() + 1))
    }

    fn recording(log: &Rc<RefCell<Vec<usize>>>) -> Listener {
        let log = Rc::clone(log);
        Box::new(move |event: &DocumentEvent| log.borrow_mut().push(day_count(event)))
    }

    #[test]
    fn test_register_delivers_initial() {
        let listeners = Listeners::default();
        let count = Rc::new(Cell::new(0));
        let _sub = listeners.register("readDays", "2026", counting(&count), &snapshot());
        assert_eq!(count.get(), 1);
        assert_eq!(listeners.active(), 1);
    }

    #[test]
    fn test_notify_matches_document() {
        let listeners = Listeners::default();
        let count = Rc::new(Cell::new(0));
        let _sub = listeners.register("readDays", "2026", counting(&count), &snapshot());
        listeners.notify("readDays", "2025", snapshot());
        listeners.notify("other", "2026", snapshot());
        assert_eq!(count.get(), 1);
        listeners.notify("readDays", "2026", snapshot());
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let listeners = Listeners::default();
        let count = Rc::new(Cell::new(0));
        let mut sub = listeners.register("readDays", "2026", counting(&count), &snapshot());
        sub.unsubscribe();
        assert_eq!(listeners.active(), 0);
        listeners.notify("readDays", "2026", snapshot());
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_unsubscribe_during_delivery() {
        let listeners = Listeners::default();
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let count = Rc::new(Cell::new(0));
        let inner_slot = Rc::clone(&slot);
        let inner_count = Rc::clone(&count);
        let sub = listeners.register(
            "readDays",
            "2026",
            Box::new(move |_| {
                inner_count.set(inner_count.get() + 1);
                if let Some(mut sub) = inner_slot.borrow_mut().take() {
                    sub.unsubscribe();
                }
            }),
            &snapshot(),
        );
        *slot.borrow_mut() = Some(sub);
        listeners.notify("readDays", "2026", snapshot());
        listeners.notify("readDays", "2026", snapshot());
        assert_eq!(count.get(), 2);
        assert_eq!(listeners.active(), 0);
    }

    #[test]
    fn test_subscribe_during_delivery() {
        let listeners = Listeners::default();
        let late_count = Rc::new(Cell::new(0));
        let subs: Rc<RefCell<Vec<Subscription>>> = Rc::new(RefCell::new(Vec::new()));
        let registry = listeners.clone();
        let late = Rc::clone(&late_count);
        let held = Rc::clone(&subs);
        let _first = listeners.register(
            "readDays",
            "2026",
            Box::new(move |_| {
                if held.borrow().is_empty() {
                    let sub = registry.register("readDays", "2026", counting(&late), &snapshot());
                    held.borrow_mut().push(sub);
                }
            }),
            &snapshot(),
        );
        assert_eq!(late_count.get(), 1);
        listeners.notify("readDays", "2026", snapshot());
        assert_eq!(listeners.active(), 2);
        assert_eq!(late_count.get(), 2);
    }

    #[test]
    fn test_notify_during_delivery_reaches_everyone_in_order() {
        let listeners = Listeners::default();
        let first = Rc::new(RefCell::new(Vec::new()));
        let last = Rc::new(RefCell::new(Vec::new()));
        let _first = listeners.register("readDays", "2026", recording(&first), &snapshot());
        let registry = listeners.clone();
        let _writer = listeners.register(
            "readDays",
            "2026",
            Box::new(move |event: &DocumentEvent| {
                if day_count(event) == 1 {
                    registry.notify("readDays", "2026", snapshot_of(2));
                }
            }),
            &snapshot(),
        );
        let _last = listeners.register("readDays", "2026", recording(&last), &snapshot());
        listeners.notify("readDays", "2026", snapshot_of(1));
        assert_eq!(*first.borrow(), [0, 1, 2]);
        assert_eq!(*last.borrow(), [0, 1, 2]);
        assert_eq!(listeners.active(), 3);
    }
}
