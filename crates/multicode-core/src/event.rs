//! Change notifications.
//!
//! ## Learning: Observers Without Lifetimes
//!
//! Listeners are `Rc<dyn Fn>` values. Sharing them through `Rc` gives each
//! registration an identity (`Rc::ptr_eq`) so it can be removed later, and
//! lets a fire pass work on a cheap snapshot of the registry. A listener can
//! therefore register or remove listeners while it is being called; the
//! change takes effect on the next fire.

use std::cell::RefCell;
use std::rc::Rc;

use crate::language::Language;

/// A change the host may want to react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// The active language changed
    LanguageSelected(Language),
    /// The code of a language was edited through the input surface
    CodeUpdated(Language),
}

impl ChangeEvent {
    /// Returns the event type name hosts match on.
    pub fn kind(&self) -> &'static str {
        match self {
            ChangeEvent::LanguageSelected(_) => "LANGUAGE_SELECTED",
            ChangeEvent::CodeUpdated(_) => "CODE_UPDATED",
        }
    }

    /// Returns the language the event refers to.
    pub fn language(&self) -> Language {
        match self {
            ChangeEvent::LanguageSelected(lang) | ChangeEvent::CodeUpdated(lang) => *lang,
        }
    }
}

/// A registered change callback.
pub type ChangeListener = Rc<dyn Fn(&ChangeEvent)>;

/// Ordered listener registry.
#[derive(Default)]
pub struct ChangeListeners {
    listeners: RefCell<Vec<ChangeListener>>,
}

impl ChangeListeners {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a listener and hands it back.
    ///
    /// The same listener may be added more than once; it is then called once
    /// per registration.
    pub fn add(&self, listener: ChangeListener) -> ChangeListener {
        self.listeners.borrow_mut().push(Rc::clone(&listener));
        listener
    }

    /// Removes the first registration of `listener`.
    pub fn remove(&self, listener: &ChangeListener) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        match listeners.iter().position(|l| Rc::ptr_eq(l, listener)) {
            Some(index) => {
                listeners.remove(index);
                true
            }
            None => false,
        }
    }

    /// Calls every listener registered at the time of the call, in order.
    pub fn fire(&self, event: &ChangeEvent) {
        let snapshot: Vec<ChangeListener> = self.listeners.borrow().clone();
        tracing::trace!("Firing {} to {} listener(s)", event.kind(), snapshot.len());
        for listener in snapshot {
            listener(event);
        }
    }

    /// Returns the number of registrations.
    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }
}

impl std::fmt::Debug for ChangeListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeListeners")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn recorder(log: &Rc<RefCell<Vec<String>>>, name: &str) -> ChangeListener {
        let log = Rc::clone(log);
        let name = name.to_string();
        Rc::new(move |event: &ChangeEvent| {
            log.borrow_mut().push(format!("{name}:{}", event.kind()));
        })
    }

    #[test]
    fn test_fires_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let listeners = ChangeListeners::new();
        listeners.add(recorder(&log, "a"));
        listeners.add(recorder(&log, "b"));

        listeners.fire(&ChangeEvent::CodeUpdated(Language::Python));

        assert_eq!(*log.borrow(), ["a:CODE_UPDATED", "b:CODE_UPDATED"]);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let count = Rc::new(Cell::new(0));
        let listeners = ChangeListeners::new();
        let counter = Rc::clone(&count);
        let listener: ChangeListener = Rc::new(move |_: &ChangeEvent| counter.set(counter.get() + 1));

        let returned = listeners.add(Rc::clone(&listener));
        listeners.add(listener);
        assert_eq!(listeners.len(), 2);

        listeners.fire(&ChangeEvent::LanguageSelected(Language::Json));
        assert_eq!(count.get(), 2);

        assert!(listeners.remove(&returned));
        listeners.fire(&ChangeEvent::LanguageSelected(Language::Json));
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn test_registration_during_fire_uses_snapshot() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let listeners = Rc::new(ChangeListeners::new());

        let late = recorder(&log, "late");
        let registry = Rc::clone(&listeners);
        listeners.add(Rc::new(move |_: &ChangeEvent| {
            registry.add(Rc::clone(&late));
        }));

        listeners.fire(&ChangeEvent::CodeUpdated(Language::Python));
        assert!(log.borrow().is_empty());
        assert_eq!(listeners.len(), 2);

        listeners.fire(&ChangeEvent::CodeUpdated(Language::Python));
        assert_eq!(*log.borrow(), ["late:CODE_UPDATED"]);
    }

    #[test]
    fn test_removal_during_fire_uses_snapshot() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let listeners = Rc::new(ChangeListeners::new());

        let registry = Rc::clone(&listeners);
        let target: Rc<RefCell<Option<ChangeListener>>> = Rc::new(RefCell::new(None));
        let victim = Rc::clone(&target);
        listeners.add(Rc::new(move |_: &ChangeEvent| {
            if let Some(listener) = victim.borrow_mut().take() {
                registry.remove(&listener);
            }
        }));
        *target.borrow_mut() = Some(listeners.add(recorder(&log, "b")));

        listeners.fire(&ChangeEvent::LanguageSelected(Language::Json));
        assert_eq!(*log.borrow(), ["b:LANGUAGE_SELECTED"]);
        assert_eq!(listeners.len(), 1);

        listeners.fire(&ChangeEvent::LanguageSelected(Language::Json));
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_event_language() {
        assert_eq!(ChangeEvent::CodeUpdated(Language::Json).language(), Language::Json);
        assert_eq!(
            ChangeEvent::LanguageSelected(Language::Blockly).language(),
            Language::Blockly
        );
    }
}
