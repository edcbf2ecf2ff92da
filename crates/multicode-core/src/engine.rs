//! Headless highlighting engine.
//!
//! `MemoryEngine` keeps the input surface in memory and performs no
//! highlighting. It reproduces the lifecycle contract of a real engine:
//! `run` throws the previous surface away together with its callbacks and
//! read-only flag, and edits typed by the user fire the update callback.
//!
//! Clones share one surface, so the caller can give one clone to a
//! controller and drive input through another.

use std::cell::RefCell;
use std::rc::Rc;

use crate::collaborators::{HighlightEngine, ScrollCallback, UpdateCallback};
use crate::language::Language;

#[derive(Default)]
struct Surface {
    /// Bumped by every `run`; callbacks from an older surface are dropped.
    generation: u64,
    mount: Option<String>,
    language: Option<Language>,
    text: String,
    read_only: bool,
    scroll_offset: f64,
    on_update: Option<UpdateCallback>,
    on_scroll: Option<ScrollCallback>,
}

/// An in-memory [`HighlightEngine`].
#[derive(Clone, Default)]
pub struct MemoryEngine {
    surface: Rc<RefCell<Surface>>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates the user replacing the input text.
    ///
    /// Returns false, without changing anything, if the surface is read-only.
    pub fn type_text(&self, text: &str) -> bool {
        let (callback, generation) = {
            let mut surface = self.surface.borrow_mut();
            if surface.read_only {
                return false;
            }
            surface.text = text.to_string();
            (surface.on_update.take(), surface.generation)
        };

        // The callback may re-enter the engine (a listener refreshing the
        // editor), so no borrow is held while it runs.
        if let Some(mut callback) = callback {
            callback(text);
            let mut surface = self.surface.borrow_mut();
            if surface.generation == generation && surface.on_update.is_none() {
                surface.on_update = Some(callback);
            }
        }
        true
    }

    /// Simulates the user scrolling the input surface.
    pub fn scroll_to(&self, offset: f64) {
        let (callback, generation) = {
            let mut surface = self.surface.borrow_mut();
            surface.scroll_offset = offset;
            (surface.on_scroll.take(), surface.generation)
        };

        if let Some(mut callback) = callback {
            callback(offset);
            let mut surface = self.surface.borrow_mut();
            if surface.generation == generation && surface.on_scroll.is_none() {
                surface.on_scroll = Some(callback);
            }
        }
    }

    /// Returns the grammar of the current surface.
    pub fn language(&self) -> Option<Language> {
        self.surface.borrow().language
    }

    /// Returns the selector the current surface is mounted at.
    pub fn mount(&self) -> Option<String> {
        self.surface.borrow().mount.clone()
    }

    /// Returns how many surfaces have been created.
    pub fn generation(&self) -> u64 {
        self.surface.borrow().generation
    }
}

impl HighlightEngine for MemoryEngine {
    fn run(&mut self, mount_selector: &str, language: Language) {
        let mut surface = self.surface.borrow_mut();
        let generation = surface.generation + 1;
        *surface = Surface {
            generation,
            mount: Some(mount_selector.to_string()),
            language: Some(language),
            ..Surface::default()
        };
    }

    fn update(&mut self, text: &str) {
        self.surface.borrow_mut().text = text.to_string();
    }

    fn on_update(&mut self, callback: UpdateCallback) {
        self.surface.borrow_mut().on_update = Some(callback);
    }

    fn text(&self) -> String {
        self.surface.borrow().text.clone()
    }

    fn set_read_only(&mut self, read_only: bool) {
        self.surface.borrow_mut().read_only = read_only;
    }

    fn is_read_only(&self) -> bool {
        self.surface.borrow().read_only
    }

    fn scroll_offset(&self) -> f64 {
        self.surface.borrow().scroll_offset
    }

    fn set_scroll_offset(&mut self, offset: f64) {
        self.surface.borrow_mut().scroll_offset = offset;
    }

    fn on_scroll(&mut self, callback: ScrollCallback) {
        self.surface.borrow_mut().on_scroll = Some(callback);
    }
}

impl std::fmt::Debug for MemoryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let surface = self.surface.borrow();
        f.debug_struct("MemoryEngine")
            .field("generation", &surface.generation)
            .field("language", &surface.language)
            .field("read_only", &surface.read_only)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_typing_fires_callback() {
        let mut engine = MemoryEngine::new();
        engine.run("#editor", Language::Python);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        engine.on_update(Box::new(move |text: &str| sink.borrow_mut().push(text.to_string())));

        assert!(engine.type_text("a"));
        assert!(engine.type_text("ab"));
        assert_eq!(*seen.borrow(), ["a", "ab"]);
        assert_eq!(engine.text(), "ab");
    }

    #[test]
    fn test_update_is_silent() {
        let mut engine = MemoryEngine::new();
        engine.run("#editor", Language::Python);
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        engine.on_update(Box::new(move |_: &str| counter.set(counter.get() + 1)));

        engine.update("x = 1");
        assert_eq!(engine.text(), "x = 1");
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_run_discards_surface() {
        let mut engine = MemoryEngine::new();
        engine.run("#editor", Language::Python);
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        engine.on_update(Box::new(move |_: &str| counter.set(counter.get() + 1)));
        engine.set_read_only(true);

        engine.run("#editor", Language::Json);
        assert_eq!(engine.generation(), 2);
        assert!(!engine.is_read_only());
        assert!(engine.type_text("{}"));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_read_only_rejects_typing() {
        let mut engine = MemoryEngine::new();
        engine.run("#editor", Language::JavaScript);
        engine.update("generated();");
        engine.set_read_only(true);

        assert!(!engine.type_text("edited();"));
        assert_eq!(engine.text(), "generated();");
    }

    #[test]
    fn test_callback_may_rerun_engine() {
        let mut engine = MemoryEngine::new();
        engine.run("#editor", Language::Python);

        let mut handle = engine.clone();
        engine.on_update(Box::new(move |_: &str| handle.run("#editor", Language::Json)));

        assert!(engine.type_text("x"));
        assert_eq!(engine.language(), Some(Language::Json));
        // The old callback belonged to the discarded surface.
        assert!(engine.type_text("y"));
        assert_eq!(engine.generation(), 2);
    }
}
