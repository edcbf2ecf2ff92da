//! Interfaces the controller drives but does not implement.
//!
//! ## Learning: Dependency Injection with Trait Objects
//!
//! The controller never reaches for globals. Everything that touches the
//! outside world (the page, the highlighting engine, the device console, the
//! download mechanism, user-facing alerts) is passed in as a boxed trait
//! object at construction. Tests substitute recording fakes.

use std::io;

use crate::language::Language;

/// Called with the full input text after every edit.
pub type UpdateCallback = Box<dyn FnMut(&str)>;

/// Called with the input surface's vertical scroll offset.
pub type ScrollCallback = Box<dyn FnMut(f64)>;

/// The element tree the editor chrome is rendered into.
pub trait Host {
    /// Returns true if an element with this id exists.
    fn has_element(&self, element_id: &str) -> bool;

    /// Replaces the content of an element with markup.
    fn render(&mut self, element_id: &str, markup: &str);

    /// Enables or disables the push button.
    fn set_push_enabled(&mut self, enabled: bool);

    /// Shows or hides the save prompt.
    fn set_save_prompt_open(&mut self, open: bool);

    /// Moves the language selector to a language.
    fn select_language(&mut self, language: Language);
}

/// A syntax-highlighting text input bound to a mount point.
///
/// Every call to [`run`](HighlightEngine::run) discards the previous input
/// surface and creates a new one. Callbacks and the read-only flag belong to
/// the surface, so callers must register them again after each `run`.
///
/// Callbacks fire only for user input, never from inside these methods.
pub trait HighlightEngine {
    /// Creates a fresh input surface at `mount_selector` for a grammar.
    fn run(&mut self, mount_selector: &str, language: Language);

    /// Replaces the surface text without firing the update callback.
    fn update(&mut self, text: &str);

    /// Registers the edit callback of the current surface.
    fn on_update(&mut self, callback: UpdateCallback);

    /// Returns the live text of the input surface.
    fn text(&self) -> String;

    fn set_read_only(&mut self, read_only: bool);

    fn is_read_only(&self) -> bool;

    /// Returns the vertical scroll offset of the input surface.
    fn scroll_offset(&self) -> f64;

    fn set_scroll_offset(&mut self, offset: f64);

    /// Registers the scroll callback of the current surface.
    fn on_scroll(&mut self, callback: ScrollCallback);
}

/// Sends code to an attached device console.
pub trait Uploader {
    fn upload(&mut self, code: &str);
}

/// File contents handed to a [`FileSaver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub content: String,
    pub mime_type: &'static str,
}

impl Blob {
    /// Creates a UTF-8 plain text blob.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            mime_type: "text/plain;charset=utf-8",
        }
    }
}

/// Writes a blob somewhere the user can find it under `file_name`.
pub trait FileSaver {
    fn save(&mut self, blob: Blob, file_name: &str) -> io::Result<()>;
}

/// Surfaces a warning to the user.
pub trait ErrorNotifier {
    fn alert_error(&mut self, message: &str);
}

/// The non-visual collaborators of a controller.
pub struct Collaborators {
    pub(crate) uploader: Option<Box<dyn Uploader>>,
    pub(crate) saver: Box<dyn FileSaver>,
    pub(crate) notifier: Box<dyn ErrorNotifier>,
}

impl Collaborators {
    /// Creates collaborators without an upload target.
    pub fn new(saver: impl FileSaver + 'static, notifier: impl ErrorNotifier + 'static) -> Self {
        Self {
            uploader: None,
            saver: Box::new(saver),
            notifier: Box::new(notifier),
        }
    }

    /// Adds an upload target.
    pub fn with_uploader(mut self, uploader: impl Uploader + 'static) -> Self {
        self.uploader = Some(Box::new(uploader));
        self
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("uploader", &self.uploader.is_some())
            .finish_non_exhaustive()
    }
}
