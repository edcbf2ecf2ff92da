//! # Multicode Core
//!
//! Controller logic for a multi-language code editing surface embedded in a
//! host application.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    EditorController                       │
//! │  ┌─────────────┐ ┌──────────────┐ ┌────────────────────┐ │
//! │  │ LanguageSet │ │ CodeBufferMap│ │  ChangeListeners   │ │
//! │  └─────────────┘ └──────────────┘ └────────────────────┘ │
//! │         │                │                               │
//! │  ┌──────┴────────────────┴─────────────────────────────┐ │
//! │  │      Collaborators (injected at construction)       │ │
//! │  │  Host · HighlightEngine · Uploader · FileSaver ·    │ │
//! │  │  ErrorNotifier                                      │ │
//! │  └─────────────────────────────────────────────────────┘ │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Persisted state is a small XML dialect, see [`state`].

pub mod buffers;
pub mod chrome;
pub mod collaborators;
pub mod config;
pub mod controller;
pub mod engine;
pub mod event;
pub mod host;
pub mod language;
pub mod state;
pub mod ui;

#[cfg(test)]
pub(crate) mod testing;

pub use buffers::CodeBufferMap;
pub use chrome::ChromeIds;
pub use collaborators::{
    Blob, Collaborators, ErrorNotifier, FileSaver, HighlightEngine, Host, ScrollCallback,
    UpdateCallback, Uploader,
};
pub use config::{Config, ConfigError, EditorOptions};
pub use controller::{EditorController, WeakController};
pub use engine::MemoryEngine;
pub use event::{ChangeEvent, ChangeListener, ChangeListeners};
pub use host::HeadlessHost;
pub use language::{Language, LanguageDescriptor, LanguageSet};
pub use state::{EditorState, LanguageEntry};
pub use ui::UiEvent;

/// Result type for editor operations
pub type EditorResult<T> = Result<T, EditorError>;

/// Errors that can occur in editor operations
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("Host element not found: {0}")]
    HostElementNotFound(String),

    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    #[error("File name is empty")]
    EmptyFileName,

    #[error("Malformed editor state at byte {offset}: {reason}")]
    MalformedState { offset: usize, reason: String },

    #[error("Language configured more than once: {0}")]
    DuplicateLanguage(Language),

    #[error("No languages configured")]
    NoLanguages,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
