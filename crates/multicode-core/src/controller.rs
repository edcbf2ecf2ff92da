//! The editor controller.
//!
//! ## Learning: The Facade Pattern
//!
//! `EditorController` is the only type a host needs. It owns the buffers and
//! session, and forwards rendering, uploads and saves to the collaborators it
//! was built with.
//!
//! ## Thread Safety
//!
//! The controller lives on the host's UI thread. Its state sits behind
//! `Rc<RefCell<_>>` so that engine callbacks and change listeners can reach
//! it; no borrow is held while a listener or collaborator callback runs.

use std::cell::RefCell;
use std::io;
use std::rc::{Rc, Weak};

use crate::buffers::CodeBufferMap;
use crate::chrome::{self, ChromeIds};
use crate::collaborators::{
    Blob, Collaborators, ErrorNotifier, FileSaver, HighlightEngine, Host, ScrollCallback,
    UpdateCallback, Uploader,
};
use crate::config::EditorOptions;
use crate::event::{ChangeEvent, ChangeListener, ChangeListeners};
use crate::language::{Language, LanguageSet};
use crate::state::{EditorState, LanguageEntry};
use crate::{EditorError, EditorResult};

/// Shown when a save is submitted without a name.
pub const EMPTY_FILE_NAME_MESSAGE: &str = "Please enter a file name.";

/// Selection state of one editor.
#[derive(Debug, Clone, Copy)]
struct Session {
    active: Language,
    last_scroll_offset: Option<f64>,
}

struct Shared {
    ids: ChromeIds,
    languages: LanguageSet,
    session: RefCell<Session>,
    buffers: RefCell<CodeBufferMap>,
    listeners: ChangeListeners,
    host: RefCell<Option<Box<dyn Host>>>,
    engine: RefCell<Box<dyn HighlightEngine>>,
    uploader: RefCell<Option<Box<dyn Uploader>>>,
    saver: RefCell<Option<Box<dyn FileSaver>>>,
    notifier: RefCell<Option<Box<dyn ErrorNotifier>>>,
}

/// Calls a collaborator with it taken out of its slot, so it may call back
/// into the controller. Returns `None` if the slot is empty, either because
/// no collaborator was given or because it is already running further up the
/// stack.
fn with_slot<T: ?Sized, R>(
    slot: &RefCell<Option<Box<T>>>,
    f: impl FnOnce(&mut T) -> R,
) -> Option<R> {
    let mut collaborator = slot.borrow_mut().take()?;
    let result = f(&mut *collaborator);
    *slot.borrow_mut() = Some(collaborator);
    Some(result)
}

/// A multi-language code editor bound to one host element.
///
/// Cloning yields another handle to the same editor.
#[derive(Clone)]
pub struct EditorController {
    shared: Rc<Shared>,
}

/// A non-owning handle, for listeners that call back into the editor.
#[derive(Clone)]
pub struct WeakController {
    shared: Weak<Shared>,
}

impl WeakController {
    /// Returns the editor if it is still alive.
    pub fn upgrade(&self) -> Option<EditorController> {
        self.shared.upgrade().map(|shared| EditorController { shared })
    }
}

impl EditorController {
    /// Builds the editor chrome inside `host_element_id` and binds the engine
    /// to the primary language.
    pub fn new(
        host_element_id: &str,
        options: &EditorOptions,
        mut host: impl Host + 'static,
        engine: impl HighlightEngine + 'static,
        collaborators: Collaborators,
    ) -> EditorResult<Self> {
        let languages = options.language_set()?;

        if !host.has_element(host_element_id) {
            return Err(EditorError::HostElementNotFound(host_element_id.to_string()));
        }

        let ids = ChromeIds::for_host(host_element_id);
        let markup = chrome::render(&ids, &languages, options.hide_buttons);
        host.render(host_element_id, &markup);

        let primary = languages.primary();
        host.set_push_enabled(primary.is_executable());
        host.select_language(primary);

        let Collaborators {
            uploader,
            saver,
            notifier,
        } = collaborators;

        let controller = Self {
            shared: Rc::new(Shared {
                ids,
                languages,
                session: RefCell::new(Session {
                    active: primary,
                    last_scroll_offset: None,
                }),
                buffers: RefCell::new(CodeBufferMap::new()),
                listeners: ChangeListeners::new(),
                host: RefCell::new(Some(Box::new(host))),
                engine: RefCell::new(Box::new(engine)),
                uploader: RefCell::new(uploader),
                saver: RefCell::new(Some(saver)),
                notifier: RefCell::new(Some(notifier)),
            }),
        };
        controller.refresh_editor(None)?;

        tracing::info!(
            "Editor mounted in #{} with {} languages",
            host_element_id,
            controller.shared.languages.len()
        );
        Ok(controller)
    }

    // ==================== Language ====================

    /// Returns the active language.
    pub fn selected_language(&self) -> Language {
        self.shared.session.borrow().active
    }

    /// Switches the active language and re-renders the engine.
    pub fn change_language(&self, language: Language) -> EditorResult<()> {
        self.shared.languages.require(language)?;

        self.shared.session.borrow_mut().active = language;
        self.refresh_editor(None)?;
        self.with_host(|host| {
            host.set_push_enabled(language.is_executable());
            host.select_language(language);
        });

        tracing::debug!("Language selected: {}", language);
        self.shared
            .listeners
            .fire(&ChangeEvent::LanguageSelected(language));
        Ok(())
    }

    /// Returns the configured languages.
    pub fn languages(&self) -> &LanguageSet {
        &self.shared.languages
    }

    /// Returns the element ids of the rendered chrome.
    pub fn ids(&self) -> &ChromeIds {
        &self.shared.ids
    }

    // ==================== Buffers ====================

    /// Stores code for a language without re-rendering.
    pub fn add_code_to_editor(&self, code: impl Into<String>, language: Language) {
        self.shared.buffers.borrow_mut().set(language, code);
    }

    /// Returns the code stored for a language.
    pub fn buffer(&self, language: Language) -> String {
        self.shared.buffers.borrow().get(language).to_string()
    }

    /// Returns code loaded under an identifier that is not a known language.
    pub fn foreign(&self, id: &str) -> Option<String> {
        self.shared.buffers.borrow().foreign(id).map(str::to_string)
    }

    /// Empties every buffer and re-renders.
    pub fn clear(&self) -> EditorResult<()> {
        self.shared.buffers.borrow_mut().clear();
        self.refresh_editor(None)
    }

    // ==================== Rendering ====================

    /// Rebinds the engine to a language (the active one by default) and
    /// loads its buffer.
    ///
    /// The engine creates a new input surface on every bind, so the edit
    /// callback, the read-only flag and the scroll tracker are registered
    /// again each time.
    pub fn refresh_editor(&self, language: Option<Language>) -> EditorResult<()> {
        let language = language.unwrap_or_else(|| self.selected_language());
        let descriptor = self.shared.languages.require(language)?;
        let code = self.buffer(language);
        let selector = self.shared.ids.editor_selector();

        let mut engine = self.shared.engine.borrow_mut();
        engine.run(&selector, descriptor.highlight_language());
        engine.update(&code);
        engine.on_update(self.edit_callback(language));
        engine.set_read_only(descriptor.read_only);
        engine.on_scroll(self.scroll_callback());

        tracing::debug!(
            "Rendered {} ({} bytes, read-only: {})",
            language,
            code.len(),
            descriptor.read_only
        );
        Ok(())
    }

    /// Writes each edit into the buffer of `language` and notifies listeners.
    fn edit_callback(&self, language: Language) -> UpdateCallback {
        let shared = Rc::downgrade(&self.shared);
        Box::new(move |text: &str| {
            let Some(shared) = shared.upgrade() else {
                return;
            };
            shared.buffers.borrow_mut().set(language, text);
            shared.listeners.fire(&ChangeEvent::CodeUpdated(language));
        })
    }

    fn scroll_callback(&self) -> ScrollCallback {
        let shared = Rc::downgrade(&self.shared);
        Box::new(move |offset: f64| {
            if let Some(shared) = shared.upgrade() {
                shared.session.borrow_mut().last_scroll_offset = Some(offset);
            }
        })
    }

    /// Restores the last tracked scroll offset, e.g. after the editor was
    /// hidden and shown again.
    pub fn scroll_to_last_position(&self) {
        let offset = self.shared.session.borrow().last_scroll_offset;
        if let Some(offset) = offset {
            self.shared.engine.borrow_mut().set_scroll_offset(offset);
        }
    }

    /// Returns the last scroll offset reported by the input surface.
    pub fn last_scroll_offset(&self) -> Option<f64> {
        self.shared.session.borrow().last_scroll_offset
    }

    /// Returns true if the input surface currently rejects edits.
    pub fn is_read_only(&self) -> bool {
        self.shared.engine.borrow().is_read_only()
    }

    // ==================== Actions ====================

    /// Uploads the live Python code to the device console.
    ///
    /// Returns true if an upload was handed off. Other languages, and hosts
    /// without an upload target, are a no-op.
    pub fn push_code(&self) -> bool {
        let language = self.selected_language();
        if !language.is_executable() {
            tracing::debug!("Push ignored for {}", language);
            return false;
        }

        let code = self.shared.engine.borrow().text();
        match with_slot(&self.shared.uploader, |uploader| uploader.upload(&code)) {
            Some(()) => {
                tracing::info!("Pushed {} bytes of {}", code.len(), language);
                true
            }
            None => {
                tracing::warn!("Push requested but no upload target is available");
                false
            }
        }
    }

    /// Saves the live code as `file_name` plus the active language's
    /// extension.
    ///
    /// A blank name is reported to the user and leaves the save prompt open.
    pub fn save_code(&self, file_name: &str) -> EditorResult<()> {
        let name = file_name.trim();
        if name.is_empty() {
            let alerted = with_slot(&self.shared.notifier, |notifier| {
                notifier.alert_error(EMPTY_FILE_NAME_MESSAGE)
            });
            if alerted.is_none() {
                tracing::warn!("Alert already showing: {}", EMPTY_FILE_NAME_MESSAGE);
            }
            self.set_save_prompt_open(true);
            return Err(EditorError::EmptyFileName);
        }

        let descriptor = self.shared.languages.require(self.selected_language())?;
        let file_name = format!("{}{}", name, descriptor.file_extension);
        let code = self.shared.engine.borrow().text();

        with_slot(&self.shared.saver, |saver| saver.save(Blob::text(code), &file_name))
            .ok_or_else(|| io::Error::other("a save is already in progress"))??;
        self.set_save_prompt_open(false);

        tracing::info!("Saved {}", file_name);
        Ok(())
    }

    /// Shows or hides the save prompt.
    pub fn set_save_prompt_open(&self, open: bool) {
        self.with_host(|host| host.set_save_prompt_open(open));
    }

    fn with_host(&self, f: impl FnOnce(&mut (dyn Host + 'static))) {
        if with_slot(&self.shared.host, f).is_none() {
            tracing::debug!("Host busy, skipped a chrome update");
        }
    }

    // ==================== Persistence ====================

    /// Returns the buffers of every configured language except those the
    /// host workspace persists itself.
    pub fn state_as_xml(&self) -> EditorState {
        let buffers = self.shared.buffers.borrow();
        let entries = self
            .shared
            .languages
            .iter()
            .filter(|d| !d.value.is_workspace_owned())
            .map(|d| LanguageEntry::new(d.value.as_str(), buffers.get(d.value)))
            .collect();
        EditorState { entries }
    }

    /// Serializes [`state_as_xml`](Self::state_as_xml).
    pub fn state_as_xml_string(&self) -> String {
        self.state_as_xml().to_string()
    }

    /// Replaces the buffers named in `state` and re-renders the active
    /// language.
    pub fn load_state_from_xml(&self, state: &EditorState) -> EditorResult<()> {
        {
            let mut buffers = self.shared.buffers.borrow_mut();
            for entry in &state.entries {
                if entry.id.parse::<Language>().is_err() {
                    tracing::warn!("Keeping code for unknown language {:?}", entry.id);
                }
                buffers.set_raw(&entry.id, entry.code.as_str());
            }
        }
        tracing::info!("Loaded editor state with {} entries", state.entries.len());
        self.refresh_editor(None)
    }

    /// Parses and loads a state document.
    ///
    /// A document that fails to parse leaves every buffer untouched.
    pub fn load_state_from_xml_string(&self, source: &str) -> EditorResult<()> {
        let state = EditorState::parse(source)?;
        self.load_state_from_xml(&state)
    }

    // ==================== Events ====================

    /// Registers a change listener and returns it.
    pub fn add_change_listener(&self, listener: ChangeListener) -> ChangeListener {
        self.shared.listeners.add(listener)
    }

    /// Removes a listener previously returned by
    /// [`add_change_listener`](Self::add_change_listener).
    pub fn remove_change_listener(&self, listener: &ChangeListener) -> bool {
        self.shared.listeners.remove(listener)
    }

    /// Returns a handle that does not keep the editor alive.
    pub fn downgrade(&self) -> WeakController {
        WeakController {
            shared: Rc::downgrade(&self.shared),
        }
    }
}

impl std::fmt::Debug for EditorController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorController")
            .field("host", &self.shared.ids.host)
            .field("session", &*self.shared.session.borrow())
            .field("listeners", &self.shared.listeners)
            .finish_non_exhaustive()
    }
}
