//! In-memory host for running the editor without a page.
//!
//! `HeadlessHost` is a handle: clones share one element tree, so a caller
//! can hand one clone to the controller and keep another to inspect what
//! was rendered.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::collaborators::Host;
use crate::language::Language;

#[derive(Debug, Default)]
struct HostState {
    elements: HashMap<String, String>,
    push_enabled: bool,
    save_prompt_open: bool,
    selected: Option<Language>,
}

/// A [`Host`] that keeps rendered markup and control state in memory.
#[derive(Debug, Clone, Default)]
pub struct HeadlessHost {
    state: Rc<RefCell<HostState>>,
}

impl HeadlessHost {
    /// Creates a host containing empty elements with the given ids.
    pub fn with_elements<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let state = HostState {
            elements: ids.into_iter().map(|id| (id.into(), String::new())).collect(),
            ..HostState::default()
        };
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    /// Returns the markup last rendered into an element.
    pub fn markup(&self, element_id: &str) -> Option<String> {
        self.state.borrow().elements.get(element_id).cloned()
    }

    pub fn push_enabled(&self) -> bool {
        self.state.borrow().push_enabled
    }

    pub fn save_prompt_open(&self) -> bool {
        self.state.borrow().save_prompt_open
    }

    pub fn selected_language(&self) -> Option<Language> {
        self.state.borrow().selected
    }
}

impl Host for HeadlessHost {
    fn has_element(&self, element_id: &str) -> bool {
        self.state.borrow().elements.contains_key(element_id)
    }

    fn render(&mut self, element_id: &str, markup: &str) {
        self.state
            .borrow_mut()
            .elements
            .insert(element_id.to_string(), markup.to_string());
    }

    fn set_push_enabled(&mut self, enabled: bool) {
        self.state.borrow_mut().push_enabled = enabled;
    }

    fn set_save_prompt_open(&mut self, open: bool) {
        self.state.borrow_mut().save_prompt_open = open;
    }

    fn select_language(&mut self, language: Language) {
        self.state.borrow_mut().selected = Some(language);
    }
}
