//! Per-language code buffers.

use std::collections::{BTreeMap, HashMap};

use crate::language::Language;

/// Source text for each language; a missing entry reads as empty.
///
/// Identifiers that appear in loaded state but are not known languages are
/// kept verbatim in a side table so a load never drops data silently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeBufferMap {
    buffers: HashMap<Language, String>,
    foreign: BTreeMap<String, String>,
}

impl CodeBufferMap {
    /// Creates an empty buffer map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the code stored for a language.
    pub fn get(&self, language: Language) -> &str {
        self.buffers.get(&language).map(String::as_str).unwrap_or("")
    }

    /// Returns true if a buffer was ever stored for the language.
    pub fn contains(&self, language: Language) -> bool {
        self.buffers.contains_key(&language)
    }

    /// Replaces the code for a language.
    pub fn set(&mut self, language: Language, code: impl Into<String>) {
        self.buffers.insert(language, code.into());
    }

    /// Stores code under a raw identifier.
    ///
    /// Known identifiers land in the typed map; anything else goes to the
    /// foreign table.
    pub fn set_raw(&mut self, id: &str, code: impl Into<String>) {
        match id.parse::<Language>() {
            Ok(language) => self.set(language, code),
            Err(_) => {
                self.foreign.insert(id.to_string(), code.into());
            }
        }
    }

    /// Returns code stored under an unknown identifier.
    pub fn foreign(&self, id: &str) -> Option<&str> {
        self.foreign.get(id).map(String::as_str)
    }

    /// Empties every buffer.
    pub fn clear(&mut self) {
        self.buffers.clear();
        self.foreign.clear();
    }

    /// Returns true if no buffer holds any entry.
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty() && self.foreign.is_empty()
    }
}
