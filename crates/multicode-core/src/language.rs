//! Language identifiers and the configured language list.
//!
//! ## Learning: Closed Enums as Keys
//!
//! Buffers are keyed by [`Language`] rather than by strings. A typo in an
//! identifier becomes a parse error at the boundary (config, UI, persisted
//! state) instead of a silently empty buffer deep inside the controller.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{EditorError, EditorResult};

/// A language the editor knows how to hold code for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    Json,
    /// Code generated from the host's visual block workspace.
    Blockly,
}

impl Language {
    /// Every known language, in declaration order.
    pub const ALL: [Language; 4] = [
        Language::Python,
        Language::JavaScript,
        Language::Json,
        Language::Blockly,
    ];

    /// Returns the identifier used in markup and persisted state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::Json => "json",
            Language::Blockly => "blockly",
        }
    }

    /// Returns true if code in this language can be pushed to a device.
    pub fn is_executable(&self) -> bool {
        matches!(self, Language::Python)
    }

    /// Returns true if the host workspace persists this language itself.
    ///
    /// Such languages are left out of the editor's XML state.
    pub fn is_workspace_owned(&self) -> bool {
        matches!(self, Language::Blockly)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|lang| lang.as_str() == s)
            .ok_or_else(|| EditorError::UnknownLanguage(s.to_string()))
    }
}

/// Describes one entry of the language selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageDescriptor {
    /// Identifier, unique within a [`LanguageSet`]
    pub value: Language,

    /// Label shown in the selector
    pub display_text: String,

    /// Grammar to highlight with, when different from `value`
    #[serde(default)]
    pub highlight_as: Option<Language>,

    /// Extension appended to saved file names, including the dot
    pub file_extension: String,

    /// Whether the input surface rejects edits
    #[serde(default)]
    pub read_only: bool,
}

impl LanguageDescriptor {
    /// Creates an editable descriptor highlighted as itself.
    pub fn new(
        value: Language,
        display_text: impl Into<String>,
        file_extension: impl Into<String>,
    ) -> Self {
        Self {
            value,
            display_text: display_text.into(),
            highlight_as: None,
            file_extension: file_extension.into(),
            read_only: false,
        }
    }

    /// Sets the grammar used for highlighting.
    pub fn highlighted_as(mut self, language: Language) -> Self {
        self.highlight_as = Some(language);
        self
    }

    /// Marks the descriptor read-only.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Returns the grammar the engine should be bound to.
    pub fn highlight_language(&self) -> Language {
        self.highlight_as.unwrap_or(self.value)
    }
}

/// The ordered, validated list of languages a controller offers.
///
/// The first descriptor is the primary language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageSet {
    descriptors: Vec<LanguageDescriptor>,
}

impl LanguageSet {
    /// Validates and wraps a descriptor list.
    pub fn new(descriptors: Vec<LanguageDescriptor>) -> EditorResult<Self> {
        if descriptors.is_empty() {
            return Err(EditorError::NoLanguages);
        }

        for (i, descriptor) in descriptors.iter().enumerate() {
            if descriptors[..i].iter().any(|d| d.value == descriptor.value) {
                return Err(EditorError::DuplicateLanguage(descriptor.value));
            }
        }

        Ok(Self { descriptors })
    }

    /// Returns the language the editor starts in.
    pub fn primary(&self) -> Language {
        self.descriptors[0].value
    }

    /// Looks up a descriptor by identifier.
    pub fn get(&self, language: Language) -> Option<&LanguageDescriptor> {
        self.descriptors.iter().find(|d| d.value == language)
    }

    /// Looks up a descriptor, failing for unconfigured languages.
    pub fn require(&self, language: Language) -> EditorResult<&LanguageDescriptor> {
        self.get(language)
            .ok_or_else(|| EditorError::UnknownLanguage(language.to_string()))
    }

    /// Returns true if the language is configured.
    pub fn contains(&self, language: Language) -> bool {
        self.get(language).is_some()
    }

    /// Finds the descriptor whose extension matches, ignoring case and the dot.
    pub fn by_extension(&self, extension: &str) -> Option<&LanguageDescriptor> {
        let wanted = extension.trim_start_matches('.');
        self.descriptors.iter().filter(|d| !d.read_only).find(|d| {
            d.file_extension
                .trim_start_matches('.')
                .eq_ignore_ascii_case(wanted)
        })
    }

    /// Returns an iterator over the descriptors in configured order.
    pub fn iter(&self) -> impl Iterator<Item = &LanguageDescriptor> {
        self.descriptors.iter()
    }

    /// Returns the number of configured languages.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Always false; a set holds at least one language.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl Default for LanguageSet {
    fn default() -> Self {
        Self {
            descriptors: default_descriptors(),
        }
    }
}

/// The stock language list: three editable languages plus the generated
/// block code, which is shown highlighted as JavaScript and cannot be edited.
pub fn default_descriptors() -> Vec<LanguageDescriptor> {
    vec![
        LanguageDescriptor::new(Language::Python, "Python", ".py"),
        LanguageDescriptor::new(Language::JavaScript, "JavaScript", ".js"),
        LanguageDescriptor::new(Language::Json, "JSON", ".json"),
        LanguageDescriptor::new(Language::Blockly, "Blocks", ".js")
            .highlighted_as(Language::JavaScript)
            .read_only(),
    ]
}
