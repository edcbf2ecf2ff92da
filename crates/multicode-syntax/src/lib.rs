//! # Multicode Syntax
//!
//! A tree-sitter backed [`HighlightEngine`] for the multicode editor.
//!
//! ## Why Tree-sitter?
//!
//! Tree-sitter produces a concrete syntax tree even for code with errors,
//! which is the normal state of code while it is being typed. Highlight
//! spans come from walking that tree, not from regexes.
//!
//! ## Learning: Composition over Inheritance
//!
//! [`SyntaxEngine`] does not reimplement the input surface. It wraps the
//! core crate's [`MemoryEngine`], delegates the surface contract to it and
//! adds highlighting on top.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use multicode_core::{HighlightEngine, Language, MemoryEngine, ScrollCallback, UpdateCallback};
use tree_sitter::{Node, Parser, Tree};

/// Errors that can occur during syntax highlighting.
#[derive(Debug, thiserror::Error)]
pub enum SyntaxError {
    #[error("No grammar for language: {0}")]
    UnknownLanguage(Language),

    #[error("Parser error")]
    ParseError,
}

/// A parser for one grammar.
pub struct Highlighter {
    parser: Parser,
}

impl Highlighter {
    /// Creates a new highlighter for a language.
    pub fn new(lang: Language) -> Result<Self, SyntaxError> {
        let language = grammar(lang)?;

        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .map_err(|_| SyntaxError::ParseError)?;

        Ok(Self { parser })
    }

    /// Parses source code from scratch.
    pub fn parse(&mut self, source: &str) -> Result<Tree, SyntaxError> {
        self.parser
            .parse(source, None)
            .ok_or(SyntaxError::ParseError)
    }

    /// Returns syntax highlights for the source code.
    pub fn highlight(&mut self, source: &str) -> Result<Vec<HighlightSpan>, SyntaxError> {
        let tree = self.parse(source)?;
        let mut spans = Vec::new();
        collect_highlights(tree.root_node(), &mut spans);
        Ok(spans)
    }
}

/// Recursively collects highlights from the syntax tree.
fn collect_highlights(node: Node, spans: &mut Vec<HighlightSpan>) {
    let kind = highlight_kind_from_node(node.kind());

    if kind != HighlightKind::None {
        spans.push(HighlightSpan {
            start: node.start_byte(),
            end: node.end_byte(),
            kind,
        });
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_highlights(child, spans);
    }
}

/// A highlighted span of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightSpan {
    /// Start byte offset
    pub start: usize,
    /// End byte offset
    pub end: usize,
    /// Kind of syntax element
    pub kind: HighlightKind,
}

/// Types of syntax elements for highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HighlightKind {
    Keyword,
    String,
    Number,
    Comment,
    Function,
    Constant,
    Operator,
    Property,
    Attribute,
    None,
}

impl HighlightKind {
    /// Returns the CSS class suffix for this kind.
    pub fn class_name(&self) -> &'static str {
        match self {
            HighlightKind::Keyword => "keyword",
            HighlightKind::String => "string",
            HighlightKind::Number => "number",
            HighlightKind::Comment => "comment",
            HighlightKind::Function => "function",
            HighlightKind::Constant => "constant",
            HighlightKind::Operator => "operator",
            HighlightKind::Property => "property",
            HighlightKind::Attribute => "attribute",
            HighlightKind::None => "plain",
        }
    }
}

/// Maps node kinds of the supported grammars to highlight kinds.
fn highlight_kind_from_node(kind: &str) -> HighlightKind {
    match kind {
        // Python and JavaScript keywords
        "def" | "class" | "if" | "elif" | "else" | "for" | "while" | "return" | "import"
        | "from" | "as" | "try" | "except" | "finally" | "with" | "yield" | "lambda"
        | "pass" | "break" | "continue" | "in" | "not" | "and" | "or" | "is" | "global"
        | "function" | "let" | "const" | "var" | "new" | "typeof" | "instanceof"
        | "throw" | "catch" | "switch" | "case" | "default" | "export" | "extends"
        | "async" | "await" | "do" => HighlightKind::Keyword,

        "true" | "false" | "True" | "False" | "None" | "null" | "undefined" => {
            HighlightKind::Constant
        }

        "string" | "template_string" => HighlightKind::String,

        "number" | "integer" | "float" => HighlightKind::Number,

        "comment" => HighlightKind::Comment,

        "call" | "call_expression" | "function_definition" | "function_declaration"
        | "method_definition" => HighlightKind::Function,

        "decorator" => HighlightKind::Attribute,

        "binary_operator" | "binary_expression" | "unary_expression"
        | "assignment_expression" | "comparison_operator" => HighlightKind::Operator,

        // JSON object keys
        "pair" => HighlightKind::Property,

        _ => HighlightKind::None,
    }
}

/// Gets the tree-sitter grammar for a language.
///
/// Block code is generated JavaScript and is normally bound with
/// `highlight_as = javascript`; it has no grammar of its own.
fn grammar(lang: Language) -> Result<tree_sitter::Language, SyntaxError> {
    match lang {
        Language::Python => Ok(tree_sitter_python::LANGUAGE.into()),
        Language::JavaScript => Ok(tree_sitter_javascript::LANGUAGE.into()),
        Language::Json => Ok(tree_sitter_json::LANGUAGE.into()),
        Language::Blockly => Err(SyntaxError::UnknownLanguage(lang)),
    }
}

/// Lazily created highlighters, one per grammar.
#[derive(Default)]
pub struct LanguageRegistry {
    highlighters: HashMap<Language, Highlighter>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets or creates a highlighter for a language.
    pub fn get_mut(&mut self, lang: Language) -> Result<&mut Highlighter, SyntaxError> {
        if !self.highlighters.contains_key(&lang) {
            let highlighter = Highlighter::new(lang)?;
            self.highlighters.insert(lang, highlighter);
        }
        self.highlighters
            .get_mut(&lang)
            .ok_or(SyntaxError::UnknownLanguage(lang))
    }

    /// Returns true if a grammar exists for the language.
    pub fn supports(lang: Language) -> bool {
        grammar(lang).is_ok()
    }
}

/// A [`HighlightEngine`] whose input surface is highlighted with tree-sitter.
///
/// Clones share one surface and one parser cache.
#[derive(Clone, Default)]
pub struct SyntaxEngine {
    surface: MemoryEngine,
    registry: Rc<RefCell<LanguageRegistry>>,
}

impl SyntaxEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates the user replacing the input text.
    pub fn type_text(&self, text: &str) -> bool {
        self.surface.type_text(text)
    }

    /// Simulates the user scrolling the input surface.
    pub fn scroll_to(&self, offset: f64) {
        self.surface.scroll_to(offset);
    }

    /// Returns the grammar the surface is bound to.
    pub fn language(&self) -> Option<Language> {
        self.surface.language()
    }

    /// Highlights the current surface text.
    pub fn highlights(&self) -> Result<Vec<HighlightSpan>, SyntaxError> {
        let Some(lang) = self.surface.language() else {
            return Ok(Vec::new());
        };
        let text = self.surface.text();
        self.registry.borrow_mut().get_mut(lang)?.highlight(&text)
    }
}

impl HighlightEngine for SyntaxEngine {
    fn run(&mut self, mount_selector: &str, language: Language) {
        if !LanguageRegistry::supports(language) {
            tracing::warn!("No grammar for {}, text will not be highlighted", language);
        }
        self.surface.run(mount_selector, language);
    }

    fn update(&mut self, text: &str) {
        self.surface.update(text);
    }

    fn on_update(&mut self, callback: UpdateCallback) {
        self.surface.on_update(callback);
    }

    fn text(&self) -> String {
        self.surface.text()
    }

    fn set_read_only(&mut self, read_only: bool) {
        self.surface.set_read_only(read_only);
    }

    fn is_read_only(&self) -> bool {
        self.surface.is_read_only()
    }

    fn scroll_offset(&self) -> f64 {
        self.surface.scroll_offset()
    }

    fn set_scroll_offset(&mut self, offset: f64) {
        self.surface.set_scroll_offset(offset);
    }

    fn on_scroll(&mut self, callback: ScrollCallback) {
        self.surface.on_scroll(callback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_highlighting() {
        let mut highlighter = Highlighter::new(Language::Python).unwrap();
        let source = "def main():\n    return 42  # answer\n";

        let spans = highlighter.highlight(source).unwrap();

        assert!(spans.iter().any(|s| s.kind == HighlightKind::Keyword));
        assert!(spans.iter().any(|s| s.kind == HighlightKind::Comment));
        let number = spans.iter().find(|s| s.kind == HighlightKind::Number).unwrap();
        assert_eq!(&source[number.start..number.end], "42");
    }

    #[test]
    fn test_json_highlighting() {
        let mut highlighter = Highlighter::new(Language::Json).unwrap();
        let spans = highlighter.highlight(r#"{"speed": 3}"#).unwrap();
        assert!(spans.iter().any(|s| s.kind == HighlightKind::Property));
        assert!(spans.iter().any(|s| s.kind == HighlightKind::Number));
    }

    #[test]
    fn test_blockly_has_no_grammar() {
        assert!(matches!(
            Highlighter::new(Language::Blockly),
            Err(SyntaxError::UnknownLanguage(Language::Blockly))
        ));
        assert!(!LanguageRegistry::supports(Language::Blockly));
    }

    #[test]
    fn test_engine_highlights_surface() {
        let mut engine = SyntaxEngine::new();
        assert!(engine.highlights().unwrap().is_empty());

        engine.run("#editor", Language::JavaScript);
        engine.update("const x = 'a';");
        let spans = engine.highlights().unwrap();
        assert!(spans.iter().any(|s| s.kind == HighlightKind::String));

        assert!(engine.type_text("// gone"));
        let spans = engine.highlights().unwrap();
        assert!(spans.iter().all(|s| s.kind == HighlightKind::Comment));
    }

    #[test]
    fn test_engine_surface_contract() {
        let mut engine = SyntaxEngine::new();
        engine.run("#editor", Language::Python);
        engine.set_read_only(true);
        assert!(!engine.type_text("x"));

        engine.run("#editor", Language::Python);
        assert!(!engine.is_read_only());
        engine.set_scroll_offset(12.5);
        assert_eq!(engine.scroll_offset(), 12.5);
    }
}
