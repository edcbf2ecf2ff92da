//! Persisted editor state.
//!
//! The format is a deliberately tiny XML dialect:
//!
//! ```text
//! <editor><language value="python">x = 1</language>...</editor>
//! ```
//!
//! Writing is byte-exact: no declaration, no whitespace between elements,
//! bodies escaped with the predefined entities. Reading is lenient about the
//! things real XML tooling emits (declaration, comments, indentation, CDATA,
//! character references) and strict about everything else, so a corrupt file
//! is rejected before any buffer is touched.
//!
//! XML 1.0 has no representation for C0 control characters other than tab,
//! LF and CR. They are written as numeric character references, which this
//! reader accepts but a strict XML 1.0 reader will reject. A leading
//! byte-order mark is skipped on read.

use std::fmt;
use std::str::FromStr;

use crate::{EditorError, EditorResult};

const ROOT: &str = "editor";
const ENTRY: &str = "language";
const VALUE_ATTR: &str = "value";

/// One `<language>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageEntry {
    /// Raw identifier from the `value` attribute
    pub id: String,
    /// Unescaped element body
    pub code: String,
}

impl LanguageEntry {
    pub fn new(id: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
        }
    }
}

/// Parsed form of the persisted state document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorState {
    pub entries: Vec<LanguageEntry>,
}

impl EditorState {
    /// Parses a state document.
    pub fn parse(source: &str) -> EditorResult<Self> {
        StateParser::new(source).parse_document()
    }

    /// Returns the code for an identifier, if present.
    ///
    /// When an identifier repeats, the last element wins, matching the order
    /// in which a load applies them.
    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.id == id)
            .map(|e| e.code.as_str())
    }
}

impl fmt::Display for EditorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{ROOT}>")?;
        for entry in &self.entries {
            write!(f, "<{ENTRY} {VALUE_ATTR}=\"")?;
            write_escaped(f, &entry.id, true)?;
            f.write_str("\">")?;
            write_escaped(f, &entry.code, false)?;
            write!(f, "</{ENTRY}>")?;
        }
        write!(f, "</{ROOT}>")
    }
}

impl FromStr for EditorState {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, text: &str, attribute: bool) -> fmt::Result {
    let mut start = 0;
    for (i, c) in text.char_indices() {
        let replacement = match c {
            '&' => "&amp;",
            '<' => "&lt;",
            '>' => "&gt;",
            // A bare CR would be folded into LF by any conforming reader.
            '\r' => "&#13;",
            '"' if attribute => "&quot;",
            c if c.is_ascii_control() && !matches!(c, '\t' | '\n' | '\x7f') => {
                f.write_str(&text[start..i])?;
                write!(f, "&#{};", c as u32)?;
                start = i + 1;
                continue;
            }
            _ => continue,
        };
        f.write_str(&text[start..i])?;
        f.write_str(replacement)?;
        start = i + c.len_utf8();
    }
    f.write_str(&text[start..])
}

/// Start tag as read from the input.
struct StartTag<'a> {
    name: &'a str,
    attributes: Vec<(&'a str, String)>,
    self_closing: bool,
}

impl StartTag<'_> {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }
}

struct StateParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> StateParser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn parse_document(mut self) -> EditorResult<EditorState> {
        self.eat("\u{FEFF}");
        self.skip_misc()?;

        let root_at = self.pos;
        let root = self.parse_start_tag()?;
        if root.name != ROOT {
            return Err(self.error_at(root_at, format!("expected <{ROOT}>, found <{}>", root.name)));
        }

        let mut state = EditorState::default();
        if !root.self_closing {
            loop {
                self.skip_misc()?;
                if self.rest().starts_with("</") {
                    self.parse_end_tag(ROOT)?;
                    break;
                }
                if !self.rest().starts_with('<') {
                    return Err(self.error(if self.at_end() {
                        format!("unclosed <{ROOT}>")
                    } else {
                        "unexpected text".to_string()
                    }));
                }
                state.entries.push(self.parse_entry()?);
            }
        }

        self.skip_misc()?;
        if !self.at_end() {
            return Err(self.error("trailing content after root element"));
        }

        Ok(state)
    }

    fn parse_entry(&mut self) -> EditorResult<LanguageEntry> {
        let tag_at = self.pos;
        let tag = self.parse_start_tag()?;
        if tag.name != ENTRY {
            return Err(self.error_at(tag_at, format!("unexpected element <{}>", tag.name)));
        }
        let id = tag
            .attribute(VALUE_ATTR)
            .ok_or_else(|| self.error_at(tag_at, format!("<{ENTRY}> without {VALUE_ATTR}")))?
            .to_string();

        let code = if tag.self_closing {
            String::new()
        } else {
            self.parse_body()?
        };

        Ok(LanguageEntry { id, code })
    }

    /// Reads character data up to and including `</language>`.
    fn parse_body(&mut self) -> EditorResult<String> {
        let mut code = String::new();
        loop {
            let rest = self.rest();
            if rest.is_empty() {
                return Err(self.error(format!("unclosed <{ENTRY}>")));
            } else if rest.starts_with("</") {
                self.parse_end_tag(ENTRY)?;
                return Ok(code);
            } else if let Some(cdata) = rest.strip_prefix("<![CDATA[") {
                let end = cdata
                    .find("]]>")
                    .ok_or_else(|| self.error("unterminated CDATA section"))?;
                code.push_str(&cdata[..end]);
                self.pos += "<![CDATA[".len() + end + "]]>".len();
            } else if rest.starts_with("<!--") {
                self.skip_comment()?;
            } else if rest.starts_with('<') {
                return Err(self.error(format!("element nested in <{ENTRY}>")));
            } else if rest.starts_with('&') {
                code.push(self.parse_reference()?);
            } else {
                let end = rest.find(['<', '&']).unwrap_or(rest.len());
                code.push_str(&rest[..end]);
                self.pos += end;
            }
        }
    }

    fn parse_start_tag(&mut self) -> EditorResult<StartTag<'a>> {
        if !self.eat("<") {
            return Err(self.error("expected start tag"));
        }
        let name = self.parse_name()?;

        let mut attributes = Vec::new();
        loop {
            let had_space = self.skip_whitespace();
            if self.eat("/>") {
                return Ok(StartTag { name, attributes, self_closing: true });
            }
            if self.eat(">") {
                return Ok(StartTag { name, attributes, self_closing: false });
            }
            if self.at_end() {
                return Err(self.error(format!("unterminated <{name}> tag")));
            }
            if !had_space {
                return Err(self.error("expected whitespace before attribute"));
            }

            let attr_name = self.parse_name()?;
            self.skip_whitespace();
            if !self.eat("=") {
                return Err(self.error(format!("expected '=' after {attr_name}")));
            }
            self.skip_whitespace();
            let value = self.parse_attribute_value()?;

            if attributes.iter().any(|(n, _)| *n == attr_name) {
                return Err(self.error(format!("duplicate attribute {attr_name}")));
            }
            attributes.push((attr_name, value));
        }
    }

    fn parse_end_tag(&mut self, expected: &str) -> EditorResult<()> {
        let at = self.pos;
        self.eat("</");
        let name = self.parse_name()?;
        if name != expected {
            return Err(self.error_at(at, format!("expected </{expected}>, found </{name}>")));
        }
        self.skip_whitespace();
        if !self.eat(">") {
            return Err(self.error(format!("unterminated </{name}> tag")));
        }
        Ok(())
    }

    fn parse_name(&mut self) -> EditorResult<&'a str> {
        let rest = self.rest();
        let end = rest
            .find(|c: char| !(c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')))
            .unwrap_or(rest.len());
        if end == 0 {
            return Err(self.error("expected a name"));
        }
        self.pos += end;
        Ok(&rest[..end])
    }

    fn parse_attribute_value(&mut self) -> EditorResult<String> {
        let quote = match self.rest().chars().next() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(self.error("expected quoted attribute value")),
        };
        self.pos += 1;

        let mut value = String::new();
        loop {
            let rest = self.rest();
            match rest.chars().next() {
                None => return Err(self.error("unterminated attribute value")),
                Some(c) if c == quote => {
                    self.pos += 1;
                    return Ok(value);
                }
                Some('<') => return Err(self.error("'<' in attribute value")),
                Some('&') => value.push(self.parse_reference()?),
                Some(_) => {
                    let end = rest.find([quote, '<', '&']).unwrap_or(rest.len());
                    value.push_str(&rest[..end]);
                    self.pos += end;
                }
            }
        }
    }

    /// Decodes `&name;`, `&#N;` or `&#xH;` at the cursor.
    fn parse_reference(&mut self) -> EditorResult<char> {
        let at = self.pos;
        let rest = &self.rest()[1..];
        let end = rest
            .find(';')
            .filter(|&end| end <= 10)
            .ok_or_else(|| self.error("unterminated character reference"))?;
        let name = &rest[..end];

        let decoded = match name {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => {
                let code = if let Some(hex) = name.strip_prefix("#x") {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = name.strip_prefix('#') {
                    dec.parse::<u32>().ok()
                } else {
                    None
                };
                code.and_then(char::from_u32)
            }
        };

        let c = decoded.ok_or_else(|| self.error_at(at, format!("unknown reference &{name};")))?;
        self.pos += 1 + end + 1;
        Ok(c)
    }

    /// Skips whitespace, comments and processing instructions.
    fn skip_misc(&mut self) -> EditorResult<()> {
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.starts_with("<!--") {
                self.skip_comment()?;
            } else if rest.starts_with("<?") {
                let end = rest
                    .find("?>")
                    .ok_or_else(|| self.error("unterminated processing instruction"))?;
                self.pos += end + 2;
            } else {
                return Ok(());
            }
        }
    }

    fn skip_comment(&mut self) -> EditorResult<()> {
        let end = self.rest()[4..]
            .find("-->")
            .ok_or_else(|| self.error("unterminated comment"))?;
        self.pos += 4 + end + 3;
        Ok(())
    }

    fn skip_whitespace(&mut self) -> bool {
        let rest = self.rest();
        let trimmed = rest.trim_start_matches([' ', '\t', '\r', '\n']);
        let skipped = rest.len() - trimmed.len();
        self.pos += skipped;
        skipped > 0
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn error(&self, reason: impl Into<String>) -> EditorError {
        self.error_at(self.pos, reason)
    }

    fn error_at(&self, offset: usize, reason: impl Into<String>) -> EditorError {
        EditorError::MalformedState {
            offset,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn state(entries: &[(&str, &str)]) -> EditorState {
        EditorState {
            entries: entries
                .iter()
                .map(|(id, code)| LanguageEntry::new(*id, *code))
                .collect(),
        }
    }

    #[test]
    fn test_exact_format() {
        let s = state(&[("python", "x=1"), ("javascript", "")]);
        assert_eq!(
            s.to_string(),
            r#"<editor><language value="python">x=1</language><language value="javascript"></language></editor>"#
        );
        assert_eq!(EditorState::default().to_string(), "<editor></editor>");
    }

    #[test]
    fn test_escaping() {
        let s = state(&[("python", "if a < b && c > d:\r\n  pass")]);
        assert_eq!(
            s.to_string(),
            r#"<editor><language value="python">if a &lt; b &amp;&amp; c &gt; d:&#13;
  pass</language></editor>"#
        );
        assert_eq!(EditorState::parse(&s.to_string()).unwrap(), s);
    }

    #[test]
    fn test_control_characters_written_as_references() {
        let s = state(&[("python", "a\u{1}b\tc\u{1b}")]);
        assert_eq!(
            s.to_string(),
            "<editor><language value=\"python\">a&#1;b\tc&#27;</language></editor>"
        );
        assert_eq!(EditorState::parse(&s.to_string()).unwrap(), s);
    }

    #[test]
    fn test_leading_byte_order_mark() {
        let s = EditorState::parse("\u{FEFF}<editor><language value=\"python\">x</language></editor>")
            .unwrap();
        assert_eq!(s.get("python"), Some("x"));

        let err = EditorState::parse("<editor>\u{FEFF}</editor>").unwrap_err();
        assert!(matches!(err, EditorError::MalformedState { offset: 8, .. }));
    }

    #[test]
    fn test_parse_reference_document() {
        let s = EditorState::parse(r#"<editor><language value="python">x=1</language></editor>"#)
            .unwrap();
        assert_eq!(s.get("python"), Some("x=1"));
        assert_eq!(s.get("javascript"), None);
    }

    #[test]
    fn test_parse_lenient_forms() {
        let source = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- saved by the host -->
<editor>
  <language value='json'/>
  <language  value = "javascript"><![CDATA[a<b]]>&#x41;&#66;&quot;&apos;</language>
</editor>
"#;
        let s = EditorState::parse(source).unwrap();
        assert_eq!(s.entries.len(), 2);
        assert_eq!(s.get("json"), Some(""));
        assert_eq!(s.get("javascript"), Some("a<bAB\"'"));
    }

    #[test]
    fn test_body_whitespace_is_kept() {
        let s = EditorState::parse("<editor><language value=\"python\">\n  x\n</language></editor>")
            .unwrap();
        assert_eq!(s.get("python"), Some("\n  x\n"));
    }

    #[test]
    fn test_empty_root() {
        assert!(EditorState::parse("<editor/>").unwrap().entries.is_empty());
    }

    #[test]
    fn test_malformed_documents() {
        let cases = [
            "",
            "not xml",
            "<workspace></workspace>",
            "<editor>",
            "<editor><language>x</language></editor>",
            r#"<editor><language value="python">x</editor>"#,
            r#"<editor><language value="python">a < b</language></editor>"#,
            r#"<editor><language value="python">a && b</language></editor>"#,
            r#"<editor><language value="python">&bogus;</language></editor>"#,
            r#"<editor><language value="python"><b>x</b></language></editor>"#,
            r#"<editor>stray</editor>"#,
            r#"<editor></editor><editor></editor>"#,
            r#"<editor><language value="a" value="b"></language></editor>"#,
        ];
        for case in cases {
            assert!(
                matches!(EditorState::parse(case), Err(EditorError::MalformedState { .. })),
                "accepted: {case:?}"
            );
        }
    }

    #[test]
    fn test_error_offset() {
        let err = EditorState::parse("<editor><tab/></editor>").unwrap_err();
        assert!(matches!(err, EditorError::MalformedState { offset: 8, .. }));
    }

    #[test]
    fn test_last_duplicate_wins() {
        let s = EditorState::parse(
            r#"<editor><language value="python">a</language><language value="python">b</language></editor>"#,
        )
        .unwrap();
        assert_eq!(s.get("python"), Some("b"));
    }

    proptest! {
        #[test]
        fn prop_round_trip(codes in proptest::collection::vec(any::<String>(), 0..4)) {
            let ids = ["python", "javascript", "json", "lua"];
            let s = EditorState {
                entries: codes
                    .iter()
                    .zip(ids)
                    .map(|(code, id)| LanguageEntry::new(id, code.clone()))
                    .collect(),
            };
            prop_assert_eq!(EditorState::parse(&s.to_string()).unwrap(), s);
        }
    }
}
