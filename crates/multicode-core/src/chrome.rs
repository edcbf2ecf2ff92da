//! Editor chrome markup.
//!
//! The chrome is the toolbar (language selector, push and save buttons), the
//! save prompt and the mount point the highlighting engine renders into.

use std::fmt::Write;

use crate::language::LanguageSet;

/// Element ids derived from the host element id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChromeIds {
    pub host: String,
    pub language_select: String,
    pub push_button: String,
    pub save_button: String,
    pub save_form: String,
    pub save_name: String,
    pub editor: String,
}

impl ChromeIds {
    pub fn for_host(host: &str) -> Self {
        Self {
            host: host.to_string(),
            language_select: format!("{host}-language"),
            push_button: format!("{host}-push"),
            save_button: format!("{host}-save"),
            save_form: format!("{host}-save-form"),
            save_name: format!("{host}-save-name"),
            editor: format!("{host}-editor"),
        }
    }

    /// Selector the engine is mounted at.
    pub fn editor_selector(&self) -> String {
        format!("#{}", self.editor)
    }
}

/// Builds the chrome markup for a host element.
pub fn render(ids: &ChromeIds, languages: &LanguageSet, hide_buttons: bool) -> String {
    let primary = languages.primary();
    let hidden = if hide_buttons { " hidden" } else { "" };
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = write!(
        out,
        r#"<div class="multicode-toolbar"><select id="{}" class="multicode-language">"#,
        escape(&ids.language_select)
    );
    for descriptor in languages.iter() {
        let selected = if descriptor.value == primary { " selected" } else { "" };
        let _ = write!(
            out,
            r#"<option value="{}"{selected}>{}</option>"#,
            descriptor.value,
            escape(&descriptor.display_text)
        );
    }
    let _ = write!(
        out,
        concat!(
            r#"</select>"#,
            r#"<button id="{push}" type="button" class="multicode-push"{hidden}>Push</button>"#,
            r#"<button id="{save}" type="button" class="multicode-save"{hidden}>Save</button>"#,
            r#"</div>"#,
            r#"<form id="{form}" class="multicode-save-prompt" hidden>"#,
            r#"<input id="{name}" type="text" placeholder="File name">"#,
            r#"<button type="submit">Save</button>"#,
            r#"</form>"#,
            r#"<div id="{editor}" class="multicode-editor"></div>"#,
        ),
        push = escape(&ids.push_button),
        save = escape(&ids.save_button),
        form = escape(&ids.save_form),
        name = escape(&ids.save_name),
        editor = escape(&ids.editor),
        hidden = hidden,
    );

    out
}

/// Escapes text for use in element content or a quoted attribute.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
