//! Binding from toolkit events to controller calls.
//!
//! ## Learning: Messages Instead of Callbacks
//!
//! The page (or any other front end) reports what the user did as a
//! [`UiEvent`] value and hands it to [`EditorController::handle`]. The
//! controller never sees toolkit types, and every interaction can be
//! replayed in a test.

use crate::controller::EditorController;
use crate::{EditorError, EditorResult};

/// Something the user did to the editor chrome.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// An option of the language selector was picked
    LanguageSelected(String),
    /// The push button was clicked
    PushClicked,
    /// The save button was clicked
    SaveClicked,
    /// The save prompt was submitted with a file name
    SaveSubmitted(String),
    /// The save prompt was dismissed
    SaveCancelled,
    /// The editor became visible again
    Shown,
}

impl EditorController {
    /// Applies a user interaction.
    ///
    /// A blank file name has already been reported to the user by the time
    /// this returns, so it is not an error here.
    pub fn handle(&self, event: UiEvent) -> EditorResult<()> {
        tracing::trace!("UI event: {:?}", event);
        match event {
            UiEvent::LanguageSelected(id) => self.change_language(id.parse()?),
            UiEvent::PushClicked => {
                self.push_code();
                Ok(())
            }
            UiEvent::SaveClicked => {
                self.set_save_prompt_open(true);
                Ok(())
            }
            UiEvent::SaveSubmitted(name) => match self.save_code(&name) {
                Err(EditorError::EmptyFileName) => Ok(()),
                result => result,
            },
            UiEvent::SaveCancelled => {
                self.set_save_prompt_open(false);
                Ok(())
            }
            UiEvent::Shown => {
                self.scroll_to_last_position();
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::HighlightEngine;
    use crate::controller::EMPTY_FILE_NAME_MESSAGE;
    use crate::language::Language;
    use crate::testing::Fixture;

    #[test]
    fn test_language_selected() {
        let fx = Fixture::new();
        fx.controller
            .handle(UiEvent::LanguageSelected("json".into()))
            .unwrap();
        assert_eq!(fx.controller.selected_language(), Language::Json);

        let result = fx.controller.handle(UiEvent::LanguageSelected("ruby".into()));
        assert!(matches!(result, Err(EditorError::UnknownLanguage(_))));
        assert_eq!(fx.controller.selected_language(), Language::Json);
    }

    #[test]
    fn test_save_flow() {
        let fx = Fixture::new();
        fx.engine.type_text("x = 1");

        fx.controller.handle(UiEvent::SaveClicked).unwrap();
        assert!(fx.host.save_prompt_open());

        fx.controller.handle(UiEvent::SaveSubmitted(String::new())).unwrap();
        assert!(fx.host.save_prompt_open());
        assert_eq!(*fx.alerts.borrow(), [EMPTY_FILE_NAME_MESSAGE]);

        fx.controller
            .handle(UiEvent::SaveSubmitted("robot".into()))
            .unwrap();
        assert!(!fx.host.save_prompt_open());
        assert_eq!(fx.saves.borrow()[0].1, "robot.py");
    }

    #[test]
    fn test_save_cancelled() {
        let fx = Fixture::new();
        fx.controller.handle(UiEvent::SaveClicked).unwrap();
        fx.controller.handle(UiEvent::SaveCancelled).unwrap();
        assert!(!fx.host.save_prompt_open());
    }

    #[test]
    fn test_push_and_shown() {
        let fx = Fixture::new();
        fx.engine.type_text("motor.run()");
        fx.engine.scroll_to(64.0);

        fx.controller.handle(UiEvent::PushClicked).unwrap();
        assert_eq!(*fx.uploads.borrow(), ["motor.run()"]);

        fx.controller.refresh_editor(None).unwrap();
        fx.controller.handle(UiEvent::Shown).unwrap();
        assert_eq!(fx.engine.scroll_offset(), 64.0);
    }
}
