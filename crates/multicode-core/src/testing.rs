//! Recording collaborators for controller tests.

use std::cell::{Cell, RefCell};
use std::io;
use std::rc::Rc;

use crate::collaborators::{Blob, Collaborators, ErrorNotifier, FileSaver, Uploader};
use crate::config::EditorOptions;
use crate::controller::EditorController;
use crate::engine::MemoryEngine;
use crate::event::ChangeEvent;
use crate::host::HeadlessHost;
use crate::EditorResult;

pub(crate) struct RecordingUploader(pub Rc<RefCell<Vec<String>>>);

impl Uploader for RecordingUploader {
    fn upload(&mut self, code: &str) {
        self.0.borrow_mut().push(code.to_string());
    }
}

pub(crate) struct RecordingSaver {
    pub saves: Rc<RefCell<Vec<(Blob, String)>>>,
    pub fail: Rc<Cell<bool>>,
}

impl FileSaver for RecordingSaver {
    fn save(&mut self, blob: Blob, file_name: &str) -> io::Result<()> {
        if self.fail.get() {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only disk"));
        }
        self.saves.borrow_mut().push((blob, file_name.to_string()));
        Ok(())
    }
}

pub(crate) struct RecordingNotifier(pub Rc<RefCell<Vec<String>>>);

impl ErrorNotifier for RecordingNotifier {
    fn alert_error(&mut self, message: &str) {
        self.0.borrow_mut().push(message.to_string());
    }
}

/// A controller mounted in `#code` with handles to everything it drives.
pub(crate) struct Fixture {
    pub controller: EditorController,
    pub host: HeadlessHost,
    pub engine: MemoryEngine,
    pub uploads: Rc<RefCell<Vec<String>>>,
    pub saves: Rc<RefCell<Vec<(Blob, String)>>>,
    pub alerts: Rc<RefCell<Vec<String>>>,
    fail_saves: Rc<Cell<bool>>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::build("code", &EditorOptions::default(), true).expect("fixture builds")
    }

    pub fn without_uploader() -> Self {
        Self::build("code", &EditorOptions::default(), false).expect("fixture builds")
    }

    pub fn try_new(host_element_id: &str, options: &EditorOptions) -> EditorResult<Self> {
        Self::build(host_element_id, options, true)
    }

    fn build(host_element_id: &str, options: &EditorOptions, uploader: bool) -> EditorResult<Self> {
        let host = HeadlessHost::with_elements(["code"]);
        let engine = MemoryEngine::new();
        let uploads = Rc::new(RefCell::new(Vec::new()));
        let saves = Rc::new(RefCell::new(Vec::new()));
        let alerts = Rc::new(RefCell::new(Vec::new()));
        let fail_saves = Rc::new(Cell::new(false));

        let mut collaborators = Collaborators::new(
            RecordingSaver {
                saves: Rc::clone(&saves),
                fail: Rc::clone(&fail_saves),
            },
            RecordingNotifier(Rc::clone(&alerts)),
        );
        if uploader {
            collaborators = collaborators.with_uploader(RecordingUploader(Rc::clone(&uploads)));
        }

        let controller = EditorController::new(
            host_element_id,
            options,
            host.clone(),
            engine.clone(),
            collaborators,
        )?;

        Ok(Self {
            controller,
            host,
            engine,
            uploads,
            saves,
            alerts,
            fail_saves,
        })
    }

    /// Makes every following save fail with an I/O error.
    pub fn fail_saves(&self) {
        self.fail_saves.set(true);
    }

    /// Collects every change event fired from now on.
    pub fn record_events(&self) -> Rc<RefCell<Vec<ChangeEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        self.controller
            .add_change_listener(Rc::new(move |event: &ChangeEvent| {
                sink.borrow_mut().push(event.clone());
            }));
        events
    }
}
