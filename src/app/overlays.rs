use crossterm::event::{KeyCode, KeyEvent};
use log::debug;

use super::{Action, App, ListPicker, Notice, OverlayState, SAMPLE_QUESTIONS};
use crate::locale::SUPPORTED_LOCALES;
use crate::upload::{self, DEFAULT_SCAN_DEPTH};

// Implementation block for overlay-related logic in the App.
impl App {
    pub(crate) fn open_language_picker(&mut self) {
        let current = self.session.locale().index();
        self.overlay = Some(OverlayState::Language(ListPicker::new(
            SUPPORTED_LOCALES.to_vec(),
            current,
        )));
        self.notice = Notice::info("Select a response language");
    }

    pub(crate) fn open_file_picker(&mut self) {
        let files = upload::discover_csv_files(&self.scan_root, DEFAULT_SCAN_DEPTH);
        debug!("File picker opened with {} candidates", files.len());
        let current = self
            .session
            .source_name()
            .and_then(|name| {
                files
                    .iter()
                    .position(|path| upload::display_name(path) == name)
            })
            .unwrap_or(0);
        self.notice = if files.is_empty() {
            Notice::warning(format!("No CSV files found under {}", self.scan_root.display()))
        } else {
            Notice::info("Choose a CSV file")
        };
        self.overlay = Some(OverlayState::Files(ListPicker::new(files, current)));
    }

    pub(crate) fn open_sample_questions(&mut self) {
        if self.session.table().is_none() {
            self.notice = Notice::info("Upload a CSV file to get started");
            return;
        }
        self.overlay = Some(OverlayState::SampleQuestions(ListPicker::new(
            SAMPLE_QUESTIONS.to_vec(),
            0,
        )));
        self.notice = Notice::info("Pick a sample question");
    }

    /// Overlays capture all keys while open.
    pub(crate) fn handle_overlay_key(&mut self, key: KeyEvent) {
        let delta = match key.code {
            KeyCode::Up => -1,
            KeyCode::Down => 1,
            KeyCode::PageUp => -10,
            KeyCode::PageDown => 10,
            KeyCode::Esc => {
                self.overlay = None;
                self.notice = Notice::info("Cancelled");
                return;
            }
            KeyCode::Enter => {
                if let Some(overlay) = self.overlay.take() {
                    self.confirm_overlay(overlay);
                }
                return;
            }
            _ => return,
        };
        match self.overlay.as_mut() {
            Some(OverlayState::Language(picker)) => picker.move_selection(delta),
            Some(OverlayState::Files(picker)) => picker.move_selection(delta),
            Some(OverlayState::SampleQuestions(picker)) => picker.move_selection(delta),
            None => {}
        }
    }

    fn confirm_overlay(&mut self, overlay: OverlayState) {
        match overlay {
            OverlayState::Language(picker) => {
                if let Some(locale) = picker.selected_item() {
                    self.queue(Action::SelectLanguage(*locale));
                }
            }
            OverlayState::Files(picker) => {
                if let Some(path) = picker.selected_item() {
                    self.queue(Action::LoadFile(path.clone()));
                }
            }
            OverlayState::SampleQuestions(picker) => {
                if let Some(question) = picker.selected_item() {
                    self.submit_question(question.to_string());
                }
            }
        }
    }
}
