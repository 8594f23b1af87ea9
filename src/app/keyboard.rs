use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::{Action, App};
use crate::event::Event;

const SCROLL_STEP: u16 = 5;

impl App {
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key(key),
            // The next draw picks up the new size.
            Event::Resize => {}
        }
    }

    /// Routes a key press: overlays first, then global shortcuts, then the
    /// question input.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if self.overlay.is_some() {
            self.handle_overlay_key(key);
            return;
        }

        if self.handle_global_shortcuts(key) {
            return;
        }

        self.handle_input_key(key);
    }

    /// Returns `true` if the key was a shortcut.
    fn handle_global_shortcuts(&mut self, key: KeyEvent) -> bool {
        if !key.modifiers.contains(KeyModifiers::CONTROL) {
            return false;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('c') => self.queue(Action::Quit),
            KeyCode::Char('o') => self.open_file_picker(),
            KeyCode::Char('l') => self.open_language_picker(),
            KeyCode::Char('s') => self.open_sample_questions(),
            KeyCode::Char('d') => self.queue(Action::LoadSample),
            KeyCode::Char('x') => self.queue(Action::ClearFile),
            KeyCode::Char('k') => self.queue(Action::ClearChat),
            KeyCode::Char('u') => self.input.clear(),
            _ => return false,
        }
        true
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                if let Some(question) = self.input.take() {
                    self.submit_question(question);
                }
            }
            KeyCode::Esc if self.input.is_empty() => self.queue(Action::Quit),
            KeyCode::Esc => self.input.clear(),
            KeyCode::Backspace => self.input.backspace(),
            KeyCode::Delete => self.input.delete(),
            KeyCode::Left => self.input.move_left(),
            KeyCode::Right => self.input.move_right(),
            KeyCode::Home => self.input.move_home(),
            KeyCode::End => self.input.move_end(),
            KeyCode::Up => {
                self.input.history_previous();
            }
            KeyCode::Down => {
                self.input.history_next();
            }
            KeyCode::PageUp => self.chat_scroll = self.chat_scroll.saturating_add(SCROLL_STEP),
            KeyCode::PageDown => self.chat_scroll = self.chat_scroll.saturating_sub(SCROLL_STEP),
            KeyCode::Char(ch) => self.input.insert_char(ch),
            _ => {}
        }
    }
}
