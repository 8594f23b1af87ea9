use crossterm::event::{Event as CrosstermEvent, KeyEvent};

/// Terminal events the application reacts to.
#[derive(Debug)]
pub enum Event {
    /// A key press event.
    Key(KeyEvent),
    /// The terminal was resized.
    Resize,
}

impl Event {
    /// Keeps the crossterm events the UI cares about.
    pub fn from_crossterm(event: CrosstermEvent) -> Option<Self> {
        match event {
            CrosstermEvent::Key(key) => Some(Event::Key(key)),
            CrosstermEvent::Resize(..) => Some(Event::Resize),
            _ => None,
        }
    }
}
