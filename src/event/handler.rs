use crossterm::event::{self, KeyEvent, KeyEventKind};
use std::time::Duration;
use tokio::sync::mpsc;

/// Terminal input the wizard reacts to
#[derive(Debug, PartialEq, Eq)]
pub enum Event {
    Key(KeyEvent),
    Resize,
    /// No input within one tick; drives the spinner
    Tick,
}

/// Map a crossterm event to a wizard event. Key releases and repeats,
/// mouse and focus events are dropped.
fn translate(raw: event::Event) -> Option<Event> {
    match raw {
        event::Event::Key(key) if key.kind == KeyEventKind::Press => Some(Event::Key(key)),
        event::Event::Resize(_, _) => Some(Event::Resize),
        _ => None,
    }
}

/// Reads the terminal on its own thread and hands events to the async loop.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    _tx: mpsc::UnboundedSender<Event>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let event_tx = tx.clone();

        std::thread::spawn(move || {
            loop {
                let next = match event::poll(tick_rate) {
                    Ok(true) => match event::read() {
                        Ok(raw) => translate(raw),
                        Err(_) => None,
                    },
                    Ok(false) | Err(_) => Some(Event::Tick),
                };

                // The receiver is gone once the wizard has shut down
                if let Some(event) = next {
                    if event_tx.send(event).is_err() {
                        break;
                    }
                }
            }
        });

        Self { rx, _tx: tx }
    }

    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEventState, KeyModifiers};

    fn key(kind: KeyEventKind) -> KeyEvent {
        KeyEvent {
            code: KeyCode::Enter,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn only_key_presses_reach_the_wizard() {
        assert_eq!(
            translate(event::Event::Key(key(KeyEventKind::Press))),
            Some(Event::Key(key(KeyEventKind::Press)))
        );
        assert_eq!(translate(event::Event::Key(key(KeyEventKind::Release))), None);
        assert_eq!(translate(event::Event::Key(key(KeyEventKind::Repeat))), None);
    }

    #[test]
    fn resize_is_forwarded_and_focus_dropped() {
        assert_eq!(translate(event::Event::Resize(80, 24)), Some(Event::Resize));
        assert_eq!(translate(event::Event::FocusGained), None);
    }
}
