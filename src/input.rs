//! Keyboard input handling.
//!
//! Maps terminal key events to [`App`] actions. Adding a new keybinding is
//! a single match arm in [`handle_key_event`].

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::app::App;

/// Process a single key event, updating app state accordingly.
///
/// Only reacts to key-press events (ignoring release / repeat) so that each
/// physical keypress triggers exactly one action.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit = true,
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
        KeyCode::Home | KeyCode::Char('g') => app.select_first(),
        KeyCode::End | KeyCode::Char('G') => app.select_last(),
        KeyCode::Char('n') => app.request_page(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::sample_posts;
    use crossterm::event::{KeyEventState, KeyModifiers};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn loaded() -> App {
        let mut app = App::new();
        app.take_page_request();
        app.append_page(sample_posts(10), false);
        app
    }

    #[test]
    fn q_and_esc_quit() {
        for code in [KeyCode::Char('q'), KeyCode::Esc] {
            let mut app = App::new();
            handle_key_event(&mut app, press(code));
            assert!(app.quit);
        }
    }

    #[test]
    fn vim_and_arrow_keys_move() {
        let mut app = loaded();
        handle_key_event(&mut app, press(KeyCode::Char('j')));
        handle_key_event(&mut app, press(KeyCode::Down));
        assert_eq!(app.list_state.selected(), Some(2));
        handle_key_event(&mut app, press(KeyCode::Char('k')));
        assert_eq!(app.list_state.selected(), Some(1));
        handle_key_event(&mut app, press(KeyCode::Char('G')));
        assert_eq!(app.list_state.selected(), Some(9));
        handle_key_event(&mut app, press(KeyCode::Home));
        assert_eq!(app.list_state.selected(), Some(0));
    }

    #[test]
    fn n_requests_next_page() {
        let mut app = loaded();
        assert!(!app.take_page_request());
        handle_key_event(&mut app, press(KeyCode::Char('n')));
        assert!(app.take_page_request());
    }

    #[test]
    fn release_events_are_ignored() {
        let mut app = App::new();
        let release = KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        handle_key_event(&mut app, release);
        assert!(!app.quit);
    }
}
