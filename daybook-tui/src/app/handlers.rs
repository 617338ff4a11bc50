use crate::app::state::{App, ComposerField, Screen, Tab};
use crate::app::Action;
use crate::log_key_event;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use daybook_types::FollowStatus;

/// Apply a key press. Returns the server work it asks for, if any.
///
/// Optimistic mutations start right here; only loads and form submissions
/// come back as an [`Action`] for the event loop to await.
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    log_key_event!(app.log_config, "key={:?} screen={:?} tab={:?}", key.code, app.screen, app.current_tab);

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.running = false;
        return None;
    }

    // Priority 1: Help overlay
    if app.show_help {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
            app.toggle_help();
        }
        return None;
    }

    match app.screen {
        Screen::Auth => handle_auth_keys(app, key),
        Screen::UsernamePrompt => handle_username_keys(app, key),
        Screen::Main => handle_main_keys(app, key),
    }
}

fn handle_auth_keys(app: &mut App, key: KeyEvent) -> Option<Action> {
    if app.auth.loading {
        return None;
    }
    match key.code {
        KeyCode::Esc => app.running = false,
        KeyCode::Tab | KeyCode::BackTab => app.toggle_auth_mode(),
        KeyCode::Enter => return Some(Action::SubmitAuth),
        KeyCode::Backspace => {
            app.auth.email.pop();
        }
        KeyCode::Char(c) if !c.is_whitespace() => {
            app.auth.email.push(c);
            app.auth.error = None;
        }
        _ => {}
    }
    None
}

fn handle_username_keys(app: &mut App, key: KeyEvent) -> Option<Action> {
    if app.username_prompt.submitting {
        return None;
    }
    match key.code {
        KeyCode::Esc => return Some(Action::Logout),
        KeyCode::Enter => return Some(Action::SubmitUsername),
        KeyCode::Backspace => {
            app.username_prompt.input.pop();
        }
        KeyCode::Char(c) => {
            app.username_prompt.input.push(c);
            app.username_prompt.error = None;
        }
        _ => {}
    }
    None
}

fn handle_main_keys(app: &mut App, key: KeyEvent) -> Option<Action> {
    // Priority 2: Account deletion confirmation
    if app.confirm_delete_account {
        return match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(Action::DeleteAccount),
            _ => {
                app.confirm_delete_account = false;
                None
            }
        };
    }

    // Priority 3: Composer
    if app.composer.is_some() {
        return handle_composer_keys(app, key);
    }

    // Priority 4: User search
    if app.search.is_some() {
        return handle_search_keys(app, key);
    }

    match key.code {
        KeyCode::Char('q') => app.running = false,
        KeyCode::Char('?') => app.toggle_help(),
        KeyCode::Tab => {
            app.next_tab();
            return Some(Action::LoadTab);
        }
        KeyCode::BackTab => {
            app.previous_tab();
            return Some(Action::LoadTab);
        }
        KeyCode::Char('r') => return Some(Action::LoadTab),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
        KeyCode::Char('n') => app.open_composer(),
        KeyCode::Char('/') => app.open_search(),
        KeyCode::Char('D') => app.confirm_delete_account = true,
        KeyCode::Char('L') => return Some(Action::Logout),
        _ => return handle_tab_keys(app, key),
    }
    None
}

/// Keys whose meaning depends on the current tab
fn handle_tab_keys(app: &mut App, key: KeyEvent) -> Option<Action> {
    match (app.current_tab, key.code) {
        (Tab::Requests, KeyCode::Char('a')) => app.answer_selected(FollowStatus::Accepted),
        (Tab::Requests, KeyCode::Char('x')) => app.answer_selected(FollowStatus::Rejected),
        (Tab::Requests, KeyCode::Char('u')) => app.unfollow_selected(),
        (Tab::Schedule, KeyCode::Char('d')) => app.delete_selected_entry(),
        (Tab::Schedule, KeyCode::Char('[')) => {
            app.shift_schedule_day(-1);
            return Some(Action::LoadTab);
        }
        (Tab::Schedule, KeyCode::Char(']')) => {
            app.shift_schedule_day(1);
            return Some(Action::LoadTab);
        }
        (Tab::Self_ | Tab::Friends | Tab::World, KeyCode::Char('l')) => app.toggle_like_selected(),
        (Tab::Self_ | Tab::Friends | Tab::World, KeyCode::Char('c')) => app.toggle_complete_selected(),
        (Tab::Self_ | Tab::Friends | Tab::World, KeyCode::Char('d')) => app.delete_selected_post(),
        _ => {}
    }
    None
}

fn handle_composer_keys(app: &mut App, key: KeyEvent) -> Option<Action> {
    let composer = app.composer.as_mut()?;
    if composer.submitting {
        return None;
    }
    match key.code {
        KeyCode::Esc => app.close_composer(),
        KeyCode::Enter => return Some(Action::SubmitComposer),
        KeyCode::Tab | KeyCode::BackTab => composer.toggle_focus(),
        KeyCode::Backspace => {
            composer.focused_input().pop();
        }
        KeyCode::Char(c) => {
            // Time blocks only take digits, ':' and '-'
            if composer.focus == ComposerField::TimeBlock && !(c.is_ascii_digit() || c == ':' || c == '-') {
                return None;
            }
            composer.focused_input().push(c);
        }
        _ => {}
    }
    None
}

fn handle_search_keys(app: &mut App, key: KeyEvent) -> Option<Action> {
    let search = app.search.as_mut()?;
    match key.code {
        KeyCode::Esc => app.close_search(),
        KeyCode::Enter => {
            // Enter on unchanged results follows the highlighted user
            let fresh = search.last_query.as_deref() == Some(search.query.as_str());
            if fresh && !search.results.is_empty() {
                app.follow_search_selection();
            } else {
                return Some(Action::Search);
            }
        }
        KeyCode::Down => {
            let len = search.results.len();
            if len > 0 {
                let next = search.list_state.selected().map_or(0, |i| (i + 1).min(len - 1));
                search.list_state.select(Some(next));
            }
        }
        KeyCode::Up => {
            let prev = search.list_state.selected().map_or(0, |i| i.saturating_sub(1));
            if !search.results.is_empty() {
                search.list_state.select(Some(prev));
            }
        }
        KeyCode::Backspace => {
            search.query.pop();
        }
        KeyCode::Char(c) => search.query.push(c),
        _ => {}
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn app() -> App {
        App::new(std::sync::Arc::new(crate::api::ApiClient::default()))
    }

    #[test]
    fn test_auth_typing_and_mode_toggle() {
        let mut app = app();
        for c in "ada@example.com".chars() {
            assert_eq!(handle_key_event(&mut app, press(KeyCode::Char(c))), None);
        }
        assert_eq!(app.auth.email, "ada@example.com");

        handle_key_event(&mut app, press(KeyCode::Tab));
        assert_eq!(app.auth.mode, crate::app::AuthMode::Register);
        assert_eq!(handle_key_event(&mut app, press(KeyCode::Enter)), Some(Action::SubmitAuth));
    }

    #[test]
    fn test_tab_switch_requests_a_load() {
        let mut app = app();
        app.screen = Screen::Main;
        assert_eq!(handle_key_event(&mut app, press(KeyCode::Tab)), Some(Action::LoadTab));
        assert_eq!(app.current_tab, Tab::Friends);
        assert_eq!(handle_key_event(&mut app, press(KeyCode::BackTab)), Some(Action::LoadTab));
        assert_eq!(app.current_tab, Tab::Self_);
    }

    #[test]
    fn test_delete_account_needs_confirmation() {
        let mut app = app();
        app.screen = Screen::Main;

        handle_key_event(&mut app, press(KeyCode::Char('D')));
        assert!(app.confirm_delete_account);
        assert_eq!(handle_key_event(&mut app, press(KeyCode::Char('n'))), None);
        assert!(!app.confirm_delete_account);

        handle_key_event(&mut app, press(KeyCode::Char('D')));
        assert_eq!(
            handle_key_event(&mut app, press(KeyCode::Char('y'))),
            Some(Action::DeleteAccount)
        );
    }

    #[test]
    fn test_time_block_field_filters_characters() {
        let mut app = app();
        app.screen = Screen::Main;
        handle_key_event(&mut app, press(KeyCode::Char('n')));
        handle_key_event(&mut app, press(KeyCode::Tab));
        for c in "09:0x0-10:00".chars() {
            handle_key_event(&mut app, press(KeyCode::Char(c)));
        }
        let composer = app.composer.as_ref().unwrap();
        assert_eq!(composer.time_block, "09:00-10:00");
        assert!(composer.text.is_empty());
    }

    #[test]
    fn test_help_swallows_keys() {
        let mut app = app();
        app.screen = Screen::Main;
        handle_key_event(&mut app, press(KeyCode::Char('?')));
        assert!(app.show_help);
        assert_eq!(handle_key_event(&mut app, press(KeyCode::Tab)), None);
        assert_eq!(app.current_tab, Tab::Self_);
        handle_key_event(&mut app, press(KeyCode::Esc));
        assert!(!app.show_help);
    }
}
