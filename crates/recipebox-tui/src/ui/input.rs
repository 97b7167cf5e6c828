//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{
    can_add_email_char, can_add_form_char, can_add_password_char, can_add_search_char, App,
    AppState, FormField, LoginFocus, NotificationKind, PAGE_SCROLL_SIZE,
};

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        // Only Ctrl+C (handled by the main loop) until the session check finishes
        AppState::Loading => Ok(false),
        AppState::LoggingIn => handle_login_input(app, key).await,
        AppState::EditingRecipe => Ok(handle_form_input(app, key)),
        AppState::Searching => Ok(handle_search_input(app, key)),
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            Ok(false)
        }
        AppState::ConfirmingDelete => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.confirm_delete(),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.cancel_delete(),
                _ => {}
            }
            Ok(false)
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return Ok(true);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            Ok(false)
        }
        AppState::Quitting => Ok(true),
        AppState::Normal => handle_normal_input(app, key).await,
    }
}

async fn handle_normal_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Char('q') => app.state = AppState::ConfirmingQuit,
        KeyCode::Char('?') => app.state = AppState::ShowingHelp,
        KeyCode::Char('/') => {
            app.state = AppState::Searching;
            app.search_query.clear();
            app.selection = 0;
        }
        KeyCode::Char('c') => app.cycle_cuisine_tag(),
        KeyCode::Esc => {
            app.search_query.clear();
            app.selection = 0;
        }
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(1),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(1),
        KeyCode::PageUp => app.select_prev(PAGE_SCROLL_SIZE),
        KeyCode::PageDown => app.select_next(PAGE_SCROLL_SIZE),
        KeyCode::Home => app.selection = 0,
        KeyCode::End => app.select_last(),
        KeyCode::Char('a') => app.start_add(),
        KeyCode::Char('e') => app.start_edit(),
        KeyCode::Char('d') => app.start_delete(),
        KeyCode::Char('m') => app.toggle_my_recipes(),
        KeyCode::Char('r') => app.refresh_recipes(),
        KeyCode::Char('l') => {
            if app.is_logged_in() {
                app.notify(NotificationKind::Info, "Already logged in");
            } else {
                app.start_login();
            }
        }
        KeyCode::Char('L') => {
            if app.is_logged_in() {
                app.logout().await;
            }
        }
        _ => {}
    }
    Ok(false)
}

fn handle_search_input(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
            app.search_query.clear();
        }
        KeyCode::Enter => {
            // Keep search query active
            app.state = AppState::Normal;
        }
        KeyCode::Backspace => {
            app.search_query.pop();
        }
        KeyCode::Char(c) => {
            if can_add_search_char(app.search_query.chars().count(), c) {
                app.search_query.push(c);
            }
        }
        _ => return false,
    }
    // Reset selection when search changes
    app.selection = 0;
    false
}

async fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            // Browsing does not require a login
            app.login_error = None;
            app.state = AppState::Normal;
        }
        KeyCode::Down | KeyCode::Tab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Email => LoginFocus::Password,
                LoginFocus::Password => LoginFocus::Button,
                LoginFocus::Button => LoginFocus::Email,
            };
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Email => LoginFocus::Button,
                LoginFocus::Password => LoginFocus::Email,
                LoginFocus::Button => LoginFocus::Password,
            };
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Email => app.login_focus = LoginFocus::Password,
            LoginFocus::Password | LoginFocus::Button => {
                // On success the state returns to Normal; on failure login_error is set
                app.attempt_login().await;
            }
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Email => {
                app.login_email.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            LoginFocus::Button => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Email => {
                if can_add_email_char(app.login_email.chars().count(), c) {
                    app.login_email.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(app.login_password.chars().count(), c) {
                    app.login_password.push(c);
                }
            }
            LoginFocus::Button => {}
        },
        _ => {}
    }
    Ok(false)
}

fn handle_form_input(app: &mut App, key: KeyEvent) -> bool {
    if app.form.saving {
        // Ignore edits while the save is in flight
        return false;
    }

    let focus = app.form.focus;
    match key.code {
        KeyCode::Esc => app.cancel_form(),
        KeyCode::Tab | KeyCode::Down => app.form.focus = focus.next(),
        KeyCode::BackTab | KeyCode::Up => app.form.focus = focus.prev(),
        KeyCode::Left => app.form.cycle_choice(false),
        KeyCode::Right => app.form.cycle_choice(true),
        // Ctrl+S saves from any field
        KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => app.submit_form(),
        // Alt+Enter starts a new line in ingredients and instructions
        KeyCode::Enter
            if key.modifiers.contains(KeyModifiers::ALT)
                && matches!(focus, FormField::Ingredients | FormField::Instructions) =>
        {
            if let Some(text) = app.form.focused_text_mut() {
                text.push('\n');
            }
        }
        KeyCode::Enter if focus == FormField::Submit => app.submit_form(),
        KeyCode::Enter => app.form.focus = focus.next(),
        KeyCode::Char(' ') if !focus.is_text() => app.form.cycle_choice(true),
        KeyCode::Backspace => {
            if let Some(text) = app.form.focused_text_mut() {
                text.pop();
            }
        }
        KeyCode::Char(c) => {
            if let Some(text) = app.form.focused_text_mut() {
                if can_add_form_char(focus, text.chars().count(), c) {
                    text.push(c);
                }
            }
        }
        _ => {}
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use recipebox_core::auth::{MemoryTokenStore, SessionManager};
    use recipebox_core::config::Config;
    use recipebox_core::models::Cuisine;
    use recipebox_core::recipes::RecipeRepository;
    use recipebox_core::{ApiClient, ImageHost};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn test_app() -> App {
        let api = ApiClient::new("http://127.0.0.1:1", Duration::from_secs(1)).expect("client");
        let images = ImageHost::new(api.http().clone(), "http://127.0.0.1:1/upload", None);
        let auth = SessionManager::new(api.clone(), Box::new(MemoryTokenStore::new()));
        let mut app = App::with_services(Config::default(), auth, RecipeRepository::new(api, images));
        app.state = AppState::Normal;
        app
    }

    #[tokio::test]
    async fn test_search_typing_and_escape() {
        let mut app = test_app();
        handle_input(&mut app, key(KeyCode::Char('/'))).await.expect("input");
        assert_eq!(app.state, AppState::Searching);

        for c in "thai".chars() {
            handle_input(&mut app, key(KeyCode::Char(c))).await.expect("input");
        }
        assert_eq!(app.search_query, "thai");

        handle_input(&mut app, key(KeyCode::Enter)).await.expect("input");
        assert_eq!(app.state, AppState::Normal);
        assert_eq!(app.search_query, "thai");

        handle_input(&mut app, key(KeyCode::Esc)).await.expect("input");
        assert!(app.search_query.is_empty());
    }

    #[tokio::test]
    async fn test_quit_confirmation() {
        let mut app = test_app();
        assert!(!handle_input(&mut app, key(KeyCode::Char('q'))).await.expect("input"));
        assert_eq!(app.state, AppState::ConfirmingQuit);

        assert!(!handle_input(&mut app, key(KeyCode::Char('n'))).await.expect("input"));
        assert_eq!(app.state, AppState::Normal);

        handle_input(&mut app, key(KeyCode::Char('q'))).await.expect("input");
        assert!(handle_input(&mut app, key(KeyCode::Char('y'))).await.expect("input"));
        assert_eq!(app.state, AppState::Quitting);
    }

    #[tokio::test]
    async fn test_keys_ignored_while_loading() {
        let mut app = test_app();
        app.state = AppState::Loading;
        handle_input(&mut app, key(KeyCode::Char('q'))).await.expect("input");
        assert_eq!(app.state, AppState::Loading);
    }

    #[tokio::test]
    async fn test_login_escape_returns_to_list() {
        let mut app = test_app();
        handle_input(&mut app, key(KeyCode::Char('l'))).await.expect("input");
        assert_eq!(app.state, AppState::LoggingIn);

        handle_input(&mut app, key(KeyCode::Esc)).await.expect("input");
        assert_eq!(app.state, AppState::Normal);
    }

    #[tokio::test]
    async fn test_form_typing_and_choices() {
        let mut app = test_app();
        app.state = AppState::EditingRecipe;

        for c in "Tacos".chars() {
            handle_input(&mut app, key(KeyCode::Char(c))).await.expect("input");
        }
        assert_eq!(app.form.title, "Tacos");

        // Title -> Ingredients -> Instructions -> Type
        for _ in 0..3 {
            handle_input(&mut app, key(KeyCode::Tab)).await.expect("input");
        }
        assert_eq!(app.form.focus, FormField::Type);

        // Typed letters do not land in choice fields
        handle_input(&mut app, key(KeyCode::Char('x'))).await.expect("input");
        handle_input(&mut app, key(KeyCode::Right)).await.expect("input");
        assert_eq!(app.form.cuisine, Some(Cuisine::American));
        assert_eq!(app.form.title, "Tacos");

        handle_input(&mut app, key(KeyCode::Esc)).await.expect("input");
        assert_eq!(app.state, AppState::Normal);
        assert!(app.form.title.is_empty());
    }
}
