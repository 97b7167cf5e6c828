use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use recipebox_core::utils::truncate_string;

use crate::app::{App, AppState, LoginFocus};

use super::styles;
use super::views::{form, recipes};

const LOGO: [&str; 3] = [
    "   ╦═╗╔═╗╔═╗╦╔═╗╔═╗╔╗ ╔═╗═╗ ╦",
    "   ╠╦╝║╣ ║  ║╠═╝║╣ ╠╩╗║ ║╔╩╦╝",
    "   ╩╚═╚═╝╚═╝╩╩  ╚═╝╚═╝╚═╝╩ ╚═",
];

fn logo_lines(indent: usize) -> Vec<Line<'static>> {
    LOGO.iter()
        .map(|row| Line::from(Span::styled(format!("{}{}", " ".repeat(indent), row), styles::title_style())))
        .collect()
}

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(3), // Search and cuisine tags
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_search_bar(frame, app, chunks[1]);
    recipes::render(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    // Render overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame, app),
        AppState::LoggingIn => render_login_overlay(frame, app),
        AppState::EditingRecipe => form::render_form_overlay(frame, app),
        AppState::ConfirmingDelete => render_delete_overlay(frame, app),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        AppState::Loading | AppState::Normal | AppState::Searching | AppState::Quitting => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  recipebox";
    let session = app.auth.session();
    let account = if session.loading {
        "checking session...".to_string()
    } else {
        match session.user() {
            Some(user) => format!("{}  [L]ogout", user.display_name()),
            None => "not logged in  [l]ogin".to_string(),
        }
    };
    let right = format!("{}   [?] Help", account);

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(title.len() + right.chars().count() + 2),
        )),
        Span::styled(right, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_search_bar(frame: &mut Frame, app: &App, area: Rect) {
    let searching = matches!(app.state, AppState::Searching);
    let cursor = if searching { "▌" } else { "" };

    let mut spans = vec![
        Span::styled(" Search: ", styles::muted_style()),
        Span::styled(format!("{}{}", app.search_query, cursor), styles::search_style()),
        Span::raw("   "),
    ];

    let active = app.active_tag();
    let tags = app.cuisine_tags();
    if !tags.is_empty() {
        spans.push(Span::styled("[c] ", styles::help_key_style()));
    }
    for (i, tag) in tags.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        spans.push(Span::styled(tag.display_name(), styles::tag_style(active == Some(*tag))));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = "[a]dd | [r]efresh | [m]ine | [q]uit";
    let width = area.width as usize;
    let right_text = format!(" {} ", shortcuts);

    let (left_text, left_style) = match app.notification {
        Some(ref n) => (format!(" {} ", n.message), styles::notification_style(n.kind)),
        None if app.recipes_loading => (" Loading recipes... ".to_string(), styles::muted_style()),
        None => (
            format!(" {} recipes ", app.recipes.len()),
            styles::muted_style(),
        ),
    };
    let left_text = truncate_string(&left_text, width.saturating_sub(right_text.len()));

    let padding_len = width
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());
    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(52, 28, frame.area());

    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let mut help_text = logo_lines(5);
    help_text.push(Line::from(Span::styled(
        format!("              version {}", version),
        styles::muted_style(),
    )));
    help_text.extend([
        Line::from(""),
        Line::from(Span::styled(" Browse", styles::highlight_style())),
        help_line("↑/↓", "Navigate list"),
        help_line("/", "Search by title or type"),
        help_line("c", "Cycle cuisine tags"),
        help_line("Esc", "Clear search"),
        help_line("m", "Toggle my recipes"),
        help_line("r", "Refresh recipes"),
        Line::from(""),
        Line::from(Span::styled(" Recipes", styles::highlight_style())),
        help_line("a", "Add a recipe"),
        help_line("e", "Edit selected (yours only)"),
        help_line("d", "Delete selected (yours only)"),
        Line::from(""),
        Line::from(Span::styled(" Account", styles::highlight_style())),
        help_line("l / L", "Log in / log out"),
        help_line("q", "Quit"),
        Line::from(""),
    ]);

    if let Some(dir) = app.log_dir() {
        help_text.push(Line::from(Span::styled(
            format!(" Logs: {}", truncate_string(&dir.display().to_string(), 42)),
            styles::muted_style(),
        )));
    }

    help_text.push(Line::from(vec![
        Span::styled("       Press ", styles::muted_style()),
        Span::styled("?", styles::help_key_style()),
        Span::styled(" or ", styles::muted_style()),
        Span::styled("Esc", styles::help_key_style()),
        Span::styled(" to close", styles::muted_style()),
    ]));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(help_text).block(block);

    frame.render_widget(paragraph, area);
}

fn render_login_overlay(frame: &mut Frame, app: &App) {
    let height = if app.login_error.is_some() { 14 } else { 12 };
    let area = centered_rect_fixed(52, height, frame.area());

    frame.render_widget(Clear, area);

    let mut lines = logo_lines(5);
    lines.push(Line::from(""));

    // Email field
    let email_focused = app.login_focus == LoginFocus::Email;
    let email_display = format!("{:<24}", truncate_string(&app.login_email, 24));
    let cursor = if email_focused { "▌" } else { "" };
    lines.push(Line::from(vec![
        Span::raw("      "),
        Span::styled("Email:    [", styles::muted_style()),
        Span::styled(format!("{}{}", email_display, cursor), styles::field_style(email_focused)),
        Span::styled("]", styles::muted_style()),
    ]));

    // Password field
    let password_focused = app.login_focus == LoginFocus::Password;
    let password_masked: String = "*".repeat(app.login_password.chars().count().min(24));
    let password_display = format!("{:<24}", password_masked);
    let cursor = if password_focused { "▌" } else { "" };
    lines.push(Line::from(vec![
        Span::raw("      "),
        Span::styled("Password: [", styles::muted_style()),
        Span::styled(format!("{}{}", password_display, cursor), styles::field_style(password_focused)),
        Span::styled("]", styles::muted_style()),
    ]));

    // Login button
    let button_focused = app.login_focus == LoginFocus::Button;
    lines.push(Line::from(""));
    let label = if button_focused { " ▶ Login ◀ " } else { "   Login   " };
    lines.push(Line::from(vec![
        Span::raw("                  ["),
        Span::styled(label, styles::field_style(button_focused)),
        Span::raw("]"),
    ]));

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(lines).block(block);

    frame.render_widget(paragraph, area);
}

/// Create a centered rectangle with fixed dimensions
pub(crate) fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_confirm_overlay(frame: &mut Frame, question: String, action: &'static str) {
    let area = centered_rect_fixed(52, 10, frame.area());

    frame.render_widget(Clear, area);

    let mut lines = logo_lines(5);
    lines.extend([
        Line::from(""),
        Line::from(Span::styled(format!("   {}", question), styles::highlight_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(format!(" to {}, ", action), styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(lines).block(block);

    frame.render_widget(paragraph, area);
}

fn render_delete_overlay(frame: &mut Frame, app: &App) {
    let title = app
        .pending_delete
        .as_ref()
        .map(|p| truncate_string(&p.title, 24))
        .unwrap_or_default();
    render_confirm_overlay(frame, format!("Delete \"{}\"?", title), "delete");
}

fn render_quit_overlay(frame: &mut Frame) {
    render_confirm_overlay(frame, "Are you sure you want to quit?".to_string(), "quit");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_fixed() {
        let outer = Rect::new(0, 0, 100, 40);
        assert_eq!(centered_rect_fixed(52, 10, outer), Rect::new(24, 15, 52, 10));

        // Larger than the terminal: clamp to the available area
        let small = Rect::new(0, 0, 40, 8);
        assert_eq!(centered_rect_fixed(52, 10, small), Rect::new(0, 0, 40, 8));
    }
}
