use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use recipebox_core::utils::{preview_line, truncate_string};

use crate::app::{App, FormField, RecipeForm};
use crate::ui::render::centered_rect_fixed;
use crate::ui::styles;

const FORM_WIDTH: u16 = 72;
const LABEL_WIDTH: usize = 14;

/// Width available for a field value inside the overlay
const VALUE_WIDTH: usize = FORM_WIDTH as usize - LABEL_WIDTH - 6;

fn field_value(form: &RecipeForm, field: FormField) -> String {
    match field {
        FormField::Title => form.title.clone(),
        FormField::Ingredients => preview_line(&form.ingredients, VALUE_WIDTH),
        FormField::Instructions => preview_line(&form.instructions, VALUE_WIDTH),
        FormField::Type => match form.cuisine {
            Some(c) => format!("◀ {} ▶", c.display_name()),
            None => "◀ Select a type ▶".to_string(),
        },
        FormField::CookingTime => match form.cooking_time {
            Some(t) => format!("◀ {} mins ▶", t),
            None => "◀ Select a time ▶".to_string(),
        },
        FormField::Image => form.image.clone(),
        FormField::Submit => String::new(),
    }
}

/// Keep the tail of long text visible while typing
fn tail(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width {
        text.to_string()
    } else {
        let skipped: String = text.chars().skip(count - width + 1).collect();
        format!("…{}", skipped)
    }
}

fn field_line(form: &RecipeForm, field: FormField) -> Line<'static> {
    let focused = form.focus == field;
    let value = field_value(form, field);
    let shown = if focused && field.is_text() {
        format!("{}▌", tail(&value, VALUE_WIDTH - 1))
    } else {
        truncate_string(&value, VALUE_WIDTH)
    };

    Line::from(vec![
        Span::styled(format!("  {:<width$}", field.label(), width = LABEL_WIDTH), styles::muted_style()),
        Span::styled(shown, styles::field_style(focused)),
    ])
}

pub fn render_form_overlay(frame: &mut Frame, app: &App) {
    let form = &app.form;
    let height = if form.error.is_some() { 20 } else { 18 };
    let area = centered_rect_fixed(FORM_WIDTH, height, frame.area());

    frame.render_widget(Clear, area);

    let title = if form.is_edit() { " Edit Recipe " } else { " Add Recipe " };

    let mut lines = vec![Line::from("")];
    for field in FormField::ALL.iter().filter(|f| **f != FormField::Submit) {
        lines.push(field_line(form, *field));
        lines.push(Line::from(""));
    }

    lines.push(Line::from(Span::styled(
        "  Image takes a URL or a local file to upload.",
        styles::muted_style(),
    )));

    let button_focused = form.focus == FormField::Submit;
    let button = match (form.saving, button_focused) {
        (true, _) => "  Saving...  ".to_string(),
        (false, true) => format!(" ▶ {} ◀ ", FormField::Submit.label()),
        (false, false) => format!("   {}   ", FormField::Submit.label()),
    };
    lines.push(Line::from(vec![
        Span::raw("                            ["),
        Span::styled(button, styles::field_style(button_focused)),
        Span::raw("]"),
    ]));

    if let Some(ref error) = form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!("  {}", error), styles::error_style())));
    }

    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .title_bottom(Line::from(Span::styled(
            " Tab/↑↓ move · ←/→ choose · Enter save · Esc cancel ",
            styles::muted_style(),
        )))
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}
