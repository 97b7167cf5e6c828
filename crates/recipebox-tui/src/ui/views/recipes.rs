use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use recipebox_core::models::Recipe;
use recipebox_core::recipes::empty_state_message;
use recipebox_core::utils::truncate_string;

use crate::app::{App, AppState};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    render_recipe_list(frame, app, chunks[0]);
    render_recipe_card(frame, app, chunks[1]);
}

/// Text for the list area when there is nothing to show
fn empty_list_text(app: &App) -> String {
    if matches!(app.state, AppState::Loading) {
        "Checking session...".to_string()
    } else if app.recipes_loading && app.recipes.is_empty() {
        "Loading recipes...".to_string()
    } else if !app.search_query.is_empty() {
        empty_state_message(&app.search_query)
    } else if app.my_recipes_only {
        "You have not posted any recipes yet. Press [a] to add one.".to_string()
    } else {
        empty_state_message("")
    }
}

fn render_recipe_list(frame: &mut Frame, app: &App, area: Rect) {
    let visible = app.visible_recipes();
    let viewer = app.current_user();

    let scope = if app.my_recipes_only { "My Recipes" } else { "Recipes" };
    let title = format!(" {} ({}) ", scope, visible.len());
    let block = Block::default()
        .title(title)
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    if visible.is_empty() {
        let paragraph = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(format!(" {}", empty_list_text(app)), styles::muted_style())),
        ])
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let header = Row::new([
        Cell::from("Title"),
        Cell::from("Type"),
        Cell::from("Time"),
        Cell::from("By"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = visible
        .iter()
        .enumerate()
        .map(|(i, recipe)| {
            let style = if i == app.selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            Row::new(vec![
                Cell::from(recipe.title.as_str()),
                Cell::from(recipe.cuisine.display_name()),
                Cell::from(recipe.cooking_time_display()),
                Cell::from(recipe.author_label(viewer)),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Fill(1),
        Constraint::Length(10),
        Constraint::Length(9),
        Constraint::Length(14),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.selection));

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_recipe_card(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Recipe ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let lines = match app.selected_recipe() {
        Some(recipe) => card_lines(recipe, app, area.width.saturating_sub(4) as usize),
        None => vec![Line::from(Span::styled(" Select a recipe", styles::muted_style()))],
    };

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn card_lines<'a>(recipe: &'a Recipe, app: &App, width: usize) -> Vec<Line<'a>> {
    let viewer = app.current_user();
    let mut lines = vec![
        Line::from(Span::styled(recipe.title.as_str(), styles::title_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("By:       ", styles::muted_style()),
            Span::raw(recipe.author_label(viewer)),
        ]),
        Line::from(vec![
            Span::styled("Type:     ", styles::muted_style()),
            Span::raw(recipe.cuisine.display_name()),
        ]),
        Line::from(vec![
            Span::styled("Time:     ", styles::muted_style()),
            Span::raw(recipe.cooking_time_display()),
        ]),
        Line::from(vec![
            Span::styled("Image:    ", styles::muted_style()),
            Span::raw(truncate_string(recipe.image_display(), width.saturating_sub(10).max(8))),
        ]),
        Line::from(""),
        Line::from(Span::styled("Ingredients", styles::highlight_style())),
    ];

    lines.extend(
        recipe
            .ingredients
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|l| Line::from(format!("  • {}", l))),
    );

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Instructions", styles::highlight_style())));
    lines.extend(recipe.instructions.lines().map(|l| Line::from(format!("  {}", l))));

    if recipe.is_owned_by(viewer) {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("[e]", styles::help_key_style()),
            Span::styled(" edit  ", styles::muted_style()),
            Span::styled("[d]", styles::help_key_style()),
            Span::styled(" delete", styles::muted_style()),
        ]));
    }

    lines
}
