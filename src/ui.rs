use chrono::Utc;
use ratatui::{
    prelude::*,
    widgets::{
        Block, Borders, Clear, List, ListItem, ListState, Paragraph, Scrollbar,
        ScrollbarOrientation, ScrollbarState, Wrap,
    },
};

use crate::app::{App, Row};
use crate::bulk::{ConfirmDialog, DialogTarget};
use crate::models::{FocusArea, Severity};
use crate::theme::Theme;
use crate::utils::{highlight_matches, relative_time};

/// Renders a repository as a two-line card.
fn render_row(row: &Row<'_>, term: &str, is_cursor: bool, theme: &Theme) -> ListItem<'static> {
    let repo = row.repo;
    let marker = if row.selected { "[x] " } else { "[ ] " };
    let pointer = if is_cursor { "→" } else { " " };
    let muted = Style::default().fg(theme.text_secondary);

    let mut first = vec![
        Span::raw(pointer),
        Span::styled(marker, if row.selected { theme.selected_marker } else { muted }),
    ];
    if row.starred_at.is_some() {
        first.push(Span::styled(format!("{}/", repo.owner.login), muted));
    }
    first.extend(highlight_matches(&repo.name, term, theme.repo_name, theme.search_match));
    if let Some(lang) = &repo.language {
        first.push(Span::raw("  "));
        first.push(Span::styled(format!(" {} ", lang), theme.repo_language));
    }
    first.push(Span::styled(format!("  ★ {}", repo.stargazers_count), theme.repo_stars));
    let now = Utc::now();
    first.push(Span::styled(
        format!("  updated {}", relative_time(repo.updated_at, now)),
        theme.repo_updated,
    ));
    if let Some(starred_at) = row.starred_at {
        first.push(Span::styled(
            format!("  starred {}", relative_time(starred_at, now)),
            theme.repo_updated,
        ));
    }

    let mut second = vec![Span::raw("      ")];
    match &repo.description {
        Some(desc) => second.extend(highlight_matches(
            desc,
            term,
            theme.repo_description,
            theme.search_match,
        )),
        None => second.push(Span::styled(
            "No description",
            theme.repo_description.add_modifier(Modifier::ITALIC),
        )),
    }

    let item = ListItem::new(vec![Line::from(first), Line::from(second)]);
    if is_cursor { item.style(theme.cursor_row) } else { item }
}

/// Renders the whole screen.
pub fn render(f: &mut Frame, app: &App, theme: &Theme) {
    let area = f.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // search + filters
            Constraint::Min(1),    // list
            Constraint::Length(1), // snackbar
            Constraint::Length(3), // footer
        ])
        .split(area);

    render_filter_bar(f, app, theme, chunks[0]);
    render_list(f, app, theme, chunks[1]);
    render_snackbar(f, app, theme, chunks[2]);

    let footer = Paragraph::new(concat!(
        "↑/↓ j/k Move | <Space> Select | / Search | l Language | s Sort | o Order | ",
        "Tab Owned/Starred | U/D Unstar/Delete selected | u/d Unstar/Delete one | ",
        "c Copy URL | r Reload | q Quit",
    ))
    .block(Block::default().borders(Borders::ALL))
    .wrap(Wrap { trim: true })
    .style(theme.footer);
    f.render_widget(footer, chunks[3]);

    if app.dialog.is_open() {
        render_confirm_dialog(f, app, theme);
    }
}

fn render_filter_bar(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(24), Constraint::Length(20)])
        .split(area);

    let searching = app.focus == FocusArea::Search;
    let search_text = if searching {
        format!("{}▏", app.criteria.search_term)
    } else if app.criteria.search_term.is_empty() {
        "press / to search".to_string()
    } else {
        app.criteria.search_term.clone()
    };
    let search = Paragraph::new(search_text)
        .style(Style::default().fg(if searching { theme.text_highlight } else { theme.text }))
        .block(
            Block::default()
                .title("Search repositories")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(if searching {
                    theme.focus_border
                } else {
                    theme.blurred_border
                })),
        );
    f.render_widget(search, columns[0]);

    let blurred = Style::default().fg(theme.blurred_border);
    let language = Paragraph::new(app.criteria.language.label().to_string()).block(
        Block::default()
            .title("Language [l]")
            .borders(Borders::ALL)
            .border_style(blurred),
    );
    f.render_widget(language, columns[1]);

    let sort = Paragraph::new(format!("{} {}", app.sort.field.label(), app.sort.order.arrow()))
        .block(
            Block::default()
                .title("Sort by [s/o]")
                .borders(Borders::ALL)
                .border_style(blurred),
        );
    f.render_widget(sort, columns[2]);
}

fn render_list(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let rows = app.rows();
    let user = app.login.as_deref().map(|l| format!(" @{}", l)).unwrap_or_default();
    let mut title = vec![
        Span::styled(format!("{}{}", app.view.label(), user), theme.popup_title),
        Span::raw(format!(" – {} shown, {} selected", rows.len(), app.selection.len())),
    ];
    if app.busy() {
        title.push(Span::styled("  Loading...", theme.busy));
    }
    let block = Block::default()
        .title(Line::from(title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if app.focus == FocusArea::List {
            theme.focus_border
        } else {
            theme.blurred_border
        }));

    if rows.is_empty() {
        let text = if app.loading {
            "Loading..."
        } else if app.collection.is_empty() {
            "No repositories found."
        } else {
            "No repositories match the current filters."
        };
        let placeholder = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(placeholder, area);
        return;
    }

    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    let term = &app.criteria.search_term;
    let items: Vec<ListItem> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| render_row(row, term, Some(i) == app.cursor, theme))
        .collect();
    let mut state = ListState::default();
    state.select(app.cursor);
    f.render_stateful_widget(List::new(items).block(block), layout[0], &mut state);

    let mut sb = ScrollbarState::default()
        .position(app.cursor.unwrap_or(0))
        .content_length(rows.len());
    f.render_stateful_widget(
        Scrollbar::default().orientation(ScrollbarOrientation::VerticalRight),
        layout[1],
        &mut sb,
    );
}

fn render_snackbar(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    if let Some(snackbar) = &app.snackbar {
        let style = match snackbar.notification.severity {
            Severity::Success => theme.success,
            Severity::Error => theme.danger,
        };
        f.render_widget(Paragraph::new(snackbar.notification.message.clone()).style(style), area);
    }
}

fn render_confirm_dialog(f: &mut Frame, app: &App, theme: &Theme) {
    let ConfirmDialog::Open { action, target } = &app.dialog else {
        return;
    };
    let popup_area = centered_rect(50, 25, f.area());
    f.render_widget(Clear, popup_area);

    let question = match target {
        DialogTarget::Selection => format!(
            "Are you sure you want to {} {} selected repositories?",
            action.verb(),
            app.dialog.target_count(&app.selection)
        ),
        DialogTarget::Single { full_name, .. } => {
            format!("Are you sure you want to {} {}?", action.verb(), full_name)
        }
    };
    let lines = vec![
        Line::from(Span::styled(question, theme.popup_text)),
        Line::from(""),
        Line::from(vec![
            Span::styled("y/Enter", theme.danger),
            Span::raw(" Confirm    "),
            Span::styled("n/Esc", theme.popup_title),
            Span::raw(" Cancel"),
        ]),
    ];
    let para = Paragraph::new(lines)
        .block(
            Block::default()
                .title(Span::styled(format!("Confirm {}", action.title()), theme.popup_title))
                .borders(Borders::ALL)
                .style(theme.popup_border),
        )
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center);
    f.render_widget(para, popup_area);
}

/// Centers a rectangle within another rectangle.
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r)[1];
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical)[1]
}
