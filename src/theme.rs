use ratatui::style::{Color, Modifier, Style};

pub struct Theme {
    pub focus_border: Color,
    pub blurred_border: Color,
    pub text: Color,
    pub text_secondary: Color,
    pub text_highlight: Color,

    // Specific components
    pub repo_name: Style,
    pub repo_description: Style,
    pub repo_language: Style,
    pub repo_stars: Style,
    pub repo_updated: Style,
    pub selected_marker: Style,
    pub cursor_row: Style,
    pub search_match: Style,
    pub footer: Style,
    pub popup_title: Style,
    pub popup_border: Style,
    pub popup_text: Style,
    pub danger: Style,
    pub success: Style,
    pub busy: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            focus_border: Color::Cyan,
            blurred_border: Color::DarkGray,
            text: Color::White,
            text_secondary: Color::Gray,
            text_highlight: Color::Yellow,

            repo_name: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            repo_description: Style::default().fg(Color::Gray),
            repo_language: Style::default().fg(Color::Black).bg(Color::Cyan),
            repo_stars: Style::default().fg(Color::Yellow),
            repo_updated: Style::default().fg(Color::Magenta),
            selected_marker: Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            cursor_row: Style::default().bg(Color::Rgb(30, 30, 30)),
            search_match: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            footer: Style::default().fg(Color::Gray).add_modifier(Modifier::DIM),
            popup_title: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            popup_border: Style::default().fg(Color::Magenta).bg(Color::Black),
            popup_text: Style::default().fg(Color::White),
            danger: Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            success: Style::default().fg(Color::Green),
            busy: Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        }
    }
}
