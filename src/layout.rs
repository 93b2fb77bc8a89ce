//! Layout helpers.

use ratatui::prelude::*;

/// Vertical split of the whole screen.
pub struct MainLayout {
    /// Form and preview panels.
    pub body: Rect,
    /// HELP bar.
    pub help_bar: Rect,
    /// STATUS bar.
    pub status_bar: Rect,
}

/// Horizontal split of the body.
pub struct BodyLayout {
    /// File, fields and actions.
    pub form_panel: Rect,
    /// Preview pane and counter.
    pub preview_panel: Rect,
}

/// Split the screen into body, HELP and STATUS.
pub fn create_main_layout(area: Rect) -> MainLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // body
            Constraint::Length(3), // HELP
            Constraint::Length(3), // STATUS
        ])
        .split(area);

    // Bars keep a fixed height; the body takes the rest.
    MainLayout {
        body: chunks[0],
        help_bar: chunks[1],
        status_bar: chunks[2],
    }
}

/// Split the body into the form (55%) and the preview (45%).
pub fn create_body_layout(area: Rect) -> BodyLayout {
    // Form gets the larger share; the preview only needs a description.
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    BodyLayout {
        form_panel: chunks[0],
        preview_panel: chunks[1],
    }
}
