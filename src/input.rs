//! Single-line text prompt (InputBox) used for paths and form fields.

use ratatui::{
    layout::Alignment,
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph},
};

/// Editing state of the open prompt.
#[derive(Clone, Debug)]
pub struct InputBoxState {
    /// Prompt text.
    pub prompt: String,
    /// Current value.
    pub value: String,
    /// Cursor position in characters.
    pub cursor: usize,
    /// What to do with the value on confirm.
    pub callback_id: InputCallbackId,
}

/// Destination of a confirmed value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputCallbackId {
    // Main screen
    OpenFile,
    InvoiceNumber,
    InvoiceDate,
    CustomerTaxId,

    // Settings screen
    SettingsBaseUrl,
    SettingsDownloadsDir,
}

impl InputBoxState {
    /// Open a prompt with the cursor at the end of `value`.
    pub fn new(prompt: impl Into<String>, value: impl Into<String>, callback_id: InputCallbackId) -> Self {
        let value = value.into();
        // Start with the cursor after the existing text.
        Self {
            prompt: prompt.into(),
            cursor: value.chars().count(),
            value,
            callback_id,
        }
    }

    /// Byte offset of the character at `idx`.
    fn byte_at(&self, idx: usize) -> usize {
        // Past the last character maps to the end of the string.
        self.value
            .char_indices()
            .nth(idx)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    /// Insert a character at the cursor.
    pub fn insert_char(&mut self, c: char) {
        // Convert the character index to a byte offset before inserting.
        let at = self.byte_at(self.cursor);
        self.value.insert(at, c);
        // Advance past the new character.
        self.cursor += 1;
    }

    /// Insert pasted text at the cursor, ignoring line breaks.
    pub fn insert_str(&mut self, s: &str) {
        // A drop may end with a newline; the prompt is single-line.
        for c in s.chars().filter(|c| *c != '\n' && *c != '\r') {
            self.insert_char(c);
        }
    }

    /// Remove the character before the cursor.
    pub fn backspace(&mut self) {
        // Nothing to remove at the start of the line.
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_at(self.cursor);
            self.value.remove(at);
        }
    }

    /// Remove the character under the cursor.
    pub fn delete(&mut self) {
        // Nothing to remove at the end of the line.
        if self.cursor < self.value.chars().count() {
            let at = self.byte_at(self.cursor);
            self.value.remove(at);
        }
    }

    /// One character left, stopping at the start.
    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// One character right, stopping at the end.
    pub fn move_right(&mut self) {
        if self.cursor < self.value.chars().count() {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.value.chars().count();
    }

    /// Clear the whole line.
    pub fn clear_line(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }
}

/// Draw the prompt as a centered popup.
pub fn render_input_box(f: &mut Frame, state: &InputBoxState) {
    let popup_area = centered_popup(f.area(), 70, 7);

    // Wipe what is underneath before drawing the popup.
    f.render_widget(Clear, popup_area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Input")
        .style(Style::default().bg(Color::DarkGray));
    f.render_widget(block, popup_area);

    // Prompt, value, spacer, help.
    let inner_layout = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(popup_area);

    // Prompt line.
    let prompt_widget = Paragraph::new(state.prompt.clone()).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );
    f.render_widget(prompt_widget, inner_layout[0]);

    // Scroll horizontally so the cursor stays visible.
    let display_width = inner_layout[1].width as usize;
    let scroll_offset = state
        .cursor
        .saturating_sub(display_width.saturating_sub(2));
    // Work in characters so multibyte input scrolls correctly.
    let chars: Vec<char> = state.value.chars().collect();
    let visible: Vec<char> = chars
        .iter()
        .skip(scroll_offset)
        .take(display_width)
        .copied()
        .collect();
    // Draw the cursor as a bar between the two halves.
    let split = state.cursor.saturating_sub(scroll_offset).min(visible.len());
    let before: String = visible[..split].iter().collect();
    let after: String = visible[split..].iter().collect();

    let input_widget =
        Paragraph::new(format!("{before}|{after}")).style(Style::default().fg(Color::Green));
    f.render_widget(input_widget, inner_layout[1]);

    // Key hints on the last line.
    let help = Paragraph::new("Enter=confirm | Esc=cancel | Ctrl+U=clear")
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center);
    f.render_widget(help, inner_layout[3]);
}

/// Centered rectangle of `width_percent` width and fixed `height`.
fn centered_popup(area: Rect, width_percent: u16, height: u16) -> Rect {
    // Center vertically first.
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((area.height.saturating_sub(height)) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    // Then horizontally within the middle row.
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - width_percent) / 2),
            Constraint::Percentage(width_percent),
            Constraint::Percentage((100 - width_percent) / 2),
        ])
        .split(popup_layout[1])[1]
}
