//! Drawing.

use ratatui::{
    Frame,
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::{
    counter::COUNTER_KEY,
    events::Screen,
    input, layout,
    shortcuts::Shortcuts,
    status::StatusKind,
    workflow::{ExtractionMode, Field, Preview, format_file_size},
};

use super::App;

/// Draw the whole screen.
pub fn draw(f: &mut Frame, app: &App) {
    let main_layout = layout::create_main_layout(f.area());
    let body_layout = layout::create_body_layout(main_layout.body);

    let left = match app.ui.screen {
        Screen::Main => Paragraph::new(build_form_text(app))
            .block(Block::default().borders(Borders::ALL).title("INVOICE")),
        Screen::Settings => Paragraph::new(build_settings_text(app))
            .block(Block::default().borders(Borders::ALL).title("SETTINGS")),
    };
    f.render_widget(left.wrap(Wrap { trim: false }), body_layout.form_panel);

    let preview = Paragraph::new(build_preview_text(app))
        .block(Block::default().borders(Borders::ALL).title("PREVIEW"))
        .wrap(Wrap { trim: true });
    f.render_widget(preview, body_layout.preview_panel);

    let help_bar = Paragraph::new(get_help_text(&app.ui.screen, &app.shortcuts))
        .block(Block::default().borders(Borders::ALL).title("HELP"))
        .wrap(Wrap { trim: true });
    f.render_widget(help_bar, main_layout.help_bar);

    f.render_widget(build_status_bar(app), main_layout.status_bar);

    if let Some(input_state) = &app.input_box {
        input::render_input_box(f, input_state);
    }
}

fn dim() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn field_line(app: &App, label: &str, value: &str, field: Field) -> Line<'static> {
    let mut spans = vec![
        Span::styled(format!("{label:<14}"), Style::default().fg(Color::Cyan)),
        Span::raw(if value.is_empty() { "-".to_string() } else { value.to_string() }),
    ];
    if !app.workflow.field_editable(field) {
        spans.push(Span::styled(" [auto]", dim()));
    }
    Line::from(spans)
}

fn action_line(label: &str, enabled: bool, detail: String) -> Line<'static> {
    let style = if enabled {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Rgb(255, 140, 0))
            .add_modifier(Modifier::BOLD)
    } else {
        dim()
    };
    Line::from(vec![
        Span::styled(format!("[ {label} ]"), style),
        Span::raw(" "),
        Span::styled(detail, dim()),
    ])
}

/// File, form fields and the two actions.
fn build_form_text(app: &App) -> Text<'static> {
    let wf = &app.workflow;
    let form = wf.form();
    let mut lines = vec![];

    match wf.file() {
        Some(file) => lines.push(Line::from(vec![
            Span::styled("File          ", Style::default().fg(Color::Cyan)),
            Span::styled(file.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!(" ({})", format_file_size(file.size))),
        ])),
        None => lines.push(Line::styled(
            "No file. Drop a PDF onto the terminal or press o.",
            dim(),
        )),
    }
    lines.push(Line::raw(""));

    let auto = match wf.mode() {
        ExtractionMode::Automatic => "ON (from filename)",
        ExtractionMode::Manual => "OFF",
    };
    lines.push(Line::from(vec![
        Span::styled("Auto extract  ", Style::default().fg(Color::Cyan)),
        Span::raw(auto),
    ]));
    lines.push(field_line(app, "Invoice #", &form.identifier, Field::Identifier));
    if let Some(next) = wf.suggestion() {
        lines.push(Line::styled(format!("{:14}next suggested: {next}", ""), dim()));
    }
    lines.push(field_line(app, "Invoice date", &form.date, Field::Date));
    lines.push(field_line(app, "Customer ABN", &form.tax_id, Field::TaxId));
    lines.push(Line::from(vec![
        Span::styled("Excl. discount", Style::default().fg(Color::Cyan)),
        Span::raw(if form.exclude_discount { "yes" } else { "no" }),
    ]));
    lines.push(Line::raw(""));

    let process_detail = if wf.is_busy() {
        "Processing...".to_string()
    } else if wf.file().is_none() {
        "needs a PDF".to_string()
    } else {
        String::new()
    };
    lines.push(action_line("Process", wf.can_process(), process_detail));
    let download_detail = wf
        .result()
        .map(|r| r.artifact.clone())
        .unwrap_or_default();
    lines.push(action_line("Download", wf.can_download(), download_detail));

    Text::from(lines)
}

fn build_settings_text(app: &App) -> String {
    format!(
        "Server URL:       {}\nDownloads folder: {}\n\nCounter file:     {}\nRequest timeout:  {}s\n\nChanges apply after saving.",
        app.base_url,
        app.downloads_dir,
        app.cfg
            .storage
            .state_dir
            .join(format!("{COUNTER_KEY}.json"))
            .display(),
        app.cfg.server.timeout_secs,
    )
}

/// Describe what the preview pane holds; the terminal cannot show the image.
fn build_preview_text(app: &App) -> String {
    let wf = &app.workflow;
    let pane = match wf.preview() {
        Preview::Placeholder => "Preview will appear here".to_string(),
        Preview::Hidden => "Processing...".to_string(),
        Preview::Original(bytes) => format!(
            "Original: {}\nfirst page rendered ({})",
            wf.file().map(|f| f.name.as_str()).unwrap_or("-"),
            format_file_size(bytes.len() as u64),
        ),
        Preview::Processed(bytes) => format!(
            "Processed: {}\nfirst page rendered ({})",
            wf.result().map(|r| r.artifact.as_str()).unwrap_or("-"),
            format_file_size(bytes.len() as u64),
        ),
    };
    let log = app
        .ui
        .log
        .iter()
        .rev()
        .take(6)
        .rev()
        .cloned()
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "{pane}\n\nProcessed today: {}\n\nLog:\n{log}",
        wf.processed_today()
    )
}

fn build_status_bar(app: &App) -> Paragraph<'static> {
    let screen_name = match app.ui.screen {
        Screen::Main => "Main",
        Screen::Settings => "Settings",
    };

    let red = Style::default().fg(Color::Red);
    let mut spans = vec![Span::raw(format!("[{screen_name}] "))];

    // Workflow status first; a worker failure is appended, never shown instead.
    match app.workflow.status() {
        Some(status) => {
            let style = if status.kind == StatusKind::Error {
                red
            } else {
                Style::default()
            };
            spans.push(Span::styled(
                format!("{} {}", status.kind.icon(), status.message),
                style,
            ));
        }
        None if app.ui.error.is_none() => spans.push(Span::raw("Ready")),
        None => {}
    }
    if let Some(err) = &app.ui.error {
        if app.workflow.status().is_some() {
            spans.push(Span::raw(" | "));
        }
        spans.push(Span::styled(format!("ERROR: {err}"), red));
    }

    Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("STATUS"))
        .wrap(Wrap { trim: true })
}

fn get_help_text(screen: &Screen, shortcuts: &Shortcuts) -> String {
    match screen {
        Screen::Main => {
            let sc = &shortcuts.main;
            format!(
                "{}: open | {}: remove | {}: process | {}: download | {}: auto | {}: discount | {}/{}/{}: number/date/ABN | {}: settings | {}: quit",
                format_keys(&sc.open_file),
                format_keys(&sc.remove_file),
                format_keys(&sc.process),
                format_keys(&sc.download),
                format_keys(&sc.toggle_auto),
                format_keys(&sc.toggle_discount),
                format_keys(&sc.edit_identifier),
                format_keys(&sc.edit_date),
                format_keys(&sc.edit_tax_id),
                format_keys(&sc.settings),
                format_keys(&sc.quit),
            )
        }
        Screen::Settings => {
            let sc = &shortcuts.settings;
            format!(
                "{}: server URL | {}: downloads folder | {}: save | {}: cancel",
                format_keys(&sc.base_url),
                format_keys(&sc.downloads_dir),
                format_keys(&sc.save),
                format_keys(&sc.cancel),
            )
        }
    }
}

fn format_keys(keys: &[String]) -> String {
    keys.join("/")
}
