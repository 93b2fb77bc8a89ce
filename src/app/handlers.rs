//! Key handlers.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::PathBuf;

use crate::{
    events::Screen,
    input::{InputBoxState, InputCallbackId},
    shortcuts,
    worker::WorkerCmd,
    workflow::{Field, IntakeSource},
};

use super::{App, dispatch, intake};

/// Handle one key press. Returns true when the app should exit.
pub async fn handle_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    // An open prompt takes every key.
    if app.input_box.is_some() {
        return handle_input_box_key(app, k).await;
    }

    // Otherwise dispatch by screen.

    match app.ui.screen {
        Screen::Main => handle_main_key(app, k).await,
        Screen::Settings => handle_settings_key(app, k).await,
    }
}

pub fn is_ctrl_c(k: &KeyEvent) -> bool {
    k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c')
}

async fn handle_main_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let sc = &app.shortcuts.main;

    if shortcuts::matches_shortcut(&k, &sc.quit) {
        return Ok(true);
    } else if shortcuts::matches_shortcut(&k, &sc.open_file) {
        // Replacing mid-process is allowed; late answers for the old file are dropped.
        app.input_box = Some(InputBoxState::new(
            "PDF path:",
            "",
            InputCallbackId::OpenFile,
        ));
    } else if shortcuts::matches_shortcut(&k, &sc.remove_file) {
        if app.workflow.file().is_some() {
            let reqs = app.workflow.remove_candidate();
            dispatch(app, reqs).await?;
        }
    } else if shortcuts::matches_shortcut(&k, &sc.process) {
        // Disabled while idle-without-file or busy.
        if app.workflow.can_process() {
            let reqs = app.workflow.process();
            dispatch(app, reqs).await?;
        }
    } else if shortcuts::matches_shortcut(&k, &sc.download) {
        if app.workflow.can_download() {
            let reqs = app.workflow.download();
            dispatch(app, reqs).await?;
        }
    } else if shortcuts::matches_shortcut(&k, &sc.toggle_auto) {
        let reqs = app.workflow.toggle_mode();
        dispatch(app, reqs).await?;
    } else if shortcuts::matches_shortcut(&k, &sc.toggle_discount) {
        app.workflow.toggle_exclude_discount();
    } else if shortcuts::matches_shortcut(&k, &sc.edit_identifier) {
        open_field_prompt(app, Field::Identifier);
    } else if shortcuts::matches_shortcut(&k, &sc.edit_date) {
        open_field_prompt(app, Field::Date);
    } else if shortcuts::matches_shortcut(&k, &sc.edit_tax_id) {
        open_field_prompt(app, Field::TaxId);
    } else if shortcuts::matches_shortcut(&k, &sc.settings) {
        reload_settings_buffers(app);
        app.ui.screen = Screen::Settings;
    }

    Ok(false)
}

/// Open the prompt for a form field unless it is locked.
fn open_field_prompt(app: &mut App, field: Field) {
    if !app.workflow.field_editable(field) {
        app.ui
            .push_log(format!("{field:?} is filled automatically; press the auto toggle to edit"));
        return;
    }
    let form = app.workflow.form();
    let (prompt, value, callback_id) = match field {
        Field::Identifier => (
            "Invoice number:",
            form.identifier.clone(),
            InputCallbackId::InvoiceNumber,
        ),
        Field::Date => (
            "Invoice date (YYYY-MM-DD):",
            form.date.clone(),
            InputCallbackId::InvoiceDate,
        ),
        Field::TaxId => (
            "Customer ABN (optional):",
            form.tax_id.clone(),
            InputCallbackId::CustomerTaxId,
        ),
    };
    app.input_box = Some(InputBoxState::new(prompt, value, callback_id));
}

async fn handle_settings_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let sc = &app.shortcuts.settings;

    if shortcuts::matches_shortcut(&k, &sc.cancel) {
        reload_settings_buffers(app);
        app.ui.screen = Screen::Main;
    } else if shortcuts::matches_shortcut(&k, &sc.save) {
        // Copy the edit buffers into the config and persist it.
        app.cfg.server.base_url = app.base_url.trim().to_string();
        app.cfg.downloads.dir = PathBuf::from(app.downloads_dir.trim());
        app.cfg.save(&app.cfg_path)?;
        tracing::info!("settings saved to {}", app.cfg_path.display());

        // The worker rebuilds its client from the new settings.
        app.worker_tx
            .send(WorkerCmd::SaveSettings(app.cfg.clone()))
            .await?;
        app.ui.screen = Screen::Main;
    } else if shortcuts::matches_shortcut(&k, &sc.base_url) {
        app.input_box = Some(InputBoxState::new(
            "Server URL:",
            app.base_url.clone(),
            InputCallbackId::SettingsBaseUrl,
        ));
    } else if shortcuts::matches_shortcut(&k, &sc.downloads_dir) {
        app.input_box = Some(InputBoxState::new(
            "Downloads folder:",
            app.downloads_dir.clone(),
            InputCallbackId::SettingsDownloadsDir,
        ));
    }

    Ok(false)
}

async fn handle_input_box_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let Some(input_state) = &mut app.input_box else {
        return Ok(false);
    };

    let sc = &app.shortcuts.input_box;

    if is_ctrl_c(&k) {
        return Ok(true);
    }

    if shortcuts::matches_shortcut(&k, &sc.confirm) {
        // Take the value before closing the prompt.
        let value = input_state.value.clone();
        let callback_id = input_state.callback_id.clone();
        app.input_box = None;
        apply_input_callback(app, callback_id, value).await?;
    } else if shortcuts::matches_shortcut(&k, &sc.cancel) {
        app.input_box = None;
    } else if shortcuts::matches_shortcut(&k, &sc.backspace) {
        input_state.backspace();
    } else if shortcuts::matches_shortcut(&k, &sc.delete) {
        input_state.delete();
    } else if shortcuts::matches_shortcut(&k, &sc.left) {
        input_state.move_left();
    } else if shortcuts::matches_shortcut(&k, &sc.right) {
        input_state.move_right();
    } else if shortcuts::matches_shortcut(&k, &sc.home) {
        input_state.move_home();
    } else if shortcuts::matches_shortcut(&k, &sc.end) {
        input_state.move_end();
    } else if shortcuts::matches_shortcut(&k, &sc.clear_line) {
        input_state.clear_line();
    } else if let KeyCode::Char(c) = k.code
        // Unbound control chords are not text.
        && !k.modifiers.contains(KeyModifiers::CONTROL)
    {
        input_state.insert_char(c);
    }

    Ok(false)
}

async fn apply_input_callback(
    app: &mut App,
    callback_id: InputCallbackId,
    value: String,
) -> Result<()> {
    match callback_id {
        InputCallbackId::OpenFile => intake(app, &value, IntakeSource::Chooser).await?,
        InputCallbackId::InvoiceNumber => {
            app.workflow.edit_field(Field::Identifier, value);
        }
        InputCallbackId::InvoiceDate => {
            app.workflow.edit_field(Field::Date, value);
        }
        InputCallbackId::CustomerTaxId => {
            app.workflow.edit_field(Field::TaxId, value);
        }
        InputCallbackId::SettingsBaseUrl => app.base_url = value,
        InputCallbackId::SettingsDownloadsDir => app.downloads_dir = value,
    }
    Ok(())
}

/// Reset the settings buffers from the saved config.
fn reload_settings_buffers(app: &mut App) {
    app.base_url = app.cfg.server.base_url.clone();
    app.downloads_dir = app.cfg.downloads.dir.display().to_string();
}
