//! TUI event loop, worker plumbing and app state.

mod handlers;
mod render;

use anyhow::Result;
use crossterm::event::{self, Event};
use std::{path::PathBuf, time::Duration};
use tokio::sync::mpsc;

use crate::{
    clock::LocalClock,
    config::Config,
    counter::JsonFileStorage,
    events::{Screen, UiState},
    input::InputBoxState,
    shortcuts::Shortcuts,
    ui::Tui,
    worker::{self, WorkerCmd, WorkerEvent},
    workflow::{
        Candidate, IntakeSource, Request, Workflow, intake::normalize_dropped_path,
    },
};

use handlers::{handle_key, is_ctrl_c};
use render::draw;

/// State shared by input handling and drawing.
pub struct App {
    /// Path of the persisted config file.
    pub cfg_path: PathBuf,
    /// Current config.
    pub cfg: Config,
    /// Screen and log state.
    pub ui: UiState,
    /// Invoice workflow state and controllers.
    pub workflow: Workflow<JsonFileStorage, LocalClock>,
    /// Commands to the worker.
    pub worker_tx: mpsc::Sender<WorkerCmd>,
    /// Events from the worker.
    pub worker_rx: mpsc::Receiver<WorkerEvent>,

    /// Server URL being edited on the settings screen.
    pub base_url: String,
    /// Downloads directory being edited on the settings screen.
    pub downloads_dir: String,

    /// Open prompt, if any.
    pub input_box: Option<InputBoxState>,

    /// Key bindings.
    pub shortcuts: Shortcuts,
}

impl App {
    pub fn new(
        cfg_path: PathBuf,
        cfg: Config,
        shortcuts: Shortcuts,
        worker_tx: mpsc::Sender<WorkerCmd>,
        worker_rx: mpsc::Receiver<WorkerEvent>,
    ) -> Self {
        let workflow = Workflow::new(
            JsonFileStorage::new(&cfg.storage.state_dir),
            LocalClock,
            &cfg.settings(),
        );
        Self {
            cfg_path,
            base_url: cfg.server.base_url.clone(),
            downloads_dir: cfg.downloads.dir.display().to_string(),
            cfg,
            ui: UiState {
                screen: Screen::Main,
                log: vec![],
                error: None,
            },
            workflow,
            worker_tx,
            worker_rx,
            input_box: None,
            shortcuts,
        }
    }
}

/// Run the main TUI loop until the user quits.
pub async fn run_app(terminal: &mut Tui) -> Result<()> {
    let cfg_path = PathBuf::from("config.toml");
    // Config is created with defaults on first run.
    let cfg = Config::load_or_default(&cfg_path)?;

    let shortcuts = Shortcuts::load_or_default("shortcut.toml")?;

    // Command and event channels between UI and worker.
    let (tx_cmd, rx_cmd) = mpsc::channel::<WorkerCmd>(64);
    let (tx_ev, rx_ev) = mpsc::channel::<WorkerEvent>(256);

    tokio::spawn(worker::run(rx_cmd, tx_ev, cfg.clone()));

    let mut app = App::new(cfg_path, cfg, shortcuts, tx_cmd, rx_ev);

    // Load today's count and ask for the first invoice number.
    let initial = app.workflow.start();
    dispatch(&app, initial).await?;

    loop {
        // Drop an expired status before drawing.
        app.workflow.tick();
        terminal.draw(|f| draw(f, &app))?;

        // Apply finished requests before reading input.
        while let Ok(ev) = app.worker_rx.try_recv() {
            handle_worker_event(&mut app, ev).await?;
        }

        // Short poll keeps worker results flowing.
        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(k) => {
                    if is_ctrl_c(&k) || handle_key(&mut app, k).await? {
                        break;
                    }
                }
                Event::Paste(text) => handle_paste(&mut app, &text).await?,
                _ => {}
            }
        }
    }
    Ok(())
}

/// Hand workflow requests to the worker.
pub async fn dispatch(app: &App, requests: Vec<Request>) -> Result<()> {
    for req in requests {
        app.worker_tx.send(WorkerCmd::Run(req)).await?;
    }
    Ok(())
}

/// Reflect a worker event in the app state.
async fn handle_worker_event(app: &mut App, ev: WorkerEvent) -> Result<()> {
    match ev {
        WorkerEvent::Completed(done) => {
            let follow_up = app.workflow.apply(done);
            dispatch(app, follow_up).await?;
        }
        WorkerEvent::Log(s) => {
            app.ui.error = None;
            app.ui.push_log(s);
        }
        WorkerEvent::Error(s) => {
            app.ui.push_log(format!("error: {s}"));
            app.ui.error = Some(s);
        }
    }
    Ok(())
}

/// A paste is a dropped file unless a prompt is open.
async fn handle_paste(app: &mut App, text: &str) -> Result<()> {
    if let Some(input_state) = &mut app.input_box {
        input_state.insert_str(text);
        return Ok(());
    }
    if app.ui.screen == Screen::Main {
        intake(app, text, IntakeSource::Drop).await?;
    }
    Ok(())
}

/// Read the file at `raw` and offer it to the workflow.
pub async fn intake(app: &mut App, raw: &str, source: IntakeSource) -> Result<()> {
    if raw.trim().is_empty() {
        return Ok(());
    }
    let path = normalize_dropped_path(raw);
    match Candidate::from_path(&path, source).await {
        Ok(candidate) => {
            let requests = app.workflow.submit_candidate(candidate);
            dispatch(app, requests).await?;
        }
        Err(e) => app.workflow.reject_unreadable(&e),
    }
    Ok(())
}
