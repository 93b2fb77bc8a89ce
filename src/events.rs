//! Screen selection and UI-only state.

/// Screen currently shown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Screen {
    /// Invoice form, preview and actions.
    Main,
    /// Server and download settings.
    Settings,
}

/// UI state that is not part of the invoice workflow.
#[derive(Clone, Debug)]
pub struct UiState {
    /// Current screen.
    pub screen: Screen,
    /// Recent worker/UI log lines for the info panel.
    pub log: Vec<String>,
    /// Worker-level error (not a workflow status).
    pub error: Option<String>,
}

impl UiState {
    /// Maximum number of log lines kept.
    const LOG_CAP: usize = 50;

    /// Append a log line, dropping the oldest beyond the cap.
    pub fn push_log(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
        if self.log.len() > Self::LOG_CAP {
            let excess = self.log.len() - Self::LOG_CAP;
            self.log.drain(..excess);
        }
    }
}
