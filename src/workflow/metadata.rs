//! Where the invoice number and date come from: the user or the filename.

use uuid::Uuid;

use super::{Request, Workflow, format_date};
use crate::{
    clock::Clock,
    counter::CounterStorage,
    error::WorkflowError,
    remote::{Inference, RemoteError},
    status::StatusKind,
};

/// Source of the identifier and date fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtractionMode {
    /// Inferred by the server from the filename; fields are locked.
    Automatic,
    /// Typed by the user.
    Manual,
}

/// Text fields of the form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Identifier,
    Date,
    TaxId,
}

impl<S: CounterStorage, C: Clock> Workflow<S, C> {
    /// Switch extraction mode; a no-op when already in `mode`.
    pub fn set_mode(&mut self, mode: ExtractionMode) -> Vec<Request> {
        if self.mode == mode {
            return vec![];
        }
        tracing::info!("extraction mode {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
        match mode {
            ExtractionMode::Automatic => self.resolve().into_iter().collect(),
            ExtractionMode::Manual => {
                self.form.date = format_date(self.clock.today());
                vec![Request::NextIdentifier]
            }
        }
    }

    pub fn toggle_mode(&mut self) -> Vec<Request> {
        let next = match self.mode {
            ExtractionMode::Automatic => ExtractionMode::Manual,
            ExtractionMode::Manual => ExtractionMode::Automatic,
        };
        self.set_mode(next)
    }

    /// Inference request for the active file, when automatic mode wants one.
    pub(super) fn resolve(&self) -> Option<Request> {
        if self.mode != ExtractionMode::Automatic {
            return None;
        }
        let file = self.file.as_ref()?;
        Some(Request::Infer {
            subject: file.id,
            filename: file.name.clone(),
        })
    }

    /// Identifier and date are locked while automatic; the tax id never is.
    pub fn field_editable(&self, field: Field) -> bool {
        match field {
            Field::Identifier | Field::Date => self.mode == ExtractionMode::Manual,
            Field::TaxId => true,
        }
    }

    /// Store a typed value. Returns false if the field is locked.
    pub fn edit_field(&mut self, field: Field, value: String) -> bool {
        if !self.field_editable(field) {
            tracing::warn!("{field:?} is locked in automatic mode");
            return false;
        }
        let slot = match field {
            Field::Identifier => &mut self.form.identifier,
            Field::Date => &mut self.form.date,
            Field::TaxId => &mut self.form.tax_id,
        };
        *slot = value;
        true
    }

    pub fn toggle_exclude_discount(&mut self) {
        self.form.exclude_discount = !self.form.exclude_discount;
    }

    pub(super) fn apply_inference(
        &mut self,
        subject: Uuid,
        result: Result<Inference, RemoteError>,
    ) -> Vec<Request> {
        if !self.is_current(subject) || self.mode != ExtractionMode::Automatic {
            tracing::info!("dropping inference for {subject}: no longer wanted");
            return vec![];
        }
        match result {
            Ok(found) => {
                self.form.identifier = found.identifier;
                self.form.date = format_date(found.date);
                let msg = format!(
                    "Extracted: Invoice #{}, Date: {}",
                    self.form.identifier, self.form.date
                );
                self.notify(StatusKind::Success, msg);
                vec![]
            }
            Err(e) => {
                self.fail(WorkflowError::inference(e));
                // One-way fallback: never retried automatically.
                self.set_mode(ExtractionMode::Manual)
            }
        }
    }
}
