//! Test-result modal controller
//!
//! One modal per client. Opening, submitting and clearing are each split into
//! a "begin" step that yields a request value and a "finish" step that
//! applies the response. Every open or close bumps a session number carried by
//! those requests; a response for an older session no longer touches the form.

use emisi_domain::repository::EmisiBackend;
use emisi_domain::service::{TestForm, TestInputs};
use emisi_types::{
    ResultSummary, Result, SaveOutcome, TestField, TestResult, TestSubmission, ValidationErrors,
    Vehicle,
};
use tracing::{debug, warn};

use crate::confirm::Confirmation;
use crate::list::VehicleListController;
use crate::notify::Notifier;

/// Issued by [`TestResultModal::begin_open`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenTicket {
    pub plat: String,
    session: u64,
}

/// A validated submission ready to be sent
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitRequest {
    pub plat: String,
    pub submission: TestSubmission,
    session: u64,
}

/// A confirmed clear ready to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearRequest {
    pub plat: String,
    session: u64,
}

/// Follow-up the caller must perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum ModalEffect {
    None,
    /// Refresh tested plates, then the vehicle list
    RefreshLists,
}

/// Form state while the modal is open
#[derive(Debug, Clone, PartialEq)]
pub struct OpenForm {
    pub vehicle: Vehicle,
    pub form: TestForm,
    pub inputs: TestInputs,
    pub existing: Option<TestResult>,
    /// Fields flagged by the last failed validation
    pub errors: ValidationErrors,
    pub confirm: Option<Confirmation>,
    pub busy: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModalState {
    Closed,
    Loading { plat: String },
    Open(Box<OpenForm>),
}

#[derive(Debug, Clone)]
pub struct TestResultModal {
    state: ModalState,
    session: u64,
}

impl Default for TestResultModal {
    fn default() -> Self {
        Self {
            state: ModalState::Closed,
            session: 0,
        }
    }
}

impl TestResultModal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ModalState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, ModalState::Open(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, ModalState::Loading { .. })
    }

    pub fn open_form(&self) -> Option<&OpenForm> {
        match &self.state {
            ModalState::Open(form) => Some(form),
            _ => None,
        }
    }

    fn open_form_mut(&mut self) -> Option<&mut OpenForm> {
        match &mut self.state {
            ModalState::Open(form) => Some(form),
            _ => None,
        }
    }

    /// Plate of the open (or opening) modal
    pub fn plat(&self) -> Option<&str> {
        match &self.state {
            ModalState::Closed => None,
            ModalState::Loading { plat } => Some(plat),
            ModalState::Open(form) => Some(&form.vehicle.plat_nomor),
        }
    }

    pub fn form(&self) -> Option<TestForm> {
        self.open_form().map(|f| f.form)
    }

    /// Verdict of the stored result, if any
    pub fn summary(&self) -> Option<ResultSummary> {
        self.open_form()
            .and_then(|f| f.existing.as_ref())
            .map(|r| r.summary())
    }

    pub fn can_clear(&self) -> bool {
        self.open_form().is_some_and(|f| f.existing.is_some())
    }

    pub fn is_highlighted(&self, field: TestField) -> bool {
        self.open_form()
            .is_some_and(|f| f.errors.has_field(field.key()))
    }

    pub fn pending_confirmation(&self) -> Option<&Confirmation> {
        self.open_form().and_then(|f| f.confirm.as_ref())
    }

    pub fn close(&mut self) {
        self.session += 1;
        self.state = ModalState::Closed;
    }

    // ---- open ----

    pub fn begin_open(&mut self, plat: &str) -> OpenTicket {
        self.session += 1;
        self.state = ModalState::Loading {
            plat: plat.to_string(),
        };
        OpenTicket {
            plat: plat.to_string(),
            session: self.session,
        }
    }

    /// Apply the vehicle and existing-result lookups.
    ///
    /// Returns `true` when the modal is now open for `ticket.plat`.
    pub fn finish_open(
        &mut self,
        ticket: OpenTicket,
        vehicle: Result<Vehicle>,
        existing: Result<Option<TestResult>>,
        notifier: &mut Notifier,
    ) -> bool {
        if ticket.session != self.session {
            debug!("Discarding stale modal data for {}", ticket.plat);
            return false;
        }

        let vehicle = match vehicle {
            Ok(v) => v,
            Err(e) => {
                self.state = ModalState::Closed;
                notifier.error(format!(
                    "Gagal memuat data kendaraan {}: {}",
                    ticket.plat,
                    e.user_message()
                ));
                return false;
            }
        };

        let existing = existing.unwrap_or_else(|e| {
            warn!("Failed to fetch test result for {}: {}", ticket.plat, e);
            None
        });

        let form = TestForm::for_fuel(vehicle.fuel_type);
        let inputs = existing
            .as_ref()
            .map(|r| form.prefill(r))
            .unwrap_or_default();

        self.state = ModalState::Open(Box::new(OpenForm {
            vehicle,
            form,
            inputs,
            existing,
            errors: ValidationErrors::new(),
            confirm: None,
            busy: false,
        }));
        true
    }

    /// Fetch and open the modal for `plat`
    pub fn show<R>(&mut self, repo: &R, plat: &str, notifier: &mut Notifier) -> bool
    where
        R: EmisiBackend + ?Sized,
    {
        let ticket = self.begin_open(plat);
        let vehicle = repo.find_by_plate(plat);
        let existing = match vehicle {
            Ok(_) => repo.find_result(plat),
            Err(_) => Ok(None),
        };
        self.finish_open(ticket, vehicle, existing, notifier)
    }

    // ---- inputs ----

    /// Set a field's text; fields outside the active form shape are ignored
    pub fn set_input(&mut self, field: TestField, value: impl Into<String>) {
        if let Some(form) = self.open_form_mut() {
            if form.form.accepts(field) {
                form.inputs.set(field, value);
            }
        }
    }

    pub fn input(&self, field: TestField) -> &str {
        self.open_form().map(|f| f.inputs.get(field)).unwrap_or("")
    }

    // ---- submit ----

    /// Validate the inputs; on failure the offending fields are highlighted
    /// and nothing is sent.
    pub fn prepare_submit(&mut self, user_id: Option<i64>) -> std::result::Result<SubmitRequest, ValidationErrors> {
        let session = self.session;
        let Some(form) = self.open_form_mut() else {
            return Err(ValidationErrors::single("plat_nomor", "Tidak ada kendaraan yang dipilih"));
        };
        match form.form.readings(&form.inputs) {
            Ok(readings) => {
                form.errors = ValidationErrors::new();
                form.busy = true;
                Ok(SubmitRequest {
                    plat: form.vehicle.plat_nomor.clone(),
                    submission: TestSubmission { readings, user_id },
                    session,
                })
            }
            Err(errors) => {
                form.errors = errors.clone();
                Err(errors)
            }
        }
    }

    pub fn finish_submit(
        &mut self,
        request: SubmitRequest,
        result: Result<SaveOutcome>,
        notifier: &mut Notifier,
    ) -> ModalEffect {
        let current = request.session == self.session;
        match result {
            Ok(outcome) => {
                notifier.success(format!("Tersimpan – {}", outcome.summary()));
                if current {
                    self.close();
                }
                ModalEffect::RefreshLists
            }
            Err(e) => {
                notifier.error(format!("Gagal menyimpan data: {}", e.user_message()));
                if current {
                    if let Some(form) = self.open_form_mut() {
                        form.busy = false;
                    }
                }
                ModalEffect::None
            }
        }
    }

    /// Validate, save and refresh the list on success
    pub fn submit<R>(
        &mut self,
        repo: &R,
        list: &mut VehicleListController,
        user_id: Option<i64>,
        notifier: &mut Notifier,
    ) -> ModalEffect
    where
        R: EmisiBackend + ?Sized,
    {
        let request = match self.prepare_submit(user_id) {
            Ok(request) => request,
            Err(errors) => {
                notifier.error(validation_message(&errors));
                return ModalEffect::None;
            }
        };
        let result = repo.save_result(&request.plat, &request.submission);
        let effect = self.finish_submit(request, result, notifier);
        if effect == ModalEffect::RefreshLists {
            list.refresh_all(repo, notifier);
        }
        effect
    }

    // ---- clear ----

    /// Ask for confirmation; only possible when a result exists
    pub fn request_clear(&mut self) -> Option<Confirmation> {
        let form = self.open_form_mut()?;
        form.existing.as_ref()?;
        let confirmation = Confirmation::ClearTestResult {
            plat: form.vehicle.plat_nomor.clone(),
        };
        form.confirm = Some(confirmation.clone());
        Some(confirmation)
    }

    pub fn cancel_clear(&mut self) {
        if let Some(form) = self.open_form_mut() {
            form.confirm = None;
        }
    }

    pub fn confirm_clear(&mut self) -> Option<ClearRequest> {
        let session = self.session;
        let form = self.open_form_mut()?;
        let confirmation = form.confirm.take()?;
        form.busy = true;
        Some(ClearRequest {
            plat: confirmation.plat().to_string(),
            session,
        })
    }

    pub fn finish_clear(
        &mut self,
        request: ClearRequest,
        result: Result<()>,
        notifier: &mut Notifier,
    ) -> ModalEffect {
        let current = request.session == self.session;
        match result {
            Ok(()) => {
                notifier.success("Data uji dihapus");
                if current {
                    self.close();
                }
                ModalEffect::RefreshLists
            }
            Err(e) => {
                notifier.error(format!("Gagal menghapus data uji: {}", e.user_message()));
                if current {
                    if let Some(form) = self.open_form_mut() {
                        form.busy = false;
                    }
                }
                ModalEffect::None
            }
        }
    }

    /// Send a confirmed clear and refresh the list on success
    pub fn clear<R>(&mut self, repo: &R, list: &mut VehicleListController, notifier: &mut Notifier) -> ModalEffect
    where
        R: EmisiBackend + ?Sized,
    {
        let Some(request) = self.confirm_clear() else {
            return ModalEffect::None;
        };
        let result = repo.delete_result(&request.plat);
        let effect = self.finish_clear(request, result, notifier);
        if effect == ModalEffect::RefreshLists {
            list.refresh_all(repo, notifier);
        }
        effect
    }
}

/// "Field wajib diisi: co, hc" for missing fields, followed by any other problems
pub fn validation_message(errors: &ValidationErrors) -> String {
    let (missing, other): (Vec<_>, Vec<_>) = errors
        .errors()
        .iter()
        .partition(|e| e.message.ends_with("wajib diisi"));

    let mut parts = Vec::new();
    if !missing.is_empty() {
        let fields: Vec<&str> = missing.iter().map(|e| e.field.as_str()).collect();
        parts.push(format!("Field wajib diisi: {}", fields.join(", ")));
    }
    parts.extend(other.iter().map(|e| e.message.clone()));
    parts.join("; ")
}
