use std::time::Instant;

use log::{error, info, warn};
use tokio::sync::watch;
use crate::error::{ApiError, FormError};
use crate::models::{AddSemesterRequest, FlashMessage, Grade, PageSnapshot};
use crate::state::{NotificationKind, ViewState};
use crate::utils::backend::GpaApi;
use crate::utils::page::parse_page;

/// Drives the GPA form. Every handler takes `&mut self`, so only one operation
/// can be in flight; while it is, the published state is `busy`.
pub struct FormController<A: GpaApi> {
    api: A,
    state: ViewState,
    updates: watch::Sender<ViewState>,
}

impl<A: GpaApi> FormController<A> {
    pub fn new(api: A) -> Self {
        let state = ViewState::default();
        let (updates, _) = watch::channel(state.clone());
        FormController { api, state, updates }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Receives every state the form goes through, in-flight ones included.
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.updates.subscribe()
    }

    fn apply(&mut self, reduce: impl FnOnce(ViewState) -> ViewState) {
        let current = std::mem::take(&mut self.state);
        self.state = reduce(current);
        self.updates.send_replace(self.state.clone());
    }

    fn notify(&mut self, message: impl Into<String>, kind: NotificationKind) {
        let now = Instant::now();
        self.apply(|s| s.notified(message, kind, now));
    }

    fn reject(&mut self, message: impl Into<String>) -> FormError {
        let message = message.into();
        info!("Rejected: {}", message);
        self.notify(message.clone(), NotificationKind::Error);
        FormError::Validation(message)
    }

    // Clears the in-flight flag and reports the failure; the rest of the state is left alone.
    fn backend_failure(&mut self, err: ApiError, fallback: &str) -> FormError {
        let message = err.user_message(fallback);
        error!("{}: {}", fallback, err);
        let now = Instant::now();
        let banner = message.clone();
        self.apply(|s| s.with_busy(false).notified(banner, NotificationKind::Error, now));
        FormError::Backend { message, source: err }
    }

    /// Renders the server-provided initial state. No network call.
    pub fn initialize_page(&mut self, html: &str) {
        self.show_page(parse_page(html));
    }

    // A flashed message on the page takes the banner slot.
    fn show_page(&mut self, mut page: PageSnapshot) {
        let flash = page.flash.take();
        info!(
            "Page initialized: CGPA {:.2}, {} semester(s) in session",
            page.initial_cgpa,
            page.initial_summary.len()
        );
        self.apply(|_| ViewState::from_page(page));
        if let Some(flash) = flash {
            self.notify(flash.message.clone(), flash_kind(&flash));
        }
    }

    pub async fn load_page(&mut self) -> Result<(), FormError> {
        self.apply(|s| s.with_busy(true));
        match self.api.index_page().await {
            Ok(html) => {
                self.initialize_page(&html);
                Ok(())
            }
            Err(err) => Err(self.backend_failure(err, "Failed to load the page.")),
        }
    }

    pub async fn select_part(&mut self, part: &str) -> Result<(), FormError> {
        if !part.is_empty() && !self.state.part_options.is_empty() && !self.state.part_options.iter().any(|p| p == part) {
            return Err(self.reject(format!("Unknown part `{}`.", part)));
        }
        self.apply(|s| s.with_part(part));
        self.fetch_courses().await
    }

    pub async fn select_semester(&mut self, semester: &str) -> Result<(), FormError> {
        if !semester.is_empty()
            && !self.state.semester_options.is_empty()
            && !self.state.semester_options.iter().any(|s| s == semester)
        {
            return Err(self.reject(format!("Unknown semester `{}`.", semester)));
        }
        self.apply(|s| s.with_semester(semester));
        self.fetch_courses().await
    }

    /// Reloads the course table for the current selection. An incomplete selection just empties it.
    pub async fn fetch_courses(&mut self) -> Result<(), FormError> {
        self.apply(|s| s.without_courses());
        if !self.state.selection.is_complete() {
            return Ok(());
        }

        let selection = self.state.selection.clone();
        self.apply(|s| s.with_busy(true));
        match self.api.courses(&selection).await {
            Ok(courses) => {
                info!(
                    "Loaded {} course(s) for part {} {}",
                    courses.len(),
                    selection.part,
                    selection.semester
                );
                self.apply(|s| s.with_busy(false).with_courses(courses));
                Ok(())
            }
            Err(err) => Err(self.backend_failure(err, "Failed to load courses.")),
        }
    }

    pub fn choose_grade(&mut self, course_code: &str, grade: Option<Grade>) -> Result<(), FormError> {
        if !self.state.has_course(course_code) {
            return Err(self.reject(format!("Unknown course `{}`.", course_code)));
        }
        self.apply(|s| s.with_grade(course_code, grade));
        Ok(())
    }

    pub async fn add_semester(&mut self) -> Result<(), FormError> {
        if !self.state.selection.is_complete() {
            return Err(self.reject("Please select a Part and Semester."));
        }
        let grades = self.state.grade_entries();
        if grades.is_empty() {
            return Err(self.reject("Please enter at least one grade."));
        }

        let request = AddSemesterRequest {
            part: self.state.selection.part.clone(),
            semester: self.state.selection.semester.clone(),
            grades,
        };
        self.apply(|s| s.with_busy(true));
        match self.api.add_semester(&request).await {
            Ok(result) => {
                info!(
                    "Added part {} {}: semester GPA {:.2}, CGPA {:.2}",
                    request.part, request.semester, result.semester_gpa, result.cumulative_gpa
                );
                let now = Instant::now();
                self.apply(|s| {
                    s.with_busy(false)
                        .with_result(result)
                        .notified("Semester added successfully!", NotificationKind::Success, now)
                });
                Ok(())
            }
            Err(err) => Err(self.backend_failure(err, "Failed to add semester")),
        }
    }

    pub async fn reset_session(&mut self) -> Result<(), FormError> {
        self.reset(true).await
    }

    // The display is cleared whatever the backend says; only the banner differs.
    async fn reset(&mut self, announce: bool) -> Result<(), FormError> {
        self.apply(|s| s.with_busy(true));
        let outcome = self.api.reset_session().await;
        self.apply(|s| s.with_busy(false).cleared());
        match outcome {
            Ok(()) => {
                info!("Session reset");
                if announce {
                    self.notify("New calculation started.", NotificationKind::Success);
                }
                Ok(())
            }
            Err(err) => {
                warn!("Session reset failed: {}", err);
                let message = "Failed to reset session.".to_string();
                self.notify(message.clone(), NotificationKind::Error);
                Err(FormError::Backend { message, source: err })
            }
        }
    }

    /// Saves the session on the backend, then starts a new calculation.
    pub async fn save_calculation(&mut self) -> Result<(), FormError> {
        if self.state.summary.is_empty() {
            return Err(self.reject("No data to save. Please add at least one semester."));
        }

        self.apply(|s| s.with_busy(true));
        match self.api.save_calculation().await {
            Ok(receipt) => {
                let banner = match &receipt.record_id {
                    Some(record_id) => {
                        info!("Calculation saved as {}", record_id);
                        format!("Calculation saved with ID: {}", record_id)
                    }
                    None => {
                        info!("Calculation saved, results at {:?}", receipt.redirect_url);
                        "Calculation saved.".to_string()
                    }
                };
                self.notify(banner, NotificationKind::Success);
                self.reset(false).await
            }
            Err(err) => Err(self.backend_failure(err, "Failed to save calculation")),
        }
    }

    /// Restores a saved calculation into the session and redraws from the page it comes back with.
    /// The backend redirects to the form either way; its flashed message tells whether anything loaded.
    pub async fn load_calculation(&mut self, record_id: &str) -> Result<(), FormError> {
        let record_id = record_id.trim();
        if record_id.is_empty() {
            return Err(self.reject("Please give a record ID."));
        }

        self.apply(|s| s.with_busy(true));
        let html = match self.api.load_calculation(record_id).await {
            Ok(html) => html,
            Err(err) => return Err(self.backend_failure(err, "Failed to load calculation.")),
        };

        let page = parse_page(&html);
        let refusal = page.flash.as_ref().filter(|f| f.is_error()).map(|f| f.message.clone());
        if let Some(message) = refusal {
            warn!("Calculation {} not loaded: {}", record_id, message);
            let now = Instant::now();
            let banner = message.clone();
            self.apply(|s| s.with_busy(false).notified(banner, NotificationKind::Error, now));
            return Err(FormError::Refused(message));
        }

        let flashed = page.flash.is_some();
        self.show_page(page);
        if !flashed {
            self.notify("Calculation loaded.", NotificationKind::Success);
        }
        Ok(())
    }
}

fn flash_kind(flash: &FlashMessage) -> NotificationKind {
    if flash.is_error() {
        NotificationKind::Error
    } else {
        NotificationKind::Success
    }
}
