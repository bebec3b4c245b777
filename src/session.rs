use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::client::{ClientError, EmployeeApi};
use crate::controller::debounce::DEFAULT_DEBOUNCE;
use crate::controller::{
    Debouncer, PageError, PageOutcome, PageRequest, QueryController, SuggestOutcome, SuggestPlan,
    SuggestRequest, Ticket,
};
use crate::editor::{Editor, Submission, ValidationError};
use crate::model::{ResultPage, Suggestion, DEFAULT_PAGE_SIZE};
use crate::output;

#[derive(Clone, Debug)]
pub struct SessionSettings {
    pub page_size: u32,
    pub debounce: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

#[derive(Debug)]
enum SessionEvent {
    Page {
        ticket: Ticket,
        result: Result<ResultPage, ClientError>,
    },
    Suggestions {
        ticket: Ticket,
        result: Result<Vec<Suggestion>, ClientError>,
    },
}

/// What applying one response changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Update {
    PageReplaced,
    /// The total shrank below the current page; a request for `page` is on its way.
    PageClamped { page: u32 },
    /// The page request failed and the previous page stays.
    PageUnchanged,
    SuggestionsReplaced,
    SuggestionsUnchanged,
    /// A superseded response was dropped.
    Stale,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionOutcome {
    Done,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExportOutcome {
    Written { path: PathBuf, bytes: usize },
    Failed,
}

/// Event loop state for one user: the query controller, the record form
/// and the remote API.
///
/// Page and suggestion requests run as spawned tasks and report back
/// through a channel; [`Session::next_update`] applies their responses in
/// arrival order while the controller's tickets drop superseded ones.
/// Remote failures are logged and remembered as the last error, never
/// returned.
pub struct Session<A: EmployeeApi> {
    api: Arc<A>,
    controller: QueryController,
    editor: Editor,
    debouncer: Debouncer,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    pages_in_flight: usize,
}

impl<A: EmployeeApi> Session<A> {
    pub fn new(api: A, settings: SessionSettings) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            api: Arc::new(api),
            controller: QueryController::new(settings.page_size),
            editor: Editor::default(),
            debouncer: Debouncer::new(settings.debounce),
            events_tx,
            events_rx,
            pages_in_flight: 0,
        }
    }

    pub fn controller(&self) -> &QueryController {
        &self.controller
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    pub fn pages_in_flight(&self) -> usize {
        self.pages_in_flight
    }

    /// Re-requests the current page.
    pub fn refresh(&mut self) {
        let request = self.controller.fetch_page();
        self.spawn_page(request);
    }

    /// Sets every query field at once without a suggestion lookup.
    pub fn load(&mut self, search: &str, department: &str, page: u32) {
        self.debouncer.cancel();
        let request = self.controller.set_query(search, department, page);
        self.spawn_page(request);
    }

    pub fn set_search_text(&mut self, text: &str) {
        let change = self.controller.set_search_text(text);
        match change.suggest {
            SuggestPlan::Cleared => self.debouncer.cancel(),
            SuggestPlan::Lookup(request) => self.schedule_suggestions(request),
        }
        if let Some(request) = change.fetch {
            self.spawn_page(request);
        }
    }

    pub fn select_suggestion(&mut self, suggestion: &Suggestion) {
        self.debouncer.cancel();
        if let Some(request) = self.controller.select_suggestion(suggestion) {
            self.spawn_page(request);
        }
    }

    pub fn set_department_filter(&mut self, department: &str) {
        let request = self.controller.set_department_filter(department);
        self.spawn_page(request);
    }

    pub fn set_page(&mut self, index: u32) -> Result<(), PageError> {
        if let Some(request) = self.controller.set_page(index)? {
            self.spawn_page(request);
        }
        Ok(())
    }

    pub fn next_page(&mut self) -> Result<(), PageError> {
        if let Some(request) = self.controller.next_page()? {
            self.spawn_page(request);
        }
        Ok(())
    }

    pub fn previous_page(&mut self) -> Result<(), PageError> {
        if let Some(request) = self.controller.previous_page()? {
            self.spawn_page(request);
        }
        Ok(())
    }

    /// Looks suggestions up right away, leaving the search text and page
    /// alone.
    pub async fn lookup_suggestions(&mut self, text: &str) -> Update {
        self.debouncer.cancel();
        let request = match self.controller.plan_suggestions(text) {
            SuggestPlan::Cleared => return Update::SuggestionsReplaced,
            SuggestPlan::Lookup(request) => request,
        };
        let result = self.api.suggest(&request.text).await;
        self.apply(SessionEvent::Suggestions {
            ticket: request.ticket,
            result,
        })
    }

    /// Waits for the next response and applies it.
    pub async fn next_update(&mut self) -> Option<Update> {
        let event = self.events_rx.recv().await?;
        Some(self.apply(event))
    }

    /// Applies a response if one is already waiting.
    pub fn try_next_update(&mut self) -> Option<Update> {
        let event = self.events_rx.try_recv().ok()?;
        Some(self.apply(event))
    }

    /// Applies responses until no page request is outstanding.
    pub async fn settle_pages(&mut self) {
        while self.pages_in_flight > 0 {
            if self.next_update().await.is_none() {
                break;
            }
        }
    }

    /// Loads one record into the form for editing.
    pub async fn view(&mut self, id: &str) -> ActionOutcome {
        match self.api.get(id).await {
            Ok(mut employee) => {
                if employee.id.is_empty() {
                    employee.id = id.to_string();
                }
                self.editor.begin_edit(&employee);
                ActionOutcome::Done
            }
            Err(err) => self.report("load employee", err),
        }
    }

    pub fn cancel_edit(&mut self) {
        self.editor.reset();
    }

    /// Creates or updates depending on the form mode. On success the form
    /// is cleared and the page refetched; on failure the form is kept.
    pub async fn save(&mut self) -> Result<ActionOutcome, ValidationError> {
        let submission = self.editor.submission()?;
        let result = match &submission {
            Submission::Create(draft) => self.api.create(draft).await,
            Submission::Update { id, draft } => self.api.update(id, draft).await,
        };
        Ok(match result {
            Ok(()) => {
                match &submission {
                    Submission::Create(draft) => {
                        info!(email = %draft.email, "employee created")
                    }
                    Submission::Update { id, .. } => info!(%id, "employee updated"),
                }
                self.editor.reset();
                self.refresh();
                ActionOutcome::Done
            }
            Err(err) => self.report("save employee", err),
        })
    }

    pub async fn delete(&mut self, id: &str) -> ActionOutcome {
        match self.api.delete(id).await {
            Ok(()) => {
                info!(%id, "employee deleted");
                if self.editor.editing_id() == Some(id) {
                    self.editor.reset();
                }
                self.refresh();
                ActionOutcome::Done
            }
            Err(err) => self.report("delete employee", err),
        }
    }

    /// Downloads the CSV export into `path`. Only the local write can fail
    /// with an error; a remote failure is absorbed like any other.
    pub async fn export_csv(&mut self, path: &Path) -> std::io::Result<ExportOutcome> {
        let bytes = match self.api.export_csv().await {
            Ok(bytes) => bytes,
            Err(err) => {
                self.report("export employees", err);
                return Ok(ExportOutcome::Failed);
            }
        };
        output::write_export(path, &bytes).await?;
        info!(path = %path.display(), bytes = bytes.len(), "export written");
        Ok(ExportOutcome::Written {
            path: path.to_path_buf(),
            bytes: bytes.len(),
        })
    }

    fn report(&mut self, action: &str, err: ClientError) -> ActionOutcome {
        warn!(error = %err, "{action} failed");
        self.controller.record_error(format!("{action} failed: {err}"));
        ActionOutcome::Failed
    }

    fn spawn_page(&mut self, request: PageRequest) {
        let api = Arc::clone(&self.api);
        let tx = self.events_tx.clone();
        self.pages_in_flight += 1;
        tokio::spawn(async move {
            let result = api.fetch_page(&request.query).await;
            let _ = tx.send(SessionEvent::Page {
                ticket: request.ticket,
                result,
            });
        });
    }

    fn schedule_suggestions(&mut self, request: SuggestRequest) {
        let api = Arc::clone(&self.api);
        let tx = self.events_tx.clone();
        self.debouncer.schedule(async move {
            let result = api.suggest(&request.text).await;
            let _ = tx.send(SessionEvent::Suggestions {
                ticket: request.ticket,
                result,
            });
        });
    }

    fn apply(&mut self, event: SessionEvent) -> Update {
        match event {
            SessionEvent::Page { ticket, result } => {
                self.pages_in_flight = self.pages_in_flight.saturating_sub(1);
                if let Err(err) = &result {
                    warn!(error = %err, ticket = ticket.value(), "page fetch failed");
                }
                match self.controller.apply_page(ticket, result) {
                    PageOutcome::Replaced { follow_up: None } => Update::PageReplaced,
                    PageOutcome::Replaced {
                        follow_up: Some(request),
                    } => {
                        let page = request.query.page;
                        self.spawn_page(request);
                        Update::PageClamped { page }
                    }
                    PageOutcome::Failed => Update::PageUnchanged,
                    PageOutcome::Stale => Update::Stale,
                }
            }
            SessionEvent::Suggestions { ticket, result } => {
                if let Err(err) = &result {
                    warn!(error = %err, ticket = ticket.value(), "suggestion lookup failed");
                }
                match self.controller.apply_suggestions(ticket, result) {
                    SuggestOutcome::Replaced => Update::SuggestionsReplaced,
                    SuggestOutcome::Failed => Update::SuggestionsUnchanged,
                    SuggestOutcome::Stale => Update::Stale,
                }
            }
        }
    }
}
