//! Query state for the employee list.
//!
//! [`QueryController`] owns the search text, department filter and page
//! index. It never performs I/O itself: every setter that changes a
//! query-relevant field returns the single request the caller has to
//! issue, and responses are handed back together with the [`Ticket`] they
//! were issued under. Responses whose ticket is no longer the latest for
//! their class are dropped, so a slow reply can never overwrite a newer
//! one.

pub mod debounce;
pub mod sequence;

use thiserror::Error;
use tracing::debug;

use crate::client::ClientError;
use crate::model::{self, Employee, PageQuery, ResultPage, Suggestion, DEFAULT_PAGE_SIZE};

pub use debounce::Debouncer;
pub use sequence::{RequestSeq, Ticket};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub ticket: Ticket,
    pub query: PageQuery,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuggestRequest {
    pub ticket: Ticket,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SuggestPlan {
    /// The text was empty; the list has already been cleared.
    Cleared,
    /// Look the text up once the debounce delay has passed.
    Lookup(SuggestRequest),
}

/// Requests produced by a search-text change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchChange {
    pub fetch: Option<PageRequest>,
    pub suggest: SuggestPlan,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("page index must be at least 1")]
    BelowFirst,

    #[error("page {requested} is past the last page ({total} results, {page_size} per page)")]
    PastEnd {
        requested: u32,
        total: u64,
        page_size: u32,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageOutcome {
    /// The page was replaced. `follow_up` is set when the new total no
    /// longer reaches the current page and the page index was pulled back.
    Replaced { follow_up: Option<PageRequest> },
    /// The request failed; the previous page is still shown.
    Failed,
    /// A newer request was issued since; the response was ignored.
    Stale,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SuggestOutcome {
    Replaced,
    Failed,
    Stale,
}

#[derive(Debug)]
pub struct QueryController {
    search: String,
    department: String,
    page: u32,
    page_size: u32,
    employees: Vec<Employee>,
    total: Option<u64>,
    suggestions: Vec<Suggestion>,
    page_seq: RequestSeq,
    suggest_seq: RequestSeq,
    last_error: Option<String>,
}

impl QueryController {
    pub fn new(page_size: u32) -> Self {
        Self {
            search: String::new(),
            department: String::new(),
            page: 1,
            page_size: page_size.max(1),
            employees: Vec::new(),
            total: None,
            suggestions: Vec::new(),
            page_seq: RequestSeq::default(),
            suggest_seq: RequestSeq::default(),
            last_error: None,
        }
    }

    pub fn search_text(&self) -> &str {
        &self.search
    }

    pub fn department_filter(&self) -> &str {
        &self.department
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    /// Total matches reported by the last applied page, 0 before any.
    pub fn total(&self) -> u64 {
        self.total.unwrap_or(0)
    }

    pub fn total_known(&self) -> bool {
        self.total.is_some()
    }

    pub fn page_count(&self) -> u64 {
        model::page_count(self.total(), self.page_size)
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Remembers a failure from an action outside the query path.
    pub fn record_error(&mut self, message: String) {
        self.last_error = Some(message);
    }

    pub fn can_go_previous(&self) -> bool {
        self.page > 1
    }

    pub fn can_go_next(&self) -> bool {
        match self.total {
            Some(total) => u64::from(self.page) * u64::from(self.page_size) < total,
            None => true,
        }
    }

    pub fn query(&self) -> PageQuery {
        PageQuery {
            search: self.search.clone(),
            department: self.department.clone(),
            page: self.page,
            size: self.page_size,
        }
    }

    /// Issues a request for the current query under a fresh ticket.
    pub fn fetch_page(&mut self) -> PageRequest {
        PageRequest {
            ticket: self.page_seq.issue(),
            query: self.query(),
        }
    }

    /// Replaces the search text. A changed text resets to page 1 and yields
    /// a page request. Whitespace-only text counts as empty: suggestions are
    /// cleared and no lookup is planned.
    pub fn set_search_text(&mut self, text: &str) -> SearchChange {
        let suggest = self.plan_suggestions(text);
        SearchChange {
            fetch: self.replace_search(text),
            suggest,
        }
    }

    /// Plans a suggestion lookup for `text` without touching the query.
    /// Earlier suggestion tickets become stale either way.
    pub fn plan_suggestions(&mut self, text: &str) -> SuggestPlan {
        if text.trim().is_empty() {
            self.suggest_seq.invalidate();
            self.suggestions.clear();
            SuggestPlan::Cleared
        } else {
            SuggestPlan::Lookup(SuggestRequest {
                ticket: self.suggest_seq.issue(),
                text: text.to_string(),
            })
        }
    }

    pub fn select_suggestion(&mut self, suggestion: &Suggestion) -> Option<PageRequest> {
        self.suggest_seq.invalidate();
        self.suggestions.clear();
        self.replace_search(&suggestion.text)
    }

    /// Sets the filter and resets to the first page. Always yields exactly
    /// one request covering both changes.
    pub fn set_department_filter(&mut self, department: &str) -> PageRequest {
        self.department = department.trim().to_string();
        self.page = 1;
        self.fetch_page()
    }

    /// Replaces search, filter and page together as one request. The page
    /// is not bounds-checked; an out-of-range page is pulled back once the
    /// total arrives.
    pub fn set_query(&mut self, search: &str, department: &str, page: u32) -> PageRequest {
        self.suggest_seq.invalidate();
        self.suggestions.clear();
        self.search = search.to_string();
        self.department = department.trim().to_string();
        self.page = page.max(1);
        self.fetch_page()
    }

    pub fn set_page(&mut self, index: u32) -> Result<Option<PageRequest>, PageError> {
        if index < 1 {
            return Err(PageError::BelowFirst);
        }
        if index > self.page {
            if let Some(total) = self.total {
                let offset = u64::from(index - 1) * u64::from(self.page_size);
                if offset >= total {
                    return Err(PageError::PastEnd {
                        requested: index,
                        total,
                        page_size: self.page_size,
                    });
                }
            }
        }
        if index == self.page {
            return Ok(None);
        }
        self.page = index;
        Ok(Some(self.fetch_page()))
    }

    pub fn next_page(&mut self) -> Result<Option<PageRequest>, PageError> {
        self.set_page(self.page.saturating_add(1))
    }

    pub fn previous_page(&mut self) -> Result<Option<PageRequest>, PageError> {
        self.set_page(self.page.saturating_sub(1))
    }

    pub fn apply_page(
        &mut self,
        ticket: Ticket,
        result: Result<ResultPage, ClientError>,
    ) -> PageOutcome {
        if !self.page_seq.is_current(ticket) {
            debug!(
                ticket = ticket.value(),
                latest = self.page_seq.last_issued(),
                "dropping stale page response"
            );
            return PageOutcome::Stale;
        }
        let page = match result {
            Ok(page) => page,
            Err(err) => {
                self.last_error = Some(err.to_string());
                return PageOutcome::Failed;
            }
        };

        self.employees = page.employees;
        self.total = Some(page.total);
        self.last_error = None;

        let last_page = model::page_count(page.total, self.page_size).max(1);
        let follow_up = if u64::from(self.page) > last_page {
            self.page = u32::try_from(last_page).unwrap_or(u32::MAX);
            Some(self.fetch_page())
        } else {
            None
        };
        PageOutcome::Replaced { follow_up }
    }

    pub fn apply_suggestions(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<Suggestion>, ClientError>,
    ) -> SuggestOutcome {
        if !self.suggest_seq.is_current(ticket) {
            debug!(
                ticket = ticket.value(),
                latest = self.suggest_seq.last_issued(),
                "dropping stale suggestions"
            );
            return SuggestOutcome::Stale;
        }
        match result {
            Ok(items) => {
                self.suggestions = items;
                SuggestOutcome::Replaced
            }
            Err(err) => {
                self.last_error = Some(err.to_string());
                SuggestOutcome::Failed
            }
        }
    }

    fn replace_search(&mut self, text: &str) -> Option<PageRequest> {
        if self.search == text {
            return None;
        }
        self.search = text.to_string();
        self.page = 1;
        Some(self.fetch_page())
    }
}

impl Default for QueryController {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}
