use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::client::{ClientError, EmployeeApi};
use crate::controller::{PageError, PageOutcome, QueryController, SuggestOutcome, SuggestPlan};
use crate::editor::{Editor, Submission, ValidationError};
use crate::model::{Employee, EmployeeDraft, PageQuery, ResultPage, Suggestion};
use crate::session::{ActionOutcome, ExportOutcome, Session, SessionSettings, Update};
use crate::theme::{self, PrefStore, DARK_MODE_KEY};

fn employee(id: &str, first: &str) -> Employee {
    Employee {
        id: id.to_string(),
        first_name: first.to_string(),
        last_name: "Smith".to_string(),
        email: format!("{}@example.com", first.to_lowercase()),
        department: "Engineering".to_string(),
        position: "Developer".to_string(),
        salary: 1000.0,
        skills: None,
        contact_number: None,
    }
}

fn page_of(employees: Vec<Employee>, total: u64) -> ResultPage {
    ResultPage { employees, total }
}

fn suggestion(text: &str) -> Suggestion {
    Suggestion {
        text: text.to_string(),
    }
}

fn fail(status: u16) -> ClientError {
    ClientError::Status {
        url: "http://fake/employees".to_string(),
        status,
    }
}

fn filled_draft() -> EmployeeDraft {
    EmployeeDraft {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        department: "Engineering".to_string(),
        position: "Analyst".to_string(),
        salary: Some(90000.0),
        skills: Some(vec!["math".to_string()]),
        contact_number: None,
    }
}

fn temp_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("employee-desk-tests-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    let _ = std::fs::remove_file(&path);
    path
}

#[derive(Default)]
struct FakeState {
    pages: VecDeque<Result<ResultPage, u16>>,
    default_page: ResultPage,
    page_delays: HashMap<String, Duration>,
    page_queries: Vec<PageQuery>,
    suggestions: Vec<Suggestion>,
    suggest_queries: Vec<String>,
    records: HashMap<String, Employee>,
    created: Vec<EmployeeDraft>,
    updated: Vec<(String, EmployeeDraft)>,
    deleted: Vec<String>,
    fail_writes: bool,
    export: Vec<u8>,
}

#[derive(Clone, Default)]
struct FakeApi {
    state: Arc<Mutex<FakeState>>,
}

impl FakeApi {
    fn with<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    fn push_page(&self, page: Result<ResultPage, u16>) {
        self.with(|s| s.pages.push_back(page));
    }

    fn page_queries(&self) -> Vec<PageQuery> {
        self.with(|s| s.page_queries.clone())
    }

    fn suggest_queries(&self) -> Vec<String> {
        self.with(|s| s.suggest_queries.clone())
    }
}

impl EmployeeApi for FakeApi {
    async fn fetch_page(&self, query: &PageQuery) -> Result<ResultPage, ClientError> {
        let (delay, result) = self.with(|s| {
            s.page_queries.push(query.clone());
            let delay = s.page_delays.get(&query.search).copied();
            let result = match s.pages.pop_front() {
                Some(result) => result,
                None => Ok(s.default_page.clone()),
            };
            (delay, result)
        });
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result.map_err(fail)
    }

    async fn suggest(&self, text: &str) -> Result<Vec<Suggestion>, ClientError> {
        Ok(self.with(|s| {
            s.suggest_queries.push(text.to_string());
            s.suggestions.clone()
        }))
    }

    async fn get(&self, id: &str) -> Result<Employee, ClientError> {
        self.with(|s| s.records.get(id).cloned()).ok_or_else(|| fail(404))
    }

    async fn create(&self, draft: &EmployeeDraft) -> Result<(), ClientError> {
        self.with(|s| {
            if s.fail_writes {
                return Err(fail(500));
            }
            s.created.push(draft.clone());
            Ok(())
        })
    }

    async fn update(&self, id: &str, draft: &EmployeeDraft) -> Result<(), ClientError> {
        self.with(|s| {
            if s.fail_writes {
                return Err(fail(500));
            }
            s.updated.push((id.to_string(), draft.clone()));
            Ok(())
        })
    }

    async fn delete(&self, id: &str) -> Result<(), ClientError> {
        self.with(|s| {
            if s.fail_writes {
                return Err(fail(500));
            }
            s.deleted.push(id.to_string());
            Ok(())
        })
    }

    async fn export_csv(&self) -> Result<Vec<u8>, ClientError> {
        Ok(self.with(|s| s.export.clone()))
    }
}

/// Controller on `page` with a known `total`.
fn controller_at(page: u32, total: u64) -> QueryController {
    let mut controller = QueryController::new(5);
    let request = controller.fetch_page();
    controller.apply_page(request.ticket, Ok(page_of(Vec::new(), total)));
    while controller.page() < page {
        controller.next_page().unwrap();
    }
    let request = controller.fetch_page();
    controller.apply_page(request.ticket, Ok(page_of(Vec::new(), total)));
    controller
}

#[test]
fn page_count_rounds_up() {
    assert_eq!(crate::model::page_count(12, 5), 3);
    assert_eq!(crate::model::page_count(10, 5), 2);
    assert_eq!(crate::model::page_count(0, 5), 0);
    assert_eq!(controller_at(1, 12).page_count(), 3);
}

#[test]
fn forward_moves_stop_at_the_last_page() {
    let mut controller = controller_at(2, 12);
    assert!(controller.can_go_next());
    let request = controller.set_page(3).unwrap().unwrap();
    assert_eq!(request.query.page, 3);
    assert!(!controller.can_go_next());
    assert_eq!(
        controller.set_page(4),
        Err(PageError::PastEnd {
            requested: 4,
            total: 12,
            page_size: 5
        })
    );
    assert_eq!(controller.page(), 3);
}

#[test]
fn page_zero_is_rejected_and_same_page_is_a_no_op() {
    let mut controller = controller_at(1, 12);
    assert_eq!(controller.set_page(0), Err(PageError::BelowFirst));
    assert_eq!(controller.previous_page(), Err(PageError::BelowFirst));
    assert_eq!(controller.set_page(1), Ok(None));
}

#[test]
fn no_page_sequence_requests_out_of_bounds() {
    let mut controller = controller_at(1, 23);
    let mut seed: u32 = 7;
    for _ in 0..500 {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let target = (seed >> 16) % 9;
        if let Ok(Some(request)) = controller.set_page(target) {
            assert!(request.query.page >= 1);
            let offset = u64::from(request.query.page - 1) * 5;
            assert!(offset < 23, "requested page {}", request.query.page);
        }
        assert!(controller.page() >= 1);
    }
}

#[test]
fn department_filter_resets_page_with_one_request() {
    let mut controller = controller_at(3, 12);
    let before = controller.fetch_page().ticket.value();
    let request = controller.set_department_filter("HR");
    assert_eq!(request.ticket.value(), before + 1);
    assert_eq!(request.query.page, 1);
    assert_eq!(request.query.department, "HR");
    assert_eq!(controller.page(), 1);
}

#[test]
fn search_change_resets_page_and_plans_lookup() {
    let mut controller = controller_at(2, 12);
    let change = controller.set_search_text("Al");
    let fetch = change.fetch.expect("search change fetches");
    assert_eq!(fetch.query.search, "Al");
    assert_eq!(fetch.query.page, 1);
    assert!(matches!(change.suggest, SuggestPlan::Lookup(ref r) if r.text == "Al"));

    let again = controller.set_search_text("Al");
    assert!(again.fetch.is_none());
}

#[test]
fn empty_search_clears_suggestions_and_drops_in_flight_lookup() {
    let mut controller = QueryController::new(5);
    let SuggestPlan::Lookup(lookup) = controller.set_search_text("Al").suggest else {
        panic!("expected lookup");
    };
    let first = controller.set_search_text("Ali");
    let SuggestPlan::Lookup(latest) = first.suggest else {
        panic!("expected lookup");
    };
    controller.apply_suggestions(latest.ticket, Ok(vec![suggestion("Alice Smith")]));
    assert_eq!(controller.suggestions().len(), 1);

    let cleared = controller.set_search_text("");
    assert_eq!(cleared.suggest, SuggestPlan::Cleared);
    assert!(controller.suggestions().is_empty());
    assert_eq!(
        controller.apply_suggestions(lookup.ticket, Ok(vec![suggestion("Al Jones")])),
        SuggestOutcome::Stale
    );
    assert!(controller.suggestions().is_empty());
}

#[test]
fn late_suggestions_for_older_text_are_discarded() {
    let mut controller = QueryController::new(5);
    let SuggestPlan::Lookup(al) = controller.set_search_text("Al").suggest else {
        panic!("expected lookup");
    };
    let SuggestPlan::Lookup(ali) = controller.set_search_text("Ali").suggest else {
        panic!("expected lookup");
    };

    assert_eq!(
        controller.apply_suggestions(ali.ticket, Ok(vec![suggestion("Alice Smith")])),
        SuggestOutcome::Replaced
    );
    assert_eq!(
        controller.apply_suggestions(al.ticket, Ok(vec![suggestion("Al Jones")])),
        SuggestOutcome::Stale
    );
    assert_eq!(controller.suggestions(), &[suggestion("Alice Smith")]);
}

#[test]
fn selecting_a_suggestion_sets_text_without_lookup() {
    let mut controller = QueryController::new(5);
    let SuggestPlan::Lookup(lookup) = controller.set_search_text("Ali").suggest else {
        panic!("expected lookup");
    };
    controller.apply_suggestions(lookup.ticket, Ok(vec![suggestion("Alice Smith")]));

    let fetch = controller
        .select_suggestion(&suggestion("Alice Smith"))
        .expect("text changed");
    assert_eq!(fetch.query.search, "Alice Smith");
    assert_eq!(controller.search_text(), "Alice Smith");
    assert!(controller.suggestions().is_empty());
    assert_eq!(
        controller.apply_suggestions(lookup.ticket, Ok(vec![suggestion("Alison")])),
        SuggestOutcome::Stale
    );
}

#[test]
fn stale_page_response_never_overwrites_newer_one() {
    let mut controller = QueryController::new(5);
    let older = controller.fetch_page();
    let newer = controller.set_department_filter("Sales");

    let outcome = controller.apply_page(newer.ticket, Ok(page_of(vec![employee("2", "Bea")], 1)));
    assert_eq!(outcome, PageOutcome::Replaced { follow_up: None });
    let outcome = controller.apply_page(older.ticket, Ok(page_of(vec![employee("1", "Al")], 9)));
    assert_eq!(outcome, PageOutcome::Stale);
    assert_eq!(controller.employees()[0].id, "2");
    assert_eq!(controller.total(), 1);
}

#[test]
fn failed_fetch_keeps_previous_page() {
    let mut controller = QueryController::new(5);
    let request = controller.fetch_page();
    let e1 = employee("1", "Al");
    let e2 = employee("2", "Bea");
    controller.apply_page(request.ticket, Ok(page_of(vec![e1.clone(), e2.clone()], 2)));

    let request = controller.fetch_page();
    assert_eq!(
        controller.apply_page(request.ticket, Err(fail(503))),
        PageOutcome::Failed
    );
    assert_eq!(controller.employees(), &[e1, e2]);
    assert_eq!(controller.total(), 2);
    assert!(controller.last_error().unwrap().contains("503"));
}

#[test]
fn shrinking_total_pulls_page_back_with_one_follow_up() {
    let mut controller = controller_at(3, 12);
    let request = controller.fetch_page();
    let outcome = controller.apply_page(request.ticket, Ok(page_of(Vec::new(), 6)));
    let PageOutcome::Replaced {
        follow_up: Some(follow_up),
    } = outcome
    else {
        panic!("expected a follow-up request");
    };
    assert_eq!(follow_up.query.page, 2);
    assert_eq!(controller.page(), 2);

    let outcome = controller.apply_page(follow_up.ticket, Ok(page_of(Vec::new(), 0)));
    let PageOutcome::Replaced {
        follow_up: Some(follow_up),
    } = outcome
    else {
        panic!("expected a follow-up request");
    };
    assert_eq!(follow_up.query.page, 1);
    assert_eq!(
        controller.apply_page(follow_up.ticket, Ok(page_of(Vec::new(), 0))),
        PageOutcome::Replaced { follow_up: None }
    );
}

#[test]
fn editor_modes_are_exclusive() {
    let mut editor = Editor::default();
    assert!(!editor.is_editing());
    editor.begin_edit(&employee("42", "Al"));
    assert_eq!(editor.editing_id(), Some("42"));
    editor.draft_mut().position = "Lead".to_string();
    let Submission::Update { id, draft } = editor.submission().unwrap() else {
        panic!("expected update");
    };
    assert_eq!(id, "42");
    assert_eq!(draft.position, "Lead");

    editor.reset();
    assert_eq!(editor, Editor::Creating(EmployeeDraft::default()));
}

#[test]
fn editor_enforces_required_fields_and_email_shape() {
    let mut editor = Editor::default();
    assert_eq!(
        editor.validate(),
        Err(ValidationError::Missing {
            field: "first name"
        })
    );
    *editor.draft_mut() = filled_draft();
    assert!(editor.validate().is_ok());

    editor.draft_mut().email = "not-an-email".to_string();
    assert!(matches!(
        editor.validate(),
        Err(ValidationError::InvalidEmail { .. })
    ));

    editor.draft_mut().email = "ada@example.com".to_string();
    editor.draft_mut().salary = None;
    assert_eq!(
        editor.validate(),
        Err(ValidationError::Missing { field: "salary" })
    );
}

#[test]
fn employee_decodes_service_shapes() {
    let json = r#"{"_id":"abc","first_name":"Al","last_name":"Jones","email":"al@x.io",
        "department":"HR","position":"Clerk","salary":"4200.50"}"#;
    let e: Employee = serde_json::from_str(json).unwrap();
    assert_eq!(e.id, "abc");
    assert_eq!(e.salary, 4200.5);
    assert_eq!(e.skills, None);

    let json = r#"{"employee_id":"xyz","first_name":"Bea","salary":100,"skills":["rust"]}"#;
    let e: Employee = serde_json::from_str(json).unwrap();
    assert_eq!(e.id, "xyz");
    assert_eq!(e.salary, 100.0);
    assert_eq!(e.skills, Some(vec!["rust".to_string()]));

    let page: ResultPage = serde_json::from_str("{}").unwrap();
    assert!(page.employees.is_empty());
    assert_eq!(page.total, 0);
}

#[test]
fn search_hits_carry_both_id_keys() {
    let json = r#"{"employees":[{"employee_id":"u1","first_name":"Al","last_name":"Jones",
        "email":"al@x.io","department":"HR","position":"Clerk","salary":4200,"_id":"doc-1"},
        {"employee_id":"u2","first_name":"Bea","last_name":"Ray","email":"bea@x.io",
        "department":"Sales","position":"Rep","salary":"10","_id":""}],"total":2}"#;
    let page: ResultPage = serde_json::from_str(json).unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.employees[0].id, "doc-1");
    assert_eq!(page.employees[0].first_name, "Al");
    assert_eq!(page.employees[1].id, "u2");
}

#[test]
fn null_fields_decode_as_empty() {
    let json = r#"{"_id":"n1","first_name":"Cy","last_name":null,"email":null,
        "department":null,"position":null,"salary":null,"skills":null,"contact_number":null}"#;
    let e: Employee = serde_json::from_str(json).unwrap();
    assert_eq!(e.id, "n1");
    assert_eq!(e.last_name, "");
    assert_eq!(e.position, "");
    assert_eq!(e.salary, 0.0);
    assert_eq!(e.skills, None);
    assert_eq!(e.contact_number, None);
}

#[test]
fn employee_serializes_with_document_id() {
    let body = serde_json::to_value(employee("7", "Al")).unwrap();
    assert_eq!(body["_id"], serde_json::json!("7"));
    assert!(body.get("employee_id").is_none());
    let back: Employee = serde_json::from_value(body).unwrap();
    assert_eq!(back, employee("7", "Al"));
}

#[test]
fn draft_body_never_carries_an_id() {
    let body = serde_json::to_value(employee("7", "Al").to_draft()).unwrap();
    assert!(body.get("_id").is_none());
    assert!(body.get("skills").is_none());
    assert_eq!(body["salary"], serde_json::json!(1000.0));
}

#[test]
fn page_query_params_carry_every_field() {
    let query = PageQuery {
        search: "al".to_string(),
        department: "HR".to_string(),
        page: 2,
        size: 5,
    };
    let params = query.to_params();
    assert_eq!(params[0], ("search", "al".to_string()));
    assert_eq!(params[1], ("department", "HR".to_string()));
    assert_eq!(params[2], ("page", "2".to_string()));
    assert_eq!(params[3], ("size", "5".to_string()));
}

#[test]
fn base_url_must_be_http() {
    assert!(crate::client::parse_base_url("http://localhost:5000").is_ok());
    assert!(crate::client::parse_base_url("ftp://localhost").is_err());
    assert!(crate::client::parse_base_url("localhost:5000").is_err());
}

#[test]
fn list_parsing_drops_blanks_and_duplicates() {
    assert_eq!(
        crate::utils::parse_list_csv(" Rust, go ,,rust, SQL"),
        vec!["Rust", "go", "SQL"]
    );
    assert_eq!(crate::utils::parse_skills_csv(" , "), None);
    assert_eq!(crate::utils::parse_salary("$1,250.5").unwrap(), 1250.5);
    assert!(crate::utils::parse_salary("abc").is_err());
    assert!(crate::utils::parse_page_index("0").is_err());
}

#[test]
fn config_yaml_fills_known_keys() {
    let cfg = crate::config::parse_config(
        "base_url: http://svc:8080\npage_size: 10\ndepartments: [Ops, Legal]\n",
    )
    .unwrap();
    assert_eq!(cfg.base_url.as_deref(), Some("http://svc:8080"));
    assert_eq!(cfg.page_size, Some(10));
    assert_eq!(
        cfg.departments,
        Some(vec!["Ops".to_string(), "Legal".to_string()])
    );

    let defaults = crate::config::parse_config(&crate::config::default_config_yaml()).unwrap();
    assert_eq!(defaults.page_size, Some(5));
    assert_eq!(defaults.debounce_ms, Some(300));
}

#[test]
fn pref_store_round_trips_flags() {
    let store = PrefStore::new(temp_path("prefs-roundtrip.json"));
    assert!(!store.get_bool(DARK_MODE_KEY).unwrap());
    store.set_bool(DARK_MODE_KEY, true).unwrap();
    store.set("other", "kept").unwrap();
    assert!(store.get_bool(DARK_MODE_KEY).unwrap());
    assert_eq!(store.get("other").unwrap().as_deref(), Some("kept"));
}

#[test]
fn theme_toggle_persists_new_value() {
    let store = PrefStore::new(temp_path("prefs-toggle.json"));
    let before = theme::is_dark();
    let after = theme::toggle(&store).unwrap();
    assert_eq!(after, !before);
    assert_eq!(theme::is_dark(), after);
    assert_eq!(store.get_bool(DARK_MODE_KEY).unwrap(), after);
}

#[test]
fn pagination_line_reports_open_directions() {
    let controller = controller_at(2, 12);
    assert_eq!(
        crate::output::render_pagination(&controller),
        "Page 2 of 3 (prev, next)"
    );
    let controller = controller_at(3, 12);
    assert_eq!(
        crate::output::render_pagination(&controller),
        "Page 3 of 3 (prev)"
    );
}

#[tokio::test(start_paused = true)]
async fn suggestion_burst_reaches_network_once() {
    let api = FakeApi::default();
    api.with(|s| s.suggestions = vec![suggestion("Alice Smith")]);
    let mut session = Session::new(api.clone(), SessionSettings::default());

    session.set_search_text("A");
    tokio::time::sleep(Duration::from_millis(100)).await;
    session.set_search_text("Al");
    tokio::time::sleep(Duration::from_millis(100)).await;
    session.set_search_text("Ali");

    loop {
        match session.next_update().await {
            Some(Update::SuggestionsReplaced) => break,
            Some(_) => continue,
            None => panic!("event channel closed"),
        }
    }
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(api.suggest_queries(), vec!["Ali".to_string()]);
    assert_eq!(session.controller().suggestions(), &[suggestion("Alice Smith")]);
}

#[tokio::test(start_paused = true)]
async fn clearing_search_cancels_pending_lookup() {
    let api = FakeApi::default();
    let mut session = Session::new(api.clone(), SessionSettings::default());

    session.set_search_text("Al");
    session.set_search_text("");
    session.settle_pages().await;
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert!(api.suggest_queries().is_empty());
    assert!(session.try_next_update().is_none());
}

#[tokio::test(start_paused = true)]
async fn slow_page_response_is_dropped() {
    let api = FakeApi::default();
    api.with(|s| {
        s.page_delays
            .insert("a".to_string(), Duration::from_millis(500));
    });
    api.push_page(Ok(page_of(vec![employee("1", "Old")], 1)));
    api.push_page(Ok(page_of(vec![employee("2", "New")], 1)));
    let mut session = Session::new(api.clone(), SessionSettings::default());

    session.set_search_text("a");
    session.set_search_text("ab");
    session.settle_pages().await;

    assert_eq!(api.page_queries().len(), 2);
    assert_eq!(session.controller().employees()[0].id, "2");
    assert_eq!(session.controller().search_text(), "ab");
}

#[tokio::test]
async fn fetch_failure_leaves_page_and_total() {
    let api = FakeApi::default();
    let e1 = employee("1", "Al");
    let e2 = employee("2", "Bea");
    api.push_page(Ok(page_of(vec![e1.clone(), e2.clone()], 2)));
    api.push_page(Err(503));
    let mut session = Session::new(api.clone(), SessionSettings::default());

    session.refresh();
    assert_eq!(session.next_update().await, Some(Update::PageReplaced));
    session.refresh();
    assert_eq!(session.next_update().await, Some(Update::PageUnchanged));

    assert_eq!(session.controller().employees(), &[e1, e2]);
    assert_eq!(session.controller().total(), 2);
    assert!(session.controller().last_error().is_some());
}

#[tokio::test]
async fn department_filter_issues_a_single_fetch() {
    let api = FakeApi::default();
    api.with(|s| s.default_page = page_of(Vec::new(), 30));
    let mut session = Session::new(api.clone(), SessionSettings::default());
    session.refresh();
    session.settle_pages().await;
    session.set_page(4).unwrap();
    session.settle_pages().await;

    session.set_department_filter("HR");
    session.settle_pages().await;

    let queries = api.page_queries();
    assert_eq!(queries.len(), 3);
    let last = queries.last().unwrap();
    assert_eq!(last.page, 1);
    assert_eq!(last.department, "HR");
}

#[tokio::test]
async fn creating_posts_then_resets_form_and_refetches() {
    let api = FakeApi::default();
    let mut session = Session::new(api.clone(), SessionSettings::default());
    *session.editor_mut().draft_mut() = filled_draft();

    assert_eq!(session.save().await, Ok(ActionOutcome::Done));
    session.settle_pages().await;

    api.with(|s| {
        assert_eq!(s.created, vec![filled_draft()]);
        assert!(s.updated.is_empty());
    });
    assert_eq!(session.editor(), &Editor::default());
    assert_eq!(api.page_queries().len(), 1);
}

#[tokio::test]
async fn editing_puts_to_the_loaded_id() {
    let api = FakeApi::default();
    api.with(|s| {
        s.records.insert("42".to_string(), employee("42", "Al"));
    });
    let mut session = Session::new(api.clone(), SessionSettings::default());

    assert_eq!(session.view("42").await, ActionOutcome::Done);
    session.editor_mut().draft_mut().position = "Lead".to_string();
    assert_eq!(session.save().await, Ok(ActionOutcome::Done));

    api.with(|s| {
        assert_eq!(s.updated.len(), 1);
        assert_eq!(s.updated[0].0, "42");
        assert_eq!(s.updated[0].1.position, "Lead");
        assert!(s.created.is_empty());
    });
    assert!(!session.editor().is_editing());
}

#[tokio::test]
async fn invalid_form_is_not_sent() {
    let api = FakeApi::default();
    let mut session = Session::new(api.clone(), SessionSettings::default());
    session.editor_mut().draft_mut().first_name = "Ada".to_string();

    assert!(session.save().await.is_err());
    api.with(|s| assert!(s.created.is_empty()));
    assert_eq!(session.editor().draft().first_name, "Ada");
    assert_eq!(session.pages_in_flight(), 0);
}

#[tokio::test]
async fn failed_save_keeps_the_form() {
    let api = FakeApi::default();
    api.with(|s| s.fail_writes = true);
    let mut session = Session::new(api.clone(), SessionSettings::default());
    *session.editor_mut().draft_mut() = filled_draft();

    assert_eq!(session.save().await, Ok(ActionOutcome::Failed));
    assert_eq!(session.editor().draft(), &filled_draft());
    assert_eq!(session.pages_in_flight(), 0);
    assert!(session.controller().last_error().is_some());
}

#[tokio::test]
async fn missing_record_leaves_editor_alone() {
    let api = FakeApi::default();
    let mut session = Session::new(api, SessionSettings::default());
    assert_eq!(session.view("nope").await, ActionOutcome::Failed);
    assert!(!session.editor().is_editing());
}

#[tokio::test]
async fn deleting_refetches_and_leaves_edit_mode() {
    let api = FakeApi::default();
    api.with(|s| {
        s.records.insert("9".to_string(), employee("9", "Cy"));
    });
    let mut session = Session::new(api.clone(), SessionSettings::default());
    session.view("9").await;

    assert_eq!(session.delete("9").await, ActionOutcome::Done);
    session.settle_pages().await;

    api.with(|s| assert_eq!(s.deleted, vec!["9".to_string()]));
    assert!(!session.editor().is_editing());
    assert_eq!(api.page_queries().len(), 1);
}

#[tokio::test]
async fn export_writes_the_downloaded_csv() {
    let api = FakeApi::default();
    let csv = b"first_name,last_name\nAl,Smith\n".to_vec();
    api.with(|s| s.export = csv.clone());
    let mut session = Session::new(api, SessionSettings::default());
    let path = temp_path("employees.csv");

    let outcome = session.export_csv(&path).await.unwrap();
    assert_eq!(
        outcome,
        ExportOutcome::Written {
            path: path.clone(),
            bytes: csv.len()
        }
    );
    assert_eq!(std::fs::read(&path).unwrap(), csv);
}

#[tokio::test(start_paused = true)]
async fn debouncer_runs_only_the_last_action() {
    use crate::controller::Debouncer;
    use std::sync::atomic::{AtomicUsize, Ordering};

    let fired = Arc::new(AtomicUsize::new(0));
    let mut debouncer = Debouncer::new(Duration::from_millis(300));
    for n in 1..=3 {
        let fired = Arc::clone(&fired);
        debouncer.schedule(async move {
            fired.store(n, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(debouncer.is_pending());
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    tokio::time::sleep(debouncer.delay()).await;
    assert_eq!(fired.load(Ordering::SeqCst), 3);
    assert!(!debouncer.is_pending());

    debouncer.schedule(async {});
    debouncer.cancel();
    assert!(!debouncer.is_pending());
}

#[test]
fn json_rendering_reports_encode_errors() {
    let mut bad = HashMap::new();
    bad.insert((1u8, 2u8), "pair");
    assert!(crate::output::render_json(&bad).is_err());

    let body = crate::output::render_json(&[suggestion("Alice Smith")]).unwrap();
    assert!(body.contains("\"text\": \"Alice Smith\""));
}

#[test]
fn whitespace_search_plans_no_lookup() {
    let mut controller = QueryController::new(5);
    let change = controller.set_search_text("   ");
    assert_eq!(change.suggest, SuggestPlan::Cleared);
    assert_eq!(change.fetch.map(|r| r.query.search), Some("   ".to_string()));
}

#[test]
fn page_text_names_the_active_department() {
    let mut controller = QueryController::new(5);
    let request = controller.set_department_filter("HR");
    controller.apply_page(request.ticket, Ok(page_of(vec![employee("1", "Al")], 1)));
    let palette = crate::output::Palette::for_theme(false);
    let text = crate::output::render_page_text(&controller, palette);
    assert!(text.contains("Department: HR"));
    assert!(text.contains("Page 1 of 1"));
    assert_eq!(controller.department_filter(), "HR");
    assert_eq!(controller.page_size(), 5);
}

#[tokio::test]
async fn direct_suggestion_lookup_skips_the_page_fetch() {
    let api = FakeApi::default();
    api.with(|s| s.suggestions = vec![suggestion("Alice Smith")]);
    let mut session = Session::new(api.clone(), SessionSettings::default());

    assert_eq!(
        session.lookup_suggestions("Ali").await,
        Update::SuggestionsReplaced
    );
    assert_eq!(api.suggest_queries(), vec!["Ali".to_string()]);
    assert!(api.page_queries().is_empty());
    assert_eq!(session.pages_in_flight(), 0);
    assert_eq!(session.controller().search_text(), "");
    assert_eq!(session.controller().suggestions(), &[suggestion("Alice Smith")]);

    assert_eq!(
        session.lookup_suggestions("").await,
        Update::SuggestionsReplaced
    );
    assert!(session.controller().suggestions().is_empty());
    assert_eq!(api.suggest_queries().len(), 1);
}
