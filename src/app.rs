use std::path::PathBuf;
use std::time::Duration;

use clap::{error::ErrorKind, CommandFactory, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::args::{CliArgs, Command, ListArgs, RecordArgs, ThemeAction};
use crate::cli::validation;
use crate::client::{ClientOptions, EmployeeApi, HttpEmployeeApi, DEFAULT_BASE_URL};
use crate::config::{self, ConfigFile};
use crate::controller::debounce::DEFAULT_DEBOUNCE;
use crate::model::{EmployeeDraft, DEFAULT_PAGE_SIZE};
use crate::output::{self, OutputFormat, Palette};
use crate::session::{ActionOutcome, ExportOutcome, Session, SessionSettings, Update};
use crate::theme::{self, PrefStore};
use crate::utils;

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

fn print_banner(run: &RunConfig) {
    println!("{}", "employee-desk".bold());
    format_kv_line("Service", &run.base_url);
    format_kv_line("Page size", &run.page_size.to_string());
    format_kv_line("Theme", theme::label(theme::is_dark()));
    println!("Type 'help' for commands.");
    println!();
}

#[derive(Debug)]
struct RunConfig {
    command: Command,
    config_path: Option<PathBuf>,
    base_url: String,
    timeout: u64,
    page_size: u32,
    debounce: Duration,
    prefs_path: PathBuf,
    export_path: PathBuf,
    output_format: OutputFormat,
    no_color: bool,
    force_color: bool,
    verbose: u8,
    departments: Vec<String>,
}

fn build_run_config(
    args: CliArgs,
    cfg: ConfigFile,
    config_path: Option<PathBuf>,
) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = if args.color {
        false
    } else {
        args.no_color || cfg.no_color.unwrap_or(false)
    };

    let base_url = args
        .base_url
        .or(cfg.base_url)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    crate::client::parse_base_url(&base_url).map_err(|e| e.to_string())?;

    let timeout = args.timeout.or(cfg.timeout).unwrap_or(10).max(1);
    let page_size = args
        .page_size
        .or(cfg.page_size)
        .unwrap_or(DEFAULT_PAGE_SIZE);
    if page_size == 0 {
        return Err("invalid page_size, expected positive integer".to_string());
    }
    let debounce = args
        .debounce_ms
        .or(cfg.debounce_ms)
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_DEBOUNCE);

    let prefs_path = args
        .prefs
        .or(cfg.prefs_path)
        .map(|p| config::expand_tilde(&p))
        .unwrap_or_else(config::default_prefs_path);
    let export_path = cfg
        .export_path
        .map(|p| config::expand_tilde(&p))
        .unwrap_or_else(|| PathBuf::from(output::DEFAULT_EXPORT_FILE));

    let output_format_raw = args
        .output_format
        .or(cfg.output_format)
        .unwrap_or_else(|| "text".to_string());
    let output_format = OutputFormat::parse(&output_format_raw)
        .ok_or_else(|| format!("invalid output format '{output_format_raw}'"))?;

    let departments = cfg
        .departments
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| {
            utils::DEFAULT_DEPARTMENTS
                .iter()
                .map(|d| d.to_string())
                .collect()
        });

    Ok(RunConfig {
        command: args.command.unwrap_or(Command::Interactive),
        config_path,
        base_url,
        timeout,
        page_size,
        debounce,
        prefs_path,
        export_path,
        output_format,
        no_color,
        force_color: args.color,
        verbose: args.verbose,
        departments,
    })
}

fn apply_record_args(draft: &mut EmployeeDraft, record: &RecordArgs) -> Result<(), String> {
    if let Some(v) = &record.first_name {
        draft.first_name = v.trim().to_string();
    }
    if let Some(v) = &record.last_name {
        draft.last_name = v.trim().to_string();
    }
    if let Some(v) = &record.email {
        draft.email = v.trim().to_string();
    }
    if let Some(v) = &record.department {
        draft.department = v.trim().to_string();
    }
    if let Some(v) = &record.position {
        draft.position = v.trim().to_string();
    }
    if let Some(v) = &record.salary {
        draft.salary = Some(utils::parse_salary(v)?);
    }
    if let Some(v) = &record.skills {
        draft.skills = utils::parse_skills_csv(v);
    }
    if let Some(v) = &record.contact_number {
        let v = v.trim();
        draft.contact_number = if v.is_empty() {
            None
        } else {
            Some(v.to_string())
        };
    }
    Ok(())
}

/// Sets one form field by name, as typed in the interactive session.
fn apply_field(draft: &mut EmployeeDraft, field: &str, value: &str) -> Result<(), String> {
    let mut record = RecordArgs::default();
    let value = Some(value.to_string());
    match field.trim().to_lowercase().replace('-', "_").as_str() {
        "first_name" | "first" => record.first_name = value,
        "last_name" | "last" => record.last_name = value,
        "email" => record.email = value,
        "department" | "dept" => record.department = value,
        "position" => record.position = value,
        "salary" => record.salary = value,
        "skills" => record.skills = value,
        "contact_number" | "contact" => record.contact_number = value,
        other => return Err(format!("unknown field '{other}'")),
    }
    apply_record_args(draft, &record)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), String> {
    let body = output::render_json(value).map_err(|e| format!("failed to encode JSON: {e}"))?;
    println!("{body}");
    Ok(())
}

fn print_page<A: EmployeeApi>(session: &Session<A>, format: OutputFormat) -> Result<(), String> {
    let controller = session.controller();
    match format {
        OutputFormat::Text => {
            print!(
                "{}",
                output::render_page_text(controller, Palette::current())
            );
            Ok(())
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "employees": controller.employees(),
            "total": controller.total(),
            "page": controller.page(),
            "pages": controller.page_count(),
            "page_size": controller.page_size(),
            "search": controller.search_text(),
            "department": controller.department_filter(),
        })),
    }
}

fn print_form<A: EmployeeApi>(session: &Session<A>) {
    let editor = session.editor();
    let mode = match editor.editing_id() {
        Some(id) => format!("Editing {id}"),
        None => "New employee".to_string(),
    };
    println!("{}", mode.bold());
    let draft = editor.draft();
    let rows = [
        ("first_name", draft.first_name.clone()),
        ("last_name", draft.last_name.clone()),
        ("email", draft.email.clone()),
        ("department", draft.department.clone()),
        ("position", draft.position.clone()),
        (
            "salary",
            draft.salary.map(|s| s.to_string()).unwrap_or_default(),
        ),
        (
            "skills",
            draft.skills.clone().unwrap_or_default().join(", "),
        ),
        (
            "contact",
            draft.contact_number.clone().unwrap_or_default(),
        ),
    ];
    for (label, value) in rows {
        println!("  {label:<11} {value}");
    }
}

fn last_error_or<A: EmployeeApi>(session: &Session<A>, fallback: &str) -> String {
    session
        .controller()
        .last_error()
        .unwrap_or(fallback)
        .to_string()
}

async fn run_list<A: EmployeeApi>(
    session: &mut Session<A>,
    list: &ListArgs,
    run: &RunConfig,
) -> Result<(), String> {
    let department = match list.department.as_deref() {
        Some(d) => utils::canonical_department(d, &run.departments)
            .unwrap_or(d)
            .to_string(),
        None => String::new(),
    };
    session.load(
        list.search.as_deref().unwrap_or(""),
        &department,
        list.page.unwrap_or(1),
    );
    session.settle_pages().await;
    if !session.controller().total_known() {
        return Err(last_error_or(session, "failed to fetch employees"));
    }
    print_page(session, run.output_format)
}

async fn run_suggest<A: EmployeeApi>(
    session: &mut Session<A>,
    text: &str,
    format: OutputFormat,
) -> Result<(), String> {
    if session.lookup_suggestions(text).await == Update::SuggestionsUnchanged {
        return Err(last_error_or(session, "suggestion lookup failed"));
    }
    let suggestions = session.controller().suggestions();
    match format {
        OutputFormat::Text => {
            print!(
                "{}",
                output::render_suggestions(suggestions, Palette::current())
            );
            Ok(())
        }
        OutputFormat::Json => print_json(suggestions),
    }
}

async fn run_export<A: EmployeeApi>(
    session: &mut Session<A>,
    path: PathBuf,
) -> Result<(), String> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(format!("downloading {}", path.display()));
    pb.enable_steady_tick(Duration::from_millis(100));

    let outcome = session.export_csv(&path).await;
    pb.finish_and_clear();

    match outcome.map_err(|e| format!("failed to write '{}': {e}", path.display()))? {
        ExportOutcome::Written { path, bytes } => {
            println!("Saved {} ({} bytes)", path.display(), bytes);
            Ok(())
        }
        ExportOutcome::Failed => Err(last_error_or(session, "export failed")),
    }
}

async fn run_save<A: EmployeeApi>(session: &mut Session<A>) -> Result<(), String> {
    let editing = session.editor().editing_id().map(str::to_string);
    match session.save().await.map_err(|e| e.to_string())? {
        ActionOutcome::Done => {
            match editing {
                Some(id) => println!("Updated {id}"),
                None => println!("Created employee"),
            }
            Ok(())
        }
        ActionOutcome::Failed => Err(last_error_or(session, "save failed")),
    }
}

fn render_interactive_help() -> &'static str {
    "Commands:
  search <text>        set the search text (empty clears); suggestions follow
  pick <n>             use suggestion n as the search text
  dept <name|all>      filter by department
  page <n> | next | prev | refresh
  view <id>            load an employee into the form
  new | cancel         start a new record / leave edit mode
  set <field> <value>  edit the form (first_name, last_name, email, department,
                       position, salary, skills, contact)
  form | save          show / submit the form
  delete <id>
  export [file]
  theme                toggle dark mode
  help | quit
"
}

async fn handle_line<A: EmployeeApi>(
    session: &mut Session<A>,
    run: &RunConfig,
    store: &PrefStore,
    line: &str,
) -> Result<bool, String> {
    let line = line.trim();
    let (cmd, rest) = match line.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (line, ""),
    };
    match cmd {
        "" => {}
        "quit" | "exit" | "q" => return Ok(false),
        "help" | "?" => print!("{}", render_interactive_help()),
        "search" | "s" => session.set_search_text(rest),
        "pick" => {
            let index: usize = rest
                .parse()
                .map_err(|_| format!("invalid suggestion number '{rest}'"))?;
            let suggestion = index
                .checked_sub(1)
                .and_then(|i| session.controller().suggestions().get(i))
                .cloned()
                .ok_or_else(|| format!("no suggestion {index}"))?;
            println!("search: {}", suggestion.text);
            session.select_suggestion(&suggestion);
        }
        "dept" | "department" => {
            let department = if rest.is_empty() || rest.eq_ignore_ascii_case("all") {
                String::new()
            } else {
                utils::canonical_department(rest, &run.departments)
                    .ok_or_else(|| {
                        format!(
                            "unknown department '{rest}' (known: {})",
                            run.departments.join(", ")
                        )
                    })?
                    .to_string()
            };
            session.set_department_filter(&department);
        }
        "page" => {
            let page = utils::parse_page_index(rest)?;
            session.set_page(page).map_err(|e| e.to_string())?;
        }
        "next" | "n" => session.next_page().map_err(|e| e.to_string())?,
        "prev" | "p" => session.previous_page().map_err(|e| e.to_string())?,
        "refresh" | "r" => session.refresh(),
        "view" => {
            if session.view(rest).await == ActionOutcome::Done {
                print_form(session);
            } else {
                return Err(last_error_or(session, "failed to load employee"));
            }
        }
        "new" | "cancel" => {
            session.cancel_edit();
            print_form(session);
        }
        "set" => {
            let (field, value) = rest
                .split_once(char::is_whitespace)
                .map(|(f, v)| (f, v.trim()))
                .unwrap_or((rest, ""));
            apply_field(session.editor_mut().draft_mut(), field, value)?;
        }
        "form" => print_form(session),
        "save" => run_save(session).await?,
        "delete" | "rm" => {
            if session.delete(rest).await == ActionOutcome::Done {
                println!("Deleted {rest}");
            } else {
                return Err(last_error_or(session, "delete failed"));
            }
        }
        "export" => {
            let path = if rest.is_empty() {
                run.export_path.clone()
            } else {
                config::expand_tilde(rest)
            };
            run_export(session, path).await?;
        }
        "theme" => {
            let dark = theme::toggle(store).map_err(|e| e.to_string())?;
            println!("Theme: {}", theme::label(dark));
        }
        other => return Err(format!("unknown command '{other}' (try 'help')")),
    }
    Ok(true)
}

fn print_update<A: EmployeeApi>(session: &Session<A>, update: &Update, format: OutputFormat) {
    let palette = Palette::current();
    match update {
        Update::PageReplaced => {
            if let Err(err) = print_page(session, format) {
                eprintln!("{}", err.color(palette.error));
            }
        }
        Update::PageClamped { page } => {
            println!("{}", format!("results shrank, moving to page {page}").color(palette.muted))
        }
        Update::PageUnchanged | Update::SuggestionsUnchanged => {
            if let Some(err) = session.controller().last_error() {
                eprintln!("{}", err.color(palette.error));
            }
        }
        Update::SuggestionsReplaced => {
            if !session.controller().suggestions().is_empty() {
                println!("{}", "Suggestions:".color(palette.heading));
                print!(
                    "{}",
                    output::render_suggestions(session.controller().suggestions(), palette)
                );
            }
        }
        Update::Stale => {}
    }
}

async fn run_interactive<A: EmployeeApi>(
    session: &mut Session<A>,
    run: &RunConfig,
    store: &PrefStore,
) -> Result<(), String> {
    print_banner(run);
    session.refresh();

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    loop {
        tokio::select! {
            Some(update) = session.next_update() => {
                print_update(session, &update, run.output_format);
            }
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => return Err(format!("failed to read input: {e}")),
                };
                match handle_line(session, run, store, &line).await {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => eprintln!("{}", e.color(Palette::current().error)),
                }
            }
        }
    }
    Ok(())
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    crate::logging::init(run.verbose, run.no_color)?;
    if run.no_color {
        colored::control::set_override(false);
    } else if run.force_color {
        colored::control::set_override(true);
    }

    let store = PrefStore::new(run.prefs_path.clone());
    theme::init(&store);

    match &run.command {
        Command::InitConfig => {
            let path = run
                .config_path
                .clone()
                .or_else(config::default_config_path)
                .ok_or_else(|| "cannot determine config path".to_string())?;
            if config::ensure_default_config_file(&path)? {
                println!("Wrote {}", path.display());
            } else {
                println!("{} already exists", path.display());
            }
            return Ok(());
        }
        Command::Theme { action } => {
            let dark = match action {
                ThemeAction::Show => theme::is_dark(),
                ThemeAction::Toggle => theme::toggle(&store).map_err(|e| e.to_string())?,
            };
            println!("Theme: {}", theme::label(dark));
            return Ok(());
        }
        _ => {}
    }

    let api = HttpEmployeeApi::new(&ClientOptions {
        base_url: run.base_url.clone(),
        timeout_seconds: run.timeout,
    })
    .map_err(|e| e.to_string())?;
    let mut session = Session::new(
        api,
        SessionSettings {
            page_size: run.page_size,
            debounce: run.debounce,
        },
    );

    match &run.command {
        Command::List(list) => run_list(&mut session, list, &run).await,
        Command::Show { id } => {
            if session.view(id).await == ActionOutcome::Failed {
                return Err(last_error_or(&session, "failed to load employee"));
            }
            let employee = session.editor().draft().with_id(id);
            match run.output_format {
                OutputFormat::Text => {
                    print!(
                        "{}",
                        output::render_employee(&employee, Palette::current())
                    );
                    Ok(())
                }
                OutputFormat::Json => print_json(&employee),
            }
        }
        Command::Create(record) => {
            apply_record_args(session.editor_mut().draft_mut(), record)?;
            run_save(&mut session).await
        }
        Command::Update { id, record } => {
            if session.view(id).await == ActionOutcome::Failed {
                return Err(last_error_or(&session, "failed to load employee"));
            }
            apply_record_args(session.editor_mut().draft_mut(), record)?;
            run_save(&mut session).await
        }
        Command::Delete { id } => match session.delete(id).await {
            ActionOutcome::Done => {
                println!("Deleted {id}");
                Ok(())
            }
            ActionOutcome::Failed => Err(last_error_or(&session, "delete failed")),
        },
        Command::Suggest { text } => run_suggest(&mut session, text, run.output_format).await,
        Command::Export { out } => {
            let path = out
                .as_deref()
                .map(config::expand_tilde)
                .unwrap_or_else(|| run.export_path.clone());
            run_export(&mut session, path).await
        }
        Command::Interactive => run_interactive(&mut session, &run, &store).await,
        Command::InitConfig | Command::Theme { .. } => Ok(()),
    }
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                print!("{e}");
                return Ok(());
            }
            ErrorKind::DisplayVersion => {
                let cmd = CliArgs::command();
                print!("{}", cmd.render_version());
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    let user_config_path = args.config.clone().map(|p| config::expand_tilde(&p));
    let cfg = match user_config_path.as_ref() {
        Some(path) => config::load_config(path, false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg, user_config_path)?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))
}
