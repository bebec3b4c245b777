use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "employee-desk",
    version,
    about = "terminal client for an employee-records service",
    long_about = "employee-desk browses and edits employee records held by a REST service.\n\nExamples:\n  employee-desk list --search ali --department Engineering\n  employee-desk create --first-name Ada --last-name Lovelace --email ada@example.com --salary 90000\n  employee-desk export --out ./employees.csv\n  employee-desk            (interactive session)\n\nTip: Use --config to persist the service URL and page size."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        global = true,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'c',
        long = "clr",
        visible_alias = "color",
        global = true,
        help_heading = "Output",
        help = "Enable colored output (overrides --no-color)."
    )]
    pub color: bool,

    #[arg(
        short = 'n',
        long = "nc",
        visible_alias = "no-color",
        global = true,
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'A',
        long = "of",
        visible_alias = "output-format",
        value_name = "FORMAT",
        global = true,
        help_heading = "Output",
        help = "Output format (text or json)."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        global = true,
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.employee-desk/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "prefs",
        value_name = "FILE",
        global = true,
        help_heading = "Input",
        help = "Preference store holding the theme flag (defaults to ~/.employee-desk/prefs.json)."
    )]
    pub prefs: Option<String>,

    #[arg(
        short = 'u',
        long = "url",
        visible_alias = "base-url",
        value_name = "URL",
        global = true,
        help_heading = "HTTP",
        help = "Base URL of the employee service (default http://localhost:5000)."
    )]
    pub base_url: Option<String>,

    #[arg(
        short = 'T',
        long = "to",
        visible_alias = "timeout",
        value_name = "SECONDS",
        global = true,
        help_heading = "HTTP",
        help = "Per-request timeout in seconds."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 's',
        long = "ps",
        visible_alias = "page-size",
        value_name = "N",
        global = true,
        help_heading = "Query",
        help = "Results per page."
    )]
    pub page_size: Option<u32>,

    #[arg(
        long = "db",
        visible_alias = "debounce-ms",
        value_name = "MS",
        global = true,
        help_heading = "Query",
        help = "Quiet period before a suggestion lookup, in milliseconds."
    )]
    pub debounce_ms: Option<u64>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List one page of employees.
    #[command(visible_alias = "ls")]
    List(ListArgs),

    /// Show a single employee.
    Show { id: String },

    /// Create an employee.
    Create(RecordArgs),

    /// Update an employee; omitted fields keep their current value.
    Update {
        id: String,
        #[command(flatten)]
        record: RecordArgs,
    },

    /// Delete an employee.
    #[command(visible_alias = "rm")]
    Delete { id: String },

    /// Print search suggestions for a prefix.
    Suggest { text: String },

    /// Download all employees as CSV.
    Export {
        #[arg(
            short = 'o',
            long = "out",
            visible_alias = "output",
            value_name = "FILE",
            help = "Destination file (defaults to employees.csv)."
        )]
        out: Option<String>,
    },

    /// Show or toggle the dark-mode preference.
    Theme {
        #[arg(value_enum, default_value_t = ThemeAction::Show)]
        action: ThemeAction,
    },

    /// Write a default config file if none exists.
    InitConfig,

    /// Interactive session (the default without a command).
    #[command(visible_alias = "shell")]
    Interactive,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ThemeAction {
    Show,
    Toggle,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    #[arg(
        short = 'q',
        long = "search",
        value_name = "TEXT",
        help = "Search across name, email and position."
    )]
    pub search: Option<String>,

    #[arg(
        short = 'd',
        long = "department",
        visible_alias = "dept",
        value_name = "NAME",
        help = "Only employees of this department."
    )]
    pub department: Option<String>,

    #[arg(
        short = 'p',
        long = "page",
        value_name = "N",
        help = "Page to show (1-based)."
    )]
    pub page: Option<u32>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RecordArgs {
    #[arg(long = "first-name", value_name = "TEXT")]
    pub first_name: Option<String>,

    #[arg(long = "last-name", value_name = "TEXT")]
    pub last_name: Option<String>,

    #[arg(long = "email", value_name = "ADDRESS")]
    pub email: Option<String>,

    #[arg(long = "department", visible_alias = "dept", value_name = "NAME")]
    pub department: Option<String>,

    #[arg(long = "position", value_name = "TEXT")]
    pub position: Option<String>,

    #[arg(long = "salary", value_name = "AMOUNT")]
    pub salary: Option<String>,

    #[arg(
        long = "skills",
        value_name = "LIST",
        help = "Comma-separated skills."
    )]
    pub skills: Option<String>,

    #[arg(long = "contact", visible_alias = "contact-number", value_name = "PHONE")]
    pub contact_number: Option<String>,
}
