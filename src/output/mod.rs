use std::path::Path;

use colored::{Color, Colorize};
use itertools::Itertools;
use tokio::io::AsyncWriteExt;

use crate::controller::QueryController;
use crate::model::{Employee, Suggestion};
use crate::theme;

pub const DEFAULT_EXPORT_FILE: &str = "employees.csv";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Terminal colours for the current theme.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub heading: Color,
    pub muted: Color,
    pub accent: Color,
    pub error: Color,
}

impl Palette {
    pub fn for_theme(dark: bool) -> Self {
        if dark {
            Self {
                heading: Color::BrightWhite,
                muted: Color::BrightBlack,
                accent: Color::BrightCyan,
                error: Color::BrightRed,
            }
        } else {
            Self {
                heading: Color::Black,
                muted: Color::Blue,
                accent: Color::Magenta,
                error: Color::Red,
            }
        }
    }

    pub fn current() -> Self {
        Self::for_theme(theme::is_dark())
    }
}

pub fn render_employee(employee: &Employee, palette: Palette) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} {}\n",
        employee.full_name().color(palette.heading).bold(),
        format!("[{}]", employee.id).color(palette.muted)
    ));
    out.push_str(&format!("  {}\n", employee.email));
    out.push_str(&format!(
        "  {} - {}\n",
        employee.department, employee.position
    ));
    out.push_str(&format!(
        "  Salary: {}\n",
        format!("${}", employee.salary).color(palette.accent)
    ));
    if let Some(skills) = employee.skills.as_ref().filter(|s| !s.is_empty()) {
        out.push_str(&format!("  Skills: {}\n", skills.iter().join(", ")));
    }
    if let Some(contact) = employee.contact_number.as_deref().filter(|c| !c.is_empty()) {
        out.push_str(&format!("  Contact: {contact}\n"));
    }
    out
}

pub fn render_page_text(controller: &QueryController, palette: Palette) -> String {
    let mut out = String::new();
    if !controller.department_filter().is_empty() {
        out.push_str(&format!(
            "{}\n",
            format!("Department: {}", controller.department_filter()).color(palette.muted)
        ));
    }
    if controller.employees().is_empty() {
        out.push_str(&format!("{}\n", "No employees found.".color(palette.muted)));
    }
    for employee in controller.employees() {
        out.push_str(&render_employee(employee, palette));
    }
    out.push_str(&render_pagination(controller));
    out.push('\n');
    if let Some(err) = controller.last_error() {
        out.push_str(&format!("{}\n", err.color(palette.error)));
    }
    out
}

/// "Page N of M" plus which directions are open.
pub fn render_pagination(controller: &QueryController) -> String {
    let mut line = format!(
        "Page {} of {}",
        controller.page(),
        controller.page_count()
    );
    let mut moves = Vec::new();
    if controller.can_go_previous() {
        moves.push("prev");
    }
    if controller.can_go_next() {
        moves.push("next");
    }
    if !moves.is_empty() {
        line.push_str(&format!(" ({})", moves.join(", ")));
    }
    line
}

pub fn render_suggestions(suggestions: &[Suggestion], palette: Palette) -> String {
    suggestions
        .iter()
        .enumerate()
        .map(|(i, s)| format!("  {} {}\n", format!("{}.", i + 1).color(palette.muted), s.text))
        .collect()
}

pub fn render_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

pub async fn write_export(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    Ok(())
}
