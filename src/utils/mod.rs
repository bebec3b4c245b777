use std::collections::HashSet;

/// Departments offered by the filter when the config names none.
pub const DEFAULT_DEPARTMENTS: [&str; 4] = ["Engineering", "HR", "Sales", "Marketing"];

/// Splits a comma-separated list, trimming items and dropping
/// case-insensitive duplicates. An empty input yields an empty list.
pub fn parse_list_csv(value: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for part in value.split(',') {
        let item = part.trim();
        if item.is_empty() {
            continue;
        }
        if seen.insert(item.to_lowercase()) {
            out.push(item.to_string());
        }
    }
    out
}

pub fn parse_skills_csv(value: &str) -> Option<Vec<String>> {
    let skills = parse_list_csv(value);
    if skills.is_empty() {
        None
    } else {
        Some(skills)
    }
}

pub fn parse_salary(value: &str) -> Result<f64, String> {
    let raw = value.trim().trim_start_matches('$').replace(',', "");
    if raw.is_empty() {
        return Err("salary is empty".to_string());
    }
    let salary: f64 = raw
        .parse()
        .map_err(|_| format!("invalid salary '{}'", value.trim()))?;
    if !salary.is_finite() {
        return Err(format!("invalid salary '{}'", value.trim()));
    }
    Ok(salary)
}

pub fn parse_page_index(value: &str) -> Result<u32, String> {
    let page: u32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid page '{}'", value.trim()))?;
    if page == 0 {
        return Err("page index starts at 1".to_string());
    }
    Ok(page)
}

/// Finds a configured department by case-insensitive name so the filter
/// always carries the canonical spelling.
pub fn canonical_department<'a>(value: &str, departments: &'a [String]) -> Option<&'a str> {
    let wanted = value.trim();
    departments
        .iter()
        .find(|d| d.eq_ignore_ascii_case(wanted))
        .map(String::as_str)
}
