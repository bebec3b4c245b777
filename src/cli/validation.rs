use crate::cli::args::{CliArgs, Command, RecordArgs};

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(size) = args.page_size {
        if size == 0 {
            return Err("invalid page-size, expected positive integer".to_string());
        }
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid timeout, expected positive integer".to_string());
        }
    }
    if let Some(raw) = args.output_format.as_deref() {
        crate::output::OutputFormat::parse(raw)
            .ok_or_else(|| format!("invalid --output-format '{raw}', expected text or json"))?;
    }
    if let Some(raw) = args.base_url.as_deref() {
        crate::client::parse_base_url(raw).map_err(|e| format!("invalid --url: {e}"))?;
    }
    match &args.command {
        Some(Command::List(list)) => {
            if list.page == Some(0) {
                return Err("invalid page, expected 1 or more".to_string());
            }
        }
        Some(Command::Create(record)) | Some(Command::Update { record, .. }) => {
            validate_record(record)?;
        }
        Some(Command::Show { id }) | Some(Command::Delete { id }) => {
            if id.trim().is_empty() {
                return Err("employee id is empty".to_string());
            }
        }
        _ => {}
    }
    Ok(())
}

fn validate_record(record: &RecordArgs) -> Result<(), String> {
    if let Some(raw) = record.salary.as_deref() {
        crate::utils::parse_salary(raw).map_err(|e| format!("invalid --salary: {e}"))?;
    }
    Ok(())
}
