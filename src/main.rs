use std::process::exit;

fn main() {
    if let Err(err) = employee_desk::app::run_cli() {
        eprintln!("error: {err}");
        exit(1);
    }
}
