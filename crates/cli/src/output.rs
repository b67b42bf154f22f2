use crate::error::CliError;
use engine_core::state::models::Checkpoint;
use engine_runtime::runner::RunReport;

pub fn print_report_json(report: &RunReport) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(report).map_err(CliError::JsonSerialize)?;
    println!("{json}");
    Ok(())
}

pub fn print_report_table(report: &RunReport) {
    println!("Run '{}' on table '{}':", report.run_id, report.table);
    println!("-----------------------------");
    println!("{:<16} {:?}", "State", report.state);
    println!("{:<16} {}", "Processed", report.totals.total_processed);
    println!("{:<16} {}", "Succeeded", report.totals.total_succeeded);
    println!("{:<16} {}", "Failed", report.totals.total_failed);
    println!("{:<16} {}", "Resume cursor", report.resume_cursor);
    if let Some(path) = &report.failure_report {
        println!("{:<16} {}", "Failure report", path.display());
    }
    if let Some(error) = &report.error {
        println!("{:<16} {}", "Error", error);
    }
}

pub fn print_checkpoint_json(cp: &Checkpoint) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(cp).map_err(CliError::JsonSerialize)?;
    println!("{json}");
    Ok(())
}

pub fn print_checkpoint_table(table: &str, cp: &Checkpoint) {
    println!("Checkpoint for table '{table}':");
    println!("-----------------------------");
    println!("{:<16} {}", "Run", cp.run_id);
    println!("{:<16} {}", "Batch", cp.batch_id);
    println!("{:<16} {:?}", "Stage", cp.stage);
    println!("{:<16} {}", "Cursor", cp.cursor);
    println!("{:<16} {}", "Rows done", cp.rows_done);
    println!("{:<16} {}", "Succeeded", cp.succeeded);
    println!("{:<16} {}", "Failed", cp.failed);
    println!("{:<16} {}", "Updated at", cp.updated_at.to_rfc3339());
}
