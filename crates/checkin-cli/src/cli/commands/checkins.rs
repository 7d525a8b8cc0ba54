//! Check-in, status and history handlers.

use anyhow::{Result, bail};
use checkin_types::CheckInRecord;

use crate::cli::app::App;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub async fn check_in(app: &App) -> Result<()> {
    log_if_signed_out(app);
    if let Some(message) = app.checkins.perform_check_in().await.error_message() {
        bail!("{message}");
    }
    println!("Checked in for today");
    Ok(())
}

pub async fn status(app: &App) -> Result<()> {
    log_if_signed_out(app);
    if let Some(message) = app.checkins.get_today_status().await.error_message() {
        bail!("{message}");
    }
    if app.checkins.snapshot().today_checked_in {
        println!("Checked in today: yes");
    } else {
        println!("Checked in today: no");
    }
    Ok(())
}

pub async fn history(app: &App) -> Result<()> {
    log_if_signed_out(app);
    if let Some(message) = app.checkins.get_my_check_ins().await.error_message() {
        bail!("{message}");
    }

    let records = app.checkins.snapshot().history;
    if records.is_empty() {
        println!("No check-ins yet.");
        return Ok(());
    }
    for record in &records {
        println!("{}", format_record(record));
    }
    Ok(())
}

/// The request still goes out; the server decides.
fn log_if_signed_out(app: &App) {
    if !app.session.has_stored_credential() {
        tracing::debug!("no stored credential; sending unauthenticated request");
    }
}

fn format_record(record: &CheckInRecord) -> String {
    let time = record
        .parsed_time()
        .map_or_else(|| record.checkin_time.clone(), |t| t.format(TIME_FORMAT).to_string());

    let id = record.id.to_string();
    let mut line = format!("{id:>6}  {time}");
    if !record.status.is_empty() {
        line.push_str("  ");
        line.push_str(&record.status);
    }
    if let Some(note) = record.note.as_deref().filter(|n| !n.trim().is_empty()) {
        line.push_str("  ");
        line.push_str(note);
    }
    line
}
