//! Human-readable progress on stdout.

use owo_colors::OwoColorize;
use settle::{Outcome, Progress, RunReport, Skipped, Status};
use settle_schema::Diagnostic;

pub fn diagnostic(diagnostic: &Diagnostic) {
    println!("{:>14}  {}", "skipped".yellow(), diagnostic);
}

fn status(status: Status) -> String {
    let label = format!("{:>14}", status.label());
    match status {
        Status::Added => label.green().to_string(),
        Status::AlreadyExists => label.dimmed().to_string(),
        Status::Mismatch => label.yellow().to_string(),
        Status::Failed => label.red().bold().to_string(),
        Status::Anomalous => label.magenta().to_string(),
    }
}

pub fn outcome(outcome: &Outcome) {
    let mut path = outcome.database.clone();
    if !outcome.table.is_empty() {
        path.push('.');
        path.push_str(&outcome.table);
        if outcome.entry != outcome.table {
            path.push('.');
            path.push_str(&outcome.entry);
        }
    }
    print!("{}  {} {}", status(outcome.status), outcome.kind.dimmed(), path.bold());
    if let Some(detail) = &outcome.detail {
        print!(" {}", format!("({detail})").dimmed());
    }
    println!();
}

pub fn skipped(skipped: &Skipped) {
    println!("{:>14}  {}", "skipped".yellow(), skipped);
}

/// Prints each object as the run gets to it.
pub fn progress() -> Progress {
    Progress { outcome, skipped }
}

/// The closing summary.
pub fn report(report: &RunReport) {
    let mut parts: Vec<String> = Status::ALL
        .iter()
        .map(|&s| (s, report.count(s)))
        .filter(|&(_, n)| n > 0)
        .map(|(s, n)| format!("{n} {}", s.label()))
        .collect();
    if !report.skipped.is_empty() {
        parts.push(format!("{} skipped", report.skipped.len()));
    }

    println!();
    if report.is_clean() {
        println!("{} {}", "settled:".green().bold(), parts.join(", "));
    } else {
        println!("{} {}", "settled with problems:".yellow().bold(), parts.join(", "));
    }

    if let Some(reason) = &report.aborted {
        println!("{} {}", "run ended early:".red().bold(), reason);
    }
    if let Some(error) = &report.ledger_error {
        println!("{} {}", "ledger not written:".red().bold(), error);
    }
}
