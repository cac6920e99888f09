//! Human-readable output for command results

use acctswap_core::{AccountSummary, RemoveReport, StatusReport, SwitchOutcome};

const RESTART_HINT: &str = "Restart Claude Code to use the new account.";

pub fn summary_line(account: &AccountSummary) -> String {
    let mut line = format!("{}: {}", account.position, account.email);
    if let Some(alias) = &account.alias {
        line.push_str(&format!(" [{alias}]"));
    }
    if account.active {
        line.push_str(" (active)");
    }
    line
}

pub fn list(accounts: &[AccountSummary]) -> String {
    if accounts.is_empty() {
        return "No accounts are managed yet. Log in and run `acctswap add`.".to_string();
    }
    let mut out = String::from("Accounts:");
    for account in accounts {
        out.push_str("\n  ");
        out.push_str(&summary_line(account));
        out.push_str(&format!(" (added {})", account.added_at.format("%Y-%m-%d")));
    }
    out
}

pub fn status(report: &StatusReport) -> String {
    let mut lines = Vec::new();
    match (&report.live_email, &report.live_account) {
        (None, _) => lines.push("Logged in: nobody".to_string()),
        (Some(email), Some(account)) => {
            lines.push(format!("Logged in: {email} ({})", account.label))
        }
        (Some(email), None) => lines.push(format!("Logged in: {email} (not managed)")),
    }
    match &report.registry_active {
        Some(active) => lines.push(format!("Active: {} ({})", active.label, active.email)),
        None => lines.push("Active: none".to_string()),
    }
    if let (Some(live), Some(active)) = (&report.live_email, &report.registry_active) {
        if *live != active.email {
            lines.push(format!(
                "The logged-in account differs from the active one; {}",
                "run `acctswap add` or switch to fix."
            ));
        }
    }
    lines.join("\n")
}

pub fn added(account: &AccountSummary) -> String {
    let mut out = format!("Added {} as {}", account.email, account.label);
    if let Some(alias) = &account.alias {
        out.push_str(&format!(" [{alias}]"));
    }
    out
}

pub fn removed(report: &RemoveReport) -> String {
    let mut out = format!("Removed {}", report.removed);
    if report.was_active {
        match &report.new_active {
            Some(next) => out.push_str(&format!("\nActive account is now {next}")),
            None => out.push_str("\nNo accounts left"),
        }
    }
    out
}

pub fn switched(outcome: &SwitchOutcome) -> String {
    match outcome {
        SwitchOutcome::AlreadyActive(account) => format!("Already using {account}"),
        SwitchOutcome::Switched { from, to } => {
            let mut out = match from {
                Some(from) => format!("Switched from {from} to {to}"),
                None => format!("Switched to {to}"),
            };
            out.push('\n');
            out.push_str(RESTART_HINT);
            out
        }
    }
}

pub fn aliased(alias: &str, account: &AccountSummary) -> String {
    format!("Alias '{alias}' now points to {} ({})", account.label, account.email)
}
