use super::{connect, spinner, Context};
use crate::check::{now_timestamp, run_check, CheckReport};
use crate::fetch::PAGE_PACING;
use crate::platform::Platform;
use crate::prelude::{println, *};
use anstream::print;
use colored::Colorize;
use followtrack_core::account::Account;
use followtrack_core::display::format_number;

#[derive(Debug, clap::Args, Clone)]
pub struct CheckOptions {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run<P: Platform>(platform: &P, options: CheckOptions, ctx: &Context) -> Result<()> {
    let session = connect(platform).await?;
    let report = check_once(platform, &session, ctx).await?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", format_report(&report));
    }

    Ok(())
}

/// Run one reconciliation against the context's store, behind a spinner.
pub async fn check_once<P: Platform>(
    platform: &P,
    session: &P::Session,
    ctx: &Context,
) -> Result<CheckReport> {
    let mut store = ctx.open_store()?;
    let progress = spinner("Fetching followers...");
    let result = run_check(
        platform,
        session,
        &mut store,
        PAGE_PACING,
        &now_timestamp(),
        Some(&progress),
    )
    .await;
    progress.finish_and_clear();

    Ok(result?)
}

fn account_line(sign: colored::ColoredString, account: &Account) -> String {
    f!(
        "  {} {} (@{})\n",
        sign,
        account.display_name.bold(),
        account.handle
    )
}

pub fn format_report(report: &CheckReport) -> String {
    let mut out = String::new();

    if report.first_run {
        out.push_str(&f!(
            "{}\n",
            f!(
                "First run: recorded {} followers. Changes will be tracked from now on.",
                format_number(report.total as u64)
            )
            .cyan()
        ));
        return out;
    }

    if report.added.is_empty() && report.removed.is_empty() {
        out.push_str(&f!("{}\n", "No changes since the last check.".dimmed()));
    }

    if !report.added.is_empty() {
        out.push_str(&f!(
            "{}\n",
            f!("{} new follower(s):", report.added.len()).green().bold()
        ));
        for account in &report.added {
            out.push_str(&account_line("+".green(), account));
        }
    }

    if !report.removed.is_empty() {
        out.push_str(&f!(
            "{}\n",
            f!("{} unfollower(s):", report.removed.len()).red().bold()
        ));
        for account in &report.removed {
            out.push_str(&account_line("-".red(), account));
        }
    }

    out.push_str(&f!(
        "\nTotal followers: {}\n",
        format_number(report.total as u64).bold()
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::accounts;

    fn report(first_run: bool, added: &[&str], removed: &[&str], total: usize) -> CheckReport {
        CheckReport {
            first_run,
            added: accounts(added),
            removed: accounts(removed),
            total,
        }
    }

    #[test]
    fn test_format_first_run() {
        let out = format_report(&report(true, &[], &[], 1234));
        assert!(out.contains("First run"));
        assert!(out.contains("1,234"));
    }

    #[test]
    fn test_format_no_changes() {
        let out = format_report(&report(false, &[], &[], 2));
        assert!(out.contains("No changes"));
        assert!(out.contains("Total followers"));
    }

    #[test]
    fn test_format_lists_changes() {
        let out = format_report(&report(false, &["C"], &["A"], 2));
        assert!(out.contains("1 new follower(s)"));
        assert!(out.contains("(@c@example.social)"));
        assert!(out.contains("1 unfollower(s)"));
        assert!(out.contains("(@a@example.social)"));
        assert!(!out.contains("No changes"));
    }
}
