use super::Context;
use crate::prelude::{println, *};
use crate::store::SnapshotStore;
use colored::Colorize;
use followtrack_core::display::{format_change_time, format_number, truncate_chars};
use followtrack_core::reconcile::{ChangeAction, ChangeRecord, FollowerStats};

#[derive(Debug, clap::Args, Clone)]
pub struct HistoryOptions {
    /// Number of changes to show
    #[arg(short, long, default_value = "50")]
    pub limit: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct StatsOptions {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run_history(options: HistoryOptions, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let changes = store.recent_changes(options.limit)?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&changes)?);
        return Ok(());
    }

    if changes.is_empty() {
        println!("No follower changes recorded yet. Run `followtrack check` to start tracking.");
        return Ok(());
    }

    println!("Last {} change(s) on {}:\n", changes.len(), ctx.kind);
    history_table(&changes).printstd();
    Ok(())
}

pub fn history_table(changes: &[ChangeRecord]) -> prettytable::Table {
    let mut table = new_table();
    table.add_row(prettytable::row!["Time", "Action", "User", "Handle"]);

    for change in changes {
        let action = match change.action {
            ChangeAction::Follow => "➕ follow".green().to_string(),
            ChangeAction::Unfollow => "➖ unfollow".red().to_string(),
        };
        table.add_row(prettytable::row![
            format_change_time(&change.timestamp),
            action,
            truncate_chars(&change.display_name, 30),
            f!("@{}", change.handle)
        ]);
    }

    table
}

pub fn run_stats(options: StatsOptions, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let stats = store.stats()?;

    if options.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "current_followers": stats.current_followers,
                "follows_tracked": stats.follows_tracked,
                "unfollows_tracked": stats.unfollows_tracked,
                "net_change": stats.net_change(),
            }))?
        );
        return Ok(());
    }

    print_stats(&stats, &store, ctx)
}

fn print_stats(stats: &FollowerStats, store: &SnapshotStore, ctx: &Context) -> Result<()> {
    println!("{}", f!("{} follower stats", ctx.kind).bold());
    for line in format_stats(stats) {
        println!("  {line}");
    }
    if let Some(last) = store.last_change_at()? {
        println!("  Last change:       {}", format_change_time(&last));
    }
    Ok(())
}

pub fn format_stats(stats: &FollowerStats) -> Vec<String> {
    let net = stats.net_change();
    let net = match net.signum() {
        1 => f!("+{net}").green().to_string(),
        -1 => net.to_string().red().to_string(),
        _ => net.to_string(),
    };

    vec![
        f!(
            "Current followers: {}",
            format_number(stats.current_followers)
        ),
        f!("Follows tracked:   {}", format_number(stats.follows_tracked)),
        f!("Unfollows tracked: {}", format_number(stats.unfollows_tracked)),
        f!("Net change:        {net}"),
    ]
}
