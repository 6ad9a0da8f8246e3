use super::{connect, spinner, Context};
use crate::fetch::{fetch_list, PAGE_PACING};
use crate::platform::Platform;
use crate::prelude::{println, *};
use crate::terminal::{RawTerminal, Terminal};
use crate::workflow::{run_workflow, ACTION_PACING};
use colored::Colorize;
use followtrack_core::account::{Account, ListKind};
use followtrack_core::candidates::{follow_back, non_mutual};
use followtrack_core::display::format_number;
use followtrack_core::selection::{BulkAction, BulkSummary};
use indicatif::ProgressBar;
use serde::Serialize;

#[derive(Debug, clap::Args, Clone)]
pub struct CandidateOptions {
    /// Browse and act on the list interactively
    #[arg(short, long)]
    pub interactive: bool,

    /// Output as JSON
    #[arg(long, conflicts_with = "interactive")]
    pub json: bool,
}

/// Which derived list to work on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    /// Accounts you follow that do not follow you back.
    NonMutual,
    /// Accounts following you that you do not follow.
    FollowBack,
}

impl CandidateKind {
    pub fn action(&self) -> BulkAction {
        match self {
            CandidateKind::NonMutual => BulkAction::Unfollow,
            CandidateKind::FollowBack => BulkAction::Follow,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            CandidateKind::NonMutual => "Accounts that don't follow you back",
            CandidateKind::FollowBack => "Followers you don't follow back",
        }
    }

    /// Shown instead of the list when there is nothing to act on.
    pub fn all_clear(&self) -> &'static str {
        match self {
            CandidateKind::NonMutual => "🎉 All accounts you follow also follow you back!",
            CandidateKind::FollowBack => "🎉 You already follow everyone who follows you!",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            CandidateKind::NonMutual => "Non-mutual",
            CandidateKind::FollowBack => "Follow-back candidates",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateList {
    pub following_count: usize,
    pub followers_count: usize,
    pub candidates: Vec<Account>,
}

/// Fetch both lists and derive the candidates for `kind`.
pub async fn load_candidates<P: Platform>(
    platform: &P,
    session: &P::Session,
    kind: CandidateKind,
    progress: Option<&ProgressBar>,
) -> Result<CandidateList> {
    let following =
        fetch_list(platform, session, ListKind::Following, PAGE_PACING, progress).await?;
    let followers =
        fetch_list(platform, session, ListKind::Followers, PAGE_PACING, progress).await?;

    let candidates = match kind {
        CandidateKind::NonMutual => non_mutual(&following, &followers),
        CandidateKind::FollowBack => follow_back(&followers, &following),
    };

    Ok(CandidateList {
        following_count: following.len(),
        followers_count: followers.len(),
        candidates,
    })
}

pub async fn run<P: Platform>(
    platform: &P,
    kind: CandidateKind,
    options: CandidateOptions,
    ctx: &Context,
) -> Result<()> {
    let session = connect(platform).await?;
    let progress = spinner("Fetching following...");
    let list = load_candidates(platform, &session, kind, Some(&progress)).await;
    progress.finish_and_clear();
    let list = list?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    if ctx.verbose {
        println!(
            "Fetched {} following and {} followers on {}",
            list.following_count,
            list.followers_count,
            platform.kind()
        );
    }

    if options.interactive && !list.candidates.is_empty() {
        let mut terminal = RawTerminal::new()?;
        let summary = interact(platform, &session, &mut terminal, kind, &list).await?;
        drop(terminal);
        if let Some(summary) = summary {
            print_summary(&summary);
        }
        return Ok(());
    }

    print_list(kind, &list);
    Ok(())
}

/// Run the selection screen over the derived list.
pub async fn interact<P: Platform, T: Terminal>(
    platform: &P,
    session: &P::Session,
    terminal: &mut T,
    kind: CandidateKind,
    list: &CandidateList,
) -> Result<Option<BulkSummary>> {
    if list.candidates.is_empty() {
        return Ok(None);
    }

    let summary = run_workflow(
        platform,
        session,
        terminal,
        &list.candidates,
        kind.action(),
        kind.title(),
        ACTION_PACING,
    )
    .await?;
    Ok(summary)
}

fn print_list(kind: CandidateKind, list: &CandidateList) {
    for line in list_lines(kind, list) {
        println!("{line}");
    }
}

pub fn list_lines(kind: CandidateKind, list: &CandidateList) -> Vec<String> {
    let mut lines = vec![kind.title().bold().to_string(), String::new()];

    if list.candidates.is_empty() {
        lines.push(kind.all_clear().green().to_string());
    }

    for account in &list.candidates {
        lines.push(f!(
            "  {} {} ({} followers)",
            f!("@{}", account.handle).cyan(),
            account.display_name,
            format_number(account.followers_count)
        ));
    }

    lines.push(String::new());
    lines.extend(summary_lines(kind, list));
    lines
}

pub fn summary_lines(kind: CandidateKind, list: &CandidateList) -> Vec<String> {
    vec![
        f!("You follow:  {}", format_number(list.following_count as u64)),
        f!("Follow you:  {}", format_number(list.followers_count as u64)),
        f!(
            "{}: {}",
            kind.label(),
            format_number(list.candidates.len() as u64)
        ),
    ]
}

pub fn print_summary(summary: &BulkSummary) {
    println!(
        "{}",
        f!(
            "{} {} of {} accounts",
            summary.action.past_tense(),
            summary.succeeded,
            summary.attempted
        )
        .green()
    );
    for (handle, reason) in &summary.failures {
        println!("  {} @{handle}: {reason}", "✗".red());
    }
}
