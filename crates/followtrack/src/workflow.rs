//! Interactive selection screen
//!
//! The state machine in [`followtrack_core::selection`] decides what every key
//! does; this module paints each mode, performs the returned effects against a
//! [`Platform`] and pauses between relationship changes.

use crate::error;
use crate::fetch::pause;
use crate::platform::Platform;
use crate::terminal::Terminal;
use colored::Colorize;
use followtrack_core::account::{Account, AccountDetail, Post};
use followtrack_core::display::{format_month_year, format_number, truncate_chars};
use followtrack_core::selection::{
    list_rows, visible_window, BulkAction, BulkSummary, Effect, Mode, Workflow,
};
use log::{debug, warn};
use std::time::Duration;

/// Pause between follow/unfollow calls.
pub const ACTION_PACING: Duration = Duration::from_secs(1);

const RECENT_POSTS: u32 = 3;
const CONFIRM_PREVIEW: usize = 10;

struct LoadedDetail {
    detail: AccountDetail,
    posts: Vec<Post>,
}

/// Browse `accounts`, select some and apply `action` to them.
///
/// Returns the bulk summary when a bulk run happened, `None` when the user
/// quit without one or there was nothing to show.
pub async fn run_workflow<P: Platform, T: Terminal>(
    platform: &P,
    session: &P::Session,
    terminal: &mut T,
    accounts: &[Account],
    action: BulkAction,
    title: &str,
    pacing: Duration,
) -> error::Result<Option<BulkSummary>> {
    let Some(mut workflow) = Workflow::new(accounts.len(), action) else {
        return Ok(None);
    };
    let mut detail: Option<LoadedDetail> = None;
    let mut status: Option<String> = None;

    loop {
        let (width, rows) = terminal.size();
        let frame = match workflow.mode() {
            Mode::Browsing => render_list(&workflow, accounts, title, rows, width, status.as_deref()),
            Mode::Detail(index) => match &detail {
                Some(loaded) => render_detail(loaded, width, status.as_deref()),
                None => vec![format!("Loading @{}...", accounts[*index].handle)],
            },
            Mode::ConfirmBulk(indices) => render_confirm(accounts, indices, action),
            Mode::Exited => break,
        };
        terminal.draw(&frame)?;

        let key = terminal.read_key()?;
        // Status lines last until the next key on the list.
        if matches!(workflow.mode(), Mode::Browsing) {
            status = None;
        }
        match workflow.handle(key) {
            Effect::None | Effect::Confirm(_) | Effect::Exit => {}
            Effect::LoadDetail(index) => {
                let account = &accounts[index];
                status = None;
                detail = None;
                terminal.draw(&[format!("Loading @{}...", account.handle)])?;

                match load_detail(platform, session, &account.id).await {
                    Ok(loaded) => detail = Some(loaded),
                    Err(e) => {
                        warn!("detail for {} failed: {e}", account.handle);
                        status = Some(format!("Could not load @{}: {e}", account.handle));
                        workflow.detail_failed();
                    }
                }
            }
            Effect::Single { index, action } => {
                let account = &accounts[index];
                status = Some(match platform.apply(session, action, &account.id).await {
                    Ok(()) => format!("✓ {} @{}", action.past_tense(), account.handle),
                    Err(e) => {
                        warn!("{} {} failed: {e}", action.verb(), account.handle);
                        format!("✗ Failed to {} @{}: {e}", action.verb(), account.handle)
                    }
                });
                pause(pacing).await;
            }
            Effect::OpenProfile(index) => {
                let url = detail
                    .as_ref()
                    .and_then(|d| d.detail.profile_url.clone());
                status = match url {
                    Some(url) => match terminal.open_url(&url) {
                        Ok(()) => Some(format!("Opened {url}")),
                        Err(e) => Some(e.to_string()),
                    },
                    None => Some(format!("No profile URL for @{}", accounts[index].handle)),
                };
            }
            Effect::ExecuteBulk { indices, action } => {
                let targets: Vec<&Account> = indices.iter().map(|&i| &accounts[i]).collect();
                let summary =
                    execute_bulk(platform, session, terminal, &targets, action, pacing).await?;

                terminal.draw(&render_summary(&summary))?;
                terminal.read_key()?;
                return Ok(Some(summary));
            }
        }
    }

    Ok(None)
}

async fn load_detail<P: Platform>(
    platform: &P,
    session: &P::Session,
    id: &str,
) -> error::Result<LoadedDetail> {
    let detail = platform.account_detail(session, id).await?;
    let posts = match platform.recent_posts(session, id, RECENT_POSTS).await {
        Ok(posts) => posts,
        Err(e) => {
            warn!("recent posts for {id} failed: {e}");
            Vec::new()
        }
    };
    Ok(LoadedDetail { detail, posts })
}

/// Apply `action` to each target in order, pausing between calls.
///
/// A failed call is tallied and the run continues.
pub async fn execute_bulk<P: Platform, T: Terminal>(
    platform: &P,
    session: &P::Session,
    terminal: &mut T,
    targets: &[&Account],
    action: BulkAction,
    pacing: Duration,
) -> error::Result<BulkSummary> {
    let mut summary = BulkSummary::new(action);

    for (i, account) in targets.iter().enumerate() {
        if i > 0 {
            pause(pacing).await;
        }
        terminal.draw(&[format!(
            "{} {}/{}: @{}",
            action.progressive(),
            i + 1,
            targets.len(),
            account.handle
        )])?;

        match platform.apply(session, action, &account.id).await {
            Ok(()) => {
                debug!("{} {}", action.past_tense(), account.handle);
                summary.record_success();
            }
            Err(e) => {
                warn!("{} {} failed: {e}", action.verb(), account.handle);
                summary.record_failure(&account.handle, e.to_string());
            }
        }
    }

    Ok(summary)
}

fn render_list(
    workflow: &Workflow,
    accounts: &[Account],
    title: &str,
    terminal_rows: usize,
    width: usize,
    status: Option<&str>,
) -> Vec<String> {
    let rows = list_rows(terminal_rows);
    let window = visible_window(accounts.len(), workflow.cursor(), rows);
    let mut lines = vec![
        title.bold().to_string(),
        format!(
            "{} accounts, {} selected",
            accounts.len(),
            workflow.selected().len()
        ),
        String::new(),
    ];

    for index in window.clone() {
        let account = &accounts[index];
        let check = if workflow.is_selected(index) { "✓" } else { " " };
        let row = format!(
            "[{check}] @{} {} ({} followers)",
            account.handle,
            account.display_name,
            format_number(account.followers_count)
        );
        let row = truncate_chars(&row, width.saturating_sub(2).max(10));

        lines.push(if index == workflow.cursor() {
            format!("› {}", row.reversed())
        } else if workflow.is_selected(index) {
            format!("  {}", row.green())
        } else {
            format!("  {row}")
        });
    }

    lines.push(String::new());
    lines.push(format!(
        "Showing {}-{} of {}",
        window.start + 1,
        window.end,
        accounts.len()
    ));
    let action = workflow.action();
    lines.push(
        format!(
            "↑/↓ move  space toggle  a all  n none  i details  {} {} selected  q quit",
            action.key(),
            action.verb()
        )
        .dimmed()
        .to_string(),
    );
    if let Some(status) = status {
        lines.push(status.yellow().to_string());
    }

    lines
}

fn render_detail(loaded: &LoadedDetail, width: usize, status: Option<&str>) -> Vec<String> {
    let LoadedDetail { detail, posts } = loaded;
    let account = &detail.account;
    let text_width = width.saturating_sub(4).max(20);

    let mut lines = vec![
        account.display_name.bold().to_string(),
        format!("@{}", account.handle).cyan().to_string(),
        String::new(),
    ];

    if let Some(bio) = detail.bio.as_deref().filter(|b| !b.trim().is_empty()) {
        lines.push(truncate_chars(bio, text_width));
        lines.push(String::new());
    }

    lines.push(format!(
        "Followers: {}  Following: {}  Posts: {}",
        format_number(account.followers_count),
        format_number(account.following_count),
        format_number(detail.posts_count)
    ));
    lines.push(format!(
        "Joined: {}",
        format_month_year(account.created_at.as_deref())
    ));
    lines.push(String::new());

    if posts.is_empty() {
        lines.push("No recent posts".dimmed().to_string());
    } else {
        lines.push("Recent posts:".bold().to_string());
        for post in posts {
            lines.push(format!("  • {}", truncate_chars(&post.text, text_width)));
            lines.push(
                format!(
                    "    ♥ {}  ↻ {}  ↩ {}",
                    post.like_count, post.repost_count, post.reply_count
                )
                .dimmed()
                .to_string(),
            );
        }
    }

    lines.push(String::new());
    lines.push(
        "f follow  u unfollow  o open profile  b back"
            .dimmed()
            .to_string(),
    );
    if let Some(status) = status {
        lines.push(status.yellow().to_string());
    }

    lines
}

fn render_confirm(accounts: &[Account], indices: &[usize], action: BulkAction) -> Vec<String> {
    let mut lines = vec![
        format!("{} {} accounts?", action.progressive(), indices.len())
            .bold()
            .to_string(),
        String::new(),
    ];

    for &i in indices.iter().take(CONFIRM_PREVIEW) {
        lines.push(format!("  @{}", accounts[i].handle));
    }
    if indices.len() > CONFIRM_PREVIEW {
        lines.push(format!("  ... and {} more", indices.len() - CONFIRM_PREVIEW));
    }

    lines.push(String::new());
    lines.push(format!(
        "Press y to {} them, any other key to cancel",
        action.verb()
    ));
    lines
}

fn render_summary(summary: &BulkSummary) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {} of {} accounts",
        summary.action.past_tense(),
        summary.succeeded,
        summary.attempted
    )
    .green()
    .to_string()];

    if !summary.failures.is_empty() {
        lines.push(String::new());
        lines.push(format!("{} failed:", summary.failures.len()).red().to_string());
        for (handle, reason) in &summary.failures {
            lines.push(format!("  @{handle}: {reason}"));
        }
    }

    lines.push(String::new());
    lines.push("Press any key to continue".dimmed().to_string());
    lines
}
