use super::candidates::{interact, load_candidates, summary_lines, CandidateKind};
use super::check::format_report;
use super::history::{format_stats, history_table};
use super::{connect, setup, Context};
use crate::check::{now_timestamp, run_check};
use crate::config::{BlueskyConfig, MastodonConfig};
use crate::fetch::PAGE_PACING;
use crate::platform::{Platform, PlatformKind};
use crate::prelude::*;
use crate::store::SnapshotStore;
use crate::terminal::{RawTerminal, Terminal};
use colored::Colorize;
use followtrack_core::display::format_change_time;
use followtrack_core::reconcile::ChangeAction;
use followtrack_core::selection::{BulkSummary, Key};

const RECENT_CHANGES: usize = 5;
const HISTORY_ROWS: usize = 20;

/// How the menu loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardExit {
    Quit,
    /// Leave the menu and rerun the setup prompts.
    Reconfigure,
}

pub async fn run<P: Platform>(platform: &P, ctx: &Context) -> Result<()> {
    let session = connect(platform).await?;
    let mut store = ctx.open_store()?;
    let settings = settings_lines(ctx);
    let mut terminal = RawTerminal::new()?;

    let exit = run_dashboard(platform, &session, &mut terminal, &mut store, &settings).await?;
    drop(terminal);

    match exit {
        DashboardExit::Reconfigure => setup::run(ctx).await,
        DashboardExit::Quit => Ok(()),
    }
}

/// Menu loop: stats and recent changes, one key per screen.
pub async fn run_dashboard<P: Platform, T: Terminal>(
    platform: &P,
    session: &P::Session,
    terminal: &mut T,
    store: &mut SnapshotStore,
    settings: &[String],
) -> Result<DashboardExit> {
    let mut notice: Option<String> = None;

    loop {
        terminal.draw(&menu(platform, store, notice.take())?)?;

        match terminal.read_key()? {
            Key::Char('c') | Key::Char('C') => {
                terminal.draw(&["Checking followers...".to_string()])?;
                let lines = match run_check(
                    platform,
                    session,
                    store,
                    PAGE_PACING,
                    &now_timestamp(),
                    None,
                )
                .await
                {
                    Ok(report) => text_lines(&format_report(&report)),
                    Err(e) => vec![f!("{} {e}", "Check failed:".red())],
                };
                pager(terminal, lines)?;
            }
            Key::Char('h') | Key::Char('H') => {
                let changes = store.recent_changes(HISTORY_ROWS)?;
                let lines = if changes.is_empty() {
                    vec!["No follower changes recorded yet.".to_string()]
                } else {
                    text_lines(&history_table(&changes).to_string())
                };
                pager(terminal, lines)?;
            }
            Key::Char(c @ ('n' | 'N' | 'f' | 'F')) => {
                let kind = if c.eq_ignore_ascii_case(&'n') {
                    CandidateKind::NonMutual
                } else {
                    CandidateKind::FollowBack
                };
                notice = Some(candidates(platform, session, terminal, kind).await?);
            }
            Key::Char('s') | Key::Char('S') => {
                let mut lines = settings.to_vec();
                lines.push(String::new());
                lines.push("r reconfigure  b back".dimmed().to_string());
                terminal.draw(&lines)?;

                loop {
                    match terminal.read_key()? {
                        Key::Char('r') | Key::Char('R') => return Ok(DashboardExit::Reconfigure),
                        Key::Char('b') | Key::Char('B') => break,
                        _ => {}
                    }
                }
            }
            Key::Char('q') | Key::Char('Q') => return Ok(DashboardExit::Quit),
            _ => {}
        }
    }
}

async fn candidates<P: Platform, T: Terminal>(
    platform: &P,
    session: &P::Session,
    terminal: &mut T,
    kind: CandidateKind,
) -> Result<String> {
    terminal.draw(&[f!("Loading {}...", kind.title().to_lowercase())])?;

    let list = match load_candidates(platform, session, kind, None).await {
        Ok(list) => list,
        Err(e) => return Ok(f!("{} {e}", "Fetch failed:".red())),
    };
    if list.candidates.is_empty() {
        return Ok(f!("{}  {}", kind.all_clear(), summary_lines(kind, &list).join("  ")));
    }

    Ok(match interact(platform, session, terminal, kind, &list).await? {
        Some(summary) => summary_notice(&summary),
        None => summary_lines(kind, &list).join("  "),
    })
}

/// Settings screen body: where data lives and the stored credentials, masked.
pub fn settings_lines(ctx: &Context) -> Vec<String> {
    let mut lines = vec![
        "Settings".bold().to_string(),
        String::new(),
        f!("Platform: {}", ctx.kind),
        f!("Home: {}", ctx.home.display()),
    ];

    let fields = match ctx.kind {
        PlatformKind::Mastodon => MastodonConfig::load(&ctx.home).map(|c| c.describe()),
        PlatformKind::Bluesky => BlueskyConfig::load(&ctx.home).map(|c| c.describe()),
    };
    match fields {
        Ok(fields) => lines.extend(fields.into_iter().map(|(label, value)| f!("{label}: {value}"))),
        Err(e) => lines.push(e.to_string().red().to_string()),
    }

    lines
}

fn summary_notice(summary: &BulkSummary) -> String {
    let mut notice = f!(
        "{} {} of {} accounts",
        summary.action.past_tense(),
        summary.succeeded,
        summary.attempted
    );
    if !summary.failures.is_empty() {
        notice.push_str(&f!(", {} failed", summary.failures.len()));
    }
    notice
}

fn text_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}

/// Show `lines` until a key is pressed.
fn pager<T: Terminal>(terminal: &mut T, mut lines: Vec<String>) -> Result<()> {
    lines.push(String::new());
    lines.push("Press any key to return".dimmed().to_string());
    terminal.draw(&lines)?;
    terminal.read_key()?;
    Ok(())
}

fn menu<P: Platform>(
    platform: &P,
    store: &SnapshotStore,
    notice: Option<String>,
) -> Result<Vec<String>> {
    let stats = store.stats()?;
    let mut lines = vec![
        f!("followtrack · {}", platform.kind()).bold().to_string(),
        String::new(),
    ];
    lines.extend(format_stats(&stats));
    lines.push(String::new());

    let recent = store.recent_changes(RECENT_CHANGES)?;
    if recent.is_empty() {
        lines.push("No changes recorded yet".dimmed().to_string());
    } else {
        lines.push("Recent changes:".bold().to_string());
        for change in recent {
            let sign = match change.action {
                ChangeAction::Follow => "+".green(),
                ChangeAction::Unfollow => "-".red(),
            };
            lines.push(f!(
                "  {sign} {} @{} ({})",
                change.display_name,
                change.handle,
                format_change_time(&change.timestamp)
            ));
        }
    }

    lines.push(String::new());
    lines.push(
        "c check  h history  n non-mutual  f follow back  s settings  q quit"
            .dimmed()
            .to_string(),
    );
    if let Some(notice) = notice {
        lines.push(notice.yellow().to_string());
    }

    Ok(lines)
}
