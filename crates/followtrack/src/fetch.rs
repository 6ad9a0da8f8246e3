//! Paginated list retrieval

use crate::error;
use crate::platform::Platform;
use followtrack_core::account::{Account, ListKind, Page};
use indicatif::ProgressBar;
use log::debug;
use std::future::Future;
use std::time::Duration;

/// Pause between page requests.
pub const PAGE_PACING: Duration = Duration::from_millis(500);

/// Helper to set spinner message if spinner is present
pub fn set_spinner_msg(spinner: Option<&ProgressBar>, msg: impl Into<String>) {
    if let Some(s) = spinner {
        s.set_message(msg.into());
    }
}

/// Sleep for `pacing`, skipping the timer entirely for a zero interval.
pub async fn pause(pacing: Duration) {
    if !pacing.is_zero() {
        tokio::time::sleep(pacing).await;
    }
}

/// Fetch every page, starting from `initial_cursor`, until the cursor runs out.
///
/// Pages are concatenated in arrival order without de-duplication. Any page
/// failure aborts the whole fetch; nothing partial is returned.
pub async fn fetch_all<F, Fut>(
    mut fetch_page: F,
    initial_cursor: Option<String>,
    pacing: Duration,
    spinner: Option<&ProgressBar>,
) -> error::Result<Vec<Account>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = error::Result<Page>>,
{
    let mut accounts = Vec::new();
    let mut cursor = initial_cursor;
    let mut page = 1;

    loop {
        let Page {
            accounts: batch,
            next_cursor,
        } = fetch_page(cursor.take()).await?;

        debug!("page {page}: {} accounts", batch.len());
        accounts.extend(batch);

        match next_cursor.filter(|c| !c.is_empty()) {
            Some(next) => {
                cursor = Some(next);
                page += 1;
                set_spinner_msg(
                    spinner,
                    format!("Fetching page {page} ({} so far)...", accounts.len()),
                );
                pause(pacing).await;
            }
            None => break,
        }
    }

    Ok(accounts)
}

/// Fetch a complete followers or following list.
pub async fn fetch_list<P: Platform>(
    platform: &P,
    session: &P::Session,
    kind: ListKind,
    pacing: Duration,
    spinner: Option<&ProgressBar>,
) -> error::Result<Vec<Account>> {
    set_spinner_msg(spinner, format!("Fetching {kind}..."));
    let accounts = fetch_all(
        move |cursor| platform.list_page(session, kind, cursor),
        None,
        pacing,
        spinner,
    )
    .await?;
    debug!("fetched {} {kind}", accounts.len());
    Ok(accounts)
}
