use crate::config::database_path;
use crate::platform::{Platform, PlatformKind};
use crate::prelude::{println, *};
use crate::store::SnapshotStore;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

pub mod candidates;
pub mod check;
pub mod dashboard;
pub mod history;
pub mod setup;

/// Resolved global options shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub home: PathBuf,
    pub kind: PlatformKind,
    pub verbose: bool,
}

impl Context {
    pub fn open_store(&self) -> Result<SnapshotStore> {
        let path = database_path(&self.home, self.kind);
        if self.verbose {
            println!("Database: {}", path.display());
        }
        Ok(SnapshotStore::open(&path)?)
    }
}

pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(message.to_string());
    spinner
}

/// Sign in, showing a spinner while the platform answers.
pub async fn connect<P: Platform>(platform: &P) -> Result<P::Session> {
    let progress = spinner(&f!("Signing in to {}...", platform.kind()));
    let session = platform.check_session().await;
    progress.finish_and_clear();
    Ok(session?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_store_verbose() {
        let home = tempfile::TempDir::new().unwrap();
        let ctx = Context {
            home: home.path().to_path_buf(),
            kind: PlatformKind::Bluesky,
            verbose: true,
        };

        let store = ctx.open_store().unwrap();

        assert_eq!(store.stats().unwrap().current_followers, 0);
        assert!(database_path(home.path(), PlatformKind::Bluesky).exists());
    }
}
