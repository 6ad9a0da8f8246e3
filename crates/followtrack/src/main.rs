use crate::commands::candidates::{CandidateKind, CandidateOptions};
use crate::commands::check::CheckOptions;
use crate::commands::history::{HistoryOptions, StatsOptions};
use crate::commands::Context;
use crate::config::{resolve_home, BlueskyConfig, MastodonConfig};
use crate::platform::{BlueskyAdapter, MastodonAdapter, Platform, PlatformKind};
use crate::prelude::{println, *};
use clap::Parser;
use std::path::PathBuf;

mod check;
mod commands;
mod config;
mod error;
mod fetch;
mod platform;
mod prelude;
mod store;
mod terminal;
mod workflow;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Track who follows and unfollows you on Mastodon and Bluesky, and tidy up who you follow"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Social platform to work on
    #[clap(
        long,
        value_enum,
        env = "FOLLOWTRACK_PLATFORM",
        global = true,
        default_value = "mastodon"
    )]
    platform: PlatformKind,

    /// Directory holding credentials and follower databases
    #[clap(long, env = "FOLLOWTRACK_HOME", global = true)]
    home: Option<PathBuf>,

    /// Whether to display additional information.
    #[clap(long, env = "FOLLOWTRACK_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Store and verify credentials for the selected platform
    Setup,

    /// Fetch followers and record who followed or unfollowed since last time
    Check(CheckOptions),

    /// Show recorded follow and unfollow events
    History(HistoryOptions),

    /// Show follower totals and tracked changes
    Stats(StatsOptions),

    /// Accounts you follow that don't follow you back
    #[clap(name = "non-mutual")]
    NonMutual(CandidateOptions),

    /// Followers you don't follow back
    #[clap(name = "follow-back")]
    FollowBack(CandidateOptions),

    /// Interactive menu combining check, history and both candidate lists
    Dashboard,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();
    let ctx = Context {
        home: resolve_home(app.global.home)?,
        kind: app.global.platform,
        verbose: app.global.verbose,
    };

    if ctx.verbose {
        println!("Platform: {}", ctx.kind);
        println!("Home: {}", ctx.home.display());
        println!();
    }

    match app.command {
        SubCommands::Setup => commands::setup::run(&ctx).await,
        SubCommands::History(options) => commands::history::run_history(options, &ctx),
        SubCommands::Stats(options) => commands::history::run_stats(options, &ctx),
        command => match ctx.kind {
            PlatformKind::Mastodon => {
                let config = MastodonConfig::load(&ctx.home)?;
                dispatch(&MastodonAdapter::new(&config)?, command, &ctx).await
            }
            PlatformKind::Bluesky => {
                let config = BlueskyConfig::load(&ctx.home)?;
                dispatch(&BlueskyAdapter::new(&config)?, command, &ctx).await
            }
        },
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}

/// Commands that talk to the platform.
async fn dispatch<P: Platform>(platform: &P, command: SubCommands, ctx: &Context) -> Result<()> {
    match command {
        SubCommands::Check(options) => commands::check::run(platform, options, ctx).await,
        SubCommands::NonMutual(options) => {
            commands::candidates::run(platform, CandidateKind::NonMutual, options, ctx).await
        }
        SubCommands::FollowBack(options) => {
            commands::candidates::run(platform, CandidateKind::FollowBack, options, ctx).await
        }
        SubCommands::Dashboard => commands::dashboard::run(platform, ctx).await,
        SubCommands::Setup | SubCommands::History(_) | SubCommands::Stats(_) => {
            Err(eyre!("command does not need a platform connection"))
        }
    }
}
