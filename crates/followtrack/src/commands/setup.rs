use super::{connect, Context};
use crate::config::{BlueskyConfig, MastodonConfig, DEFAULT_BLUESKY_SERVICE};
use crate::platform::{BlueskyAdapter, MastodonAdapter, PlatformKind};
use crate::prelude::{println, *};
use anstream::print;
use colored::Colorize;
use std::io::{BufRead, Write};

fn prompt(input: &mut impl BufRead, label: &str) -> Result<String> {
    print!("{label}: ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(eyre!("No input for {label}"));
    }
    Ok(line.trim().to_string())
}

/// Read Mastodon credentials from `input`.
pub fn ask_mastodon(input: &mut impl BufRead) -> Result<MastodonConfig> {
    println!("Create an application under Preferences > Development on your instance");
    println!("with the read and write:follows scopes, then paste its access token.\n");

    let instance = prompt(input, "Instance (e.g. mastodon.social)")?;
    let token = prompt(input, "Access token")?;
    Ok(MastodonConfig::new(&instance, &token)?)
}

/// Read Bluesky credentials from `input`.
pub fn ask_bluesky(input: &mut impl BufRead) -> Result<BlueskyConfig> {
    println!("Use an app password from Settings > Privacy and security > App passwords.\n");

    let handle = prompt(input, "Handle (e.g. alice.bsky.social)")?;
    let password = prompt(input, "App password")?;
    let service = prompt(input, &f!("Service [{DEFAULT_BLUESKY_SERVICE}]"))?;
    let service = (!service.is_empty()).then_some(service.as_str());
    Ok(BlueskyConfig::new(&handle, &password, service)?)
}

pub async fn run(ctx: &Context) -> Result<()> {
    println!("{}\n", f!("Setting up {}", ctx.kind).bold());
    let mut input = std::io::stdin().lock();

    match ctx.kind {
        PlatformKind::Mastodon => {
            let config = ask_mastodon(&mut input)?;
            connect(&MastodonAdapter::new(&config)?).await?;
            config.save(&ctx.home)?;
        }
        PlatformKind::Bluesky => {
            let config = ask_bluesky(&mut input)?;
            connect(&BlueskyAdapter::new(&config)?).await?;
            config.save(&ctx.home)?;
        }
    }

    ctx.open_store()?;
    println!(
        "{} Credentials verified and saved in {}",
        "✓".green(),
        ctx.home.display()
    );
    println!("Run `followtrack --platform {} check` to take the first snapshot.", ctx.kind);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_ask_mastodon_normalizes_instance() {
        let mut input = Cursor::new("mastodon.social/\n  secret-token \n");

        let config = ask_mastodon(&mut input).unwrap();

        assert_eq!(config.instance, "https://mastodon.social");
        assert_eq!(config.token, "secret-token");
    }

    #[test]
    fn test_ask_mastodon_rejects_empty_token() {
        let mut input = Cursor::new("mastodon.social\n\n");
        assert!(ask_mastodon(&mut input).is_err());
    }

    #[test]
    fn test_ask_bluesky_defaults_service() {
        let mut input = Cursor::new("@alice.bsky.social\napp-pass\n\n");

        let config = ask_bluesky(&mut input).unwrap();

        assert_eq!(config.handle, "alice.bsky.social");
        assert_eq!(config.service, DEFAULT_BLUESKY_SERVICE);
    }

    #[test]
    fn test_prompt_fails_on_eof() {
        let mut input = Cursor::new("");
        assert!(prompt(&mut input, "Handle").is_err());
    }
}
