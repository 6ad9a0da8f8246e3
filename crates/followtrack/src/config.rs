use crate::error::{self, Error};
use crate::platform::PlatformKind;
use followtrack_core::display::normalize_instance_url;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Default Bluesky PDS entryway.
pub const DEFAULT_BLUESKY_SERVICE: &str = "https://bsky.social";

/// Resolve (and create) the directory holding config files and databases.
pub fn resolve_home(home_override: Option<PathBuf>) -> error::Result<PathBuf> {
    let home = match home_override {
        Some(path) => path,
        None => dirs_next::data_dir()
            .ok_or_else(|| Error::Config("Unable to determine data directory".to_string()))?
            .join("followtrack"),
    };

    fs::create_dir_all(&home)
        .map_err(|e| Error::Config(format!("Failed to create {}: {}", home.display(), e)))?;

    Ok(home)
}

pub fn config_path(home: &Path, kind: PlatformKind) -> PathBuf {
    home.join(format!("{kind}.json"))
}

pub fn database_path(home: &Path, kind: PlatformKind) -> PathBuf {
    home.join(format!("{kind}.db"))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> error::Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;

    serde_json::from_str(&raw).map(Some).map_err(|e| {
        Error::Config(format!(
            "Corrupted configuration file {} ({}). Please run setup again.",
            path.display(),
            e
        ))
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> error::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| Error::Config(format!("Failed to serialize configuration: {}", e)))?;

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    std::os::unix::fs::OpenOptionsExt::mode(&mut options, 0o600);

    let write = |path: &Path| -> std::io::Result<()> {
        let mut file = options.open(path)?;
        // Existing files keep their mode on open, so tighten it here too.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(json.as_bytes())
    };

    write(path).map_err(|e| Error::Config(format!("Failed to write {}: {}", path.display(), e)))
}

/// Keep enough of a secret to recognize it.
fn mask(secret: &str) -> String {
    let shown: String = secret.chars().take(4).collect();
    if secret.chars().count() > 8 {
        format!("{shown}...")
    } else {
        "...".to_string()
    }
}

fn require(value: Option<String>, what: &str) -> error::Result<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::Config(format!("{what} cannot be empty"))),
    }
}

fn not_configured(kind: PlatformKind) -> Error {
    Error::Config(format!(
        "{kind} is not configured. Run `followtrack --platform {kind} setup` first."
    ))
}

/// Mastodon credentials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MastodonConfig {
    pub instance: String,
    pub token: String,
}

impl MastodonConfig {
    pub fn new(instance: &str, token: &str) -> error::Result<Self> {
        let instance = normalize_instance_url(instance).map_err(Error::Config)?;
        let token = require(Some(token.to_string()), "Access token")?;
        Ok(Self { instance, token })
    }

    /// Load from the config file, with `MASTODON_INSTANCE` and `MASTODON_TOKEN`
    /// taking precedence.
    pub fn load(home: &Path) -> error::Result<Self> {
        Self::load_with(home, |key| std::env::var(key).ok())
    }

    pub fn load_with(home: &Path, env: impl Fn(&str) -> Option<String>) -> error::Result<Self> {
        let stored: Option<Self> = read_json(&config_path(home, PlatformKind::Mastodon))?;

        let instance = env("MASTODON_INSTANCE").or(stored.as_ref().map(|c| c.instance.clone()));
        let token = env("MASTODON_TOKEN").or(stored.map(|c| c.token));

        match (instance, token) {
            (Some(instance), Some(token)) => Self::new(&instance, &token),
            _ => Err(not_configured(PlatformKind::Mastodon)),
        }
    }

    pub fn save(&self, home: &Path) -> error::Result<()> {
        write_json(&config_path(home, PlatformKind::Mastodon), self)
    }

    /// Labelled values for display, with the token masked.
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        vec![("Instance", self.instance.clone()), ("Token", mask(&self.token))]
    }
}

fn default_service() -> String {
    DEFAULT_BLUESKY_SERVICE.to_string()
}

/// Bluesky credentials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlueskyConfig {
    pub handle: String,
    pub password: String,
    #[serde(default = "default_service")]
    pub service: String,
}

impl BlueskyConfig {
    pub fn new(handle: &str, password: &str, service: Option<&str>) -> error::Result<Self> {
        let handle = require(Some(handle.trim_start_matches('@').to_string()), "Handle")?;
        let password = require(Some(password.to_string()), "Password")?;
        let service = match service {
            Some(s) => normalize_instance_url(s).map_err(Error::Config)?,
            None => default_service(),
        };
        Ok(Self {
            handle,
            password,
            service,
        })
    }

    /// Load from the config file, with `BLUESKY_HANDLE`, `BLUESKY_PASSWORD` and
    /// `BLUESKY_SERVICE` taking precedence.
    pub fn load(home: &Path) -> error::Result<Self> {
        Self::load_with(home, |key| std::env::var(key).ok())
    }

    pub fn load_with(home: &Path, env: impl Fn(&str) -> Option<String>) -> error::Result<Self> {
        let stored: Option<Self> = read_json(&config_path(home, PlatformKind::Bluesky))?;

        let handle = env("BLUESKY_HANDLE").or(stored.as_ref().map(|c| c.handle.clone()));
        let password = env("BLUESKY_PASSWORD").or(stored.as_ref().map(|c| c.password.clone()));
        let service = env("BLUESKY_SERVICE").or(stored.map(|c| c.service));

        match (handle, password) {
            (Some(handle), Some(password)) => Self::new(&handle, &password, service.as_deref()),
            _ => Err(not_configured(PlatformKind::Bluesky)),
        }
    }

    pub fn save(&self, home: &Path) -> error::Result<()> {
        write_json(&config_path(home, PlatformKind::Bluesky), self)
    }

    pub fn describe(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Handle", self.handle.clone()),
            ("Service", self.service.clone()),
            ("App password", mask(&self.password)),
        ]
    }
}
