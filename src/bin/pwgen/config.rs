//! Settings, read from `$PWGEN_CONFIG` or `~/.pwgen/config.yaml`. Every setting is optional.

use std::env;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use pwgen::session::StoreOptions;
use pwgen::CharacterSets;

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Config {
    /// Language used until a conversation picks its own.
    pub default_language: String,
    /// Where sessions are kept; `PWGEN_SESSION_DIR` takes precedence.
    pub session_dir: Option<PathBuf>,
    pub session_ttl_secs: u64,
    pub store_timeout_ms: u64,
    /// Replaces the standard special-symbol table.
    pub special_symbols: Option<String>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            default_language: pwgen::i18n::FALLBACK_LANGUAGE.to_owned(),
            session_dir: None,
            session_ttl_secs: pwgen::session::DEFAULT_TTL.as_secs(),
            store_timeout_ms: pwgen::session::DEFAULT_TIMEOUT.as_millis() as u64,
            special_symbols: None,
        }
    }
}

impl Config {
    pub(crate) fn load() -> anyhow::Result<Config> {
        let path = match env::var_os("PWGEN_CONFIG") {
            Some(path) => Some(PathBuf::from(path)),
            None => default_config_path().filter(|path| path.exists()),
        };
        let mut config = match path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading configuration");
                Config::from_file(&path)?
            }
            None => Config::default(),
        };
        if let Some(dir) = env::var_os("PWGEN_SESSION_DIR") {
            config.session_dir = Some(PathBuf::from(dir));
        }
        Ok(config)
    }

    fn from_file(path: &Path) -> anyhow::Result<Config> {
        let file = File::open(path)
            .with_context(|| format!("failed to open config file {}", path.display()))?;
        Config::from_reader(file)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    fn from_reader(rdr: impl Read) -> anyhow::Result<Config> {
        let config: Config = serde_yaml::from_reader(rdr)?;
        if config.store_timeout_ms == 0 {
            anyhow::bail!("`store_timeout_ms` must be greater than zero");
        }
        if config.special_symbols.as_deref() == Some("") {
            anyhow::bail!("`special_symbols` must not be empty");
        }
        Ok(config)
    }

    pub(crate) fn session_dir(&self) -> anyhow::Result<PathBuf> {
        match &self.session_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(pwgen_home()?.join("sessions")),
        }
    }

    pub(crate) fn store_options(&self) -> StoreOptions {
        StoreOptions {
            ttl: Duration::from_secs(self.session_ttl_secs),
            timeout: Duration::from_millis(self.store_timeout_ms),
        }
    }

    pub(crate) fn character_sets(&self) -> CharacterSets {
        match &self.special_symbols {
            Some(special) => CharacterSets::standard().with_special_symbols(special),
            None => CharacterSets::standard(),
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    pwgen_home().ok().map(|home| home.join("config.yaml"))
}

fn pwgen_home() -> anyhow::Result<PathBuf> {
    let home = env::var_os("HOME")
        .ok_or_else(|| anyhow::anyhow!("HOME is not set; cannot find home directory of user"))?;
    let mut path = PathBuf::from(home);
    path.push(".pwgen");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use pwgen::Category;

    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_reader("{}".as_bytes()).unwrap();
        assert_eq!(config.default_language, "en");
        assert_eq!(config.store_options(), StoreOptions::default());
        assert_eq!(config.character_sets(), CharacterSets::standard());
    }

    #[test]
    fn reads_every_setting() {
        let yaml = "\
default_language: ru
session_dir: /tmp/pwgen-sessions
session_ttl_secs: 60
store_timeout_ms: 500
special_symbols: \"!?\"
";
        let config = Config::from_reader(yaml.as_bytes()).unwrap();
        assert_eq!(config.default_language, "ru");
        assert_eq!(
            config.session_dir().unwrap(),
            PathBuf::from("/tmp/pwgen-sessions")
        );
        assert_eq!(
            config.store_options(),
            StoreOptions {
                ttl: Duration::from_secs(60),
                timeout: Duration::from_millis(500),
            }
        );
        assert_eq!(
            config.character_sets().category(Category::SpecialSymbols),
            ['!', '?']
        );
    }

    #[test]
    fn rejects_unknown_settings() {
        assert!(Config::from_reader("colour: blue\n".as_bytes()).is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        assert!(Config::from_reader("store_timeout_ms: 0\n".as_bytes()).is_err());
    }

    #[test]
    fn rejects_empty_special_symbols() {
        let err = Config::from_reader("special_symbols: \"\"\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("special_symbols"));
    }
}
