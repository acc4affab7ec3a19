use anyhow::{anyhow, Result};
use serenity::all::ChannelId;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

const CONFIG_PATH_REL_HOME: &str = ".config/rosterbot/config.toml";
const TOKEN_ENV_VAR: &str = "DISCORD_TOKEN";

/// Bot configuration
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Config {
    pub general: General,
    #[serde(default)]
    pub send: SendSettings,
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct General {
    #[serde(default)]
    pub discord_token: String,
    pub command_prefix: String,
    /// Global user names allowed to run every command, including `reload`.
    #[serde(default)]
    pub bot_owners: Vec<String>,
    /// Role names whose holders may run the moderation commands.
    #[serde(default)]
    pub moderator_roles: Vec<String>,
}

/// Settings for the `send` command.
#[derive(Default, serde::Serialize, serde::Deserialize)]
pub struct SendSettings {
    /// Used when `send` is given no text.
    pub default_message: Option<String>,
    /// Short names for channels, e.g. `"cs-3345" = 1234`.
    #[serde(default)]
    pub channels: HashMap<String, u64>,
}

impl SendSettings {
    pub fn channel(&self, alias: &str) -> Option<ChannelId> {
        self.channels
            .get(alias)
            .filter(|&&id| id != 0)
            .map(|&id| ChannelId::new(id))
    }
}

impl Config {
    fn config_path() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|p| p.join(CONFIG_PATH_REL_HOME))
            .ok_or(anyhow!("Could not find home directory"))
    }

    pub async fn load() -> Result<Self> {
        let path = Self::config_path()?;

        let mut file = tokio::fs::File::open(&path).await.map_err(|e| {
            anyhow!(
                "Could not open configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        let mut contents = String::new();
        file.read_to_string(&mut contents).await.map_err(|e| {
            anyhow!(
                "Could not read configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        let mut config = Self::parse(&contents, &path)?;
        if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
            config.general.discord_token = token;
        }
        if config.general.discord_token.is_empty() {
            return Err(anyhow!(
                "No Discord token: set `general.discord_token` in `{}` or {}",
                path.to_string_lossy(),
                TOKEN_ENV_VAR
            ));
        }

        Ok(config)
    }

    fn parse(contents: &str, path: &Path) -> Result<Self> {
        toml::from_str(contents).map_err(|e| {
            anyhow!(
                "Could not parse configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })
    }

    pub async fn reload(&mut self) -> Result<()> {
        let new = Self::load().await?;
        *self = new;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config() {
        let cfg = Config::parse(
            "[general]\ndiscord_token = \"abc\"\ncommand_prefix = \";\"\n",
            Path::new("config.toml"),
        )
        .unwrap();
        assert_eq!(cfg.general.command_prefix, ";");
        assert!(cfg.general.moderator_roles.is_empty());
        assert!(cfg.send.channels.is_empty());
        assert!(cfg.send.default_message.is_none());
    }

    #[test]
    fn send_aliases() {
        let cfg = Config::parse(
            r#"
            [general]
            command_prefix = "!"
            moderator_roles = ["Moderator", "Officer"]

            [send]
            default_message = "Office hours moved"

            [send.channels]
            "cs-3345" = 1234
            "#,
            Path::new("config.toml"),
        )
        .unwrap();
        assert_eq!(cfg.general.discord_token, "");
        assert_eq!(cfg.general.moderator_roles, vec!["Moderator", "Officer"]);
        assert_eq!(cfg.send.channel("cs-3345"), Some(ChannelId::new(1234)));
        assert_eq!(cfg.send.channel("cs-9999"), None);
        assert_eq!(
            cfg.send.default_message.as_deref(),
            Some("Office hours moved")
        );
    }

    #[test]
    fn parse_errors_name_the_file() {
        let err = Config::parse("[general", Path::new("/tmp/x.toml"))
            .err()
            .unwrap();
        assert!(err.to_string().contains("/tmp/x.toml"));
    }
}
