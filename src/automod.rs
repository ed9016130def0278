//! Automatic message filters toggled per guild
//!
//! The per-guild switches live in the guild document under `automod.<feature>`.
//! Checks here are pure; the event handler deletes the message and posts the
//! notice.

use crate::store::Document;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static INVITE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(discord\.gg|discordapp\.com/invite)").expect("Valid invite regex")
});

static LINK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)https?://").expect("Valid URL regex"));

/// A filter that can be switched on or off for a guild
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutomodFeature {
    Badwords,
    Invites,
    Links,
}

impl AutomodFeature {
    pub const ALL: [Self; 3] = [Self::Badwords, Self::Invites, Self::Links];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Badwords => "badwords",
            Self::Invites => "invites",
            Self::Links => "links",
        }
    }

    /// Path of this feature's switch in the guild document
    #[must_use]
    pub fn config_path(self) -> String {
        format!("automod.{}", self.as_str())
    }
}

impl fmt::Display for AutomodFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AutomodFeature {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let name = name.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|feature| feature.as_str() == name)
            .ok_or_else(|| {
                format!(
                    "Invalid feature. Valid: {}",
                    Self::ALL.map(Self::as_str).join(", ")
                )
            })
    }
}

/// Which filters are enabled for a guild
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutomodSettings {
    pub badwords: bool,
    pub invites: bool,
    pub links: bool,
}

impl AutomodSettings {
    /// Read the switches from a guild document; missing switches are off
    #[must_use]
    pub fn from_config(config: &Document) -> Self {
        let enabled = |feature: AutomodFeature| {
            config
                .get_bool(&feature.config_path())
                .unwrap_or(false)
        };
        Self {
            badwords: enabled(AutomodFeature::Badwords),
            invites: enabled(AutomodFeature::Invites),
            links: enabled(AutomodFeature::Links),
        }
    }

    #[must_use]
    pub const fn any_enabled(&self) -> bool {
        self.badwords || self.invites || self.links
    }
}

/// Why a message was removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutomodViolation {
    BadWord,
    Invite,
    Link,
}

impl AutomodViolation {
    /// Text sent to the channel after the author's mention
    #[must_use]
    pub const fn notice(self) -> &'static str {
        match self {
            Self::BadWord => "your message was removed for bad language.",
            Self::Invite => "invites are not allowed.",
            Self::Link => "links are not allowed.",
        }
    }
}

/// Message filter with the bot-wide word list
#[derive(Debug, Clone)]
pub struct Automod {
    badwords: Vec<String>,
}

impl Automod {
    #[must_use]
    pub fn new(badwords: &[String]) -> Self {
        Self {
            badwords: badwords
                .iter()
                .map(|word| word.trim().to_lowercase())
                .filter(|word| !word.is_empty())
                .collect(),
        }
    }

    /// First enabled filter the content trips, checked in the order badwords, invites, links
    #[must_use]
    pub fn check(&self, settings: &AutomodSettings, content: &str) -> Option<AutomodViolation> {
        if settings.badwords {
            let lowered = content.to_lowercase();
            if self.badwords.iter().any(|word| lowered.contains(word.as_str())) {
                return Some(AutomodViolation::BadWord);
            }
        }
        if settings.invites && INVITE_PATTERN.is_match(content) {
            return Some(AutomodViolation::Invite);
        }
        if settings.links && LINK_PATTERN.is_match(content) {
            return Some(AutomodViolation::Link);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn automod() -> Automod {
        Automod::new(&["heck".to_string(), "  ".to_string()])
    }

    const ALL_ON: AutomodSettings = AutomodSettings {
        badwords: true,
        invites: true,
        links: true,
    };

    #[test]
    fn test_disabled_filters_never_trip() {
        let settings = AutomodSettings::default();
        assert!(!settings.any_enabled());
        assert_eq!(
            automod().check(&settings, "heck https://discord.gg/abc"),
            None
        );
    }

    #[test]
    fn test_badwords_case_insensitive() {
        assert_eq!(
            automod().check(&ALL_ON, "What the HECK"),
            Some(AutomodViolation::BadWord)
        );
        assert_eq!(automod().check(&ALL_ON, "hello there"), None);
    }

    #[test]
    fn test_invite_before_link() {
        assert_eq!(
            automod().check(&ALL_ON, "join https://discord.gg/xyz"),
            Some(AutomodViolation::Invite)
        );
        let links_only = AutomodSettings {
            links: true,
            ..AutomodSettings::default()
        };
        assert_eq!(
            automod().check(&links_only, "see http://example.com"),
            Some(AutomodViolation::Link)
        );
        assert_eq!(automod().check(&links_only, "discordapp.com/invite/x"), None);
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = Document::new();
        config.set_path("automod.invites", true);
        config.set_path("automod.links", false);

        let settings = AutomodSettings::from_config(&config);
        assert_eq!(
            settings,
            AutomodSettings {
                badwords: false,
                invites: true,
                links: false,
            }
        );
        assert!(settings.any_enabled());
    }

    #[test]
    fn test_feature_parse() {
        assert_eq!("Links".parse::<AutomodFeature>(), Ok(AutomodFeature::Links));
        assert_eq!(AutomodFeature::Badwords.config_path(), "automod.badwords");
        let err = "caps".parse::<AutomodFeature>().unwrap_err();
        assert_eq!(err, "Invalid feature. Valid: badwords, invites, links");
    }
}
