use serde::{Deserialize, Serialize};

/// The fixed set of publish targets. Every platform id stored in the
/// database must round-trip through this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    Tiktok,
    X,
    Facebook,
    Instagram,
    Youtube,
    YoutubeShorts,
    Pinterest,
}

impl Platform {
    /// Stable display order, used for selectable choices.
    pub const ALL: [Platform; 7] = [
        Platform::Tiktok,
        Platform::X,
        Platform::Facebook,
        Platform::Instagram,
        Platform::Youtube,
        Platform::YoutubeShorts,
        Platform::Pinterest,
    ];

    /// Maximum content length the platform accepts, in characters.
    pub fn char_limit(&self) -> u32 {
        match self {
            Self::Tiktok => 2200,
            Self::X => 280,
            Self::Facebook => 63206,
            Self::Instagram => 2200,
            Self::Youtube => 5000,
            Self::YoutubeShorts => 5000,
            Self::Pinterest => 500,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Tiktok => "TikTok",
            Self::X => "X",
            Self::Facebook => "Facebook",
            Self::Instagram => "Instagram",
            Self::Youtube => "YouTube",
            Self::YoutubeShorts => "YouTube Shorts",
            Self::Pinterest => "Pinterest",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "tiktok" => Some(Self::Tiktok),
            "x" => Some(Self::X),
            "facebook" => Some(Self::Facebook),
            "instagram" => Some(Self::Instagram),
            "youtube" => Some(Self::Youtube),
            "youtube-shorts" => Some(Self::YoutubeShorts),
            "pinterest" => Some(Self::Pinterest),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Tiktok => "tiktok",
            Self::X => "x",
            Self::Facebook => "facebook",
            Self::Instagram => "instagram",
            Self::Youtube => "youtube",
            Self::YoutubeShorts => "youtube-shorts",
            Self::Pinterest => "pinterest",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db())
    }
}

/// Decode a stored platform list, failing loudly on any id outside the
/// registry. An unknown id in the database is a configuration defect, not
/// user input.
pub fn platforms_from_db(values: &[String]) -> anyhow::Result<Vec<Platform>> {
    values
        .iter()
        .map(|value| {
            Platform::from_db(value).ok_or_else(|| anyhow::anyhow!("unknown platform: {}", value))
        })
        .collect()
}

pub fn platforms_as_db(platforms: &[Platform]) -> Vec<String> {
    platforms.iter().map(|p| p.as_db().to_string()).collect()
}
