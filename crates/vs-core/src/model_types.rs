use serde::{Deserialize, Serialize};

/// Frame shape requested from the generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AspectRatio {
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "16:9")]
    #[default]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "4:3")]
    Classic,
    #[serde(rename = "3:4")]
    ClassicPortrait,
    #[serde(rename = "21:9")]
    Ultrawide,
    #[serde(rename = "9:21")]
    Vertical,
}

impl AspectRatio {
    /// Value sent to the upstream API
    pub fn id(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
            Self::Classic => "4:3",
            Self::ClassicPortrait => "3:4",
            Self::Ultrawide => "21:9",
            Self::Vertical => "9:21",
        }
    }

    pub fn all() -> [AspectRatio; 7] {
        [
            Self::Landscape,
            Self::Portrait,
            Self::Square,
            Self::Classic,
            Self::ClassicPortrait,
            Self::Ultrawide,
            Self::Vertical,
        ]
    }

    /// Lenient lookup for values echoed back by upstream
    pub fn from_id(id: &str) -> Option<Self> {
        Self::all().into_iter().find(|a| a.id() == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Resolution {
    #[serde(rename = "540p")]
    Sd,
    #[serde(rename = "720p")]
    #[default]
    Hd,
    #[serde(rename = "1080p")]
    FullHd,
    #[serde(rename = "4k")]
    Uhd,
}

impl Resolution {
    pub fn id(&self) -> &'static str {
        match self {
            Self::Sd => "540p",
            Self::Hd => "720p",
            Self::FullHd => "1080p",
            Self::Uhd => "4k",
        }
    }

    pub fn all() -> [Resolution; 4] {
        [Self::Sd, Self::Hd, Self::FullHd, Self::Uhd]
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::all().into_iter().find(|r| r.id() == id)
    }
}

/// Clip length. The upstream model only accepts these two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum VideoDuration {
    #[serde(rename = "5s")]
    #[default]
    Short,
    #[serde(rename = "9s")]
    Long,
}

impl VideoDuration {
    pub fn id(&self) -> &'static str {
        match self {
            Self::Short => "5s",
            Self::Long => "9s",
        }
    }

    pub fn all() -> [VideoDuration; 2] {
        [Self::Short, Self::Long]
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::all().into_iter().find(|d| d.id() == id)
    }
}
