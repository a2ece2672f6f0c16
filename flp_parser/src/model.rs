use std::fmt;

use serde::Serialize;

use crate::{event::TextEncoding, reader::Header};

/// Tempo as stored in the file: beats per minute scaled by 1000.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(into = "f64")]
pub struct Tempo(pub u32);

impl Tempo {
    pub fn bpm(self) -> f64 {
        f64::from(self.0) / 1000.0
    }
}

impl From<Tempo> for f64 {
    fn from(t: Tempo) -> Self {
        t.bpm()
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (whole, frac) = (self.0 / 1000, self.0 % 1000);
        if frac == 0 {
            write!(f, "{whole}")
        } else {
            let frac = format!("{frac:03}");
            write!(f, "{whole}.{}", frac.trim_end_matches('0'))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Automation,
    Instrument,
    Layer,
    Sampler,
    Unknown(u8),
}

impl ChannelKind {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Sampler,
            2 | 4 => Self::Instrument,
            3 => Self::Layer,
            5 => Self::Automation,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Automation => f.write_str("Automation"),
            Self::Instrument => f.write_str("Instrument"),
            Self::Layer => f.write_str("Layer"),
            Self::Sampler => f.write_str("Sampler"),
            Self::Unknown(raw) => write!(f, "Unknown ({raw})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Plugin {
    Native {
        name: String,
    },
    ThirdParty {
        name: String,
        vendor: Option<String>,
        path: Option<String>,
    },
}

impl Plugin {
    pub fn name(&self) -> &str {
        match self {
            Self::Native { name } | Self::ThirdParty { name, .. } => name,
        }
    }

    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Native { .. } => None,
            Self::ThirdParty { path, .. } => path.as_deref(),
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Channel {
    pub index: u16,
    pub kind: ChannelKind,
    /// Name FL Studio gives the channel when it is created.
    pub default_name: Option<String>,
    /// Name set by the user, if the channel was renamed.
    pub name: Option<String>,
    pub sample_path: Option<String>,
    pub plugin: Option<Plugin>,
}

impl Channel {
    pub(crate) fn new(index: u16) -> Self {
        Self {
            index,
            kind: ChannelKind::Sampler,
            default_name: None,
            name: None,
            sample_path: None,
            plugin: None,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.default_name.as_deref())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slot {
    pub index: u16,
    pub name: Option<String>,
    pub plugin: Option<Plugin>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insert {
    pub index: usize,
    pub name: Option<String>,
    pub slots: Vec<Slot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pattern {
    pub index: u16,
    pub name: Option<String>,
    pub note_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    pub index: u32,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Arrangement {
    pub index: u16,
    pub name: Option<String>,
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    pub header: Header,
    pub encoding: TextEncoding,
    pub version: Option<String>,
    pub title: Option<String>,
    pub artists: Option<String>,
    pub genre: Option<String>,
    pub comments: Option<String>,
    pub url: Option<String>,
    pub tempo: Option<Tempo>,
    pub channels: Vec<Channel>,
    pub inserts: Vec<Insert>,
    pub patterns: Vec<Pattern>,
    pub arrangements: Vec<Arrangement>,
}
