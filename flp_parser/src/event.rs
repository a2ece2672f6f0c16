use serde::Serialize;

/// Event identifiers. The payload size is fixed by the range an id falls in.
pub mod id {
    pub const BYTE: u8 = 0;
    pub const WORD: u8 = 64;
    pub const DWORD: u8 = 128;
    pub const TEXT: u8 = 192;
    pub const DATA: u8 = 208;

    pub const CHANNEL_TYPE: u8 = BYTE + 21;

    pub const CHANNEL_NEW: u8 = WORD;
    pub const PATTERN_NEW: u8 = WORD + 1;
    pub const TEMPO_COARSE: u8 = WORD + 2;
    pub const TEMPO_FINE: u8 = WORD + 29;
    pub const SLOT_INDEX: u8 = WORD + 34;
    pub const ARRANGEMENT_NEW: u8 = WORD + 35;

    pub const INSERT_OUTPUT: u8 = DWORD + 19;
    pub const TEMPO: u8 = DWORD + 28;

    pub const DEFAULT_NAME: u8 = TEXT;
    pub const PATTERN_NAME: u8 = TEXT + 1;
    pub const TITLE: u8 = TEXT + 2;
    pub const COMMENTS: u8 = TEXT + 3;
    pub const SAMPLE_PATH: u8 = TEXT + 4;
    pub const URL: u8 = TEXT + 5;
    pub const VERSION: u8 = TEXT + 7;
    pub const NAME: u8 = TEXT + 11;
    pub const INSERT_NAME: u8 = TEXT + 12;
    pub const GENRE: u8 = TEXT + 14;
    pub const ARTISTS: u8 = TEXT + 15;
    pub const TRACK_NAME: u8 = TEXT + 47;
    pub const ARRANGEMENT_NAME: u8 = TEXT + 49;

    pub const PLUGIN_WRAPPER: u8 = DATA + 4;
    pub const PATTERN_NOTES: u8 = DATA + 16;
    pub const INSERT_ROUTING: u8 = DATA + 27;
    pub const INSERT_FLAGS: u8 = DATA + 28;
    pub const TRACK_DATA: u8 = DATA + 30;

    /// Events that only occur once the mixer section of a project has started.
    pub fn is_mixer(id: u8) -> bool {
        matches!(
            id,
            SLOT_INDEX | INSERT_OUTPUT | INSERT_NAME | INSERT_ROUTING | INSERT_FLAGS
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventData {
    Byte(u8),
    Word(u16),
    Dword(u32),
    Blob(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: u8,
    pub data: EventData,
}

impl Event {
    pub fn byte(id: u8, value: u8) -> Self {
        Self { id, data: EventData::Byte(value) }
    }

    pub fn word(id: u8, value: u16) -> Self {
        Self { id, data: EventData::Word(value) }
    }

    pub fn dword(id: u8, value: u32) -> Self {
        Self { id, data: EventData::Dword(value) }
    }

    pub fn blob(id: u8, bytes: impl Into<Vec<u8>>) -> Self {
        Self { id, data: EventData::Blob(bytes.into()) }
    }

    /// Text event encoded the way a project with `encoding` stores it,
    /// including the NUL terminator FL Studio writes.
    pub fn text(id: u8, value: &str, encoding: TextEncoding) -> Self {
        Self::blob(id, encoding.encode(value))
    }

    pub fn to_u8(&self) -> Option<u8> {
        match self.data {
            EventData::Byte(v) => Some(v),
            _ => None,
        }
    }

    pub fn to_u16(&self) -> Option<u16> {
        match self.data {
            EventData::Byte(v) => Some(v.into()),
            EventData::Word(v) => Some(v),
            _ => None,
        }
    }

    pub fn to_u32(&self) -> Option<u32> {
        match self.data {
            EventData::Byte(v) => Some(v.into()),
            EventData::Word(v) => Some(v.into()),
            EventData::Dword(v) => Some(v),
            EventData::Blob(_) => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.data {
            EventData::Blob(b) => Some(b),
            _ => None,
        }
    }

    pub fn to_str(&self, encoding: TextEncoding) -> Option<String> {
        // The version string is ASCII even in UTF-16 projects.
        let encoding = if self.id == id::VERSION {
            TextEncoding::Latin1
        } else {
            encoding
        };
        self.as_bytes().map(|b| encoding.decode(b))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextEncoding {
    Utf16Le,
    Latin1,
}

impl TextEncoding {
    /// FL Studio switched to UTF-16LE text in 11.5. Unparsable versions are
    /// treated as modern.
    pub fn for_version(version: &str) -> Self {
        let mut parts = version.split('.').map(|p| p.trim().parse::<u32>());
        match (parts.next(), parts.next()) {
            (Some(Ok(major)), Some(Ok(minor))) if (major, minor) < (11, 5) => Self::Latin1,
            (Some(Ok(major)), None) if major < 11 => Self::Latin1,
            _ => Self::Utf16Le,
        }
    }

    /// Encoding of every text event in `events`, chosen from the version event.
    pub fn detect(events: &[Event]) -> Self {
        events
            .iter()
            .find(|e| e.id == id::VERSION)
            .and_then(|e| e.to_str(Self::Latin1))
            .map(|v| Self::for_version(&v))
            .unwrap_or(Self::Utf16Le)
    }

    pub fn decode(self, bytes: &[u8]) -> String {
        let s: String = match self {
            Self::Utf16Le => {
                let units = bytes
                    .chunks_exact(2)
                    .map(|c| u16::from_le_bytes([c[0], c[1]]));
                char::decode_utf16(units)
                    .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
                    .collect()
            }
            Self::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
        };
        s.trim_end_matches('\0').to_string()
    }

    pub fn encode(self, value: &str) -> Vec<u8> {
        match self {
            Self::Utf16Le => value
                .encode_utf16()
                .chain(std::iter::once(0))
                .flat_map(u16::to_le_bytes)
                .collect(),
            Self::Latin1 => value
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                .chain(std::iter::once(0))
                .collect(),
        }
    }
}
