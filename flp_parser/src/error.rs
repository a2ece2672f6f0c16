use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlpErrorKind {
    Header,
    Event,
    IO,
}

impl FlpErrorKind {
    pub(crate) fn from_code(code: &'static str) -> Self {
        match code {
            // Header
            "E1001" | "E1002" | "E1003" => Self::Header,

            // Event stream
            "E1004" | "E1005" => Self::Event,

            // IO
            "E2001" | "E2002" => Self::IO,

            _ => Self::Event,
        }
    }
}

#[derive(Debug, Error, Clone)]
#[error("{code}: {message} ({})", self.location())]
pub struct FlpError {
    pub code: &'static str,
    pub kind: FlpErrorKind,
    pub message: String,
    /// Byte offset into the file where decoding stopped.
    pub offset: u64,
    /// Id of the event being decoded, if its id byte was read.
    pub event_id: Option<u8>,
}

impl FlpError {
    pub(crate) fn new(code: &'static str, message: impl Into<String>, offset: u64) -> Self {
        Self {
            code,
            kind: FlpErrorKind::from_code(code),
            message: message.into(),
            offset,
            event_id: None,
        }
    }

    pub(crate) fn with_event_id(mut self, id: u8) -> Self {
        self.event_id = Some(id);
        self
    }

    fn location(&self) -> String {
        match self.event_id {
            Some(id) => format!("event {id} at offset {}", self.offset),
            None => format!("offset {}", self.offset),
        }
    }
}
