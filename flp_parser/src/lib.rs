//! Reader for FL Studio project files (`.flp`).
//!
//! An FLP is a `FLhd` header chunk followed by a `FLdt` chunk holding a flat
//! stream of tagged events. [`parse_file`] returns that stream as-is;
//! [`load_project`] folds it into a [`Project`] object graph.

use std::{fs, path::Path};

mod error;
pub mod event;
mod model;
mod plugin;
mod project;
mod reader;
mod writer;

pub use error::{FlpError, FlpErrorKind};
pub use event::{Event, EventData, TextEncoding};
pub use model::{
    Arrangement, Channel, ChannelKind, Insert, Pattern, Plugin, Project, Slot, Tempo, Track,
};
pub use project::build_project;
pub use reader::{Header, Parsed};
pub use writer::encode_flp;

impl Parsed {
    pub fn encoding(&self) -> TextEncoding {
        TextEncoding::detect(&self.events)
    }

    pub fn project(&self) -> Project {
        build_project(self.header, &self.events)
    }
}

pub fn parse_file(path: impl AsRef<Path>) -> Result<Parsed, FlpError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| {
        FlpError::new("E2001", format!("failed to read {}: {e}", path.display()), 0)
    })?;
    log::debug!("read {} bytes from {}", bytes.len(), path.display());
    parse_bytes(&bytes)
}

pub fn parse_bytes(bytes: &[u8]) -> Result<Parsed, FlpError> {
    reader::parse_bytes(bytes)
}

pub fn load_project(path: impl AsRef<Path>) -> Result<Project, FlpError> {
    Ok(parse_file(path)?.project())
}
