use std::collections::BTreeMap;

use crate::{
    event::{id, Event, TextEncoding},
    model::{Arrangement, Channel, ChannelKind, Insert, Pattern, Project, Slot, Tempo, Track},
    plugin::{parse_wrapper, resolve_plugin, WrapperInfo},
    reader::Header,
};

const NOTE_SIZE: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Project,
    Channels,
    Arrangements,
    Mixer,
}

/// Plugin events seen since the last channel or slot boundary.
#[derive(Debug, Default)]
struct PendingPlugin {
    internal_name: Option<String>,
    name: Option<String>,
    wrapper: Option<WrapperInfo>,
}

impl PendingPlugin {
    fn is_empty(&self) -> bool {
        self.internal_name.is_none() && self.name.is_none() && self.wrapper.is_none()
    }
}

struct Builder {
    encoding: TextEncoding,
    section: Section,
    project: Project,
    tempo_coarse: Option<u16>,
    tempo_fine: Option<u16>,
    channel_wrapper: Option<WrapperInfo>,
    patterns: BTreeMap<u16, Pattern>,
    current_pattern: Option<u16>,
    insert: Insert,
    slot: PendingPlugin,
}

impl Builder {
    fn new(header: Header, encoding: TextEncoding) -> Self {
        Self {
            encoding,
            section: Section::Project,
            project: Project {
                header,
                encoding,
                version: None,
                title: None,
                artists: None,
                genre: None,
                comments: None,
                url: None,
                tempo: None,
                channels: Vec::new(),
                inserts: Vec::new(),
                patterns: Vec::new(),
                arrangements: Vec::new(),
            },
            tempo_coarse: None,
            tempo_fine: None,
            channel_wrapper: None,
            patterns: BTreeMap::new(),
            current_pattern: None,
            insert: empty_insert(0),
            slot: PendingPlugin::default(),
        }
    }

    fn text(&self, e: &Event) -> Option<String> {
        e.to_str(self.encoding)
    }

    fn enter(&mut self, section: Section) {
        if self.section != section {
            log::debug!("section {:?} -> {:?}", self.section, section);
            if self.section == Section::Channels {
                self.finish_channel();
            }
            self.section = section;
        }
    }

    fn apply(&mut self, e: &Event) {
        if id::is_mixer(e.id) {
            self.enter(Section::Mixer);
        }

        match e.id {
            id::VERSION => self.project.version = self.text(e),
            id::TITLE => self.project.title = self.text(e),
            id::ARTISTS => self.project.artists = self.text(e),
            id::GENRE => self.project.genre = self.text(e),
            id::COMMENTS => self.project.comments = self.text(e),
            id::URL => self.project.url = self.text(e),
            id::TEMPO => self.project.tempo = e.to_u32().map(Tempo),
            id::TEMPO_COARSE => self.tempo_coarse = e.to_u16(),
            id::TEMPO_FINE => self.tempo_fine = e.to_u16(),

            id::CHANNEL_NEW => {
                self.enter(Section::Channels);
                self.finish_channel();
                let index = e.to_u16().unwrap_or_default();
                self.project.channels.push(Channel::new(index));
            }
            id::PATTERN_NEW => {
                let index = e.to_u16().unwrap_or_default();
                self.patterns.entry(index).or_insert_with(|| Pattern {
                    index,
                    name: None,
                    note_count: 0,
                });
                self.current_pattern = Some(index);
            }
            id::PATTERN_NAME => {
                let name = self.text(e);
                if let Some(p) = self.pattern_mut() {
                    p.name = name;
                }
            }
            id::PATTERN_NOTES => {
                let count = e.as_bytes().map_or(0, |b| b.len() / NOTE_SIZE);
                if let Some(p) = self.pattern_mut() {
                    p.note_count = count;
                }
            }
            id::ARRANGEMENT_NEW => {
                self.enter(Section::Arrangements);
                self.project.arrangements.push(Arrangement {
                    index: e.to_u16().unwrap_or_default(),
                    name: None,
                    tracks: Vec::new(),
                });
            }
            id::ARRANGEMENT_NAME => {
                let name = self.text(e);
                if let Some(a) = self.project.arrangements.last_mut() {
                    a.name = name;
                }
            }
            id::TRACK_DATA => self.track_data(e),
            id::TRACK_NAME => {
                let name = self.text(e);
                if let Some(t) = self
                    .project
                    .arrangements
                    .last_mut()
                    .and_then(|a| a.tracks.last_mut())
                {
                    t.name = name;
                }
            }
            _ => match self.section {
                Section::Channels => self.channel_event(e),
                Section::Mixer => self.mixer_event(e),
                _ => log::trace!("ignoring event {} outside of any channel or insert", e.id),
            },
        }
    }

    fn pattern_mut(&mut self) -> Option<&mut Pattern> {
        let index = self.current_pattern?;
        self.patterns.get_mut(&index)
    }

    fn track_data(&mut self, e: &Event) {
        let Some(arrangement) = self.project.arrangements.last_mut() else {
            log::debug!("track data before any arrangement");
            return;
        };
        let index = e
            .as_bytes()
            .and_then(|b| b.get(..4))
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .unwrap_or(arrangement.tracks.len() as u32);
        arrangement.tracks.push(Track { index, name: None });
    }

    fn channel_event(&mut self, e: &Event) {
        let text = self.text(e);
        let Some(channel) = self.project.channels.last_mut() else {
            return;
        };
        match e.id {
            id::CHANNEL_TYPE => {
                channel.kind = ChannelKind::from_raw(e.to_u8().unwrap_or_default());
            }
            id::DEFAULT_NAME => channel.default_name = text,
            id::NAME => channel.name = text,
            id::SAMPLE_PATH => channel.sample_path = text.filter(|p| !p.is_empty()),
            id::PLUGIN_WRAPPER => {
                self.channel_wrapper = e.as_bytes().map(parse_wrapper);
            }
            _ => {}
        }
    }

    fn finish_channel(&mut self) {
        let wrapper = self.channel_wrapper.take();
        if let Some(channel) = self.project.channels.last_mut() {
            if channel.kind == ChannelKind::Instrument && channel.plugin.is_none() {
                channel.plugin = resolve_plugin(channel.default_name.as_deref(), wrapper.as_ref());
            }
        }
    }

    fn mixer_event(&mut self, e: &Event) {
        match e.id {
            id::DEFAULT_NAME => self.slot.internal_name = self.text(e),
            id::NAME => self.slot.name = self.text(e),
            id::PLUGIN_WRAPPER => self.slot.wrapper = e.as_bytes().map(parse_wrapper),
            id::INSERT_NAME => self.insert.name = self.text(e).filter(|n| !n.is_empty()),
            id::SLOT_INDEX => {
                let pending = std::mem::take(&mut self.slot);
                if !pending.is_empty() {
                    self.insert.slots.push(Slot {
                        index: e.to_u16().unwrap_or_default(),
                        plugin: resolve_plugin(
                            pending.internal_name.as_deref(),
                            pending.wrapper.as_ref(),
                        ),
                        name: pending.name,
                    });
                }
            }
            id::INSERT_OUTPUT => {
                let next = empty_insert(self.insert.index + 1);
                let done = std::mem::replace(&mut self.insert, next);
                self.project.inserts.push(done);
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Project {
        self.finish_channel();
        if self.insert.name.is_some() || !self.insert.slots.is_empty() {
            self.project.inserts.push(self.insert);
        }
        if self.project.tempo.is_none() {
            self.project.tempo = self
                .tempo_coarse
                .map(|c| Tempo(u32::from(c) * 1000 + u32::from(self.tempo_fine.unwrap_or(0))));
        }
        self.project.patterns = self.patterns.into_values().collect();
        self.project
    }
}

fn empty_insert(index: usize) -> Insert {
    Insert {
        index,
        name: None,
        slots: Vec::new(),
    }
}

/// Rebuilds the project object graph from a flat event stream.
pub fn build_project(header: Header, events: &[Event]) -> Project {
    let encoding = TextEncoding::detect(events);
    log::debug!("text encoding: {encoding:?}");
    let mut builder = Builder::new(header, encoding);
    for e in events {
        builder.apply(e);
    }
    builder.finish()
}
