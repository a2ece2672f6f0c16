use std::io;

use flp_parser::{event::id, Event, Tempo, TextEncoding};
use serde::Serialize;

use crate::present::Presenter;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectSummary {
    pub title: Option<String>,
    pub artists: Option<String>,
    pub genre: Option<String>,
    pub comments: Option<String>,
    pub tempo: Option<Tempo>,
    pub url: Option<String>,
    pub version: Option<String>,
    pub channels: Vec<String>,
    pub arrangements: Vec<String>,
    pub patterns: Vec<String>,
}

/// State carried across the event scan.
#[derive(Debug)]
struct Extractor {
    encoding: TextEncoding,
    /// A channel was opened and its default name not yet overridden.
    new_channel: bool,
    /// The current channel already has an entry in the list.
    named_current: bool,
    in_channels: bool,
    tempo_coarse: Option<u16>,
    tempo_fine: Option<u16>,
    summary: ProjectSummary,
}

impl Extractor {
    fn new(encoding: TextEncoding) -> Self {
        Self {
            encoding,
            new_channel: false,
            named_current: false,
            in_channels: false,
            tempo_coarse: None,
            tempo_fine: None,
            summary: ProjectSummary::default(),
        }
    }

    fn apply(mut self, e: &Event) -> Self {
        let text = || e.to_str(self.encoding);
        let s = &mut self.summary;
        match e.id {
            id::TITLE => s.title = text(),
            id::ARTISTS => s.artists = text(),
            id::GENRE => s.genre = text(),
            id::COMMENTS => s.comments = text(),
            id::URL => s.url = text(),
            id::VERSION => s.version = text(),
            id::TEMPO => s.tempo = e.to_u32().map(Tempo),
            id::TEMPO_COARSE => self.tempo_coarse = e.to_u16(),
            id::TEMPO_FINE => self.tempo_fine = e.to_u16(),
            id::CHANNEL_NEW => {
                self.new_channel = true;
                self.named_current = false;
                self.in_channels = true;
            }
            id::DEFAULT_NAME if self.in_channels => {
                s.channels.push(text().unwrap_or_default());
                self.named_current = true;
            }
            id::NAME if self.in_channels && self.new_channel => {
                let name = text().unwrap_or_default();
                match s.channels.last_mut() {
                    Some(last) if self.named_current => *last = name,
                    _ => s.channels.push(name),
                }
                self.named_current = true;
                self.new_channel = false;
            }
            id::ARRANGEMENT_NAME => s.arrangements.push(text().unwrap_or_default()),
            id::PATTERN_NAME => s.patterns.push(text().unwrap_or_default()),
            other if id::is_mixer(other) => {
                // Plugin names from here on belong to effect slots.
                self.in_channels = false;
                self.new_channel = false;
            }
            _ => {}
        }
        self
    }

    fn finish(mut self) -> ProjectSummary {
        if self.summary.tempo.is_none() {
            self.summary.tempo = self
                .tempo_coarse
                .map(|c| Tempo(u32::from(c) * 1000 + u32::from(self.tempo_fine.unwrap_or(0))));
        }
        self.summary
    }
}

/// Single forward pass over the event stream.
pub fn summarize(events: &[Event]) -> ProjectSummary {
    let encoding = TextEncoding::detect(events);
    events
        .iter()
        .fold(Extractor::new(encoding), Extractor::apply)
        .finish()
}

fn optional<W: io::Write>(p: &Presenter<W>, value: Option<&str>) -> String {
    match value {
        Some(v) => p.green(v),
        None => "-".to_string(),
    }
}

fn one_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn name_list<W: io::Write>(p: &Presenter<W>, names: &[String]) -> String {
    format!("{} [{}]", p.green(names.len()), names.join(", "))
}

pub fn print_report<W: io::Write>(p: &mut Presenter<W>, s: &ProjectSummary) -> io::Result<()> {
    let title = optional(p, s.title.as_deref());
    p.field("Title:", &title)?;
    let artists = optional(p, s.artists.as_deref());
    p.field("Artist(s):", &artists)?;
    let genre = optional(p, s.genre.as_deref());
    p.field("Genre:", &genre)?;
    let tempo = match s.tempo {
        Some(t) => p.green(t),
        None => "-".to_string(),
    };
    p.field("Tempo (BPM):", &tempo)?;
    let comments = s.comments.as_deref().map(one_line).unwrap_or_default();
    p.field("Comments:", &comments)?;
    let url = match s.url.as_deref() {
        Some(u) if !u.is_empty() => p.cyan(u),
        _ => String::new(),
    };
    p.field("Project URL:", &url)?;
    let version = optional(p, s.version.as_deref());
    p.field("FL Version:", &version)?;

    let channels = if s.channels.is_empty() {
        p.red(0)
    } else {
        name_list(p, &s.channels)
    };
    p.field("Channel(s):", &channels)?;

    let arrangements = if s.arrangements.is_empty() {
        p.red(0)
    } else {
        name_list(p, &s.arrangements)
    };
    p.field("Arrangement(s):", &arrangements)?;

    let patterns = if s.patterns.is_empty() {
        p.yellow(0)
    } else {
        name_list(p, &s.patterns)
    };
    p.field("Pattern(s):", &patterns)?;

    if !p.is_full() {
        p.blank()?;
        let flag = p.bright("--full-lists");
        p.line(format!("If you want to see the full lists run with the {flag} option."))?;
    }

    if p.bad_flp() {
        p.blank()?;
        let tool = p.cyan("FLPInspect");
        p.line(format!("FLP seems to have been corrupted, try inspecting in {tool}"))?;
    }
    Ok(())
}
