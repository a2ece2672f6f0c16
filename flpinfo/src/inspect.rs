use std::{
    collections::{BTreeMap, BTreeSet},
    io,
};

use anyhow::bail;
use clap::ValueEnum;
use flp_parser::{Arrangement, Channel, ChannelKind, Insert, Plugin, Project};

use crate::present::Presenter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortBy {
    #[default]
    Index,
    Type,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Arrangements,
    Channels { sort_by: SortBy },
    Inserts,
    Instruments { plugins_only: bool },
    Samplers,
    Samples,
    Patterns,
    Plugins,
    Tracks { arrangement: Option<u16> },
}

pub fn channels(project: &Project, kind: Option<ChannelKind>, sort_by: SortBy) -> Vec<&Channel> {
    let mut out: Vec<_> = project
        .channels
        .iter()
        .filter(|c| kind.map_or(true, |k| c.kind == k))
        .collect();
    match sort_by {
        SortBy::Index => out.sort_by_key(|c| c.index),
        SortBy::Type => out.sort_by_key(|c| (c.kind, c.index)),
    }
    out
}

pub fn instruments(project: &Project, plugins_only: bool) -> Vec<&Channel> {
    channels(project, Some(ChannelKind::Instrument), SortBy::Index)
        .into_iter()
        .filter(|c| !plugins_only || c.plugin.as_ref().is_some_and(|p| !p.is_native()))
        .collect()
}

pub fn samples(project: &Project) -> BTreeSet<&str> {
    project
        .channels
        .iter()
        .filter_map(|c| c.sample_path.as_deref())
        .collect()
}

/// Every plugin hosted by a channel or mixer slot, one entry per
/// name/kind/path. Native plugins sort before third-party ones.
pub fn plugins(project: &Project) -> Vec<&Plugin> {
    let hosted = project
        .channels
        .iter()
        .filter_map(|c| c.plugin.as_ref())
        .chain(
            project
                .inserts
                .iter()
                .flat_map(|i| &i.slots)
                .filter_map(|s| s.plugin.as_ref()),
        );

    let mut unique = BTreeMap::new();
    for plugin in hosted {
        unique
            .entry((!plugin.is_native(), plugin.name(), plugin.path()))
            .or_insert(plugin);
    }
    unique.into_values().collect()
}

pub fn arrangement(project: &Project, index: Option<u16>) -> anyhow::Result<&Arrangement> {
    let found = match index {
        Some(i) => project.arrangements.iter().find(|a| a.index == i),
        None => project.arrangements.first(),
    };
    match (found, index) {
        (Some(a), _) => Ok(a),
        (None, Some(i)) => bail!(
            "arrangement {i} not found (project has {})",
            project.arrangements.len()
        ),
        (None, None) => bail!("project has no arrangements"),
    }
}

fn insert_name(insert: &Insert) -> String {
    match (&insert.name, insert.index) {
        (Some(name), _) => name.clone(),
        (None, 0) => "Master".to_string(),
        (None, i) => format!("Insert {i}"),
    }
}

fn or_blank(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

pub fn run<W: io::Write>(p: &mut Presenter<W>, project: &Project, view: View) -> anyhow::Result<()> {
    match view {
        View::Arrangements => {
            let rows: Vec<_> = project
                .arrangements
                .iter()
                .map(|a| {
                    vec![
                        a.index.to_string(),
                        or_blank(a.name.as_deref()),
                        a.tracks.len().to_string(),
                    ]
                })
                .collect();
            table(p, "arrangements", &["Index", "Name", "Tracks"], &rows)?;
        }
        View::Channels { sort_by } => {
            let rows: Vec<_> = channels(project, None, sort_by)
                .into_iter()
                .map(|c| vec![c.index.to_string(), c.display_name().to_string(), c.kind.to_string()])
                .collect();
            table(p, "channels", &["Index", "Name", "Type"], &rows)?;
        }
        View::Inserts => {
            let rows: Vec<_> = project
                .inserts
                .iter()
                .map(|i| {
                    let slots = i
                        .slots
                        .iter()
                        .map(|s| {
                            s.name
                                .as_deref()
                                .or(s.plugin.as_ref().map(Plugin::name))
                                .unwrap_or("?")
                        })
                        .collect::<Vec<_>>()
                        .join(", ");
                    vec![i.index.to_string(), insert_name(i), slots]
                })
                .collect();
            table(p, "inserts", &["Index", "Name", "Slots"], &rows)?;
        }
        View::Instruments { plugins_only } => {
            let rows: Vec<_> = instruments(project, plugins_only)
                .into_iter()
                .map(|c| {
                    vec![
                        c.index.to_string(),
                        c.display_name().to_string(),
                        or_blank(c.plugin.as_ref().map(Plugin::name)),
                        or_blank(c.plugin.as_ref().and_then(Plugin::path)),
                    ]
                })
                .collect();
            table(p, "instruments", &["Index", "Name", "Plugin", "Path"], &rows)?;
        }
        View::Samplers => {
            let rows: Vec<_> = channels(project, Some(ChannelKind::Sampler), SortBy::Index)
                .into_iter()
                .map(|c| {
                    vec![
                        c.index.to_string(),
                        c.display_name().to_string(),
                        or_blank(c.sample_path.as_deref()),
                    ]
                })
                .collect();
            table(p, "samplers", &["Index", "Name", "Sample"], &rows)?;
        }
        View::Samples => {
            let samples = samples(project);
            if samples.is_empty() {
                let msg = p.yellow("No samples found.");
                p.line(msg)?;
            }
            for path in samples {
                p.line(path)?;
            }
        }
        View::Patterns => {
            let rows: Vec<_> = project
                .patterns
                .iter()
                .map(|pat| {
                    vec![
                        pat.index.to_string(),
                        or_blank(pat.name.as_deref()),
                        pat.note_count.to_string(),
                    ]
                })
                .collect();
            table(p, "patterns", &["Index", "Name", "Notes"], &rows)?;
        }
        View::Plugins => {
            let all = plugins(project);
            let (native, third_party): (Vec<_>, Vec<_>) =
                all.into_iter().partition(|pl| pl.is_native());

            let heading = p.bright("Native");
            p.line(heading)?;
            let rows: Vec<_> = native.iter().map(|pl| vec![pl.name().to_string()]).collect();
            table(p, "native plugins", &["Name"], &rows)?;

            p.blank()?;
            let heading = p.bright("Third-party");
            p.line(heading)?;
            let rows: Vec<_> = third_party
                .iter()
                .map(|pl| {
                    let vendor = match pl {
                        Plugin::ThirdParty { vendor, .. } => vendor.as_deref(),
                        Plugin::Native { .. } => None,
                    };
                    vec![
                        pl.name().to_string(),
                        or_blank(vendor),
                        or_blank(pl.path()),
                    ]
                })
                .collect();
            table(p, "third-party plugins", &["Name", "Vendor", "Path"], &rows)?;
        }
        View::Tracks { arrangement: index } => {
            let arr = arrangement(project, index)?;
            let named: Vec<_> = arr
                .tracks
                .iter()
                .filter(|t| t.name.as_deref().is_some_and(|n| !n.is_empty()))
                .map(|t| vec![t.index.to_string(), or_blank(t.name.as_deref())])
                .collect();
            table(p, "named tracks", &["Index", "Name"], &named)?;
            let hidden = arr.tracks.len() - named.len();
            if hidden > 0 {
                p.line(format!("({hidden} unnamed tracks hidden)"))?;
            }
        }
    }
    Ok(())
}

fn table<W: io::Write>(
    p: &mut Presenter<W>,
    what: &str,
    headers: &[&str],
    rows: &[Vec<String>],
) -> io::Result<()> {
    if rows.is_empty() {
        let msg = p.yellow(format!("No {what} found."));
        return p.line(msg);
    }
    p.table(headers, rows)
}
