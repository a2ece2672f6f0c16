use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::model::Plugin;

const RECORD_NAME: u32 = 54;
const RECORD_PATH: u32 = 55;
const RECORD_VENDOR: u32 = 56;

/// What the plugin wrapper blob says about a hosted third-party plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct WrapperInfo {
    pub(crate) name: Option<String>,
    pub(crate) path: Option<String>,
    pub(crate) vendor: Option<String>,
}

impl WrapperInfo {
    fn is_third_party(&self) -> bool {
        self.name.is_some() || self.path.is_some()
    }
}

/// Decodes the `u32 kind` + `(u32 id, u64 size, bytes)*` record list.
/// Native plugins carry a wrapper too, without name and path records.
pub(crate) fn parse_wrapper(bytes: &[u8]) -> WrapperInfo {
    let mut info = WrapperInfo::default();
    let mut cur = Cursor::new(bytes);
    if cur.read_u32::<LittleEndian>().is_err() {
        return info;
    }

    loop {
        let Ok(record) = cur.read_u32::<LittleEndian>() else {
            break;
        };
        let Ok(size) = cur.read_u64::<LittleEndian>() else {
            log::debug!("plugin wrapper record {record} has no size");
            break;
        };
        let remaining = bytes.len() as u64 - cur.position();
        if size > remaining {
            log::debug!("plugin wrapper record {record} overruns the blob ({size} > {remaining})");
            break;
        }
        let mut value = vec![0u8; size as usize];
        if cur.read_exact(&mut value).is_err() {
            break;
        }

        let text = || {
            let s = String::from_utf8_lossy(&value);
            let s = s.trim_end_matches('\0');
            (!s.is_empty()).then(|| s.to_string())
        };
        match record {
            RECORD_NAME => info.name = text(),
            RECORD_PATH => info.path = text(),
            RECORD_VENDOR => info.vendor = text(),
            _ => {}
        }
    }

    info
}

/// Classifies a generator or effect from its internal name and wrapper.
pub(crate) fn resolve_plugin(internal_name: Option<&str>, wrapper: Option<&WrapperInfo>) -> Option<Plugin> {
    let internal_name = internal_name.filter(|n| !n.is_empty());
    match wrapper {
        Some(w) if w.is_third_party() => {
            let name = w
                .name
                .clone()
                .or_else(|| w.path.as_deref().and_then(file_stem))
                .or_else(|| internal_name.map(str::to_string))
                .unwrap_or_default();
            Some(Plugin::ThirdParty {
                name,
                vendor: w.vendor.clone(),
                path: w.path.clone(),
            })
        }
        _ => internal_name.map(|n| Plugin::Native { name: n.to_string() }),
    }
}

fn file_stem(path: &str) -> Option<String> {
    // Paths come from Windows and macOS hosts alike.
    let file = path.rsplit(['/', '\\']).next()?;
    let stem = file.rsplit_once('.').map_or(file, |(s, _)| s);
    (!stem.is_empty()).then(|| stem.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;

    fn record(out: &mut Vec<u8>, id: u32, value: &str) {
        out.write_u32::<LittleEndian>(id).unwrap();
        out.write_u64::<LittleEndian>(value.len() as u64).unwrap();
        out.extend_from_slice(value.as_bytes());
    }

    #[test]
    fn wrapper_with_name_and_path_is_third_party() {
        let mut blob = vec![10, 0, 0, 0];
        record(&mut blob, 1, "\x01\x02");
        record(&mut blob, RECORD_NAME, "Serum");
        record(&mut blob, RECORD_PATH, "C:\\VST\\Serum_x64.dll");
        record(&mut blob, RECORD_VENDOR, "Xfer Records");

        let info = parse_wrapper(&blob);
        assert_eq!(info.name.as_deref(), Some("Serum"));
        assert_eq!(
            resolve_plugin(Some("Fruity Wrapper"), Some(&info)),
            Some(Plugin::ThirdParty {
                name: "Serum".into(),
                vendor: Some("Xfer Records".into()),
                path: Some("C:\\VST\\Serum_x64.dll".into()),
            })
        );
    }

    #[test]
    fn name_falls_back_to_path_stem() {
        let mut blob = vec![8, 0, 0, 0];
        record(&mut blob, RECORD_PATH, "/Library/Audio/Plug-Ins/VST/Vital.vst");
        let plugin = resolve_plugin(None, Some(&parse_wrapper(&blob))).unwrap();
        assert_eq!(plugin.name(), "Vital");
    }

    #[test]
    fn truncated_record_keeps_earlier_fields() {
        let mut blob = vec![10, 0, 0, 0];
        record(&mut blob, RECORD_NAME, "Kontakt");
        blob.write_u32::<LittleEndian>(RECORD_PATH).unwrap();
        blob.write_u64::<LittleEndian>(999).unwrap();
        blob.extend_from_slice(b"C:");

        let info = parse_wrapper(&blob);
        assert_eq!(info.name.as_deref(), Some("Kontakt"));
        assert_eq!(info.path, None);
    }

    #[test]
    fn wrapper_without_records_is_native() {
        let info = parse_wrapper(&[0, 0, 0, 0]);
        assert_eq!(
            resolve_plugin(Some("3x Osc"), Some(&info)),
            Some(Plugin::Native { name: "3x Osc".into() })
        );
        assert_eq!(resolve_plugin(Some(""), None), None);
    }
}
