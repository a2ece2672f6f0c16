use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::{
    event::{Event, EventData},
    FlpError,
};

pub(crate) const HEADER_MAGIC: &[u8; 4] = b"FLhd";
pub(crate) const DATA_MAGIC: &[u8; 4] = b"FLdt";
pub(crate) const HEADER_LEN: u32 = 6;
const ZIP_MAGIC: &[u8; 4] = b"PK\x03\x04";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct Header {
    pub format: i16,
    pub channel_count: u16,
    pub ppq: u16,
}

#[derive(Debug, Clone)]
pub struct Parsed {
    pub header: Header,
    pub events: Vec<Event>,
}

pub(crate) fn parse_bytes(bytes: &[u8]) -> Result<Parsed, FlpError> {
    if bytes.starts_with(ZIP_MAGIC) {
        return Err(FlpError::new(
            "E2002",
            "zipped projects are not supported, extract the .flp first",
            0,
        ));
    }

    let mut cur = Cursor::new(bytes);
    let header = read_header(&mut cur)?;
    log::debug!(
        "header: format={} channels={} ppq={}",
        header.format,
        header.channel_count,
        header.ppq
    );

    let mut magic = [0u8; 4];
    cur.read_exact(&mut magic)
        .map_err(|_| FlpError::new("E1003", "missing FLdt chunk", cur.position()))?;
    if &magic != DATA_MAGIC {
        return Err(FlpError::new(
            "E1003",
            format!("expected FLdt chunk, found {:?}", String::from_utf8_lossy(&magic)),
            cur.position() - 4,
        ));
    }
    let declared = cur
        .read_u32::<LittleEndian>()
        .map_err(|_| FlpError::new("E1003", "missing FLdt chunk length", cur.position()))?;

    let start = cur.position();
    let present = bytes.len() as u64 - start;
    if u64::from(declared) != present {
        log::warn!("FLdt declares {declared} bytes but {present} are present");
    }

    let mut events = Vec::new();
    while cur.position() < bytes.len() as u64 {
        events.push(read_event(&mut cur)?);
    }
    log::debug!("read {} events", events.len());

    Ok(Parsed { header, events })
}

fn read_header(cur: &mut Cursor<&[u8]>) -> Result<Header, FlpError> {
    let mut magic = [0u8; 4];
    cur.read_exact(&mut magic)
        .map_err(|_| FlpError::new("E1001", "file too short for an FLhd header", 0))?;
    if &magic != HEADER_MAGIC {
        return Err(FlpError::new("E1001", "not an FL Studio project (bad FLhd magic)", 0));
    }

    let truncated = |cur: &Cursor<&[u8]>| FlpError::new("E1002", "truncated FLhd header", cur.position());
    let len = cur.read_u32::<LittleEndian>().map_err(|_| truncated(cur))?;
    if len != HEADER_LEN {
        return Err(FlpError::new(
            "E1002",
            format!("unexpected FLhd header length {len} (expected {HEADER_LEN})"),
            4,
        ));
    }

    let format = cur.read_i16::<LittleEndian>().map_err(|_| truncated(cur))?;
    let channel_count = cur.read_u16::<LittleEndian>().map_err(|_| truncated(cur))?;
    let ppq = cur.read_u16::<LittleEndian>().map_err(|_| truncated(cur))?;

    Ok(Header {
        format,
        channel_count,
        ppq,
    })
}

fn read_event(cur: &mut Cursor<&[u8]>) -> Result<Event, FlpError> {
    let at = cur.position();
    let eid = cur
        .read_u8()
        .map_err(|_| FlpError::new("E1004", "truncated event id", at))?;
    let truncated = || {
        FlpError::new("E1004", "truncated payload", at).with_event_id(eid)
    };

    let data = match eid {
        0..=63 => EventData::Byte(cur.read_u8().map_err(|_| truncated())?),
        64..=127 => {
            EventData::Word(cur.read_u16::<LittleEndian>().map_err(|_| truncated())?)
        }
        128..=191 => {
            EventData::Dword(cur.read_u32::<LittleEndian>().map_err(|_| truncated())?)
        }
        _ => {
            let len = read_varint(cur).map_err(|e| e.with_event_id(eid))?;
            let remaining = cur.get_ref().len() as u64 - cur.position();
            if len > remaining {
                return Err(truncated());
            }
            let mut buf = vec![0u8; len as usize];
            cur.read_exact(&mut buf).map_err(|_| truncated())?;
            EventData::Blob(buf)
        }
    };

    Ok(Event { id: eid, data })
}

/// Length prefix of variable-size events: 7 bits per byte, least
/// significant group first, high bit set on every byte but the last.
pub(crate) fn read_varint(cur: &mut Cursor<&[u8]>) -> Result<u64, FlpError> {
    let at = cur.position();
    let mut value = 0u64;
    for shift in (0..64).step_by(7) {
        let b = cur
            .read_u8()
            .map_err(|_| FlpError::new("E1005", "truncated event length", at))?;
        value |= u64::from(b & 0x7f) << shift;
        if b & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(FlpError::new("E1005", "event length does not fit in 64 bits", at))
}
