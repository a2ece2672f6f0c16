use byteorder::{LittleEndian, WriteBytesExt};

use crate::{
    event::{Event, EventData},
    reader::{Header, DATA_MAGIC, HEADER_LEN, HEADER_MAGIC},
};

/// Serializes a header and event list into the FLP container layout.
///
/// Writing into a `Vec` cannot fail, so the `io::Result`s from byteorder
/// are discarded.
pub fn encode_flp(header: &Header, events: &[Event]) -> Vec<u8> {
    let mut body = Vec::new();
    for event in events {
        encode_event(&mut body, event);
    }

    let mut out = Vec::with_capacity(22 + body.len());
    out.extend_from_slice(HEADER_MAGIC);
    let _ = out.write_u32::<LittleEndian>(HEADER_LEN);
    let _ = out.write_i16::<LittleEndian>(header.format);
    let _ = out.write_u16::<LittleEndian>(header.channel_count);
    let _ = out.write_u16::<LittleEndian>(header.ppq);
    out.extend_from_slice(DATA_MAGIC);
    let _ = out.write_u32::<LittleEndian>(body.len() as u32);
    out.extend_from_slice(&body);
    out
}

pub(crate) fn encode_event(out: &mut Vec<u8>, event: &Event) {
    out.push(event.id);
    match &event.data {
        EventData::Byte(v) => out.push(*v),
        EventData::Word(v) => {
            let _ = out.write_u16::<LittleEndian>(*v);
        }
        EventData::Dword(v) => {
            let _ = out.write_u32::<LittleEndian>(*v);
        }
        EventData::Blob(b) => {
            write_varint(out, b.len() as u64);
            out.extend_from_slice(b);
        }
    }
}

pub(crate) fn write_varint(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let b = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(b);
            return;
        }
        out.push(b | 0x80);
    }
}
