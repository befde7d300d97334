// psi/eit.rs
//! Event Information Table (table_id 0x4E/0x4F present/following,
//! 0x50..0x6F schedule): the program-guide events of one service.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::constants::*;
use crate::error::SiError;
use crate::psi::descriptor::{prefixed_text, DescriptorIter};
use crate::psi::section::{Section, TableFamily};
use crate::time::{decode_bcd_duration, decode_start_time};

#[derive(Debug, Clone, Serialize)]
pub struct EitSection {
    pub service_id:                  u16,
    pub transport_stream_id:         u16,
    pub original_network_id:         u16,
    pub version:                     u8,
    pub section_number:              u8,
    pub last_section_number:         u8,
    pub segment_last_section_number: u8,
    pub last_table_id:               u8,
    pub crc_ok:                      bool,
    pub events:                      Vec<EventItem>,
}

/// One guide event. Only events carrying a short-event descriptor are
/// emitted; extended-event text fragments are concatenated in ascending
/// descriptor_number order.
#[derive(Debug, Clone, Serialize)]
pub struct EventItem {
    pub event_id:        u16,
    pub service_id:      u16,
    pub start_time:      Option<DateTime<Utc>>,
    pub duration_secs:   u32,
    pub finish_time:     Option<DateTime<Utc>>,
    pub running_status:  u8,
    pub free_ca:         bool,
    pub language:        String,
    pub title:           String,
    pub subtitle:        String,
    pub extended_text:   String,
    /// (content_nibble_level_1, content_nibble_level_2) genre pairs.
    pub content_nibbles: Vec<(u8, u8)>,
}

fn language_code(raw: &[u8]) -> String {
    let code: String = raw.iter().map(|&b| b as char).collect();
    // empty / padded language codes decode as "und"
    if code.trim_matches(|c| c == ' ' || c == '\0').is_empty() {
        "und".to_owned()
    } else {
        code
    }
}

pub fn parse_eit(payload: &[u8], strict_text: bool) -> Result<EitSection, SiError> {
    let sec = Section::parse(payload, TableFamily::Eit)?;
    let b = sec.body;

    let mut eit = EitSection {
        service_id: sec.header.table_id_ext,
        transport_stream_id: 0,
        original_network_id: 0,
        version: sec.header.version,
        section_number: sec.header.section_number,
        last_section_number: sec.header.last_section_number,
        segment_last_section_number: 0,
        last_table_id: sec.header.table_id,
        crc_ok: sec.crc_ok,
        events: Vec::new(),
    };
    if b.len() < 6 {
        return Ok(eit);
    }
    eit.transport_stream_id = u16::from_be_bytes([b[0], b[1]]);
    eit.original_network_id = u16::from_be_bytes([b[2], b[3]]);
    eit.segment_last_section_number = b[4];
    eit.last_table_id = b[5];

    let mut idx = 6;
    while idx + 12 <= b.len() {
        let event_id = u16::from_be_bytes([b[idx], b[idx + 1]]);
        let start_time = decode_start_time(&b[idx + 2..idx + 7]);
        let duration_secs = decode_bcd_duration(&b[idx + 7..idx + 10]).unwrap_or(0);
        let running_status = b[idx + 10] >> 5;
        let free_ca = b[idx + 10] & 0x10 != 0;
        let desc_len = ((b[idx + 10] & 0x0F) as usize) << 8 | b[idx + 11] as usize;
        let desc_end = (idx + 12 + desc_len).min(b.len());

        if let Some(event) = decode_event_descriptors(&b[idx + 12..desc_end], strict_text, |short| EventItem {
            event_id,
            service_id: eit.service_id,
            start_time,
            duration_secs,
            finish_time: start_time.map(|t| t + Duration::seconds(duration_secs as i64)),
            running_status,
            free_ca,
            language: short.language,
            title: short.title,
            subtitle: short.subtitle,
            extended_text: String::new(),
            content_nibbles: Vec::new(),
        })? {
            eit.events.push(event);
        }
        idx = desc_end;
    }

    Ok(eit)
}

struct ShortEvent {
    language: String,
    title:    String,
    subtitle: String,
}

/// Walks one event's descriptor loop. `make` builds the event record from
/// the short-event descriptor; without one the event is dropped.
fn decode_event_descriptors(
    buf: &[u8],
    strict_text: bool,
    make: impl FnOnce(ShortEvent) -> EventItem,
) -> Result<Option<EventItem>, SiError> {
    let mut short: Option<ShortEvent> = None;
    let mut extended: BTreeMap<u8, String> = BTreeMap::new();
    let mut nibbles: Vec<(u8, u8)> = Vec::new();

    for desc in DescriptorIter::new(buf) {
        match desc.tag {
            DESC_SHORT_EVENT if desc.body.len() >= 3 => {
                let mut pos = 3;
                let title = prefixed_text(desc.body, &mut pos, strict_text)?;
                let subtitle = prefixed_text(desc.body, &mut pos, strict_text)?;
                short = Some(ShortEvent {
                    language: language_code(&desc.body[..3]),
                    title,
                    subtitle,
                });
            }
            DESC_EXTENDED_EVENT if desc.body.len() >= 5 => {
                let number = desc.body[0] >> 4;
                // items loop (item_description + item pairs) precedes the text
                let items_len = desc.body[4] as usize;
                let mut pos = (5 + items_len).min(desc.body.len());
                let text = prefixed_text(desc.body, &mut pos, strict_text)?;
                extended.entry(number).or_default().push_str(&text);
            }
            DESC_CONTENT => {
                for pair in desc.body.chunks_exact(2) {
                    nibbles.push((pair[0] >> 4, pair[0] & 0x0F));
                }
            }
            DESC_COMPONENT | DESC_PARENTAL_RATING | DESC_SUBTITLING | DESC_PDC => {
                // recognized, carried data not surfaced
            }
            other => log::debug!("skipping descriptor 0x{other:02X} in event loop"),
        }
    }

    let Some(short) = short else {
        return Ok(None);
    };
    let mut event = make(short);
    event.extended_text = extended.into_values().collect();
    event.content_nibbles = nibbles;
    Ok(Some(event))
}
