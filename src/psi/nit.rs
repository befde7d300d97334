// psi/nit.rs
//! Network Information Table (table_id 0x40 actual / 0x41 other):
//! network name plus the service list accumulated from tag 0x41.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::constants::*;
use crate::error::SiError;
use crate::psi::descriptor::DescriptorIter;
use crate::psi::section::{Section, TableFamily};
use crate::textcodec::decode_text;

/// service_type from the service list / service descriptor
/// (ETSI EN 300 468 table 87, the subset seen on DVB-T/T2 muxes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ServiceType {
    DigitalTelevision,
    DigitalRadioSound,
    Teletext,
    AdvancedCodecSdTelevision,
    AdvancedCodecHdTelevision,
    HevcDigitalTelevision,
    Other(u8),
}

impl ServiceType {
    pub fn from_u8(val: u8) -> ServiceType {
        match val {
            0x01 => ServiceType::DigitalTelevision,
            0x02 => ServiceType::DigitalRadioSound,
            0x03 => ServiceType::Teletext,
            0x16 => ServiceType::AdvancedCodecSdTelevision,
            0x19 => ServiceType::AdvancedCodecHdTelevision,
            0x1F => ServiceType::HevcDigitalTelevision,
            other => ServiceType::Other(other),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NitSection {
    pub version:       u8,
    pub network_id:    u16,
    pub network_name:  String,
    pub crc_ok:        bool,
    /// service_id → service_type over every transport stream in the loop.
    pub service_types: BTreeMap<u16, ServiceType>,
}

pub fn parse_nit(payload: &[u8], strict_text: bool) -> Result<NitSection, SiError> {
    let sec = Section::parse(payload, TableFamily::Nit)?;
    let b = sec.body;

    let mut nit = NitSection {
        version: sec.header.version,
        network_id: sec.header.table_id_ext,
        network_name: String::new(),
        crc_ok: sec.crc_ok,
        service_types: BTreeMap::new(),
    };
    if b.len() < 2 {
        return Ok(nit);
    }

    let net_desc_len = ((b[0] & 0x0F) as usize) << 8 | b[1] as usize;
    let net_desc_end = (2 + net_desc_len).min(b.len());
    for desc in DescriptorIter::new(&b[2..net_desc_end]) {
        if desc.tag == DESC_NETWORK_NAME {
            nit.network_name = decode_text(desc.body, strict_text)?;
        }
    }

    let mut idx = net_desc_end;
    if idx + 2 > b.len() {
        return Ok(nit);
    }
    let ts_loop_len = ((b[idx] & 0x0F) as usize) << 8 | b[idx + 1] as usize;
    idx += 2;
    let loop_end = (idx + ts_loop_len).min(b.len());

    // transport_stream loop; tag 0x41 lists (service_id, service_type)
    while idx + 6 <= loop_end {
        let desc_len = ((b[idx + 4] & 0x0F) as usize) << 8 | b[idx + 5] as usize;
        let desc_end = (idx + 6 + desc_len).min(loop_end);
        for desc in DescriptorIter::new(&b[idx + 6..desc_end]) {
            if desc.tag == DESC_SERVICE_LIST {
                for entry in desc.body.chunks_exact(3) {
                    let service_id = u16::from_be_bytes([entry[0], entry[1]]);
                    nit.service_types.insert(service_id, ServiceType::from_u8(entry[2]));
                }
            }
        }
        idx = desc_end;
    }

    Ok(nit)
}
