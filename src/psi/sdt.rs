// psi/sdt.rs
//! Service Description Table (table_id 0x42 actual / 0x46 other).

use serde::Serialize;

use crate::constants::*;
use crate::error::SiError;
use crate::psi::descriptor::{prefixed_text, DescriptorIter};
use crate::psi::nit::ServiceType;
use crate::psi::section::{Section, TableFamily};

#[derive(Debug, Clone, Serialize)]
pub struct SdtSection {
    pub version:             u8,
    pub transport_stream_id: u16,
    pub original_network_id: u16,
    pub crc_ok:              bool,
    pub services:            Vec<SdtService>,
}

/// One service record: identity plus the names carried by the service
/// descriptor (tag 0x48).
#[derive(Debug, Clone, Serialize)]
pub struct SdtService {
    pub service_id:            u16,
    pub service_type:          ServiceType,
    pub provider_name:         String,
    pub service_name:          String,
    pub eit_schedule:          bool,
    pub eit_present_following: bool,
    pub running_status:        u8,
    pub free_ca:               bool,
}

pub fn parse_sdt(payload: &[u8], strict_text: bool) -> Result<SdtSection, SiError> {
    let sec = Section::parse(payload, TableFamily::Sdt)?;
    let b = sec.body;

    let mut sdt = SdtSection {
        version: sec.header.version,
        transport_stream_id: sec.header.table_id_ext,
        original_network_id: if b.len() >= 2 { u16::from_be_bytes([b[0], b[1]]) } else { 0 },
        crc_ok: sec.crc_ok,
        services: Vec::new(),
    };

    // original_network_id + 1 reserved byte precede the service loop
    let mut idx = 3;
    while idx + 5 <= b.len() {
        let service_id = u16::from_be_bytes([b[idx], b[idx + 1]]);
        let eit_schedule = b[idx + 2] & 0x02 != 0;
        let eit_present_following = b[idx + 2] & 0x01 != 0;
        let running_status = b[idx + 3] >> 5;
        let free_ca = b[idx + 3] & 0x10 != 0;
        let desc_len = ((b[idx + 3] & 0x0F) as usize) << 8 | b[idx + 4] as usize;
        let desc_end = (idx + 5 + desc_len).min(b.len());

        let mut service = SdtService {
            service_id,
            service_type: ServiceType::Other(0),
            provider_name: String::new(),
            service_name: String::new(),
            eit_schedule,
            eit_present_following,
            running_status,
            free_ca,
        };
        for desc in DescriptorIter::new(&b[idx + 5..desc_end]) {
            if desc.tag == DESC_SERVICE && !desc.body.is_empty() {
                service.service_type = ServiceType::from_u8(desc.body[0]);
                let mut pos = 1;
                service.provider_name = prefixed_text(desc.body, &mut pos, strict_text)?;
                service.service_name = prefixed_text(desc.body, &mut pos, strict_text)?;
            }
        }
        sdt.services.push(service);
        idx = desc_end;
    }

    Ok(sdt)
}
