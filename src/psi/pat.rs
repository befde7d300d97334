// psi/pat.rs
use serde::Serialize;

use crate::error::SiError;
use crate::psi::section::{Section, TableFamily};

/// ─────────── PAT ───────────
#[derive(Debug, Clone, Serialize)]
pub struct PatSection {
    pub version:             u8,
    pub current_next:        bool,
    pub transport_stream_id: u16,
    pub crc_ok:              bool,
    pub associations:        Vec<PatEntry>,
}

/// One (program_number → PID) association. Program number 0 carries the
/// NIT PID, everything else a PMT PID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatEntry {
    pub program_number: u16,
    pub pid:            u16,
}

impl PatSection {
    pub fn nit_pid(&self) -> Option<u16> {
        self.associations.iter().find(|e| e.program_number == 0).map(|e| e.pid)
    }

    pub fn pmt_pid(&self, program_number: u16) -> Option<u16> {
        self.associations
            .iter()
            .find(|e| e.program_number == program_number && e.program_number != 0)
            .map(|e| e.pid)
    }
}

pub fn parse_pat(payload: &[u8]) -> Result<PatSection, SiError> {
    let sec = Section::parse(payload, TableFamily::Pat)?;

    let mut idx = 0;
    let mut associations = Vec::new();
    while idx + 4 <= sec.body.len() {
        let pn = u16::from_be_bytes([sec.body[idx], sec.body[idx + 1]]);
        let pid = ((sec.body[idx + 2] & 0x1F) as u16) << 8 | sec.body[idx + 3] as u16;
        idx += 4;
        associations.push(PatEntry { program_number: pn, pid });
    }
    Ok(PatSection {
        version: sec.header.version,
        current_next: sec.header.current_next,
        transport_stream_id: sec.header.table_id_ext,
        crc_ok: sec.crc_ok,
        associations,
    })
}
