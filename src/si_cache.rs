// src/si_cache.rs
//! Streaming SI scanner: routes PSI/SI PIDs through per-PID section
//! buffers into the table decoders and keeps the latest tables.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::constants::*;
use crate::packet::{self, ScramblingControl, TransportPacket};
use crate::psi::{
    parse_eit, parse_nit, parse_pat, parse_sdt, EitSection, NitSection, PatSection, SdtSection,
    SdtService,
};
use crate::reassembly::{payloads_by_pid, SectionBuffer};

/// Latest decoded tables. EIT sections are keyed the way the tables key
/// themselves: (service_id, transport_stream_id, original_network_id).
#[derive(Default)]
pub struct SiCache {
    pub pat:  Option<PatSection>,
    pub nit:  Option<NitSection>,
    pub sdt:  Option<SdtSection>,
    pub eits: BTreeMap<(u16, u16, u16), EitSection>,
}

impl SiCache {
    pub fn update_pat(&mut self, pat: PatSection) {
        self.pat = Some(pat);
    }

    pub fn update_nit(&mut self, nit: NitSection) {
        self.nit = Some(nit);
    }

    pub fn update_sdt(&mut self, sdt: SdtSection) {
        self.sdt = Some(sdt);
    }

    /// Sections of one (service, version) accumulate events; a version
    /// change replaces the entry.
    pub fn update_eit(&mut self, eit: EitSection) {
        let key = (eit.service_id, eit.transport_stream_id, eit.original_network_id);
        match self.eits.get_mut(&key) {
            Some(existing) if existing.version == eit.version => {
                existing.events.extend(eit.events);
            }
            _ => {
                self.eits.insert(key, eit);
            }
        }
    }

    pub fn events_for_service(&self, service_id: u16) -> impl Iterator<Item = &crate::psi::EventItem> + '_ {
        self.eits
            .values()
            .filter(move |e| e.service_id == service_id)
            .flat_map(|e| e.events.iter())
    }
}

/// Joins the SDT's service descriptors against the PAT on program_number.
/// SDT-driven: an SDT service without a PAT association is omitted.
pub fn services_to_pmt_map<'a>(sdt: &'a SdtSection, pat: &PatSection) -> Vec<(&'a SdtService, u16)> {
    sdt.services
        .iter()
        .filter_map(|svc| pat.pmt_pid(svc.service_id).map(|pid| (svc, pid)))
        .collect()
}

/// Error counters kept while scanning.
#[derive(Default, Debug, Clone, Serialize)]
pub struct ScanStats {
    pub packets:           u64,
    pub transport_errors:  u64,
    pub scrambled_packets: u64,
    pub continuity_errors: u64,
    pub crc_errors:        u64,
    pub section_errors:    u64,
}

/// Feed packets (or raw bytes) in arrival order; completed sections are
/// decoded on the payload-unit boundary and cached. Call
/// [`SiScanner::finish`] to flush the trailing section of each PID.
#[derive(Default)]
pub struct SiScanner {
    buffers:  HashMap<u16, SectionBuffer>,
    last_cc:  HashMap<u16, u8>,
    /// When set, text with an unsupported character-set prefix rejects the
    /// carrying section instead of decoding to an empty string.
    pub strict_text: bool,
    pub cache: SiCache,
    pub stats: ScanStats,
}

impl SiScanner {
    pub fn new() -> SiScanner {
        SiScanner::default()
    }

    /// Frames `buf` and scans every packet.
    pub fn push_bytes(&mut self, buf: &[u8]) {
        for pkt in packet::parse(buf, None) {
            self.push_packet(&pkt);
        }
    }

    pub fn push_packet(&mut self, pkt: &TransportPacket) {
        self.stats.packets += 1;
        if pkt.transport_error {
            self.stats.transport_errors += 1;
            return;
        }
        if pkt.scrambling != ScramblingControl::NotScrambled {
            // scrambled payloads are opaque to us
            self.stats.scrambled_packets += 1;
            return;
        }

        if !pkt.payload().is_empty() {
            if let Some(&prev) = self.last_cc.get(&pkt.pid) {
                if !pkt.follows(prev) && pkt.continuity_counter != prev {
                    self.stats.continuity_errors += 1;
                }
            }
            self.last_cc.insert(pkt.pid, pkt.continuity_counter);
        }

        if !matches!(pkt.pid, PAT_PID | NIT_PID | SDT_PID | EIT_PID) {
            return;
        }

        let strict_text = self.strict_text;
        let buffer = self.buffers.entry(pkt.pid).or_default();
        if pkt.payload_unit_start && !buffer.is_empty() {
            // the arriving PUSI closes everything buffered so far
            for section in buffer.take_sections() {
                Self::route(&mut self.cache, &mut self.stats, pkt.pid, &section, strict_text);
            }
        }
        self.buffers.entry(pkt.pid).or_default().push(pkt);
    }

    /// Flushes per-PID buffers: the last section of each PID is only
    /// known to be complete once the capture ends.
    pub fn finish(&mut self) {
        let mut buffers = std::mem::take(&mut self.buffers);
        for (pid, buffer) in buffers.iter_mut() {
            for section in buffer.take_sections() {
                Self::route(&mut self.cache, &mut self.stats, *pid, &section, self.strict_text);
            }
        }
    }

    fn route(cache: &mut SiCache, stats: &mut ScanStats, pid: u16, section: &[u8], strict_text: bool) {
        let crc_ok = match pid {
            PAT_PID => parse_pat(section).map(|t| {
                let ok = t.crc_ok;
                cache.update_pat(t);
                ok
            }),
            NIT_PID => parse_nit(section, strict_text).map(|t| {
                let ok = t.crc_ok;
                cache.update_nit(t);
                ok
            }),
            SDT_PID => parse_sdt(section, strict_text).map(|t| {
                let ok = t.crc_ok;
                cache.update_sdt(t);
                ok
            }),
            EIT_PID => parse_eit(section, strict_text).map(|t| {
                let ok = t.crc_ok;
                cache.update_eit(t);
                ok
            }),
            _ => return,
        };
        match crc_ok {
            Ok(true) => {}
            Ok(false) => stats.crc_errors += 1,
            Err(err) => {
                log::debug!("section on PID 0x{pid:04X} rejected: {err}");
                stats.section_errors += 1;
            }
        }
    }
}

/// All assembled sections on `pid`, in arrival order.
pub fn extract_sections(packets: &[TransportPacket], pid: u16) -> Vec<Vec<u8>> {
    payloads_by_pid(packets, pid).into_values().collect()
}

fn first_section(packets: &[TransportPacket], pid: u16) -> Vec<u8> {
    payloads_by_pid(packets, pid).remove(&0).unwrap_or_default()
}

/// Decodes the first PAT section found on PID 0x0000.
pub fn decode_pat(packets: &[TransportPacket]) -> crate::error::Result<PatSection> {
    parse_pat(&first_section(packets, PAT_PID))
}

pub fn decode_nit(packets: &[TransportPacket]) -> crate::error::Result<NitSection> {
    parse_nit(&first_section(packets, NIT_PID), false)
}

pub fn decode_sdt(packets: &[TransportPacket]) -> crate::error::Result<SdtSection> {
    parse_sdt(&first_section(packets, SDT_PID), false)
}

pub fn decode_eit(packets: &[TransportPacket]) -> crate::error::Result<EitSection> {
    parse_eit(&first_section(packets, EIT_PID), false)
}
