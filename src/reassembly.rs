// src/reassembly.rs
//! Per-PID payload reassembly. Packet payloads are concatenated into
//! logical sections; a set payload_unit_start_indicator opens a new one.

use std::collections::BTreeMap;

use crate::packet::TransportPacket;

/// Per-PID accumulator. Bytes before the first PUSI packet are dropped so a
/// partial leading section is never emitted.
#[derive(Default)]
pub struct SectionBuffer {
    sections: Vec<Vec<u8>>,
    started: bool,
}

impl SectionBuffer {
    pub fn push(&mut self, pkt: &TransportPacket) {
        if pkt.payload_unit_start {
            self.sections.push(Vec::new());
            self.started = true;
        }
        if self.started {
            if let Some(cur) = self.sections.last_mut() {
                cur.extend_from_slice(pkt.payload());
            }
        }
    }

    /// Drains all assembled sections, resetting the buffer.
    pub fn take_sections(&mut self) -> Vec<Vec<u8>> {
        self.started = false;
        std::mem::take(&mut self.sections)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Packets of the first logical section on `pid`: from the first PUSI
/// packet up to (excluding) the second.
pub fn packets_for_pid(packets: &[TransportPacket], pid: u16) -> Vec<TransportPacket> {
    let mut out = Vec::new();
    for pkt in packets.iter().filter(|p| p.pid == pid) {
        if pkt.payload_unit_start {
            if !out.is_empty() {
                break;
            }
        } else if out.is_empty() {
            continue; // partial leading section
        }
        out.push(pkt.clone());
    }
    out
}

/// All logical sections on `pid`, keyed by section index in arrival order.
pub fn payloads_by_pid(packets: &[TransportPacket], pid: u16) -> BTreeMap<usize, Vec<u8>> {
    let mut buf = SectionBuffer::default();
    for pkt in packets.iter().filter(|p| p.pid == pid) {
        buf.push(pkt);
    }
    buf.take_sections().into_iter().enumerate().collect()
}
