// src/lib.rs
//! MPEG-TS / DVB-SI decoder core: transport packet framing, per-PID
//! section reassembly and PAT / NIT / SDT / EIT table decoding, including
//! the DVB text rules of ETSI EN 300 468 Annex A.
//!
//! Data flows strictly downstream: raw bytes → [`packet::TransportPacket`]s
//! → per-PID section byte streams ([`reassembly`]) → structured tables
//! ([`psi`]). [`si_cache::SiScanner`] wires the layers together for whole
//! captures.

pub mod constants;
pub mod error;
pub mod packet;
pub mod psi;
pub mod reassembly;
pub mod si_cache;
pub mod textcodec;
pub mod time;

pub use error::{Result, SiError};
pub use packet::{
    find_sync, parse, parse_strict, AdaptationFieldControl, ScramblingControl, TransportPacket,
};
pub use si_cache::{
    decode_eit, decode_nit, decode_pat, decode_sdt, extract_sections, services_to_pmt_map,
    ScanStats, SiCache, SiScanner,
};
