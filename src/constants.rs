//! Constants for MPEG-TS framing and DVB-SI table processing

/// MPEG-TS packet constants
pub const TS_PACKET_SIZE: usize = 188;
pub const TS_SYNC_BYTE: u8 = 0x47;
pub const TS_HEADER_SIZE: usize = 4;
pub const TS_PAYLOAD_SIZE: usize = TS_PACKET_SIZE - TS_HEADER_SIZE;

/// 13-bit PID space
pub const PID_MAX: u16 = 0x1FFF;

/// PSI/SI PIDs (ISO 13818-1 / ETSI EN 300 468)
pub const PAT_PID: u16 = 0x0000;
pub const NIT_PID: u16 = 0x0010;
pub const SDT_PID: u16 = 0x0011;
pub const EIT_PID: u16 = 0x0012;
pub const NULL_PID: u16 = 0x1FFF;

/// Table IDs
pub const TID_PAT: u8 = 0x00;
pub const TID_NIT_ACTUAL: u8 = 0x40;
pub const TID_NIT_OTHER: u8 = 0x41;
pub const TID_SDT_ACTUAL: u8 = 0x42;
pub const TID_SDT_OTHER: u8 = 0x46;
pub const TID_EIT_PF_ACTUAL: u8 = 0x4E;
pub const TID_EIT_PF_OTHER: u8 = 0x4F;
pub const TID_EIT_SCHED_FIRST: u8 = 0x50;
pub const TID_EIT_SCHED_LAST: u8 = 0x6F;

/// Longest legal section_length for SI sections
pub const MAX_SECTION_LENGTH: usize = 4093;

/// Descriptor tags handled by the section decoder
pub const DESC_NETWORK_NAME: u8 = 0x40;
pub const DESC_SERVICE_LIST: u8 = 0x41;
pub const DESC_SERVICE: u8 = 0x48;
pub const DESC_SHORT_EVENT: u8 = 0x4D;
pub const DESC_EXTENDED_EVENT: u8 = 0x4E;
pub const DESC_COMPONENT: u8 = 0x50;
pub const DESC_CONTENT: u8 = 0x54;
pub const DESC_PARENTAL_RATING: u8 = 0x55;
pub const DESC_SUBTITLING: u8 = 0x59;
pub const DESC_PDC: u8 = 0x69;
