// psi/section.rs
//! Generic DVB/PSI section reader with CRC-32 (MPEG-2) validation.

use crc::{Crc, CRC_32_MPEG_2};

use crate::constants::*;
use crate::error::SiError;

pub(crate) const CRC_MPEG: Crc<u32> = Crc::<u32>::new(&CRC_32_MPEG_2);

/// Table families per PID, used to reject sections that do not belong on
/// the PID they arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFamily {
    Pat,
    Nit,
    Sdt,
    Eit,
    Any,
}

impl TableFamily {
    pub fn matches(self, table_id: u8) -> bool {
        match self {
            TableFamily::Pat => table_id == TID_PAT,
            TableFamily::Nit => matches!(table_id, TID_NIT_ACTUAL | TID_NIT_OTHER),
            TableFamily::Sdt => matches!(table_id, TID_SDT_ACTUAL | TID_SDT_OTHER),
            TableFamily::Eit => matches!(
                table_id,
                TID_EIT_PF_ACTUAL | TID_EIT_PF_OTHER | TID_EIT_SCHED_FIRST..=TID_EIT_SCHED_LAST
            ),
            TableFamily::Any => true,
        }
    }
}

/// Fixed section header. `table_id_ext` is the transport_stream_id for
/// PAT/SDT, network_id for NIT and service_id for EIT.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionHeader {
    pub table_id:            u8,
    pub syntax_indicator:    bool,
    pub private:             bool,
    pub section_length:      u16,
    pub table_id_ext:        u16,
    pub version:             u8,
    pub current_next:        bool,
    pub section_number:      u8,
    pub last_section_number: u8,
}

/// Returned by [`Section::parse`].
#[derive(Debug)]
pub struct Section<'a> {
    pub header:       SectionHeader,
    /// Bytes between the fixed header and the CRC.
    pub body:         &'a [u8],
    pub crc_stored:   u32,
    pub crc_computed: u32,
    pub crc_ok:       bool,
}

impl Section<'_> {
    /// For callers that want a failing checksum to be fatal rather than a
    /// flag on the record.
    pub fn require_crc(&self) -> Result<(), SiError> {
        if self.crc_ok {
            Ok(())
        } else {
            Err(SiError::CrcMismatch {
                computed: self.crc_computed,
                stored: self.crc_stored,
            })
        }
    }
}

impl<'a> Section<'a> {
    /// Validates pointer field, table ID, declared length and CRC-32. A
    /// failing CRC does not reject the section; the record comes back
    /// with `crc_ok == false`.
    pub fn parse(payload: &'a [u8], expected: TableFamily) -> Result<Section<'a>, SiError> {
        if payload.is_empty() {
            return Err(SiError::TruncatedSection { declared: 1, available: 0 });
        }
        let pointer = payload[0] as usize;
        let start = 1 + pointer;
        if payload.len() < start + 3 {
            return Err(SiError::TruncatedSection {
                declared: start + 3,
                available: payload.len(),
            });
        }

        let table_id = payload[start];
        if !expected.matches(table_id) {
            return Err(SiError::UnexpectedTableId(table_id));
        }

        let sec_len = ((payload[start + 1] & 0x0F) as usize) << 8 | payload[start + 2] as usize;
        if sec_len > MAX_SECTION_LENGTH {
            // 4094/4095 are unencodable lengths: no input can satisfy them
            return Err(SiError::TruncatedSection {
                declared: sec_len,
                available: payload.len() - start - 3,
            });
        }
        let end = start + 3 + sec_len;
        if end > payload.len() {
            return Err(SiError::TruncatedSection {
                declared: sec_len,
                available: payload.len() - start - 3,
            });
        }

        let mut header = SectionHeader {
            table_id,
            syntax_indicator: payload[start + 1] & 0x80 != 0,
            private: payload[start + 1] & 0x40 != 0,
            section_length: sec_len as u16,
            ..SectionHeader::default()
        };

        // Too short to carry the extended header and a CRC: an empty
        // record, nothing to validate.
        if sec_len < 9 {
            return Ok(Section { header, body: &[], crc_stored: 0, crc_computed: 0, crc_ok: true });
        }

        header.table_id_ext = u16::from_be_bytes([payload[start + 3], payload[start + 4]]);
        header.version = (payload[start + 5] & 0x3E) >> 1;
        header.current_next = payload[start + 5] & 0x01 != 0;
        header.section_number = payload[start + 6];
        header.last_section_number = payload[start + 7];

        let crc_stored = u32::from_be_bytes([
            payload[end - 4],
            payload[end - 3],
            payload[end - 2],
            payload[end - 1],
        ]);
        let crc_calc = CRC_MPEG.checksum(&payload[start..end - 4]);
        let crc_ok = crc_calc == crc_stored;
        if !crc_ok {
            log::warn!(
                "CRC-32 mismatch on table 0x{table_id:02X}: computed 0x{crc_calc:08X}, stored 0x{crc_stored:08X}"
            );
        }

        Ok(Section {
            header,
            body: &payload[start + 8..end - 4],
            crc_stored,
            crc_computed: crc_calc,
            crc_ok,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Wraps `body` in a syntax section with a valid CRC and pointer field.
    pub(crate) fn build_section(table_id: u8, table_id_ext: u16, version: u8, body: &[u8]) -> Vec<u8> {
        let sec_len = 5 + body.len() + 4;
        let mut sec = vec![0u8]; // pointer_field
        sec.push(table_id);
        sec.push(0xB0 | (sec_len >> 8) as u8);
        sec.push((sec_len & 0xFF) as u8);
        sec.extend_from_slice(&table_id_ext.to_be_bytes());
        sec.push(0xC1 | version << 1);
        sec.push(0); // section_number
        sec.push(0); // last_section_number
        sec.extend_from_slice(body);
        let crc = CRC_MPEG.checksum(&sec[1..]);
        sec.extend_from_slice(&crc.to_be_bytes());
        sec
    }

    #[test]
    fn parses_header_and_validates_crc() {
        let payload = build_section(0x42, 0x0835, 3, &[1, 2, 3]);
        let sec = Section::parse(&payload, TableFamily::Sdt).unwrap();
        assert!(sec.crc_ok);
        assert_eq!(sec.header.table_id, 0x42);
        assert_eq!(sec.header.table_id_ext, 0x0835);
        assert_eq!(sec.header.version, 3);
        assert!(sec.header.current_next);
        assert_eq!(sec.body, &[1, 2, 3]);
    }

    #[test]
    fn pointer_field_skips_stuffing() {
        let mut payload = build_section(0x00, 1, 0, &[0, 0, 0, 16]);
        payload[0] = 2;
        payload.splice(1..1, [0xFF, 0xFF]);
        let sec = Section::parse(&payload, TableFamily::Pat).unwrap();
        assert!(sec.crc_ok);
        assert_eq!(sec.body.len(), 4);
    }

    #[test]
    fn corrupted_byte_fails_crc_but_still_decodes() {
        let mut payload = build_section(0x42, 1, 0, &[9, 9]);
        let last = payload.len() - 5;
        payload[last] ^= 0xFF;
        let sec = Section::parse(&payload, TableFamily::Sdt).unwrap();
        assert!(!sec.crc_ok);
        assert!(matches!(sec.require_crc(), Err(SiError::CrcMismatch { .. })));
    }

    #[test]
    fn wrong_family_is_rejected() {
        let payload = build_section(0x42, 1, 0, &[]);
        assert!(matches!(
            Section::parse(&payload, TableFamily::Pat),
            Err(SiError::UnexpectedTableId(0x42))
        ));
    }

    #[test]
    fn truncated_input_is_rejected() {
        let mut payload = build_section(0x00, 1, 0, &[0, 0, 0, 16]);
        payload.truncate(payload.len() - 2);
        assert!(matches!(
            Section::parse(&payload, TableFamily::Pat),
            Err(SiError::TruncatedSection { .. })
        ));
    }

    #[test]
    fn zero_length_section_is_an_empty_record() {
        let payload = [0u8, 0x00, 0xB0, 0x00];
        let sec = Section::parse(&payload, TableFamily::Pat).unwrap();
        assert!(sec.body.is_empty());
        assert!(sec.crc_ok);
        assert_eq!(sec.header.section_length, 0);
    }
}
