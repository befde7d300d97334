// src/textcodec.rs
//! DVB text strings per ETSI EN 300 468 Annex A: character-set prefix
//! bytes, control codes, ISO/IEC 6937 accent composition.

use crate::error::SiError;

/// ISO/IEC 6937 non-spacing accent prefixes. Per prefix: the base letters
/// it combines with and the composed characters, index-parallel.
const ACCENTS: &[(u8, &str, &str)] = &[
    (0xC1, "aeiouAEIOU", "àèìòùÀÈÌÒÙ"),                          // grave
    (0xC2, "aceilnorsuyzACEILNORSUYZ", "áćéíĺńóŕśúýźÁĆÉÍĹŃÓŔŚÚÝŹ"), // acute
    (0xC3, "aceghijosuwyACEGHIJOSUWY", "âĉêĝĥîĵôŝûŵŷÂĈÊĜĤÎĴÔŜÛŴŶ"), // circumflex
    (0xC4, "ainouAINOU", "ãĩñõũÃĨÑÕŨ"),                          // tilde
    (0xC5, "aeiouAEIOU", "āēīōūĀĒĪŌŪ"),                          // macron
    (0xC6, "aguAGU", "ăğŭĂĞŬ"),                                   // breve
    (0xC7, "cegzCEGZI", "ċėġżĊĖĠŻİ"),                            // dot above
    (0xC8, "aeiouyAEIOUY", "äëïöüÿÄËÏÖÜŸ"),                      // diaeresis
    (0xCA, "auAU", "åůÅŮ"),                                       // ring
    (0xCB, "cgklnrstCGKLNRST", "çģķļņŗşţÇĢĶĻŅŖŞŢ"),              // cedilla
    (0xCD, "ouOU", "őűŐŰ"),                                       // double acute
    (0xCE, "aeiuAEIU", "ąęįųĄĘĮŲ"),                              // ogonek
    (0xCF, "cdelnrstzCDELNRSTZ", "čďěľňřšťžČĎĚĽŇŘŠŤŽ"),          // caron
];

/// Lossy decode: an unknown character-set prefix yields an empty string.
pub fn decode_dvb_text(data: &[u8]) -> String {
    decode(data, false).unwrap_or_default()
}

/// Strict decode: an unknown character-set prefix is an error.
pub fn decode_dvb_text_strict(data: &[u8]) -> Result<String, SiError> {
    decode(data, true)
}

/// Dispatch point for parsers that thread a strict-text flag through.
pub(crate) fn decode_text(data: &[u8], strict: bool) -> Result<String, SiError> {
    if strict {
        decode_dvb_text_strict(data)
    } else {
        Ok(decode_dvb_text(data))
    }
}

fn decode(data: &[u8], strict: bool) -> Result<String, SiError> {
    let Some(&first) = data.first() else {
        return Ok(String::new());
    };
    match first {
        0x01..=0x05 => {
            // prefix 0x01..0x05 selects ISO 8859-5..9
            decode_iso8859(first as u16 + 4, &data[1..], strict)
        }
        0x10 => {
            if data.len() < 3 || data[1] != 0x00 {
                return unsupported(first, strict);
            }
            decode_iso8859(data[2] as u16, &data[3..], strict)
        }
        0x06..=0x1F => unsupported(first, strict),
        _ => Ok(decode_iso6937(data)),
    }
}

fn unsupported(prefix: u8, strict: bool) -> Result<String, SiError> {
    if strict {
        Err(SiError::UnsupportedEncoding(prefix))
    } else {
        log::debug!("unsupported DVB text prefix 0x{prefix:02X}, dropping string");
        Ok(String::new())
    }
}

/// Default character table: ASCII plus control codes plus latching accent
/// prefixes (ISO/IEC 6937 subset used by DVB).
fn decode_iso6937(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len());
    let mut accent: Option<usize> = None;
    for &b in data {
        match b {
            0x20..=0x7F => {
                let ch = b as char;
                match accent.take() {
                    Some(idx) => {
                        let (_, bases, composed) = ACCENTS[idx];
                        let hit = bases
                            .chars()
                            .zip(composed.chars())
                            .find(|&(base, _)| base == ch);
                        out.push(hit.map_or(ch, |(_, c)| c));
                    }
                    None => out.push(ch),
                }
            }
            0x8A => {
                accent = None;
                out.push('\n');
            }
            // emphasis on/off and the remaining control codes emit nothing
            0x80..=0x9F => accent = None,
            _ => {
                if let Some(idx) = ACCENTS.iter().position(|&(p, _, _)| p == b) {
                    accent = Some(idx);
                }
                // bytes outside the accent table are dropped
            }
        }
    }
    out
}

fn decode_iso8859(part: u16, data: &[u8], strict: bool) -> Result<String, SiError> {
    let map: fn(u8) -> Option<char> = match part {
        1 => |b| Some(b as char),
        5 => iso8859_5,
        6 => iso8859_6,
        7 => iso8859_7,
        8 => iso8859_8,
        9 => iso8859_9,
        _ => return unsupported(part as u8, strict),
    };
    Ok(data.iter().filter_map(|&b| map(b)).collect())
}

/// Cyrillic. The alphabet block sits at a constant offset from the byte
/// value; the handful of stragglers are matched explicitly.
fn iso8859_5(b: u8) -> Option<char> {
    match b {
        0xA0 => Some('\u{00A0}'),
        0xAD => Some('\u{00AD}'),
        0xF0 => Some('\u{2116}'),
        0xFD => Some('\u{00A7}'),
        0xA1..=0xFF => char::from_u32(b as u32 + 0x360),
        _ => Some(b as char),
    }
}

/// Arabic. 0xC1..0xDA and 0xE0..0xF2 map at offset 0x560.
fn iso8859_6(b: u8) -> Option<char> {
    match b {
        0xA0 => Some('\u{00A0}'),
        0xA4 => Some('\u{00A4}'),
        0xAC => Some('\u{060C}'),
        0xAD => Some('\u{00AD}'),
        0xBB => Some('\u{061B}'),
        0xBF => Some('\u{061F}'),
        0xC1..=0xDA | 0xE0..=0xF2 => char::from_u32(b as u32 + 0x560),
        0x00..=0x9F => Some(b as char),
        _ => None,
    }
}

/// Greek. The alphabet block 0xB8..0xFE maps at offset 0x2D0.
fn iso8859_7(b: u8) -> Option<char> {
    match b {
        0xA0 => Some('\u{00A0}'),
        0xA1 => Some('\u{2018}'),
        0xA2 => Some('\u{2019}'),
        0xA4 => Some('\u{20AC}'),
        0xA5 => Some('\u{20AF}'),
        0xAA => Some('\u{037A}'),
        0xAD => Some('\u{00AD}'),
        0xAF => Some('\u{2015}'),
        0xB4 => Some('\u{0384}'),
        0xB5 => Some('\u{0385}'),
        0xB6 => Some('\u{0386}'),
        0xD2 => None, // unassigned
        0xB8..=0xBA | 0xBC | 0xBE..=0xD1 | 0xD3..=0xFE => char::from_u32(b as u32 + 0x2D0),
        0xFF => None,
        _ => Some(b as char),
    }
}

/// Hebrew. The alphabet block 0xE0..0xFA maps at offset 0x4F0.
fn iso8859_8(b: u8) -> Option<char> {
    match b {
        0xA0 => Some('\u{00A0}'),
        0xAA => Some('\u{00D7}'),
        0xBA => Some('\u{00F7}'),
        0xDF => Some('\u{2017}'),
        0xE0..=0xFA => char::from_u32(b as u32 + 0x4F0),
        0xA1 | 0xBF..=0xDE | 0xFB..=0xFF => None,
        _ => Some(b as char),
    }
}

/// Turkish: Latin-1 with six letters swapped out.
fn iso8859_9(b: u8) -> Option<char> {
    match b {
        0xD0 => Some('Ğ'),
        0xDD => Some('İ'),
        0xDE => Some('Ş'),
        0xF0 => Some('ğ'),
        0xFD => Some('ı'),
        0xFE => Some('ş'),
        _ => Some(b as char),
    }
}

/// Inverse of the default table, for writing SI strings: ASCII passes
/// through, '\n' becomes the line separator, composed characters become
/// accent-prefix pairs. Characters with no encoding are dropped.
pub fn encode_dvb_text(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    'chars: for ch in text.chars() {
        if ch == '\n' {
            out.push(0x8A);
            continue;
        }
        if ch.is_ascii() && (' '..='\x7F').contains(&ch) {
            out.push(ch as u8);
            continue;
        }
        for &(prefix, bases, composed) in ACCENTS {
            if let Some((base, _)) = bases
                .chars()
                .zip(composed.chars())
                .find(|&(_, c)| c == ch)
            {
                out.push(prefix);
                out.push(base as u8);
                continue 'chars;
            }
        }
    }
    out
}
