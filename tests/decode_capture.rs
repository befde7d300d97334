//! End-to-end decoding of a synthesized DVB-T2 capture modelled on a
//! Czech public-broadcast multiplex: 20-program PAT, NIT with mixed
//! HEVC/MPEG-2 TV and radio services, 19-service SDT, EIT events.

use chrono::{TimeZone, Utc};
use crc::{Crc, CRC_32_MPEG_2};

use mpegts_si::psi::ServiceType;
use mpegts_si::textcodec::encode_dvb_text;
use mpegts_si::{
    constants::*, decode_nit, decode_pat, decode_sdt, parse, services_to_pmt_map, SiScanner,
};

const CRC_MPEG: Crc<u32> = Crc::<u32>::new(&CRC_32_MPEG_2);

// ───────────────────────── fixture builders ─────────────────────────

/// Syntax section with pointer field and valid CRC.
fn build_section(table_id: u8, table_id_ext: u16, version: u8, body: &[u8]) -> Vec<u8> {
    let sec_len = 5 + body.len() + 4;
    let mut sec = vec![0u8];
    sec.push(table_id);
    sec.push(0xB0 | (sec_len >> 8) as u8);
    sec.push((sec_len & 0xFF) as u8);
    sec.extend_from_slice(&table_id_ext.to_be_bytes());
    sec.push(0xC1 | version << 1);
    sec.push(0);
    sec.push(0);
    sec.extend_from_slice(body);
    let crc = CRC_MPEG.checksum(&sec[1..]);
    sec.extend_from_slice(&crc.to_be_bytes());
    sec
}

/// Splits a section payload into 188-byte packets, PUSI on the first.
fn packetize(pid: u16, section: &[u8], first_cc: u8) -> Vec<u8> {
    let mut out = Vec::new();
    for (i, chunk) in section.chunks(TS_PAYLOAD_SIZE).enumerate() {
        let mut frame = [0xFFu8; TS_PACKET_SIZE];
        frame[0] = TS_SYNC_BYTE;
        frame[1] = if i == 0 { 0x40 } else { 0x00 } | (pid >> 8) as u8;
        frame[2] = (pid & 0xFF) as u8;
        frame[3] = 0x10 | (first_cc.wrapping_add(i as u8) & 0x0F);
        frame[TS_HEADER_SIZE..TS_HEADER_SIZE + chunk.len()].copy_from_slice(chunk);
        out.extend_from_slice(&frame);
    }
    out
}

const TV_PROGRAMS: [(u16, u16, &str); 9] = [
    (268, 2100, "CT 1 HD T2"),
    (270, 2200, "CT 2 HD T2"),
    (272, 2300, "CT SPORT HD T2"),
    (274, 2400, "CT 24 HD T2"),
    (276, 2500, "CT ART HD T2"),
    (280, 2700, "CT 1 SM HD T2"),
    (282, 2800, "CT 1 JM HD T2"),
    (284, 2900, "CT 1 SVC HD T2"),
    (286, 3000, "CT 1 JZC HD T2"),
];

const RADIO_NAMES: [&str; 10] = [
    "CRo RADIOZURNAL T2",
    "CRo DVOJKA T2",
    "CRo VLTAVA T2",
    "CRo RADIO WAVE T2",
    "CRo D-DUR T2",
    "CRo RADIO JUNIOR T2",
    "CRo PLUS T2",
    "CRo JAZZ T2",
    "CRo RZ SPORT T2",
    "CRo POHODA T2",
];

fn pat_section() -> Vec<u8> {
    let mut body = Vec::new();
    let mut push = |pn: u16, pid: u16| {
        body.extend_from_slice(&pn.to_be_bytes());
        body.push(0xE0 | (pid >> 8) as u8);
        body.push((pid & 0xFF) as u8);
    };
    push(0, 16);
    for &(pn, pid, _) in &TV_PROGRAMS {
        push(pn, pid);
    }
    for i in 0..10u16 {
        push(16651 + i, 7010 + i * 10);
    }
    build_section(TID_PAT, 0x0835, 4, &body)
}

fn nit_section() -> Vec<u8> {
    let name = encode_dvb_text("CT, MUX 21");
    let mut net_descs = vec![DESC_NETWORK_NAME, name.len() as u8];
    net_descs.extend_from_slice(&name);

    let mut list = Vec::new();
    let mut push = |sid: u16, stype: u8| {
        list.extend_from_slice(&sid.to_be_bytes());
        list.push(stype);
    };
    for sid in [268u16, 270, 272, 274, 276, 280, 282] {
        push(sid, 0x1F);
    }
    for sid in [284u16, 286] {
        push(sid, 0x01);
    }
    for sid in 16651..=16659u16 {
        push(sid, 0x02);
    }
    let mut ts_descs = vec![DESC_SERVICE_LIST, list.len() as u8];
    ts_descs.extend_from_slice(&list);

    let mut ts_loop = Vec::new();
    ts_loop.extend_from_slice(&0x0835u16.to_be_bytes());
    ts_loop.extend_from_slice(&0x20FAu16.to_be_bytes());
    ts_loop.push(0xF0 | (ts_descs.len() >> 8) as u8);
    ts_loop.push((ts_descs.len() & 0xFF) as u8);
    ts_loop.extend_from_slice(&ts_descs);

    let mut body = Vec::new();
    body.push(0xF0 | (net_descs.len() >> 8) as u8);
    body.push((net_descs.len() & 0xFF) as u8);
    body.extend_from_slice(&net_descs);
    body.push(0xF0 | (ts_loop.len() >> 8) as u8);
    body.push((ts_loop.len() & 0xFF) as u8);
    body.extend_from_slice(&ts_loop);
    build_section(TID_NIT_ACTUAL, 0x3201, 2, &body)
}

fn sdt_section() -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&0x20FAu16.to_be_bytes());
    body.push(0xFF);
    let mut push = |sid: u16, stype: u8, provider: &str, name: &str| {
        let provider = encode_dvb_text(provider);
        let name = encode_dvb_text(name);
        let mut desc = vec![DESC_SERVICE, (3 + provider.len() + name.len()) as u8, stype];
        desc.push(provider.len() as u8);
        desc.extend_from_slice(&provider);
        desc.push(name.len() as u8);
        desc.extend_from_slice(&name);
        body.extend_from_slice(&sid.to_be_bytes());
        body.push(0xFD); // EIT_present_following
        body.push(0x80 | (desc.len() >> 8) as u8);
        body.push((desc.len() & 0xFF) as u8);
        body.extend_from_slice(&desc);
    };
    for &(sid, _, name) in &TV_PROGRAMS {
        push(sid, 0x1F, "CESKA TELEVIZE", name);
    }
    for (i, name) in RADIO_NAMES.iter().enumerate() {
        push(16651 + i as u16, 0x02, "CESKY ROZHLAS", name);
    }
    build_section(TID_SDT_ACTUAL, 0x0835, 1, &body)
}

fn eit_section() -> Vec<u8> {
    let start = Utc.with_ymd_and_hms(2026, 3, 1, 19, 0, 0).unwrap();
    let title = encode_dvb_text("Zprávy");
    let subtitle = encode_dvb_text("Hlavní zpravodajská relace");
    let mut descs = vec![DESC_SHORT_EVENT, (5 + title.len() + subtitle.len()) as u8];
    descs.extend_from_slice(b"ces");
    descs.push(title.len() as u8);
    descs.extend_from_slice(&title);
    descs.push(subtitle.len() as u8);
    descs.extend_from_slice(&subtitle);
    for (number, text) in [(0u8, "Moderuje "), (1u8, "redakce zpravodajství.")] {
        let text = encode_dvb_text(text);
        descs.extend_from_slice(&[DESC_EXTENDED_EVENT, (6 + text.len()) as u8, number << 4 | 1]);
        descs.extend_from_slice(b"ces");
        descs.push(0);
        descs.push(text.len() as u8);
        descs.extend_from_slice(&text);
    }

    let mut event = Vec::new();
    event.extend_from_slice(&0x0101u16.to_be_bytes());
    event.extend_from_slice(&mpegts_si::time::encode_start_time(start));
    event.extend_from_slice(&mpegts_si::time::encode_bcd_duration(1800));
    event.push(0x80 | (descs.len() >> 8) as u8);
    event.push((descs.len() & 0xFF) as u8);
    event.extend_from_slice(&descs);

    let mut body = Vec::new();
    body.extend_from_slice(&0x0835u16.to_be_bytes());
    body.extend_from_slice(&0x20FAu16.to_be_bytes());
    body.push(0);
    body.push(TID_EIT_PF_ACTUAL);
    body.extend_from_slice(&event);
    build_section(TID_EIT_PF_ACTUAL, 268, 9, &body)
}

fn capture() -> Vec<u8> {
    let mut buf = vec![0u8; 100]; // leading garbage the framer must skip
    buf.extend_from_slice(&packetize(PAT_PID, &pat_section(), 0));
    buf.extend_from_slice(&packetize(NIT_PID, &nit_section(), 0));
    buf.extend_from_slice(&packetize(SDT_PID, &sdt_section(), 0));
    buf.extend_from_slice(&packetize(EIT_PID, &eit_section(), 0));
    buf
}

// ───────────────────────── scenarios ─────────────────────────

#[test]
fn pat_carries_twenty_associations() {
    let packets = parse(&capture(), Some(PAT_PID));
    let pat = decode_pat(&packets).unwrap();
    assert!(pat.crc_ok);
    assert_eq!(pat.associations.len(), 20);
    assert_eq!(pat.nit_pid(), Some(16));
    for &(pn, pid, _) in &TV_PROGRAMS {
        assert_eq!(pat.pmt_pid(pn), Some(pid), "program {pn}");
    }
    assert_eq!(pat.pmt_pid(16651), Some(7010));
    assert_eq!(pat.pmt_pid(16660), Some(7100));
    // insertion order is preserved
    assert_eq!(pat.associations[0].program_number, 0);
    assert_eq!(pat.associations[1].program_number, 268);
    assert_eq!(pat.associations[19].program_number, 16660);
}

#[test]
fn nit_names_network_and_service_types() {
    let packets = parse(&capture(), Some(NIT_PID));
    let nit = decode_nit(&packets).unwrap();
    assert!(nit.crc_ok);
    assert_eq!(nit.network_name, "CT, MUX 21");
    assert_eq!(nit.service_types.len(), 18);
    for sid in [268u16, 270, 272, 274, 276, 280, 282] {
        assert_eq!(nit.service_types[&sid], ServiceType::HevcDigitalTelevision);
    }
    for sid in [284u16, 286] {
        assert_eq!(nit.service_types[&sid], ServiceType::DigitalTelevision);
    }
    for sid in 16651..=16659u16 {
        assert_eq!(nit.service_types[&sid], ServiceType::DigitalRadioSound);
    }
}

#[test]
fn sdt_names_nineteen_services() {
    let packets = parse(&capture(), Some(SDT_PID));
    let sdt = decode_sdt(&packets).unwrap();
    assert!(sdt.crc_ok);
    assert_eq!(sdt.services.len(), 19);

    let ct1 = &sdt.services[0];
    assert_eq!(ct1.service_id, 268);
    assert_eq!(ct1.provider_name, "CESKA TELEVIZE");
    assert_eq!(ct1.service_name, "CT 1 HD T2");
    assert_eq!(ct1.service_type, ServiceType::HevcDigitalTelevision);

    let last_tv = &sdt.services[8];
    assert_eq!(last_tv.service_id, 286);
    assert_eq!(last_tv.service_name, "CT 1 JZC HD T2");

    for (i, name) in RADIO_NAMES.iter().enumerate() {
        let svc = &sdt.services[9 + i];
        assert_eq!(svc.service_id, 16651 + i as u16);
        assert_eq!(svc.provider_name, "CESKY ROZHLAS");
        assert_eq!(svc.service_name, *name);
        assert_eq!(svc.service_type, ServiceType::DigitalRadioSound);
    }
}

#[test]
fn scanner_decodes_whole_capture() {
    let mut scanner = SiScanner::new();
    scanner.push_bytes(&capture());
    scanner.finish();

    assert_eq!(scanner.stats.crc_errors, 0);
    assert_eq!(scanner.stats.section_errors, 0);
    let cache = &scanner.cache;
    assert_eq!(cache.pat.as_ref().unwrap().associations.len(), 20);
    assert_eq!(cache.nit.as_ref().unwrap().service_types.len(), 18);
    assert_eq!(cache.sdt.as_ref().unwrap().services.len(), 19);

    let events: Vec<_> = cache.events_for_service(268).collect();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].title, "Zprávy");
    assert_eq!(events[0].subtitle, "Hlavní zpravodajská relace");
    assert_eq!(events[0].extended_text, "Moderuje redakce zpravodajství.");
    assert_eq!(events[0].language, "ces");
    assert_eq!(
        events[0].start_time,
        Some(Utc.with_ymd_and_hms(2026, 3, 1, 19, 0, 0).unwrap())
    );
    assert_eq!(events[0].duration_secs, 1800);
}

#[test]
fn sdt_pat_join_is_sdt_driven() {
    let mut scanner = SiScanner::new();
    scanner.push_bytes(&capture());
    scanner.finish();
    let cache = &scanner.cache;

    let joined = services_to_pmt_map(
        cache.sdt.as_ref().unwrap(),
        cache.pat.as_ref().unwrap(),
    );
    assert_eq!(joined.len(), 19);
    assert_eq!(joined[0].0.service_name, "CT 1 HD T2");
    assert_eq!(joined[0].1, 2100);
    assert_eq!(joined[18].0.service_name, "CRo POHODA T2");
    assert_eq!(joined[18].1, 7100);
}

#[test]
fn framer_recovers_from_leading_garbage() {
    let buf = capture();
    let packets = parse(&buf, None);
    // every 188-byte frame after the 100-byte garbage prefix
    assert_eq!(packets.len(), (buf.len() - 100) / 188);
    assert!(packets.iter().all(|p| p.pid <= 0x1FFF));
}

#[test]
fn corrupted_section_is_counted_not_fatal() {
    let mut buf = capture();
    // flip one byte inside the SDT body, well past the garbage prefix
    let sdt_start = 100 + packetize(PAT_PID, &pat_section(), 0).len()
        + packetize(NIT_PID, &nit_section(), 0).len();
    buf[sdt_start + 40] ^= 0xFF;

    let mut scanner = SiScanner::new();
    scanner.push_bytes(&buf);
    scanner.finish();

    assert_eq!(scanner.stats.crc_errors, 1);
    // the damaged SDT still decodes, flagged
    assert!(!scanner.cache.sdt.as_ref().unwrap().crc_ok);
    // other tables are untouched
    assert!(scanner.cache.pat.as_ref().unwrap().crc_ok);
    assert!(scanner.cache.nit.as_ref().unwrap().crc_ok);
}
