use clap::Parser;
use serde::Serialize;

use mpegts_si::psi::EitSection;
use mpegts_si::{services_to_pmt_map, ScanStats, SiScanner};

#[derive(Parser)]
#[command(name = "si-dump", about = "Decode PSI/SI tables from an MPEG-TS capture")]
struct Opt {
    /// Path to a raw transport-stream capture
    capture: std::path::PathBuf,

    /// Only frame packets with this PID (decimal or 0x hex)
    #[clap(long, value_parser = parse_pid)]
    pid: Option<u16>,

    /// Fail on DVB text with an unsupported character-set prefix instead
    /// of decoding it as an empty string
    #[clap(long, default_value_t = false)]
    strict_text: bool,

    /// Emit the report as pretty-printed JSON instead of a summary
    #[clap(long, default_value_t = false)]
    json: bool,
}

fn parse_pid(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x") {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| e.to_string())
}

#[derive(Serialize)]
struct Report<'a> {
    pat:    Option<&'a mpegts_si::psi::PatSection>,
    nit:    Option<&'a mpegts_si::psi::NitSection>,
    sdt:    Option<&'a mpegts_si::psi::SdtSection>,
    eits:   Vec<&'a EitSection>,
    stats:  &'a ScanStats,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::parse();

    let buf = std::fs::read(&opt.capture)?;
    let mut scanner = SiScanner::new();
    scanner.strict_text = opt.strict_text;
    for pkt in mpegts_si::parse_strict(&buf, opt.pid)? {
        scanner.push_packet(&pkt);
    }
    scanner.finish();

    let cache = &scanner.cache;
    if opt.json {
        let report = Report {
            pat: cache.pat.as_ref(),
            nit: cache.nit.as_ref(),
            sdt: cache.sdt.as_ref(),
            eits: cache.eits.values().collect(),
            stats: &scanner.stats,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if let Some(pat) = &cache.pat {
        println!("PAT: {} associations (ts_id {})", pat.associations.len(), pat.transport_stream_id);
        for assoc in &pat.associations {
            let kind = if assoc.program_number == 0 { "NIT" } else { "PMT" };
            println!("  program {:5} -> {} PID 0x{:04X}", assoc.program_number, kind, assoc.pid);
        }
    }
    if let Some(nit) = &cache.nit {
        println!("NIT: network {:?} (id {})", nit.network_name, nit.network_id);
        for (sid, stype) in &nit.service_types {
            println!("  service {sid:5} type {stype:?}");
        }
    }
    if let Some(sdt) = &cache.sdt {
        println!("SDT: {} services", sdt.services.len());
        for svc in &sdt.services {
            println!("  {:5} {:<24} {:<20} {:?}", svc.service_id, svc.service_name, svc.provider_name, svc.service_type);
        }
        if let Some(pat) = &cache.pat {
            for (svc, pmt_pid) in services_to_pmt_map(sdt, pat) {
                println!("  {} -> PMT PID 0x{pmt_pid:04X}", svc.service_name);
            }
        }
    }
    for eit in cache.eits.values() {
        println!("EIT: service {} ({} events)", eit.service_id, eit.events.len());
        for ev in &eit.events {
            let start = ev.start_time.map_or_else(|| "?".to_owned(), |t| t.to_rfc3339());
            println!("  [{start}] {} ({}s)", ev.title, ev.duration_secs);
        }
    }
    println!(
        "{} packets, {} CC errors, {} CRC errors, {} rejected sections",
        scanner.stats.packets,
        scanner.stats.continuity_errors,
        scanner.stats.crc_errors,
        scanner.stats.section_errors,
    );
    Ok(())
}
