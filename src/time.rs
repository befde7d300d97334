// src/time.rs
//! DVB timestamps: 16-bit Modified Julian Date plus BCD HHMMSS, UTC.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Timelike, Utc};

fn bcd(b: u8) -> Option<u32> {
    let (hi, lo) = (b >> 4, b & 0x0F);
    (hi <= 9 && lo <= 9).then(|| (hi * 10 + lo) as u32)
}

fn to_bcd(v: u32) -> u8 {
    ((v / 10) << 4) as u8 | (v % 10) as u8
}

/// Decodes the 5-byte EIT start_time field (MJD + BCD HHMMSS). Returns
/// None on short input, out-of-range dates or invalid BCD digits.
pub fn decode_start_time(data: &[u8]) -> Option<DateTime<Utc>> {
    let data: &[u8; 5] = data.try_into().ok()?;
    let mjd = u16::from_be_bytes([data[0], data[1]]) as f64;
    let yp = ((mjd - 15078.2) / 365.25).floor();
    let mp = ((mjd - 14956.1 - (yp * 365.25).floor()) / 30.6001).floor();
    let day = mjd - 14956.0 - (yp * 365.25).floor() - (mp * 30.6001).floor();
    let k = if mp == 14.0 || mp == 15.0 { 1.0 } else { 0.0 };
    let year = 1900.0 + yp + k;
    let month = mp - 1.0 - k * 12.0;

    let date = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)?;
    let time = date.and_hms_opt(bcd(data[2])?, bcd(data[3])?, bcd(data[4])?)?;
    Some(Utc.from_utc_datetime(&time))
}

/// Inverse of [`decode_start_time`] for dates from 1900-03-01 onward.
pub fn encode_start_time(dt: DateTime<Utc>) -> [u8; 5] {
    let (y, m, d) = (dt.year() as f64, dt.month() as f64, dt.day() as f64);
    let l = if dt.month() <= 2 { 1.0 } else { 0.0 };
    let mjd = 14956.0 + d + ((y - 1900.0 - l) * 365.25).floor() + ((m + 1.0 + l * 12.0) * 30.6001).floor();
    let mjd = mjd as u16;
    [
        (mjd >> 8) as u8,
        (mjd & 0xFF) as u8,
        to_bcd(dt.hour()),
        to_bcd(dt.minute()),
        to_bcd(dt.second()),
    ]
}

/// Decodes the 3-byte BCD HHMMSS duration field into seconds.
pub fn decode_bcd_duration(data: &[u8]) -> Option<u32> {
    let data: &[u8; 3] = data.try_into().ok()?;
    Some(bcd(data[0])? * 3600 + bcd(data[1])? * 60 + bcd(data[2])?)
}

pub fn encode_bcd_duration(secs: u32) -> [u8; 3] {
    [to_bcd(secs / 3600), to_bcd(secs / 60 % 60), to_bcd(secs % 60)]
}
