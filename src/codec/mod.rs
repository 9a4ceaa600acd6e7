//! Byte-level packet field codec.
//!
//! Reads and writes the primitive wire encodings used across every
//! console packet family: little-endian fixed-width integers, signed
//! two's complement "floats", bit-packed dates and times, and the
//! Davis CRC-16.
//!
//! Refer to the Vantage Pro, Vantage Pro2 and Vantage Vue Serial
//! Communication Reference Manual, section X. Data Formats.

mod forecast;

pub use forecast::{get_forecast, get_forecast_icons};

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use crc::{Crc, CRC_16_XMODEM};
use serde::{Deserialize, Serialize};

/// The Davis CRC is CRC-16 with the CCITT polynomial 0x1021 and a zero
/// initial value, which is exactly CRC-16/XMODEM.
const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// Computes the CRC over a buffer.  A complete received packet,
/// including its trailing big-endian CRC bytes, checksums to zero.
pub fn crc(p: &[u8]) -> u16 {
    CRC16.checksum(p)
}

/// Writes the CRC of `p[..len-2]` big-endian into the last two bytes.
pub fn set_crc(p: &mut [u8]) {
    let len = p.len();
    let c = crc(&p[..len - 2]);
    BigEndian::write_u16(&mut p[len - 2..], c);
}

/// Gets a 1-byte unsigned integer.
pub fn get_u8(p: &[u8], i: usize) -> u8 {
    p[i]
}

/// Gets a 1-byte temperature, stored offset by +90 like the extra
/// sensor channels.  255 on the wire reads as 165, the dash value.
pub fn get_temp8(p: &[u8], i: usize) -> i16 {
    i16::from(p[i]) - 90
}

/// Gets a 2-byte unsigned little-endian integer.
pub fn get_u16(p: &[u8], i: usize) -> u16 {
    LittleEndian::read_u16(&p[i..])
}

/// Gets a 2-byte signed two's complement value as a float.
pub fn get_float16(p: &[u8], i: usize) -> f64 {
    f64::from(LittleEndian::read_i16(&p[i..]))
}

/// Gets a 2-byte signed value in tenths, like the inside and outside
/// temperatures.
pub fn get_float16_10(p: &[u8], i: usize) -> f64 {
    get_float16(p, i) / 10.0
}

/// Gets a barometric pressure in thousandths of an inch of mercury.
pub fn get_pressure(p: &[u8], i: usize) -> f64 {
    get_float16(p, i) / 1000.0
}

/// Gets a rain rate or accumulation in hundredths of an inch.
pub fn get_rain_clicks(p: &[u8], i: usize) -> f64 {
    get_float16(p, i) / 100.0
}

/// Gets an UltraViolet index in tenths.
pub fn get_uv_index(p: &[u8], i: usize) -> f64 {
    f64::from(p[i]) / 10.0
}

/// Gets a console battery voltage.
pub fn get_voltage(p: &[u8], i: usize) -> f64 {
    get_float16(p, i) * 300.0 / 512.0 / 100.0
}

/// Gets a 1-byte MPH wind speed.
pub fn get_mph8(p: &[u8], i: usize) -> u8 {
    p[i]
}

/// Gets a 2-byte MPH wind speed in tenths, like the 2 and 10 minute
/// averages in a loop2 packet.
pub fn get_mph16(p: &[u8], i: usize) -> f64 {
    get_float16(p, i) / 10.0
}

/// Gets a 2-byte date with no time, like the rain storm start date.
///
/// The bit layout is:
///
/// ```text
///  MMMM DDDD DYYY YYYY
/// 15       8         0
/// ```
///
/// 0xffff means no date has been set and decodes to `None`.
pub fn get_date16(p: &[u8], i: usize) -> Option<NaiveDateTime> {
    let d = get_u16(p, i);
    if d == 0xffff {
        return None;
    }

    let year = 2000 + i32::from(d & 0x007f);
    let day = u32::from((d & 0x0f80) >> 7);
    let month = u32::from((d & 0xf000) >> 12);

    NaiveDate::from_ymd_opt(year, month, day).map(|d| d.and_time(NaiveTime::MIN))
}

/// Sets a 2-byte date with no time.  `None` writes the 0xffff dash.
pub fn set_date16(p: &mut [u8], i: usize, t: Option<NaiveDateTime>) {
    let d = match t {
        Some(t) => {
            ((t.month() << 12) | (t.day() << 7)) as u16 | ((t.year() - 2000) as u16 & 0x007f)
        }
        None => 0xffff,
    };
    LittleEndian::write_u16(&mut p[i..], d);
}

/// Gets a 2-byte time with no date, like sunrise and sunset.  The
/// value is stored as hour × 100 + minute and is combined with
/// today's date.  0xffff decodes to `None`.
pub fn get_time16(p: &[u8], i: usize) -> Option<NaiveDateTime> {
    let t = get_u16(p, i);
    if t == 0xffff {
        return None;
    }

    let hour = u32::from(t / 100);
    let minute = u32::from(t % 100);

    Local::now().date_naive().and_hms_opt(hour, minute, 0)
}

/// Sets a 2-byte time with no date.  `None` writes the 0xffff dash.
pub fn set_time16(p: &mut [u8], i: usize, t: Option<NaiveDateTime>) {
    let v = match t {
        Some(t) => (t.hour() * 100 + t.minute()) as u16,
        None => 0xffff,
    };
    LittleEndian::write_u16(&mut p[i..], v);
}

/// Gets a 4-byte date and time, like in archive records.
///
/// The date half is:
///
/// ```text
///  YYYY YYYM MMMD DDDD
/// 15       8         0
/// ```
///
/// and the time half is stored as hour × 100 + minute.
pub fn get_datetime32(p: &[u8], i: usize) -> Option<NaiveDateTime> {
    let d = get_u16(p, i);
    let day = u32::from(d & 0x001f);
    let month = u32::from((d & 0x01e0) >> 5);
    let year = 2000 + i32::from((d & 0xfe00) >> 9);

    let t = get_u16(p, i + 2);
    let hour = u32::from(t / 100);
    let minute = u32::from(t % 100);

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
}

/// Sets a 4-byte date and time.
pub fn set_datetime32(p: &mut [u8], i: usize, t: NaiveDateTime) {
    let date = (t.day() as i32 + t.month() as i32 * 0x20 + (t.year() - 2000) * 0x200) as u16;
    LittleEndian::write_u16(&mut p[i..], date);

    let time = (t.hour() * 100 + t.minute()) as u16;
    LittleEndian::write_u16(&mut p[i + 2..], time);
}

/// Gets a 6-byte date and time, like the console clock.  The bytes
/// are `(second, minute, hour, day, month, year-1900)`.
pub fn get_datetime48(p: &[u8], i: usize) -> Option<NaiveDateTime> {
    let second = u32::from(p[i]);
    let minute = u32::from(p[i + 1]);
    let hour = u32::from(p[i + 2]);
    let day = u32::from(p[i + 3]);
    let month = u32::from(p[i + 4]);
    let year = 1900 + i32::from(p[i + 5]);

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, second))
}

/// Sets a 6-byte date and time.
pub fn set_datetime48(p: &mut [u8], i: usize, t: NaiveDateTime) {
    p[i] = t.second() as u8;
    p[i + 1] = t.minute() as u8;
    p[i + 2] = t.hour() as u8;
    p[i + 3] = t.day() as u8;
    p[i + 4] = t.month() as u8;
    p[i + 5] = (t.year() - 1900) as u8;
}

/// Sets a 1-byte integer.
pub fn set_u8(p: &mut [u8], i: usize, v: u8) {
    p[i] = v;
}

/// Sets a 1-byte temperature, stored offset by +90.
pub fn set_temp8(p: &mut [u8], i: usize, v: i16) {
    p[i] = (v + 90) as u8;
}

/// Sets a 2-byte unsigned little-endian integer.
pub fn set_u16(p: &mut [u8], i: usize, v: u16) {
    LittleEndian::write_u16(&mut p[i..], v);
}

/// Sets a 2-byte signed two's complement value, rounding to the
/// nearest wire unit.
pub fn set_float16(p: &mut [u8], i: usize, v: f64) {
    LittleEndian::write_i16(&mut p[i..], v.round() as i16);
}

/// Sets a 2-byte signed value in tenths.
pub fn set_float16_10(p: &mut [u8], i: usize, v: f64) {
    set_float16(p, i, v * 10.0);
}

/// Sets a barometric pressure in thousandths of an inch of mercury.
pub fn set_pressure(p: &mut [u8], i: usize, v: f64) {
    set_float16(p, i, v * 1000.0);
}

/// Sets a rain rate or accumulation in hundredths of an inch.
pub fn set_rain_clicks(p: &mut [u8], i: usize, v: f64) {
    set_float16(p, i, v * 100.0);
}

/// Sets an UltraViolet index in tenths.
pub fn set_uv_index(p: &mut [u8], i: usize, v: f64) {
    p[i] = (v * 10.0).round() as u8;
}

/// Sets a console battery voltage.
pub fn set_voltage(p: &mut [u8], i: usize, v: f64) {
    set_float16(p, i, v * 100.0 * 512.0 / 300.0);
}

/// Sets a 1-byte MPH wind speed.
pub fn set_mph8(p: &mut [u8], i: usize, v: u8) {
    p[i] = v;
}

/// Sets a 2-byte MPH wind speed in tenths.
pub fn set_mph16(p: &mut [u8], i: usize, v: f64) {
    set_float16(p, i, v * 10.0);
}

/// Barometric pressure trend.
///
/// The wire value is a signed byte; the five published codes map to
/// the five trends and anything else reads as the dash.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum BarTrend {
    #[serde(rename = "Falling Rapidly")]
    FallingRapidly,
    #[serde(rename = "Falling Slowly")]
    FallingSlowly,
    #[serde(rename = "Steady")]
    Steady,
    #[serde(rename = "Rising Slowly")]
    RisingSlowly,
    #[serde(rename = "Rising Rapidly")]
    RisingRapidly,
    #[default]
    #[serde(rename = "-")]
    Unknown,
}

impl BarTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            BarTrend::FallingRapidly => "Falling Rapidly",
            BarTrend::FallingSlowly => "Falling Slowly",
            BarTrend::Steady => "Steady",
            BarTrend::RisingSlowly => "Rising Slowly",
            BarTrend::RisingRapidly => "Rising Rapidly",
            BarTrend::Unknown => "-",
        }
    }
}

impl std::fmt::Display for BarTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gets a barometer trend code.
pub fn get_bar_trend(p: &[u8], i: usize) -> BarTrend {
    match p[i] as i8 {
        -60 => BarTrend::FallingRapidly,
        -20 => BarTrend::FallingSlowly,
        0 => BarTrend::Steady,
        20 => BarTrend::RisingSlowly,
        60 => BarTrend::RisingRapidly,
        _ => BarTrend::Unknown,
    }
}

/// Sets a barometer trend code.
pub fn set_bar_trend(p: &mut [u8], i: usize, t: BarTrend) {
    p[i] = match t {
        BarTrend::FallingRapidly => -60i8 as u8,
        BarTrend::FallingSlowly => -20i8 as u8,
        BarTrend::Steady => 0,
        BarTrend::RisingSlowly => 20,
        BarTrend::RisingRapidly => 60,
        BarTrend::Unknown => 80,
    };
}

/// Gets an archive record wind direction code and converts the
/// compass octant to degrees.  Out-of-range codes read as 0.
pub fn get_wind_dir(p: &[u8], i: usize) -> u16 {
    let c = p[i];
    if c > 15 {
        return 0;
    }

    (f64::from(c) * 22.5 + 0.5) as u16
}

/// Sets an archive record wind direction as a compass octant code.
pub fn set_wind_dir(p: &mut [u8], i: usize, deg: u16) {
    p[i] = ((f64::from(deg % 360) / 22.5).round() as u8) % 16;
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2016-06-30 15:44:02 console time response.
    const CONS_TIME: [u8; 8] = [0x02, 0x2c, 0x0f, 0x1e, 0x06, 0x74, 0x10, 0xe6];

    #[test]
    fn crc_of_full_packet_is_zero() {
        assert_eq!(0, crc(&CONS_TIME));
    }

    #[test]
    fn crc_detects_corruption() {
        let mut p = CONS_TIME;
        p[7] ^= 0xff;
        assert_ne!(0, crc(&p));
    }

    #[test]
    fn set_crc_matches_known_value() {
        let mut p = [0u8; 8];
        p[..6].copy_from_slice(&CONS_TIME[..6]);
        set_crc(&mut p);
        assert_eq!(CONS_TIME, p);
    }

    #[test]
    fn datetime48_round_trip() {
        let t = get_datetime48(&CONS_TIME, 0).unwrap();
        assert_eq!(
            NaiveDate::from_ymd_opt(2016, 6, 30)
                .unwrap()
                .and_hms_opt(15, 44, 2)
                .unwrap(),
            t
        );

        let mut p = [0u8; 8];
        set_datetime48(&mut p, 0, t);
        set_crc(&mut p);
        assert_eq!(CONS_TIME, p);
    }

    #[test]
    fn date16_dash_is_none() {
        let p = [0xff, 0xff];
        assert_eq!(None, get_date16(&p, 0));
    }

    #[test]
    fn date16_round_trip() {
        let d = NaiveDate::from_ymd_opt(2016, 7, 4)
            .unwrap()
            .and_time(NaiveTime::MIN);
        let mut p = [0u8; 2];
        set_date16(&mut p, 0, Some(d));
        assert_eq!(Some(d), get_date16(&p, 0));
    }

    #[test]
    fn time16_dash_is_none() {
        let p = [0xff, 0xff];
        assert_eq!(None, get_time16(&p, 0));
    }

    #[test]
    fn time16_is_today() {
        let mut p = [0u8; 2];
        set_u16(&mut p, 0, 1820);
        let t = get_time16(&p, 0).unwrap();
        assert_eq!(Local::now().date_naive(), t.date());
        assert_eq!((18, 20), (t.hour(), t.minute()));
    }

    #[test]
    fn datetime32_round_trip() {
        let t = NaiveDate::from_ymd_opt(2012, 8, 12)
            .unwrap()
            .and_hms_opt(23, 55, 0)
            .unwrap();
        let mut p = [0u8; 4];
        set_datetime32(&mut p, 0, t);
        assert_eq!(Some(t), get_datetime32(&p, 0));
    }

    #[test]
    fn bar_trend_is_signed() {
        assert_eq!(BarTrend::FallingRapidly, get_bar_trend(&[196], 0)); // -60
        assert_eq!(BarTrend::FallingSlowly, get_bar_trend(&[236], 0)); // -20
        assert_eq!(BarTrend::Steady, get_bar_trend(&[0], 0));
        assert_eq!(BarTrend::RisingSlowly, get_bar_trend(&[20], 0));
        assert_eq!(BarTrend::RisingRapidly, get_bar_trend(&[60], 0));
        assert_eq!(BarTrend::Unknown, get_bar_trend(&[80], 0));
    }

    #[test]
    fn temp8_offset() {
        assert_eq!(75, get_temp8(&[165], 0));
        assert_eq!(-5, get_temp8(&[85], 0));
        assert_eq!(165, get_temp8(&[255], 0)); // dash

        let mut p = [0u8; 1];
        set_temp8(&mut p, 0, -5);
        assert_eq!(85, p[0]);
    }

    #[test]
    fn wind_dir_octants() {
        assert_eq!(0, get_wind_dir(&[0], 0));
        assert_eq!(90, get_wind_dir(&[4], 0));
        assert_eq!(338, get_wind_dir(&[15], 0));
        assert_eq!(0, get_wind_dir(&[16], 0));

        let mut p = [0u8; 1];
        set_wind_dir(&mut p, 0, 90);
        assert_eq!(4, p[0]);
        set_wind_dir(&mut p, 0, 360);
        assert_eq!(0, p[0]);
    }

    #[test]
    fn voltage_round_trip() {
        let mut p = [0u8; 2];
        set_voltage(&mut p, 0, 4.73);
        assert!((get_voltage(&p, 0) - 4.73).abs() < 0.005);
    }

    #[test]
    fn pressure_round_trip() {
        let mut p = [0u8; 2];
        set_pressure(&mut p, 0, 30.177);
        assert_eq!(30.177, get_pressure(&p, 0));
    }
}
