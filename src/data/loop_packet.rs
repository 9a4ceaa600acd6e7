//! Merged loop observation.
//!
//! A [`Loop`] is the union of the loop1 and loop2 packets.  The two
//! versions overlap heavily but the precision sometimes differs and
//! they complement each other, so during LPS polling — where the
//! console interleaves the versions — the decoder updates only the
//! fields carried by the received version and leaves the rest intact.
//! A caller reading the stream sees a progressively more complete
//! merged record.
//!
//! Refer to the Vantage Pro, Vantage Pro2 and Vantage Vue Serial
//! Communication Reference Manual, section X.1 (LOOP data format) and
//! X.2 (LOOP2 data format).

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::codec::{self, BarTrend};
use crate::error::ProtocolError;

/// On-wire size of a loop packet, either version.
pub const LOOP_SIZE: usize = 99;

/// A snapshot of the current weather observation, merged from the
/// loop1 and loop2 packet versions.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Loop {
    pub bar: LoopBar,
    pub bat: LoopBat,
    pub dew_point: f64,
    #[serde(rename = "ET")]
    pub et: LoopEt,
    pub extra_humidity: [Option<u8>; 7],
    pub extra_temp: [Option<i16>; 7],
    pub forecast: String,
    pub heat_index: f64,
    pub icons: Vec<String>,
    pub in_humidity: u8,
    pub in_temp: f64,
    pub leaf_temp: [Option<i16>; 4],
    pub leaf_wetness: [Option<u8>; 4],
    pub out_humidity: u8,
    pub out_temp: f64,
    pub rain: LoopRain,
    pub soil_moist: [Option<u8>; 4],
    pub soil_temp: [Option<i16>; 4],
    pub solar_rad: u16,
    pub sunrise: Option<NaiveDateTime>,
    pub sunset: Option<NaiveDateTime>,
    #[serde(rename = "THSWIndex")]
    pub thsw_index: f64,
    #[serde(rename = "UVIndex")]
    pub uv_index: f64,
    pub wind: LoopWind,
    pub wind_chill: f64,

    /// Version of the most recently merged packet (1 or 2).
    #[serde(skip)]
    pub loop_type: u8,
    /// Index of the next archive record the console will write.
    #[serde(skip)]
    pub next_archive_record: u16,
}

/// Barometer related readings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopBar {
    pub altimeter: f64,
    pub sea_level: f64,
    pub station: f64,
    pub trend: BarTrend,
}

/// Console and transmitter battery readings.  `trans_status` is a
/// bitmap of transmitters reporting a low battery.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopBat {
    pub console_voltage: f64,
    pub trans_status: u8,
}

/// Evapotranspiration readings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopEt {
    pub today: f64,
    pub last_month: f64,
    pub last_year: f64,
}

/// Rain sensor readings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopRain {
    pub accum: RainAccum,
    pub rate: f64,
    pub storm_start_date: Option<NaiveDateTime>,
}

/// Rain accumulations over the six supported horizons plus the
/// current storm.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RainAccum {
    #[serde(rename = "last15Minutes")]
    pub last_15_min: f64,
    pub last_hour: f64,
    #[serde(rename = "last24Hours")]
    pub last_24_hours: f64,
    pub today: f64,
    pub last_month: f64,
    pub last_year: f64,
    pub storm: f64,
}

/// Wind readings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopWind {
    pub avg: WindAvg,
    pub cur: WindCur,
    pub gust: WindGust,
}

/// Average wind speeds.  Loop1 only carries whole-MPH averages so the
/// tenths from loop2 win the merge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindAvg {
    #[serde(rename = "last2MinutesSpeed")]
    pub last_2_min_speed: f64,
    #[serde(rename = "last10MinutesSpeed")]
    pub last_10_min_speed: f64,
}

/// Current wind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindCur {
    pub dir: u16,
    pub speed: u8,
}

/// 10-minute wind gust.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindGust {
    #[serde(rename = "last10MinutesDirection")]
    pub last_10_min_dir: u16,
    #[serde(rename = "last10MinutesSpeed")]
    pub last_10_min_speed: f64,
}

impl Loop {
    /// Decodes a fresh loop packet into a new record.  Fields carried
    /// only by the other version keep their defaults.
    pub fn from_bytes(p: &[u8]) -> Result<Self, ProtocolError> {
        let mut l = Loop::default();
        l.update_from_bytes(p)?;

        Ok(l)
    }

    /// Merges a 99-byte loop1 or loop2 packet into the record,
    /// updating only the fields carried by the received version.
    pub fn update_from_bytes(&mut self, p: &[u8]) -> Result<(), ProtocolError> {
        if codec::crc(p) != 0 {
            return Err(ProtocolError::BadCrc);
        }

        match loop_type(p) {
            Some(1) => self.update_loop1(p),
            Some(2) => self.update_loop2(p),
            Some(_) => return Err(ProtocolError::UnknownLoopVersion),
            None => return Err(ProtocolError::NotLoop),
        }

        Ok(())
    }

    fn update_loop1(&mut self, p: &[u8]) {
        self.loop_type = 1;

        self.bar.sea_level = codec::get_pressure(p, 7);
        self.bar.trend = codec::get_bar_trend(p, 3);
        self.bat.console_voltage = codec::get_voltage(p, 87);
        self.bat.trans_status = codec::get_u8(p, 86);
        self.et.today = codec::get_float16(p, 56) / 1000.0;
        self.et.last_month = codec::get_float16(p, 58) / 100.0;
        self.et.last_year = codec::get_float16(p, 60) / 100.0;
        for i in 0..7 {
            let v = codec::get_u8(p, 34 + i);
            self.extra_humidity[i] = (v != 255).then_some(v);
            let v = codec::get_temp8(p, 18 + i);
            self.extra_temp[i] = (v != 165).then_some(v);
        }
        self.forecast = codec::get_forecast(p, 90);
        self.icons = codec::get_forecast_icons(p, 89);
        self.in_humidity = codec::get_u8(p, 11);
        self.in_temp = codec::get_float16_10(p, 9);
        for i in 0..4 {
            let v = codec::get_temp8(p, 29 + i);
            self.leaf_temp[i] = (v != 165).then_some(v);
            let v = codec::get_u8(p, 66 + i);
            // The last leaf wetness channel reads 0 instead of the
            // dash value on some console firmware.  Treating it as
            // absent can hide a genuine zero but matches the station
            // behavior in the field.
            if i == 3 && v == 0 {
                self.leaf_wetness[i] = None;
            } else {
                self.leaf_wetness[i] = (v != 255).then_some(v);
            }
        }
        self.out_humidity = codec::get_u8(p, 33);
        self.out_temp = codec::get_float16_10(p, 12);
        self.rain.accum.today = codec::get_rain_clicks(p, 50);
        self.rain.accum.last_month = codec::get_rain_clicks(p, 52);
        self.rain.accum.last_year = codec::get_rain_clicks(p, 54);
        self.rain.accum.storm = codec::get_rain_clicks(p, 46);
        self.rain.rate = codec::get_rain_clicks(p, 41);
        self.rain.storm_start_date = codec::get_date16(p, 48);
        for i in 0..4 {
            let v = codec::get_u8(p, 62 + i);
            self.soil_moist[i] = (v != 255).then_some(v);
            let v = codec::get_temp8(p, 25 + i);
            self.soil_temp[i] = (v != 165).then_some(v);
        }
        self.solar_rad = codec::get_u16(p, 44);
        self.sunrise = codec::get_time16(p, 91);
        self.sunset = codec::get_time16(p, 93);
        self.uv_index = codec::get_uv_index(p, 43);
        self.wind.cur.dir = codec::get_u16(p, 16);
        self.wind.cur.speed = codec::get_mph8(p, 14);
        // The 10-minute average at offset 15 is skipped: the loop2
        // decode carries it in tenths.

        self.next_archive_record = codec::get_u16(p, 5);
    }

    fn update_loop2(&mut self, p: &[u8]) {
        self.loop_type = 2;

        self.bar.altimeter = codec::get_pressure(p, 69);
        self.bar.sea_level = codec::get_pressure(p, 7);
        self.bar.station = codec::get_pressure(p, 65);
        self.bar.trend = codec::get_bar_trend(p, 3);
        self.dew_point = codec::get_float16(p, 30);
        self.et.today = codec::get_float16(p, 56) / 1000.0;
        self.heat_index = codec::get_float16(p, 35);
        self.in_humidity = codec::get_u8(p, 11);
        self.in_temp = codec::get_float16_10(p, 9);
        self.out_humidity = codec::get_u8(p, 33);
        self.out_temp = codec::get_float16_10(p, 12);
        self.rain.accum.last_15_min = codec::get_rain_clicks(p, 52);
        self.rain.accum.last_hour = codec::get_rain_clicks(p, 54);
        self.rain.accum.last_24_hours = codec::get_rain_clicks(p, 58);
        self.rain.accum.today = codec::get_rain_clicks(p, 50);
        self.rain.accum.storm = codec::get_rain_clicks(p, 46);
        self.rain.rate = codec::get_rain_clicks(p, 41);
        self.solar_rad = codec::get_u16(p, 44);
        self.thsw_index = codec::get_float16(p, 39);
        self.uv_index = codec::get_uv_index(p, 43);
        self.wind.cur.dir = codec::get_u16(p, 16);
        self.wind.cur.speed = codec::get_mph8(p, 14);
        self.wind.avg.last_2_min_speed = codec::get_mph16(p, 20);
        self.wind.avg.last_10_min_speed = codec::get_mph16(p, 18);
        self.wind.gust.last_10_min_dir = codec::get_u16(p, 24);
        self.wind.gust.last_10_min_speed = codec::get_mph16(p, 22);
        self.wind_chill = codec::get_float16(p, 37);
    }

    /// Encodes a 99-byte loop packet of the requested version.  The
    /// forecast text and icon labels are decode-only lookups and are
    /// not written back.
    pub fn to_bytes(&self, version: u8) -> Result<Vec<u8>, ProtocolError> {
        let mut p = vec![0u8; LOOP_SIZE];

        match version {
            1 => {
                codec::set_pressure(&mut p, 7, self.bar.sea_level);
                codec::set_bar_trend(&mut p, 3, self.bar.trend);
                codec::set_voltage(&mut p, 87, self.bat.console_voltage);
                codec::set_u8(&mut p, 86, self.bat.trans_status);
                codec::set_float16(&mut p, 56, self.et.today * 1000.0);
                codec::set_float16(&mut p, 58, self.et.last_month * 100.0);
                codec::set_float16(&mut p, 60, self.et.last_year * 100.0);
                for i in 0..7 {
                    codec::set_u8(&mut p, 34 + i, self.extra_humidity[i].unwrap_or(255));
                    codec::set_temp8(&mut p, 18 + i, self.extra_temp[i].unwrap_or(165));
                }
                codec::set_u8(&mut p, 11, self.in_humidity);
                codec::set_float16_10(&mut p, 9, self.in_temp);
                for i in 0..4 {
                    codec::set_temp8(&mut p, 29 + i, self.leaf_temp[i].unwrap_or(165));
                    codec::set_u8(&mut p, 66 + i, self.leaf_wetness[i].unwrap_or(255));
                }
                codec::set_u8(&mut p, 33, self.out_humidity);
                codec::set_float16_10(&mut p, 12, self.out_temp);
                codec::set_rain_clicks(&mut p, 50, self.rain.accum.today);
                codec::set_rain_clicks(&mut p, 52, self.rain.accum.last_month);
                codec::set_rain_clicks(&mut p, 54, self.rain.accum.last_year);
                codec::set_rain_clicks(&mut p, 46, self.rain.accum.storm);
                codec::set_rain_clicks(&mut p, 41, self.rain.rate);
                codec::set_date16(&mut p, 48, self.rain.storm_start_date);
                for i in 0..4 {
                    codec::set_u8(&mut p, 62 + i, self.soil_moist[i].unwrap_or(255));
                    codec::set_temp8(&mut p, 25 + i, self.soil_temp[i].unwrap_or(165));
                }
                codec::set_u16(&mut p, 44, self.solar_rad);
                codec::set_time16(&mut p, 91, self.sunrise);
                codec::set_time16(&mut p, 93, self.sunset);
                codec::set_uv_index(&mut p, 43, self.uv_index);
                codec::set_u16(&mut p, 16, self.wind.cur.dir);
                codec::set_mph8(&mut p, 14, self.wind.cur.speed);

                codec::set_u16(&mut p, 5, self.next_archive_record);
            }
            2 => {
                codec::set_pressure(&mut p, 69, self.bar.altimeter);
                codec::set_pressure(&mut p, 7, self.bar.sea_level);
                codec::set_pressure(&mut p, 65, self.bar.station);
                codec::set_bar_trend(&mut p, 3, self.bar.trend);
                codec::set_float16(&mut p, 30, self.dew_point);
                codec::set_float16(&mut p, 56, self.et.today * 1000.0);
                codec::set_float16(&mut p, 35, self.heat_index);
                codec::set_u8(&mut p, 11, self.in_humidity);
                codec::set_float16_10(&mut p, 9, self.in_temp);
                codec::set_u8(&mut p, 33, self.out_humidity);
                codec::set_float16_10(&mut p, 12, self.out_temp);
                codec::set_rain_clicks(&mut p, 52, self.rain.accum.last_15_min);
                codec::set_rain_clicks(&mut p, 54, self.rain.accum.last_hour);
                codec::set_rain_clicks(&mut p, 58, self.rain.accum.last_24_hours);
                codec::set_rain_clicks(&mut p, 50, self.rain.accum.today);
                codec::set_rain_clicks(&mut p, 46, self.rain.accum.storm);
                codec::set_rain_clicks(&mut p, 41, self.rain.rate);
                codec::set_u16(&mut p, 44, self.solar_rad);
                codec::set_float16(&mut p, 39, self.thsw_index);
                codec::set_uv_index(&mut p, 43, self.uv_index);
                codec::set_u16(&mut p, 16, self.wind.cur.dir);
                codec::set_mph8(&mut p, 14, self.wind.cur.speed);
                codec::set_mph16(&mut p, 20, self.wind.avg.last_2_min_speed);
                codec::set_mph16(&mut p, 18, self.wind.avg.last_10_min_speed);
                codec::set_u16(&mut p, 24, self.wind.gust.last_10_min_dir);
                codec::set_mph16(&mut p, 22, self.wind.gust.last_10_min_speed);
                codec::set_float16(&mut p, 37, self.wind_chill);
            }
            _ => return Err(ProtocolError::UnknownLoopVersion),
        }

        set_loop_type(&mut p, version);
        codec::set_crc(&mut p);

        Ok(p)
    }
}

/// Returns the loop packet version, or `None` if the length or header
/// does not make sense.
fn loop_type(p: &[u8]) -> Option<u8> {
    if p.len() == LOOP_SIZE && &p[0..3] == b"LOO" {
        Some(codec::get_u8(p, 4) + 1)
    } else {
        None
    }
}

fn set_loop_type(p: &mut [u8], version: u8) {
    p[0..3].copy_from_slice(b"LOO");
    p[4] = version - 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_loop1() -> Loop {
        Loop {
            bar: LoopBar {
                sea_level: 29.945,
                trend: BarTrend::RisingSlowly,
                ..LoopBar::default()
            },
            bat: LoopBat {
                // 4.5V is exactly representable in the wire encoding.
                console_voltage: 4.5,
                trans_status: 0b0000_0010,
            },
            et: LoopEt {
                today: 0.011,
                last_month: 2.31,
                last_year: 16.52,
            },
            extra_humidity: [Some(71), None, None, None, None, None, None],
            extra_temp: [Some(68), None, None, None, None, None, None],
            forecast: "-".to_string(),
            in_humidity: 42,
            in_temp: 74.2,
            out_humidity: 67,
            out_temp: 61.4,
            rain: LoopRain {
                accum: RainAccum {
                    today: 0.12,
                    last_month: 1.52,
                    last_year: 23.11,
                    storm: 0.54,
                    ..RainAccum::default()
                },
                rate: 0.26,
                storm_start_date: None,
            },
            soil_moist: [Some(23), None, None, None],
            soil_temp: [Some(64), None, None, None],
            solar_rad: 410,
            uv_index: 4.9,
            wind: LoopWind {
                cur: WindCur { dir: 247, speed: 7 },
                ..LoopWind::default()
            },
            loop_type: 1,
            next_archive_record: 2361,
            ..Loop::default()
        }
    }

    #[test]
    fn loop1_round_trip() {
        let l = sample_loop1();
        let p = l.to_bytes(1).unwrap();
        let decoded = Loop::from_bytes(&p).unwrap();
        assert_eq!(l, decoded);
    }

    #[test]
    fn loop2_round_trip() {
        let l = Loop {
            bar: LoopBar {
                altimeter: 29.052,
                sea_level: 29.945,
                station: 29.031,
                trend: BarTrend::Steady,
            },
            dew_point: 54.0,
            et: LoopEt {
                today: 0.011,
                ..LoopEt::default()
            },
            heat_index: 62.0,
            in_humidity: 42,
            in_temp: 74.2,
            out_humidity: 67,
            out_temp: 61.4,
            rain: LoopRain {
                accum: RainAccum {
                    last_15_min: 0.02,
                    last_hour: 0.09,
                    last_24_hours: 0.88,
                    today: 0.12,
                    storm: 0.54,
                    ..RainAccum::default()
                },
                rate: 0.26,
                storm_start_date: None,
            },
            solar_rad: 410,
            thsw_index: 67.0,
            uv_index: 4.9,
            wind: LoopWind {
                avg: WindAvg {
                    last_2_min_speed: 6.2,
                    last_10_min_speed: 5.5,
                },
                cur: WindCur { dir: 247, speed: 7 },
                gust: WindGust {
                    last_10_min_dir: 262,
                    last_10_min_speed: 12.3,
                },
            },
            wind_chill: 61.0,
            loop_type: 2,
            ..Loop::default()
        };
        let p = l.to_bytes(2).unwrap();
        let decoded = Loop::from_bytes(&p).unwrap();
        assert_eq!(l, decoded);
    }

    #[test]
    fn merge_is_progressive() {
        let one = sample_loop1();
        let p1 = one.to_bytes(1).unwrap();

        let mut two = Loop {
            bar: LoopBar {
                altimeter: 29.052,
                station: 29.031,
                sea_level: 29.945,
                trend: BarTrend::RisingSlowly,
            },
            dew_point: 54.0,
            wind_chill: 61.0,
            ..Loop::default()
        };
        two.in_humidity = one.in_humidity;
        two.in_temp = one.in_temp;
        two.out_humidity = one.out_humidity;
        two.out_temp = one.out_temp;
        let p2 = two.to_bytes(2).unwrap();

        let mut merged = Loop::from_bytes(&p1).unwrap();
        merged.update_from_bytes(&p2).unwrap();

        // Loop1-only fields survive the loop2 merge.
        assert_eq!(Some(71), merged.extra_humidity[0]);
        assert_eq!(2361, merged.next_archive_record);
        assert_eq!(4.5, merged.bat.console_voltage);
        // Loop2 fields land on top.
        assert_eq!(29.052, merged.bar.altimeter);
        assert_eq!(54.0, merged.dew_point);
        assert_eq!(2, merged.loop_type);
    }

    #[test]
    fn bad_crc_rejected() {
        let mut p = sample_loop1().to_bytes(1).unwrap();
        let last = p.len() - 1;
        p[last] ^= 0xff;
        assert!(matches!(
            Loop::from_bytes(&p),
            Err(ProtocolError::BadCrc)
        ));
    }

    #[test]
    fn not_a_loop() {
        let mut p = sample_loop1().to_bytes(1).unwrap();
        p[0] = b'X';
        codec::set_crc(&mut p);
        assert!(matches!(Loop::from_bytes(&p), Err(ProtocolError::NotLoop)));
    }

    #[test]
    fn unknown_version() {
        let mut p = sample_loop1().to_bytes(1).unwrap();
        p[4] = 5;
        codec::set_crc(&mut p);
        assert!(matches!(
            Loop::from_bytes(&p),
            Err(ProtocolError::UnknownLoopVersion)
        ));
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let v = serde_json::to_value(sample_loop1()).unwrap();
        assert_eq!("Rising Slowly", v["bar"]["trend"]);
        assert!(v.get("UVIndex").is_some());
        assert!(v.get("ET").is_some());
        assert!(v.get("outsideHumidity").is_none()); // short wire names, not prose
        assert_eq!(67, v["outHumidity"]);
    }
}
