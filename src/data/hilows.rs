//! Record highs and lows.
//!
//! The HILOWS response carries day, month, and year extremes for
//! every sensor.  Day records also include the time the extreme
//! occurred.  The field ordering is not uniform across sensors, so
//! each bundle is decoded with its own offset table.
//!
//! Refer to the Vantage Pro, Vantage Pro2 and Vantage Vue Serial
//! Communication Reference Manual, section X.3 (HILOW data format).

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::codec;
use crate::error::ProtocolError;

/// On-wire size of a HILOWS response.
pub const HILOWS_SIZE: usize = 438;

/// Day, month, and year highs and lows for one sensor.  The day
/// extremes carry the time of occurrence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HiLowRecord<T> {
    pub day_hi: T,
    pub day_hi_time: Option<NaiveDateTime>,
    pub day_low: T,
    pub day_low_time: Option<NaiveDateTime>,
    pub month_hi: T,
    pub month_low: T,
    pub year_hi: T,
    pub year_low: T,
}

/// Day, month, and year highs for a sensor that only records highs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HiRecord<T> {
    pub day_hi: T,
    pub day_hi_time: Option<NaiveDateTime>,
    pub month_hi: T,
    pub year_hi: T,
}

/// Day, month, and year lows for a sensor that only records lows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LowRecord<T> {
    pub day_low: T,
    pub day_low_time: Option<NaiveDateTime>,
    pub month_low: T,
    pub year_low: T,
}

/// Rain rate highs, which additionally carry an hour scope.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HiRainRate {
    pub hour_hi: f64,
    pub day_hi: f64,
    pub day_hi_time: Option<NaiveDateTime>,
    pub month_hi: f64,
    pub year_hi: f64,
}

/// All of the record highs and lows by day, month, and year.  Sensor
/// channels absent on the console decode to `None`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HiLows {
    pub bar: HiLowRecord<f64>,
    pub dew_point: HiLowRecord<f64>,
    pub extra_humidity: [Option<HiLowRecord<u8>>; 7],
    pub extra_temp: [Option<HiLowRecord<i16>>; 7],
    pub heat_index: HiRecord<f64>,
    pub in_humidity: HiLowRecord<u8>,
    pub in_temp: HiLowRecord<f64>,
    pub leaf_temp: [Option<HiLowRecord<i16>>; 4],
    pub leaf_wetness: [Option<HiLowRecord<u8>>; 4],
    pub out_humidity: HiLowRecord<u8>,
    pub out_temp: HiLowRecord<f64>,
    pub rain_rate: HiRainRate,
    pub soil_moist: [Option<HiLowRecord<u8>>; 4],
    pub soil_temp: [Option<HiLowRecord<i16>>; 4],
    pub solar_rad: HiRecord<u16>,
    #[serde(rename = "THSWIndex")]
    pub thsw_index: HiRecord<f64>,
    #[serde(rename = "UVIndex")]
    pub uv_index: HiRecord<f64>,
    pub wind_speed: HiRecord<u8>,
    pub wind_chill: LowRecord<f64>,
}

/// Extra humidity bundle.  Channel 0 is the outside humidity sensor
/// and channels 1..8 are the extra sensors.
fn extra_humidity(p: &[u8], i: usize) -> HiLowRecord<u8> {
    HiLowRecord {
        day_low: codec::get_u8(p, 276 + i),
        day_low_time: codec::get_time16(p, 292 + i * 2),
        day_hi: codec::get_u8(p, 284 + i),
        day_hi_time: codec::get_time16(p, 308 + i * 2),
        month_low: codec::get_u8(p, 332 + i),
        month_hi: codec::get_u8(p, 324 + i),
        year_low: codec::get_u8(p, 348 + i),
        year_hi: codec::get_u8(p, 340 + i),
    }
}

fn set_extra_humidity(p: &mut [u8], i: usize, h: &HiLowRecord<u8>) {
    codec::set_u8(p, 276 + i, h.day_low);
    codec::set_time16(p, 292 + i * 2, h.day_low_time);
    codec::set_u8(p, 284 + i, h.day_hi);
    codec::set_time16(p, 308 + i * 2, h.day_hi_time);
    codec::set_u8(p, 332 + i, h.month_low);
    codec::set_u8(p, 324 + i, h.month_hi);
    codec::set_u8(p, 348 + i, h.year_low);
    codec::set_u8(p, 340 + i, h.year_hi);
}

/// Extra temperature bundle.  Channels 0..7 are the extra sensors,
/// 7..11 the soil sensors, and 11..15 the leaf sensors.
fn extra_temp(p: &[u8], i: usize) -> HiLowRecord<i16> {
    HiLowRecord {
        day_low: codec::get_temp8(p, 126 + i),
        day_low_time: codec::get_time16(p, 156 + i * 2),
        day_hi: codec::get_temp8(p, 141 + i),
        day_hi_time: codec::get_time16(p, 186 + i * 2),
        month_low: codec::get_temp8(p, 231 + i),
        month_hi: codec::get_temp8(p, 216 + i),
        year_low: codec::get_temp8(p, 261 + i),
        year_hi: codec::get_temp8(p, 246 + i),
    }
}

fn set_extra_temp(p: &mut [u8], i: usize, et: &HiLowRecord<i16>) {
    codec::set_temp8(p, 126 + i, et.day_low);
    codec::set_time16(p, 156 + i * 2, et.day_low_time);
    codec::set_temp8(p, 141 + i, et.day_hi);
    codec::set_time16(p, 186 + i * 2, et.day_hi_time);
    codec::set_temp8(p, 231 + i, et.month_low);
    codec::set_temp8(p, 216 + i, et.month_hi);
    codec::set_temp8(p, 261 + i, et.year_low);
    codec::set_temp8(p, 246 + i, et.year_hi);
}

impl HiLows {
    /// Decodes a 438-byte high and lows packet.
    pub fn from_bytes(p: &[u8]) -> Result<Self, ProtocolError> {
        if codec::crc(p) != 0 {
            return Err(ProtocolError::BadCrc);
        }

        let mut hl = HiLows::default();

        // Barometer
        hl.bar = HiLowRecord {
            day_low: codec::get_pressure(p, 0),
            day_low_time: codec::get_time16(p, 12),
            day_hi: codec::get_pressure(p, 2),
            day_hi_time: codec::get_time16(p, 14),
            month_low: codec::get_pressure(p, 4),
            month_hi: codec::get_pressure(p, 6),
            year_low: codec::get_pressure(p, 8),
            year_hi: codec::get_pressure(p, 10),
        };

        // Dew point
        hl.dew_point = HiLowRecord {
            day_low: codec::get_float16(p, 63),
            day_low_time: codec::get_time16(p, 67),
            day_hi: codec::get_float16(p, 65),
            day_hi_time: codec::get_time16(p, 69),
            month_low: codec::get_float16(p, 73),
            month_hi: codec::get_float16(p, 71),
            year_low: codec::get_float16(p, 77),
            year_hi: codec::get_float16(p, 75),
        };

        // Extra humidity and temperatures
        for i in 0..7 {
            let eh = extra_humidity(p, 1 + i);
            if eh.day_low != 255 {
                hl.extra_humidity[i] = Some(eh);
            }
            let et = extra_temp(p, i);
            if et.day_low != 165 {
                hl.extra_temp[i] = Some(et);
            }
        }

        // Heat index
        hl.heat_index = HiRecord {
            day_hi: codec::get_float16(p, 87),
            day_hi_time: codec::get_time16(p, 89),
            month_hi: codec::get_float16(p, 91),
            year_hi: codec::get_float16(p, 93),
        };

        // Inside humidity
        hl.in_humidity = HiLowRecord {
            day_low: codec::get_u8(p, 38),
            day_low_time: codec::get_time16(p, 41),
            day_hi: codec::get_u8(p, 37),
            day_hi_time: codec::get_time16(p, 39),
            month_low: codec::get_u8(p, 44),
            month_hi: codec::get_u8(p, 43),
            year_low: codec::get_u8(p, 46),
            year_hi: codec::get_u8(p, 45),
        };

        // Inside temperature
        hl.in_temp = HiLowRecord {
            day_low: codec::get_float16_10(p, 23),
            day_low_time: codec::get_time16(p, 27),
            day_hi: codec::get_float16_10(p, 21),
            day_hi_time: codec::get_time16(p, 25),
            month_low: codec::get_float16_10(p, 29),
            month_hi: codec::get_float16_10(p, 31),
            year_low: codec::get_float16_10(p, 33),
            year_hi: codec::get_float16_10(p, 35),
        };

        // Leaf temperature and wetness
        for i in 0..4 {
            let et = extra_temp(p, 11 + i);
            if et.day_low != 165 {
                hl.leaf_temp[i] = Some(et);
            }

            let low = codec::get_u8(p, 408 + i);
            if low != 255 {
                hl.leaf_wetness[i] = Some(HiLowRecord {
                    day_low: low,
                    day_low_time: codec::get_time16(p, 412 + i * 2),
                    day_hi: codec::get_u8(p, 396 + i),
                    day_hi_time: codec::get_time16(p, 400 + i * 2),
                    month_low: codec::get_u8(p, 420 + i),
                    month_hi: codec::get_u8(p, 424 + i),
                    year_low: codec::get_u8(p, 428 + i),
                    year_hi: codec::get_u8(p, 432 + i),
                });
            }
        }

        // Outside humidity
        hl.out_humidity = extra_humidity(p, 0);

        // Outside temperature
        hl.out_temp = HiLowRecord {
            day_low: codec::get_float16_10(p, 47),
            day_low_time: codec::get_time16(p, 51),
            day_hi: codec::get_float16_10(p, 49),
            day_hi_time: codec::get_time16(p, 53),
            month_low: codec::get_float16_10(p, 57),
            month_hi: codec::get_float16_10(p, 55),
            year_low: codec::get_float16_10(p, 61),
            year_hi: codec::get_float16_10(p, 59),
        };

        // Rain rate
        hl.rain_rate = HiRainRate {
            hour_hi: codec::get_rain_clicks(p, 120),
            day_hi: codec::get_rain_clicks(p, 116),
            day_hi_time: codec::get_time16(p, 118),
            month_hi: codec::get_rain_clicks(p, 122),
            year_hi: codec::get_rain_clicks(p, 124),
        };

        // Soil moisture and temperature
        for i in 0..4 {
            let low = codec::get_u8(p, 368 + i);
            if low != 255 {
                hl.soil_moist[i] = Some(HiLowRecord {
                    day_low: low,
                    day_low_time: codec::get_time16(p, 372 + i * 2),
                    day_hi: codec::get_u8(p, 356 + i),
                    day_hi_time: codec::get_time16(p, 360 + i * 2),
                    month_low: codec::get_u8(p, 380 + i),
                    month_hi: codec::get_u8(p, 384 + i),
                    year_low: codec::get_u8(p, 388 + i),
                    year_hi: codec::get_u8(p, 392 + i),
                });
            }

            let et = extra_temp(p, 7 + i);
            if et.day_low != 165 {
                hl.soil_temp[i] = Some(et);
            }
        }

        // Solar radiation
        hl.solar_rad = HiRecord {
            day_hi: codec::get_u16(p, 103),
            day_hi_time: codec::get_time16(p, 105),
            month_hi: codec::get_u16(p, 107),
            year_hi: codec::get_u16(p, 109),
        };

        // THSW index
        hl.thsw_index = HiRecord {
            day_hi: codec::get_float16(p, 95),
            day_hi_time: codec::get_time16(p, 97),
            month_hi: codec::get_float16(p, 99),
            year_hi: codec::get_float16(p, 101),
        };

        // UltraViolet index
        hl.uv_index = HiRecord {
            day_hi: codec::get_uv_index(p, 111),
            day_hi_time: codec::get_time16(p, 112),
            month_hi: codec::get_uv_index(p, 114),
            year_hi: codec::get_uv_index(p, 115),
        };

        // Wind speed
        hl.wind_speed = HiRecord {
            day_hi: codec::get_mph8(p, 16),
            day_hi_time: codec::get_time16(p, 17),
            month_hi: codec::get_mph8(p, 19),
            year_hi: codec::get_mph8(p, 20),
        };

        // Wind chill
        hl.wind_chill = LowRecord {
            day_low: codec::get_float16(p, 79),
            day_low_time: codec::get_time16(p, 81),
            month_low: codec::get_float16(p, 83),
            year_low: codec::get_float16(p, 85),
        };

        Ok(hl)
    }

    /// Encodes a 438-byte high and lows packet.  Absent sensor
    /// channels are marked with the sentinel in their day-low slot.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut p = vec![0u8; HILOWS_SIZE];

        codec::set_pressure(&mut p, 0, self.bar.day_low);
        codec::set_time16(&mut p, 12, self.bar.day_low_time);
        codec::set_pressure(&mut p, 2, self.bar.day_hi);
        codec::set_time16(&mut p, 14, self.bar.day_hi_time);
        codec::set_pressure(&mut p, 4, self.bar.month_low);
        codec::set_pressure(&mut p, 6, self.bar.month_hi);
        codec::set_pressure(&mut p, 8, self.bar.year_low);
        codec::set_pressure(&mut p, 10, self.bar.year_hi);

        codec::set_float16(&mut p, 63, self.dew_point.day_low);
        codec::set_time16(&mut p, 67, self.dew_point.day_low_time);
        codec::set_float16(&mut p, 65, self.dew_point.day_hi);
        codec::set_time16(&mut p, 69, self.dew_point.day_hi_time);
        codec::set_float16(&mut p, 73, self.dew_point.month_low);
        codec::set_float16(&mut p, 71, self.dew_point.month_hi);
        codec::set_float16(&mut p, 77, self.dew_point.year_low);
        codec::set_float16(&mut p, 75, self.dew_point.year_hi);

        for i in 0..7 {
            match &self.extra_humidity[i] {
                Some(eh) => set_extra_humidity(&mut p, 1 + i, eh),
                None => codec::set_u8(&mut p, 276 + 1 + i, 255),
            }
            match &self.extra_temp[i] {
                Some(et) => set_extra_temp(&mut p, i, et),
                None => codec::set_u8(&mut p, 126 + i, 255),
            }
        }

        codec::set_float16(&mut p, 87, self.heat_index.day_hi);
        codec::set_time16(&mut p, 89, self.heat_index.day_hi_time);
        codec::set_float16(&mut p, 91, self.heat_index.month_hi);
        codec::set_float16(&mut p, 93, self.heat_index.year_hi);

        codec::set_u8(&mut p, 38, self.in_humidity.day_low);
        codec::set_time16(&mut p, 41, self.in_humidity.day_low_time);
        codec::set_u8(&mut p, 37, self.in_humidity.day_hi);
        codec::set_time16(&mut p, 39, self.in_humidity.day_hi_time);
        codec::set_u8(&mut p, 44, self.in_humidity.month_low);
        codec::set_u8(&mut p, 43, self.in_humidity.month_hi);
        codec::set_u8(&mut p, 46, self.in_humidity.year_low);
        codec::set_u8(&mut p, 45, self.in_humidity.year_hi);

        codec::set_float16_10(&mut p, 23, self.in_temp.day_low);
        codec::set_time16(&mut p, 27, self.in_temp.day_low_time);
        codec::set_float16_10(&mut p, 21, self.in_temp.day_hi);
        codec::set_time16(&mut p, 25, self.in_temp.day_hi_time);
        codec::set_float16_10(&mut p, 29, self.in_temp.month_low);
        codec::set_float16_10(&mut p, 31, self.in_temp.month_hi);
        codec::set_float16_10(&mut p, 33, self.in_temp.year_low);
        codec::set_float16_10(&mut p, 35, self.in_temp.year_hi);

        for i in 0..4 {
            match &self.leaf_temp[i] {
                Some(et) => set_extra_temp(&mut p, 11 + i, et),
                None => codec::set_u8(&mut p, 126 + 11 + i, 255),
            }
            match &self.leaf_wetness[i] {
                Some(lw) => {
                    codec::set_u8(&mut p, 408 + i, lw.day_low);
                    codec::set_time16(&mut p, 412 + i * 2, lw.day_low_time);
                    codec::set_u8(&mut p, 396 + i, lw.day_hi);
                    codec::set_time16(&mut p, 400 + i * 2, lw.day_hi_time);
                    codec::set_u8(&mut p, 420 + i, lw.month_low);
                    codec::set_u8(&mut p, 424 + i, lw.month_hi);
                    codec::set_u8(&mut p, 428 + i, lw.year_low);
                    codec::set_u8(&mut p, 432 + i, lw.year_hi);
                }
                None => codec::set_u8(&mut p, 408 + i, 255),
            }
        }

        set_extra_humidity(&mut p, 0, &self.out_humidity);

        codec::set_float16_10(&mut p, 47, self.out_temp.day_low);
        codec::set_time16(&mut p, 51, self.out_temp.day_low_time);
        codec::set_float16_10(&mut p, 49, self.out_temp.day_hi);
        codec::set_time16(&mut p, 53, self.out_temp.day_hi_time);
        codec::set_float16_10(&mut p, 57, self.out_temp.month_low);
        codec::set_float16_10(&mut p, 55, self.out_temp.month_hi);
        codec::set_float16_10(&mut p, 61, self.out_temp.year_low);
        codec::set_float16_10(&mut p, 59, self.out_temp.year_hi);

        codec::set_rain_clicks(&mut p, 120, self.rain_rate.hour_hi);
        codec::set_rain_clicks(&mut p, 116, self.rain_rate.day_hi);
        codec::set_time16(&mut p, 118, self.rain_rate.day_hi_time);
        codec::set_rain_clicks(&mut p, 122, self.rain_rate.month_hi);
        codec::set_rain_clicks(&mut p, 124, self.rain_rate.year_hi);

        for i in 0..4 {
            match &self.soil_moist[i] {
                Some(sm) => {
                    codec::set_u8(&mut p, 368 + i, sm.day_low);
                    codec::set_time16(&mut p, 372 + i * 2, sm.day_low_time);
                    codec::set_u8(&mut p, 356 + i, sm.day_hi);
                    codec::set_time16(&mut p, 360 + i * 2, sm.day_hi_time);
                    codec::set_u8(&mut p, 380 + i, sm.month_low);
                    codec::set_u8(&mut p, 384 + i, sm.month_hi);
                    codec::set_u8(&mut p, 388 + i, sm.year_low);
                    codec::set_u8(&mut p, 392 + i, sm.year_hi);
                }
                None => codec::set_u8(&mut p, 368 + i, 255),
            }
            match &self.soil_temp[i] {
                Some(et) => set_extra_temp(&mut p, 7 + i, et),
                None => codec::set_u8(&mut p, 126 + 7 + i, 255),
            }
        }

        codec::set_u16(&mut p, 103, self.solar_rad.day_hi);
        codec::set_time16(&mut p, 105, self.solar_rad.day_hi_time);
        codec::set_u16(&mut p, 107, self.solar_rad.month_hi);
        codec::set_u16(&mut p, 109, self.solar_rad.year_hi);

        codec::set_float16(&mut p, 95, self.thsw_index.day_hi);
        codec::set_time16(&mut p, 97, self.thsw_index.day_hi_time);
        codec::set_float16(&mut p, 99, self.thsw_index.month_hi);
        codec::set_float16(&mut p, 101, self.thsw_index.year_hi);

        codec::set_uv_index(&mut p, 111, self.uv_index.day_hi);
        codec::set_time16(&mut p, 112, self.uv_index.day_hi_time);
        codec::set_uv_index(&mut p, 114, self.uv_index.month_hi);
        codec::set_uv_index(&mut p, 115, self.uv_index.year_hi);

        codec::set_mph8(&mut p, 16, self.wind_speed.day_hi);
        codec::set_time16(&mut p, 17, self.wind_speed.day_hi_time);
        codec::set_mph8(&mut p, 19, self.wind_speed.month_hi);
        codec::set_mph8(&mut p, 20, self.wind_speed.year_hi);

        codec::set_float16(&mut p, 79, self.wind_chill.day_low);
        codec::set_time16(&mut p, 81, self.wind_chill.day_low_time);
        codec::set_float16(&mut p, 83, self.wind_chill.month_low);
        codec::set_float16(&mut p, 85, self.wind_chill.year_low);

        codec::set_crc(&mut p);

        p
    }
}
