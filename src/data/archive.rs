//! Archive record, download page, and DMPAFT handshake packets.
//!
//! Only revision B records are supported.  Unlike loop packets, where
//! multiple versions remain in use, the archive format switched from
//! revision A to B in April 2002 and consoles have emitted B ever
//! since.
//!
//! Refer to the Vantage Pro, Vantage Pro2 and Vantage Vue Serial
//! Communication Reference Manual, sections X.4 (DMP and DMPAFT data
//! format) and XI (Download Protocol).

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::codec;
use crate::error::ProtocolError;

/// Records per download memory page.
pub const RECORDS_PER_PAGE: usize = 5;

/// On-wire size of a download memory page.
pub const PAGE_SIZE: usize = 267;

/// On-wire size of one archive record.
const RECORD_SIZE: usize = 52;

/// Offset of the record revision byte: 0x00 is revision B, 0xff marks
/// an unwritten slot.
const REVISION_OFFSET: usize = 42;

/// One 5-minute-interval historical sample from the console's
/// non-volatile memory.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveRecord {
    pub bar: f64,
    #[serde(rename = "ET")]
    pub et: f64,
    pub extra_humidity: [Option<u8>; 2],
    pub extra_temp: [Option<i16>; 3],
    pub forecast: String,
    pub in_humidity: u8,
    pub in_temp: f64,
    pub leaf_temp: [Option<i16>; 2],
    pub leaf_wetness: [Option<u8>; 2],
    pub out_humidity: u8,
    pub out_temp: f64,
    pub out_temp_hi: f64,
    pub out_temp_low: f64,
    pub rain_accum: f64,
    pub rain_rate_hi: f64,
    pub soil_moist: [Option<u8>; 4],
    pub soil_temp: [Option<i16>; 4],
    pub solar_rad: u16,
    pub solar_rad_hi: u16,
    pub timestamp: NaiveDateTime,
    #[serde(rename = "UVIndexAverage")]
    pub uv_index_avg: f64,
    #[serde(rename = "UVIndexHigh")]
    pub uv_index_hi: f64,
    pub wind_dir_hi: u16,
    pub wind_dir_prevail: u16,
    pub wind_samples: u16,
    pub wind_speed_avg: u8,
    pub wind_speed_hi: u8,
}

impl ArchiveRecord {
    /// Decodes a 52-byte revision B archive record.
    pub fn from_bytes(p: &[u8]) -> Result<Self, ProtocolError> {
        if p.len() != RECORD_SIZE || p[REVISION_OFFSET] != 0x00 {
            return Err(ProtocolError::NotArchiveRevisionB);
        }

        let mut a = ArchiveRecord {
            bar: codec::get_pressure(p, 14),
            et: f64::from(codec::get_u8(p, 29)) / 1000.0,
            forecast: codec::get_forecast(p, 33),
            in_humidity: codec::get_u8(p, 22),
            in_temp: codec::get_float16_10(p, 20),
            out_humidity: codec::get_u8(p, 23),
            out_temp: codec::get_float16_10(p, 4),
            out_temp_hi: codec::get_float16_10(p, 6),
            out_temp_low: codec::get_float16_10(p, 8),
            rain_accum: codec::get_rain_clicks(p, 10),
            rain_rate_hi: codec::get_rain_clicks(p, 12),
            solar_rad: codec::get_u16(p, 16),
            solar_rad_hi: codec::get_u16(p, 30),
            timestamp: codec::get_datetime32(p, 0).unwrap_or_default(),
            uv_index_avg: codec::get_uv_index(p, 28),
            uv_index_hi: codec::get_uv_index(p, 32),
            wind_dir_hi: codec::get_wind_dir(p, 26),
            wind_dir_prevail: codec::get_wind_dir(p, 27),
            wind_samples: codec::get_u16(p, 18),
            wind_speed_avg: codec::get_mph8(p, 24),
            wind_speed_hi: codec::get_mph8(p, 25),
            ..ArchiveRecord::default()
        };

        // There are 2 extra humidity sensors and 3 extra temperature
        // sensors.  Usually the quantities match but not for archive
        // records.
        for i in 0..2 {
            let v = codec::get_u8(p, 43 + i);
            if v != 255 {
                a.extra_humidity[i] = Some(v);
            }
        }
        for i in 0..3 {
            let v = codec::get_temp8(p, 45 + i);
            if v != 165 {
                a.extra_temp[i] = Some(v);
            }
        }
        for i in 0..2 {
            let v = codec::get_temp8(p, 34 + i);
            if v != 165 {
                a.leaf_temp[i] = Some(v);
            }
            let v = codec::get_u8(p, 36 + i);
            if v != 255 {
                a.leaf_wetness[i] = Some(v);
            }
        }
        for i in 0..4 {
            let v = codec::get_u8(p, 48 + i);
            if v != 255 {
                a.soil_moist[i] = Some(v);
            }
            let v = codec::get_temp8(p, 38 + i);
            if v != 165 {
                a.soil_temp[i] = Some(v);
            }
        }

        Ok(a)
    }

    /// Encodes a 52-byte revision B archive record.  The forecast text
    /// is a decode-only lookup and is not written back.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut p = vec![0u8; RECORD_SIZE];

        codec::set_datetime32(&mut p, 0, self.timestamp);
        codec::set_float16_10(&mut p, 4, self.out_temp);
        codec::set_float16_10(&mut p, 6, self.out_temp_hi);
        codec::set_float16_10(&mut p, 8, self.out_temp_low);
        codec::set_rain_clicks(&mut p, 10, self.rain_accum);
        codec::set_rain_clicks(&mut p, 12, self.rain_rate_hi);
        codec::set_pressure(&mut p, 14, self.bar);
        codec::set_u16(&mut p, 16, self.solar_rad);
        codec::set_u16(&mut p, 18, self.wind_samples);
        codec::set_float16_10(&mut p, 20, self.in_temp);
        codec::set_u8(&mut p, 22, self.in_humidity);
        codec::set_u8(&mut p, 23, self.out_humidity);
        codec::set_mph8(&mut p, 24, self.wind_speed_avg);
        codec::set_mph8(&mut p, 25, self.wind_speed_hi);
        codec::set_wind_dir(&mut p, 26, self.wind_dir_hi);
        codec::set_wind_dir(&mut p, 27, self.wind_dir_prevail);
        codec::set_uv_index(&mut p, 28, self.uv_index_avg);
        codec::set_u8(&mut p, 29, (self.et * 1000.0).round() as u8);
        codec::set_u16(&mut p, 30, self.solar_rad_hi);
        codec::set_uv_index(&mut p, 32, self.uv_index_hi);
        for i in 0..2 {
            codec::set_temp8(&mut p, 34 + i, self.leaf_temp[i].unwrap_or(165));
            codec::set_u8(&mut p, 36 + i, self.leaf_wetness[i].unwrap_or(255));
        }
        for i in 0..4 {
            codec::set_temp8(&mut p, 38 + i, self.soil_temp[i].unwrap_or(165));
            codec::set_u8(&mut p, 48 + i, self.soil_moist[i].unwrap_or(255));
        }
        p[REVISION_OFFSET] = 0x00;
        for i in 0..2 {
            codec::set_u8(&mut p, 43 + i, self.extra_humidity[i].unwrap_or(255));
        }
        for i in 0..3 {
            codec::set_temp8(&mut p, 45 + i, self.extra_temp[i].unwrap_or(165));
        }

        p
    }
}

/// A download memory page: a sequence byte and up to 5 archive
/// records, CRC-protected.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivePage {
    pub sequence: u8,
    pub records: Vec<ArchiveRecord>,
}

impl ArchivePage {
    /// Decodes a 267-byte download memory page.
    ///
    /// When the archive log is partially written the unwritten tail
    /// slots have the revision byte set to 0xff.  The first such slot
    /// ends decoding without error; any other revision value is a
    /// structural error.
    pub fn from_bytes(p: &[u8]) -> Result<Self, ProtocolError> {
        if codec::crc(p) != 0 {
            return Err(ProtocolError::BadCrc);
        }
        if p.len() != PAGE_SIZE {
            return Err(ProtocolError::NotDownloadPage);
        }

        let mut page = ArchivePage {
            sequence: p[0],
            records: Vec::with_capacity(RECORDS_PER_PAGE),
        };
        for i in 0..RECORDS_PER_PAGE {
            let offset = 1 + RECORD_SIZE * i;
            let rec = &p[offset..offset + RECORD_SIZE];
            if rec[REVISION_OFFSET] == 0xff {
                break;
            }
            page.records.push(ArchiveRecord::from_bytes(rec)?);
        }

        Ok(page)
    }

    /// Encodes a 267-byte download memory page.  Slots beyond the
    /// stored records are marked unwritten.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut p = vec![0u8; PAGE_SIZE];

        p[0] = self.sequence;
        for i in 0..RECORDS_PER_PAGE {
            let offset = 1 + RECORD_SIZE * i;
            match self.records.get(i) {
                Some(rec) => p[offset..offset + RECORD_SIZE].copy_from_slice(&rec.to_bytes()),
                None => p[offset + REVISION_OFFSET] = 0xff,
            }
        }
        codec::set_crc(&mut p);

        p
    }
}

/// The cutoff timestamp sent during the DMPAFT handshake.  `None`
/// encodes an all-zero timestamp, which the console treats as "send
/// every record in memory".
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ArchiveAfter(pub Option<NaiveDateTime>);

impl ArchiveAfter {
    /// Decodes a 6-byte DMPAFT cutoff packet.
    pub fn from_bytes(p: &[u8]) -> Result<Self, ProtocolError> {
        if codec::crc(p) != 0 {
            return Err(ProtocolError::BadCrc);
        }

        Ok(ArchiveAfter(codec::get_datetime32(p, 0)))
    }

    /// Encodes a 6-byte packet for the DMPAFT command: a 4-byte
    /// timestamp and a 2-byte CRC.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut p = vec![0u8; 6];
        if let Some(t) = self.0 {
            codec::set_datetime32(&mut p, 0, t);
        }
        codec::set_crc(&mut p);

        p
    }
}

/// The DMP metadata sent after the DMPAFT cutoff is acknowledged.  It
/// tells the downloader how many pages to expect and where the first
/// new record sits within the first page.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivePageMeta {
    pub pages: u16,
    pub first_page_offset: u16,
}

impl ArchivePageMeta {
    /// Decodes a 6-byte DMP metadata packet.
    pub fn from_bytes(p: &[u8]) -> Result<Self, ProtocolError> {
        if codec::crc(p) != 0 {
            return Err(ProtocolError::BadCrc);
        }
        if p.len() != 6 {
            return Err(ProtocolError::NotDownloadMeta);
        }

        Ok(ArchivePageMeta {
            pages: codec::get_u16(p, 0),
            first_page_offset: codec::get_u16(p, 2),
        })
    }

    /// Encodes a 6-byte DMP metadata packet.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut p = vec![0u8; 6];
        codec::set_u16(&mut p, 0, self.pages);
        codec::set_u16(&mut p, 2, self.first_page_offset);
        codec::set_crc(&mut p);

        p
    }
}
