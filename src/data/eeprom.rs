//! EEPROM configuration.
//!
//! Only a handful of fields are extracted from the 4 KB configuration
//! area: the archive interval, station location, and local UTC
//! offset.
//!
//! Refer to the Vantage Pro, Vantage Pro2 and Vantage Vue Serial
//! Communication Reference Manual, section XIII. EEPROM configuration
//! settings.

use chrono::Duration;
use serde::{Serialize, Serializer};

use crate::codec;
use crate::error::ProtocolError;

/// On-wire size of a GETEE response: 4096 bytes of EEPROM plus CRC.
pub const EEPROM_SIZE: usize = 4098;

const FEET_PER_METER: f64 = 1.0 / 0.3048;

/// Console configuration settings.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Eeprom {
    /// Archive interval in minutes.
    pub archive_period: u8,
    /// Station elevation in feet, normalized from meters when the
    /// console stores metric units.
    pub elevation: i32,
    /// Latitude in decimal degrees, positive north.
    pub latitude: f64,
    /// Longitude in decimal degrees, positive east.
    pub longitude: f64,
    /// Local offset from UTC.
    #[serde(serialize_with = "duration_secs")]
    pub time_offset: Duration,
}

impl Default for Eeprom {
    fn default() -> Self {
        Eeprom {
            archive_period: 0,
            elevation: 0,
            latitude: 0.0,
            longitude: 0.0,
            time_offset: Duration::zero(),
        }
    }
}

fn duration_secs<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_i64(d.num_seconds())
}

impl Eeprom {
    /// Decodes a 4098-byte EEPROM packet.
    ///
    /// Returns [`ProtocolError::BadLocation`] when the stored latitude
    /// or longitude disagrees with its hemisphere flag.  That is a
    /// data integrity failure in the console configuration, not a
    /// device error.
    pub fn from_bytes(p: &[u8]) -> Result<Self, ProtocolError> {
        if codec::crc(p) != 0 {
            return Err(ProtocolError::BadCrc);
        }

        // Setup bit breakdown:
        //
        // Bit  7     | 6     | 5      4      | 3         | 2             | 1        | 0
        //     -------+-------+---------------+-----------+---------------+----------+-----------
        //      Lon   | Lat   | Rain Coll     | Wind Cup  | Month/Day     | Is AM/PM | Time mode
        //     -------+-------+---------------+-----------+---------------+----------+-----------
        //      0 = W | 0 = S | 0 = 0.01in    | 0 = Small | 0 = Month/Day | 0 = PM   | 0 = AM/PM
        //      1 = E | 1 = N | 1 = 0.2mm     | 1 = Large | 1 = Day/Month | 1 = AM   | 1 = 24hr
        //            |       | 2 = 0.1mm     |
        let setup = codec::get_u8(p, 43);

        // Unit bit breakdown:
        //
        // Bit  7    6    | 5      | 4         | 3      2      | 1    0
        //     -----------+--------+-----------+---------------+-----------
        //      Wind      | Rain   | Elevation | Temperature   | Barometer
        //     -----------+--------+-----------+---------------+-----------
        //      0 = mph   | 0 = in | 0 = ft    | 0 = F (whole) | 0 = in
        //      1 = m/s   | 1 = mm | 1 = m     | 1 = F (tenth) | 1 = mm
        //      2 = km/h  |        |           | 2 = C (whole) | 2 = hpa
        //      3 = knots |        |           | 3 = C (tenth) | 3 = mb
        let unit = codec::get_u8(p, 41);

        let mut ee = Eeprom {
            archive_period: codec::get_u8(p, 45),
            elevation: i32::from(codec::get_u16(p, 15)),
            latitude: codec::get_float16_10(p, 11),
            longitude: codec::get_float16_10(p, 13),
            // The offset is stored in hundredths of hours.
            time_offset: Duration::hours((codec::get_float16(p, 20) / 100.0) as i64),
        };

        if unit & 0x10 != 0 {
            // Elevation is in meters so convert to feet.
            ee.elevation = (f64::from(ee.elevation) * FEET_PER_METER) as i32;
        }

        let north = setup & 0x40 != 0;
        if (north && ee.latitude < 0.0) || (!north && ee.latitude > 0.0) {
            // Equator hemisphere setting and latitude do not agree.
            return Err(ProtocolError::BadLocation);
        }
        let east = setup & 0x80 != 0;
        if (east && ee.longitude < 0.0) || (!east && ee.longitude > 0.0) {
            // Prime meridian hemisphere setting and longitude do not agree.
            return Err(ProtocolError::BadLocation);
        }

        Ok(ee)
    }

    /// Encodes a 4098-byte EEPROM packet carrying the extracted
    /// fields.  Elevation is written in feet and the hemisphere flags
    /// are derived from the coordinate signs.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut p = vec![0u8; EEPROM_SIZE];

        let mut setup = 0u8;
        if self.latitude >= 0.0 {
            setup |= 0x40;
        }
        if self.longitude >= 0.0 {
            setup |= 0x80;
        }
        codec::set_u8(&mut p, 43, setup);

        codec::set_u8(&mut p, 45, self.archive_period);
        codec::set_u16(&mut p, 15, self.elevation as u16);
        codec::set_float16_10(&mut p, 11, self.latitude);
        codec::set_float16_10(&mut p, 13, self.longitude);
        codec::set_float16(&mut p, 20, self.time_offset.num_hours() as f64 * 100.0);
        codec::set_crc(&mut p);

        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let ee = Eeprom {
            archive_period: 5,
            elevation: 410,
            latitude: 35.7,
            longitude: -78.7,
            time_offset: Duration::hours(-5),
        };
        let decoded = Eeprom::from_bytes(&ee.to_bytes()).unwrap();
        assert_eq!(ee, decoded);
    }

    #[test]
    fn hemisphere_mismatch() {
        let ee = Eeprom {
            archive_period: 5,
            elevation: 0,
            latitude: 35.7,
            longitude: -78.7,
            time_offset: Duration::zero(),
        };
        let mut p = ee.to_bytes();

        // Claim the southern hemisphere while keeping a positive
        // latitude.
        p[43] &= !0x40;
        codec::set_crc(&mut p);
        assert!(matches!(
            Eeprom::from_bytes(&p),
            Err(ProtocolError::BadLocation)
        ));

        // And an eastern longitude flag against a western value.
        let mut p = ee.to_bytes();
        p[43] |= 0x80;
        codec::set_crc(&mut p);
        assert!(matches!(
            Eeprom::from_bytes(&p),
            Err(ProtocolError::BadLocation)
        ));
    }

    #[test]
    fn metric_elevation_is_normalized() {
        let ee = Eeprom {
            archive_period: 10,
            elevation: 125, // meters on the wire when bit 4 is set
            latitude: 35.7,
            longitude: -78.7,
            time_offset: Duration::zero(),
        };
        let mut p = ee.to_bytes();
        p[41] |= 0x10;
        codec::set_crc(&mut p);

        let decoded = Eeprom::from_bytes(&p).unwrap();
        assert_eq!(410, decoded.elevation);
    }

    #[test]
    fn bad_crc() {
        let mut p = Eeprom::default().to_bytes();
        p[100] ^= 0xff;
        assert!(matches!(
            Eeprom::from_bytes(&p),
            Err(ProtocolError::BadCrc)
        ));
    }
}
