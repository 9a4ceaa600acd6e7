//! Console clock packet.
//!
//! Refer to the Vantage Pro, Vantage Pro2 and Vantage Vue Serial
//! Communication Reference Manual, section VIII. Command Summary,
//! subsection 7. Configuration Commands.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::codec;
use crate::error::ProtocolError;

/// The console current time, exchanged with the GETTIME and SETTIME
/// commands as a 6-byte calendar time plus CRC.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ConsoleTime(pub NaiveDateTime);

impl ConsoleTime {
    /// Decodes an 8-byte console time response packet.
    pub fn from_bytes(p: &[u8]) -> Result<Self, ProtocolError> {
        if codec::crc(p) != 0 {
            return Err(ProtocolError::BadCrc);
        }

        Ok(ConsoleTime(codec::get_datetime48(p, 0).unwrap_or_default()))
    }

    /// Encodes an 8-byte packet suitable for the SETTIME command.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut p = vec![0u8; 8];
        codec::set_datetime48(&mut p, 0, self.0);
        codec::set_crc(&mut p);

        p
    }
}

impl From<ConsoleTime> for NaiveDateTime {
    fn from(ct: ConsoleTime) -> Self {
        ct.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const STD: [u8; 8] = [0x02, 0x2c, 0x0f, 0x1e, 0x06, 0x74, 0x10, 0xe6];

    fn std_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2016, 6, 30)
            .unwrap()
            .and_hms_opt(15, 44, 2)
            .unwrap()
    }

    #[test]
    fn decode() {
        let ct = ConsoleTime::from_bytes(&STD).unwrap();
        assert_eq!(std_time(), ct.0);
    }

    #[test]
    fn encode() {
        assert_eq!(STD.to_vec(), ConsoleTime(std_time()).to_bytes());
    }

    #[test]
    fn bad_crc() {
        let mut p = STD;
        p[0] ^= 0xff;
        assert!(matches!(
            ConsoleTime::from_bytes(&p),
            Err(ProtocolError::BadCrc)
        ));
    }
}
