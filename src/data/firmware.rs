//! Firmware identification packets.
//!
//! The VER and NVER responses are CR/LF wrapped text rather than
//! binary: a `"Apr 24 2002"`-shaped build date and a `"1.73"` version
//! literal.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::ProtocolError;

/// The firmware build time, exchanged with the VER command.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct FirmwareTime(pub NaiveDate);

impl FirmwareTime {
    /// Decodes a 13-byte firmware build time response packet.
    pub fn from_bytes(p: &[u8]) -> Result<Self, ProtocolError> {
        let s = String::from_utf8_lossy(p);
        let d = NaiveDate::parse_from_str(s.trim_end_matches(['\n', '\r']), "%b %d %Y")?;

        Ok(FirmwareTime(d))
    }

    /// Encodes a 13-byte packet matching the VER response format.
    pub fn to_bytes(&self) -> Vec<u8> {
        format!("{}\n\r", self.0.format("%b %d %Y")).into_bytes()
    }
}

/// The firmware version number, exchanged with the NVER command.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct FirmwareVersion(pub String);

impl FirmwareVersion {
    /// Decodes a 6-byte firmware version response packet.
    pub fn from_bytes(p: &[u8]) -> Result<Self, ProtocolError> {
        let s = String::from_utf8_lossy(p);

        Ok(FirmwareVersion(
            s.trim_end_matches(['\n', '\r']).to_string(),
        ))
    }

    /// Encodes a 6-byte packet matching the NVER response format.
    /// Versions are always formatted `N.NN`.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        if self.0.len() != 4 {
            return Err(ProtocolError::BadFirmwareVersion);
        }

        Ok(format!("{}\n\r", self.0).into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_time_decode() {
        let ft = FirmwareTime::from_bytes(b"Apr 24 2002\n\r").unwrap();
        assert_eq!(NaiveDate::from_ymd_opt(2002, 4, 24).unwrap(), ft.0);
    }

    #[test]
    fn build_time_encode() {
        let ft = FirmwareTime(NaiveDate::from_ymd_opt(2002, 4, 24).unwrap());
        assert_eq!(b"Apr 24 2002\n\r".to_vec(), ft.to_bytes());
    }

    #[test]
    fn build_time_garbage() {
        assert!(FirmwareTime::from_bytes(b"not a date\n\r").is_err());
    }

    #[test]
    fn version_decode() {
        let fv = FirmwareVersion::from_bytes(b"1.73\n\r").unwrap();
        assert_eq!("1.73", fv.0);
    }

    #[test]
    fn version_encode() {
        let fv = FirmwareVersion("1.73".to_string());
        assert_eq!(b"1.73\n\r".to_vec(), fv.to_bytes().unwrap());
    }

    #[test]
    fn version_must_be_four_chars() {
        assert!(matches!(
            FirmwareVersion("1.7".to_string()).to_bytes(),
            Err(ProtocolError::BadFirmwareVersion)
        ));
    }
}
