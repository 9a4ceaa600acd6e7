//! Single-command operations.

use chrono::{Local, NaiveDateTime};
use crossbeam_channel::Sender;
use log::{debug, error, info};

use super::{Connection, ACK, CR, LF};
use crate::data::{
    ConsoleTime, Eeprom, Event, FirmwareTime, FirmwareVersion, HiLows, EEPROM_SIZE, HILOWS_SIZE,
};
use crate::error::ProtocolError;

/// Maximum drift tolerated before the console clock is rewritten.
const MAX_CLOCK_OFFSET_SECS: i64 = 10;

impl Connection {
    /// Gets the console time.
    pub fn get_console_time(&mut self) -> Result<NaiveDateTime, ProtocolError> {
        let p = self.write_cmd(b"GETTIME\n", &[ACK], 8)?;

        Ok(ConsoleTime::from_bytes(&p)?.0)
    }

    /// Sets the console time.
    fn set_console_time(&mut self, t: NaiveDateTime) -> Result<(), ProtocolError> {
        self.write_cmd(b"SETTIME\n", &[ACK], 0)?;
        self.write_cmd(&ConsoleTime(t).to_bytes(), &[ACK], 0)?;

        Ok(())
    }

    /// Synchronizes the console clock with the local system time if
    /// the offset exceeds 10 seconds.
    pub fn sync_console_time(&mut self) -> Result<(), ProtocolError> {
        let t = self.get_console_time()?;
        let offset = (Local::now().naive_local() - t).num_seconds().abs();
        debug!("console time is {t}, offset is {offset}s");

        if offset > MAX_CLOCK_OFFSET_SECS {
            info!("console time is off by {offset}s, syncing");
            if let Err(e) = self.set_console_time(Local::now().naive_local()) {
                error!("{e}");
                return Err(e);
            }
        }

        Ok(())
    }

    /// Gets the firmware build time.
    pub fn get_firmware_time(&mut self) -> Result<FirmwareTime, ProtocolError> {
        let p = self.write_cmd(b"VER\n", &[LF, CR, b'O', b'K', LF, CR], 13)?;

        FirmwareTime::from_bytes(&p)
    }

    /// Gets the firmware version number.
    pub fn get_firmware_version(&mut self) -> Result<FirmwareVersion, ProtocolError> {
        let p = self.write_cmd(b"NVER\n", &[LF, CR, b'O', b'K', LF, CR], 6)?;

        FirmwareVersion::from_bytes(&p)
    }

    /// Retrieves the firmware build time and version and emits both
    /// on the event channel.
    pub fn get_firmware(&mut self, events: &Sender<Event>) -> Result<(), ProtocolError> {
        let ft = self.get_firmware_time()?;
        let fv = self.get_firmware_version()?;
        let _ = events.send(Event::FirmwareTime(ft));
        let _ = events.send(Event::FirmwareVersion(fv));

        Ok(())
    }

    /// Retrieves the record highs and lows.
    pub fn get_hi_lows(&mut self, events: &Sender<Event>) -> Result<(), ProtocolError> {
        let p = self.write_cmd(b"HILOWS\n", &[ACK], HILOWS_SIZE)?;

        let hl = HiLows::from_bytes(&p)?;
        let _ = events.send(Event::HiLows(Box::new(hl)));

        Ok(())
    }

    /// Retrieves the entire EEPROM configuration.  The archive
    /// interval it carries is cached to size future loop streams.
    pub fn get_eeprom(&mut self, events: &Sender<Event>) -> Result<(), ProtocolError> {
        let p = self.write_cmd(b"GETEE\n", &[ACK], EEPROM_SIZE)?;

        let ee = Eeprom::from_bytes(&p)?;
        self.cache_archive_period(ee.archive_period);
        let _ = events.send(Event::Eeprom(ee));

        Ok(())
    }

    /// Sets the console lamps state.
    pub fn set_lamps(&mut self, on: bool) -> Result<(), ProtocolError> {
        let cmd: &[u8] = if on { b"LAMPS 1\n" } else { b"LAMPS 0\n" };
        self.write_cmd(cmd, &[LF, CR, b'O', b'K', LF, CR], 0)?;

        Ok(())
    }
}
