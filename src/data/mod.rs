//! Decoded console data types.
//!
//! Each packet family gets a struct with `from_bytes`/`to_bytes`
//! mirroring its fixed on-wire layout.  Decoded values are emitted to
//! consumers as [`Event`]s and then forgotten; the library keeps no
//! record history.

mod archive;
mod console_time;
mod eeprom;
mod firmware;
mod hilows;
mod loop_packet;

pub use archive::{
    ArchiveAfter, ArchivePage, ArchivePageMeta, ArchiveRecord, PAGE_SIZE, RECORDS_PER_PAGE,
};
pub use console_time::ConsoleTime;
pub use eeprom::{Eeprom, EEPROM_SIZE};
pub use firmware::{FirmwareTime, FirmwareVersion};
pub use hilows::{HiLowRecord, HiLows, HiRainRate, HiRecord, LowRecord, HILOWS_SIZE};
pub use loop_packet::{
    Loop, LoopBar, LoopBat, LoopEt, LoopRain, LoopWind, RainAccum, WindAvg, WindCur, WindGust,
    LOOP_SIZE,
};

use serde::Serialize;

/// A value produced on the output event stream.  Consumers
/// discriminate by variant.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Event {
    Archive(ArchiveRecord),
    Eeprom(Eeprom),
    HiLows(Box<HiLows>),
    Loop(Box<Loop>),
    FirmwareTime(FirmwareTime),
    FirmwareVersion(FirmwareVersion),
}
