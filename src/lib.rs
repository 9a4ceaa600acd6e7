//! Davis Instruments Vantage Pro, Pro2, and Vue console client.
//!
//! Implements the documented serial, USB, and TCP/IP communication
//! protocol: the binary packet codecs for every request/response
//! family and a command broker that drives a single console,
//! multiplexing external commands with loop streaming and archive
//! catch-up.
//!
//! ## Example
//!
//! ```rust,no_run
//! use vantage::{std_idle, Command, Connection, Event};
//!
//! # fn main() -> Result<(), vantage::ProtocolError> {
//! let conn = Connection::dial("192.168.1.254:22222")?;
//! let station = conn.start(std_idle);
//!
//! // Ask for the record highs and lows, then consume events as they
//! // arrive.
//! station.queue(Command::GetHiLows)?;
//! for event in station.events().iter() {
//!     match event {
//!         Event::Loop(l) => println!("barometer {}", l.bar.sea_level),
//!         Event::Archive(a) => println!("archive record {}", a.timestamp),
//!         other => println!("{other:?}"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Logging uses the [`log`] facade; wire up any compatible logger to
//! see the protocol exchange at `trace` level.

mod broker;
pub mod codec;
pub mod data;
pub mod device;
mod error;
mod protocol;

pub use broker::{std_idle, Command, Idler, Station};
pub use codec::BarTrend;
pub use data::{
    ArchiveAfter, ArchivePage, ArchivePageMeta, ArchiveRecord, ConsoleTime, Eeprom, Event,
    FirmwareTime, FirmwareVersion, HiLows, Loop,
};
pub use error::ProtocolError;
pub use protocol::Connection;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
