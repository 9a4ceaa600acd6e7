//! Console protocol driver.
//!
//! [`Connection`] owns the transport exclusively and implements the
//! framed command exchange every operation is built on: write a
//! command, validate the acknowledgement with retry and soft-reset
//! between attempts, then read a fixed-size response.

mod dmp;
mod loops;
mod ops;

use std::thread;
use std::time::Duration;

use chrono::NaiveDateTime;
use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, error, trace, warn};

use crate::broker::Command;
use crate::device::{self, Device};
use crate::error::ProtocolError;

pub(crate) const LF: u8 = 0x0a; // Line feed
pub(crate) const CR: u8 = 0x0d; // Carriage return
pub(crate) const ACK: u8 = 0x06; // Acknowledge
pub(crate) const NAK: u8 = 0x15; // Not acknowledge
pub(crate) const ESC: u8 = 0x1b; // Escape, cancels a download

/// Attempts before a command is declared failed.
const CMD_RETRIES: usize = 3;

/// Settle time after a soft reset before flushing the input buffer.
const SOFT_RESET_FLUSH: Duration = Duration::from_secs(1);

/// Archive interval assumed until the EEPROM has been read.
const DEFAULT_ARCHIVE_PERIOD: u8 = 5;

/// A connection to a single console.
///
/// The connection is driven either directly through the operation
/// methods or by handing it to the command broker with
/// [`Connection::start`](crate::broker).
pub struct Connection {
    addr: String,
    dev: Box<dyn Device>,

    /// Time of the last downloaded archive record.  Used as the
    /// DMPAFT cutoff; `None` downloads everything in memory.
    pub last_archive: Option<NaiveDateTime>,
    /// A new archive record is available to download.
    pub new_archive_record: bool,
    /// Archive interval in minutes, cached from the EEPROM.
    archive_period: Option<u8>,

    cmd_tx: Sender<Command>,
    cmd_rx: Receiver<Command>,
}

impl Connection {
    /// Establishes the console connection for the given address.
    ///
    /// `/dev/null` connects the simulator, any other `/dev/` path a
    /// serial or USB data logger, and anything else is dialed as TCP
    /// `host:port`.
    pub fn dial(addr: &str) -> Result<Self, ProtocolError> {
        trace!("opening device {addr}");
        let (cmd_tx, cmd_rx) = bounded(1);

        Ok(Connection {
            addr: addr.to_string(),
            dev: device::open(addr)?,
            last_archive: None,
            new_archive_record: false,
            archive_period: None,
            cmd_tx,
            cmd_rx,
        })
    }

    /// Wraps an already-open device.  A hard reset re-dials `addr`
    /// through the address grammar, so this is mostly useful for
    /// custom transports and tests.
    pub fn from_device(addr: &str, dev: Box<dyn Device>) -> Self {
        let (cmd_tx, cmd_rx) = bounded(1);

        Connection {
            addr: addr.to_string(),
            dev,
            last_archive: None,
            new_archive_record: false,
            archive_period: None,
            cmd_tx,
            cmd_rx,
        }
    }

    /// Closes the console connection.
    pub fn close(&mut self) -> Result<(), ProtocolError> {
        trace!("closing device {}", self.addr);
        self.dev.close()?;

        Ok(())
    }

    /// Re-dials the transport during a hard reset without losing the
    /// download state.
    pub(crate) fn reopen(&mut self) -> Result<(), ProtocolError> {
        trace!("reopening device {}", self.addr);
        self.dev = device::open(&self.addr)?;

        Ok(())
    }

    /// Tries to get the console to abort the current command and into
    /// a ready state.  Usually used to interrupt LPS or DMPAFT.
    pub(crate) fn soft_reset(&mut self) {
        let _ = self.dev.write(&[LF]);
        thread::sleep(SOFT_RESET_FLUSH);
        let _ = self.dev.flush();
    }

    /// Sends a test command.
    pub fn test(&mut self) -> Result<(), ProtocolError> {
        self.write_cmd(b"TEST\n", &[LF, CR, b'T', b'E', b'S', b'T', LF, CR], 0)?;

        Ok(())
    }

    /// Runs a command and requires an acknowledgement response.  If
    /// `n` > 0 a packet of that length is read after the
    /// acknowledgement; with `n` = 0 the rest of the exchange is left
    /// to the caller (e.g. the DMPAFT and LPS streams).
    pub(crate) fn write_cmd(
        &mut self,
        cmd: &[u8],
        cmd_ack: &[u8],
        n: usize,
    ) -> Result<Vec<u8>, ProtocolError> {
        // If the command ends with a line feed it's probably printable.
        let cmd_str = if cmd.last() == Some(&LF) {
            String::from_utf8_lossy(&cmd[..cmd.len() - 1]).into_owned()
        } else {
            "[bytes]".to_string()
        };

        let mut resp = vec![0u8; cmd_ack.len()];
        let mut acked = false;
        for try_num in 0..CMD_RETRIES {
            trace!("command {cmd:02x?}");
            self.dev.write(cmd)?;

            resp.fill(0);
            let _ = self.dev.read_exact(&mut resp);
            if resp == cmd_ack {
                acked = true;
                break;
            }

            trace!("expected ack {cmd_ack:02x?}, actual {resp:02x?}");
            warn!(
                "command '{}' bad response, retrying ({}/{})",
                cmd_str,
                try_num + 1,
                CMD_RETRIES
            );
            self.soft_reset();
        }
        if !acked {
            error!("command '{cmd_str}' bad response after repeated attempts");
            return Err(ProtocolError::CommandFailed);
        }

        debug!("command '{cmd_str}' successful");

        if n < 1 {
            return Ok(Vec::new());
        }

        let mut p = vec![0u8; n];
        self.dev.read_exact(&mut p)?;
        trace!("packet {p:02x?}");

        Ok(p)
    }

    /// The archive interval in seconds, read from the EEPROM when it
    /// has been fetched and 5 minutes otherwise.
    pub(crate) fn archive_interval_secs(&self) -> u32 {
        u32::from(self.archive_period.unwrap_or(DEFAULT_ARCHIVE_PERIOD)) * 60
    }

    pub(crate) fn cache_archive_period(&mut self, minutes: u8) {
        if minutes > 0 {
            self.archive_period = Some(minutes);
        }
    }

    pub(crate) fn cmd_sender(&self) -> Sender<Command> {
        self.cmd_tx.clone()
    }

    pub(crate) fn cmd_receiver(&self) -> Receiver<Command> {
        self.cmd_rx.clone()
    }

    pub(crate) fn commands_pending(&self) -> bool {
        !self.cmd_rx.is_empty()
    }

    pub(crate) fn queued_commands(&self) -> usize {
        self.cmd_rx.len()
    }
}
