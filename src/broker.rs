//! Command broker.
//!
//! A single worker thread owns the connection and multiplexes between
//! the external command queue, a periodic console clock sync, and an
//! idle activity.  Callers interact only through the command queue
//! and the event channel.

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use log::{debug, error, trace, warn};

use crate::data::Event;
use crate::error::ProtocolError;
use crate::protocol::Connection;

/// How often the console clock is synchronized.  The sync also fires
/// immediately at startup.
const CONSOLE_TIME_SYNC_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Buffer the event channel to the maximum records a Vantage Pro 2
/// console can hold in memory.  This can speed up large downloads
/// when the receiver is I/O bound with database writes.
const EVENT_BUFFER: usize = 5 * 512;

/// Commands the broker dispatches.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Command {
    /// Download archive records newer than the last delivered one.
    GetArchives,
    /// Read the EEPROM configuration.
    GetEeprom,
    /// Read the firmware build time and version.
    GetFirmware,
    /// Read the record highs and lows.
    GetHiLows,
    /// Stream loop packets.
    GetLoops,
    /// Turn the console lamps off.
    LampsOff,
    /// Turn the console lamps on.
    LampsOn,
    /// Exit the worker.
    Stop,
    /// Synchronize the console clock with the local system time.
    SyncConsoleTime,
}

/// The idle activity the broker runs when no commands are pending.
pub trait Idler: FnMut(&mut Connection, &Sender<Event>) -> Result<(), ProtocolError> {}
impl<F: FnMut(&mut Connection, &Sender<Event>) -> Result<(), ProtocolError>> Idler for F {}

/// The standard idler: catch up on archive records when one is
/// available, otherwise stream loops.
pub fn std_idle(c: &mut Connection, events: &Sender<Event>) -> Result<(), ProtocolError> {
    if c.new_archive_record {
        c.new_archive_record = false;
        c.get_archives(events)
    } else {
        c.get_loops(events)
    }
}

/// Handle to a running command broker.
pub struct Station {
    cmd_tx: Sender<Command>,
    cmd_rx: Receiver<Command>,
    events: Receiver<Event>,
    worker: Option<JoinHandle<()>>,
}

impl Station {
    /// The output event stream.  The channel closes when the worker
    /// exits.
    pub fn events(&self) -> Receiver<Event> {
        self.events.clone()
    }

    /// Queues a command for the worker, blocking while another
    /// command is already pending.
    pub fn queue(&self, cmd: Command) -> Result<(), ProtocolError> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| ProtocolError::CommandFailed)
    }

    /// Stops the command broker: pending commands are discarded, the
    /// worker exits at its next scheduling point, and the event
    /// channel closes.
    pub fn stop(mut self) {
        trace!("stopping command broker by request");
        // Drain the command queue and send a stop command.
        while self.cmd_rx.try_recv().is_ok() {}
        let _ = self.cmd_tx.send(Command::Stop);

        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for Station {
    fn drop(&mut self) {
        if self.worker.is_some() {
            let _ = self.cmd_tx.try_send(Command::Stop);
        }
    }
}

impl Connection {
    /// Starts the command broker and returns its handle.  When no
    /// commands are pending the worker runs the idler, normally
    /// [`std_idle`].
    pub fn start<F>(self, mut idle: F) -> Station
    where
        F: Idler + Send + 'static,
    {
        let (event_tx, event_rx) = bounded(EVENT_BUFFER);
        let cmd_tx = self.cmd_sender();
        let cmd_rx = self.cmd_receiver();

        let mut conn = self;
        let worker = thread::spawn(move || {
            let mut err: Option<ProtocolError> = None;
            // Sync the console clock on startup and every
            // CONSOLE_TIME_SYNC_INTERVAL after; a failed sync stays
            // due and is retried after recovery.
            let mut next_sync = Instant::now();

            loop {
                // Before anything else make sure we're in a
                // non-error state.
                if let Some(e) = err.take() {
                    warn!("{e}, trying soft-reset");
                    if let Err(e) = conn.test() {
                        error!("{e}, trying hard-reset");
                        let _ = conn.close();
                        if let Err(e) = conn.reopen() {
                            err = Some(e);
                        }
                        continue;
                    }
                }

                if Instant::now() >= next_sync {
                    match conn.sync_console_time() {
                        Ok(()) => next_sync = Instant::now() + CONSOLE_TIME_SYNC_INTERVAL,
                        Err(e) => err = Some(e),
                    }
                    continue;
                }

                debug!("{} command(s) in queue", conn.queued_commands());
                match conn.cmd_receiver().try_recv() {
                    Ok(Command::Stop) => return,
                    Ok(cmd) => err = conn.dispatch(cmd, &event_tx).err(),
                    Err(TryRecvError::Empty) => err = idle(&mut conn, &event_tx).err(),
                    Err(TryRecvError::Disconnected) => return,
                }
            }
        });

        Station {
            cmd_tx,
            cmd_rx,
            events: event_rx,
            worker: Some(worker),
        }
    }

    fn dispatch(&mut self, cmd: Command, events: &Sender<Event>) -> Result<(), ProtocolError> {
        match cmd {
            Command::GetArchives => self.get_archives(events),
            Command::GetEeprom => self.get_eeprom(events),
            Command::GetFirmware => self.get_firmware(events),
            Command::GetHiLows => self.get_hi_lows(events),
            Command::GetLoops => self.get_loops(events),
            Command::LampsOff => self.set_lamps(false),
            Command::LampsOn => self.set_lamps(true),
            Command::SyncConsoleTime => self.sync_console_time(),
            // Handled by the scheduling loop before dispatch.
            Command::Stop => Ok(()),
        }
    }
}
