//! Simulated console.
//!
//! A console is simulated by guessing which command was requested
//! from the packet sizes and the most recent write.  It is not
//! perfect but is a convenient way to allow low level protocol
//! testing without hardware.

use std::io;
use std::thread;
use std::time::Duration;

use chrono::Local;
use log::debug;
use rand::Rng;

use super::Device;
use crate::data::{ArchivePageMeta, ConsoleTime, FirmwareTime, FirmwareVersion, Loop, LOOP_SIZE};

const ACK: u8 = 0x06;

/// Delay between simulated loop packets.
const LOOP_DELAY: Duration = Duration::from_secs(2);

/// A simulated console device.
pub struct SimDevice {
    /// Current loop packet state.
    l: Loop,
    /// Loop version to send next, so versions interleave.
    next_loop_version: u8,

    /// The last write and the reads since it determine what is
    /// expected to be read next.  This is simple and avoids
    /// implementing a command state machine.
    last_write: Vec<u8>,
    reads_since_write: u32,
    /// A DMPAFT handshake is in flight and the next 6-byte read is
    /// the page metadata.
    dmp_pending: bool,
}

impl SimDevice {
    /// Initializes the state of a simulated console.  The address is
    /// ignored.
    pub fn dial(_addr: &str) -> Self {
        let mut l = Loop::default();

        // Starting observation values which will pass typical QC
        // processes.
        l.bar.altimeter = 29.0;
        l.bar.sea_level = 29.0;
        l.bar.station = 29.0;
        l.out_humidity = 50;
        l.out_temp = 65.0;
        l.wind.cur.speed = 3;

        SimDevice {
            l,
            next_loop_version: 0,
            last_write: Vec::new(),
            reads_since_write: 0,
            dmp_pending: false,
        }
    }

    fn next_loop_packet(&mut self) -> Vec<u8> {
        // Make observation values wander around like they would on a
        // real station.
        self.l.bar.altimeter = wander(self.l.bar.altimeter, 0.01);
        self.l.bar.sea_level = wander(self.l.bar.sea_level, 0.01);
        self.l.bar.station = wander(self.l.bar.station, 0.01);
        self.l.out_humidity = wander(f64::from(self.l.out_humidity), 1.0) as u8;
        self.l.out_temp = wander(self.l.out_temp, 0.5);
        self.l.wind.cur.speed = wander(f64::from(self.l.wind.cur.speed), 1.0) as u8;

        let version = self.next_loop_version + 1;
        self.next_loop_version = (self.next_loop_version + 1) % 2;

        thread::sleep(LOOP_DELAY);

        // Both versions are always encodable.
        self.l.to_bytes(version).unwrap_or_else(|_| vec![0; LOOP_SIZE])
    }
}

impl Device for SimDevice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.len() == 1 {
            buf[0] = ACK;
            return Ok(1);
        }

        debug!("unhandled simulated read of {} bytes", buf.len());
        Err(io::ErrorKind::UnexpectedEof.into())
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.reads_since_write += 1;

        let p: Vec<u8> = if buf.len() == 1 {
            // Command ack
            vec![ACK]
        } else if self.dmp_pending && buf.len() == 6 {
            self.dmp_pending = false;
            ArchivePageMeta::default().to_bytes()
        } else if buf.len() == 6 && self.reads_since_write < 2 {
            // Command OK
            b"\n\rOK\n\r".to_vec()
        } else if self.last_write == b"GETTIME\n" {
            ConsoleTime(Local::now().naive_local()).to_bytes()
        } else if self.last_write == b"NVER\n" {
            FirmwareVersion("1.73".to_string())
                .to_bytes()
                .map_err(|_| io::Error::from(io::ErrorKind::InvalidData))?
        } else if self.last_write == b"TEST\n" {
            b"\n\rTEST\n\r".to_vec()
        } else if self.last_write == b"VER\n" {
            FirmwareTime(chrono::NaiveDate::from_ymd_opt(2002, 4, 24).unwrap_or_default())
                .to_bytes()
        } else if buf.len() == LOOP_SIZE {
            // LPS 3 x
            self.next_loop_packet()
        } else {
            debug!("unhandled simulated read of exactly {} bytes", buf.len());
            return Err(io::ErrorKind::UnexpectedEof.into());
        };

        let n = p.len().min(buf.len());
        buf[..n].copy_from_slice(&p[..n]);

        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.last_write = buf.to_vec();
        self.reads_since_write = 0;
        if buf == b"DMPAFT\n" {
            self.dmp_pending = true;
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.l = Loop::default();
        self.next_loop_version = 0;

        Ok(())
    }
}

/// Takes a value and randomly adds +/- step or zero.
fn wander(v: f64, step: f64) -> f64 {
    v + f64::from(rand::thread_rng().gen_range(-1i32..=1)) * step
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acks_single_byte_reads() {
        let mut sim = SimDevice::dial("/dev/null");
        let mut b = [0u8; 1];
        sim.read_exact(&mut b).unwrap();
        assert_eq!(ACK, b[0]);
    }

    #[test]
    fn answers_gettime() {
        let mut sim = SimDevice::dial("/dev/null");
        sim.write(b"GETTIME\n").unwrap();
        let mut ack = [0u8; 1];
        sim.read_exact(&mut ack).unwrap();

        let mut p = [0u8; 8];
        sim.read_exact(&mut p).unwrap();
        let ct = ConsoleTime::from_bytes(&p).unwrap();
        let now = Local::now().naive_local();
        assert!((now - ct.0).num_seconds().abs() < 5);
    }

    #[test]
    fn answers_dmpaft_with_zero_pages() {
        let mut sim = SimDevice::dial("/dev/null");
        sim.write(b"DMPAFT\n").unwrap();
        let mut ack = [0u8; 1];
        sim.read_exact(&mut ack).unwrap();

        sim.write(&[0u8; 6]).unwrap(); // cutoff timestamp
        sim.read_exact(&mut ack).unwrap();

        let mut p = [0u8; 6];
        sim.read_exact(&mut p).unwrap();
        let meta = ArchivePageMeta::from_bytes(&p).unwrap();
        assert_eq!(0, meta.pages);
    }

    #[test]
    fn interleaves_loop_versions() {
        let mut sim = SimDevice::dial("/dev/null");
        sim.write(b"LPS 3 2\n").unwrap();
        let mut ack = [0u8; 1];
        sim.read_exact(&mut ack).unwrap();

        let mut p = vec![0u8; LOOP_SIZE];
        sim.read_exact(&mut p).unwrap();
        let first = Loop::from_bytes(&p).unwrap();
        assert_eq!(1, first.loop_type);

        sim.read_exact(&mut p).unwrap();
        let mut merged = first.clone();
        merged.update_from_bytes(&p).unwrap();
        assert_eq!(2, merged.loop_type);
        assert!(merged.bar.altimeter > 25.0 && merged.bar.altimeter < 32.0);
    }
}
