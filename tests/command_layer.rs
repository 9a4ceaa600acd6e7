//! Command exchange and archive download against a scripted device.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use crossbeam_channel::unbounded;

use vantage::device::Device;
use vantage::{
    ArchivePage, ArchivePageMeta, ArchiveRecord, Connection, Event, ProtocolError,
};

const ACK: u8 = 0x06;
const NAK: u8 = 0x15;
const LF: u8 = 0x0a;

/// Serves a fixed sequence of reads and records every write.
struct ScriptedDevice {
    reads: VecDeque<Vec<u8>>,
    writes: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl ScriptedDevice {
    fn new(reads: Vec<Vec<u8>>) -> (Self, Arc<Mutex<Vec<Vec<u8>>>>) {
        let writes = Arc::new(Mutex::new(Vec::new()));
        (
            ScriptedDevice {
                reads: reads.into(),
                writes: writes.clone(),
            },
            writes,
        )
    }
}

impl Device for ScriptedDevice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_exact(buf).map(|_| buf.len())
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        let next = self
            .reads
            .pop_front()
            .ok_or_else(|| io::Error::from(io::ErrorKind::TimedOut))?;
        assert_eq!(next.len(), buf.len(), "script out of sync with protocol");
        buf.copy_from_slice(&next);

        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writes.lock().unwrap().push(buf.to_vec());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn conn_with_script(reads: Vec<Vec<u8>>) -> (Connection, Arc<Mutex<Vec<Vec<u8>>>>) {
    let (dev, writes) = ScriptedDevice::new(reads);
    (Connection::from_device("scripted", Box::new(dev)), writes)
}

// 2016-06-30 15:44:02 console time response.
const CONS_TIME: [u8; 8] = [0x02, 0x2c, 0x0f, 0x1e, 0x06, 0x74, 0x10, 0xe6];

fn ts(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2016, 6, 30)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

fn record(t: NaiveDateTime) -> ArchiveRecord {
    ArchiveRecord {
        bar: 29.821,
        forecast: "-".to_string(),
        out_temp: 61.4,
        timestamp: t,
        ..ArchiveRecord::default()
    }
}

fn archive_timestamps(events: &crossbeam_channel::Receiver<Event>) -> Vec<NaiveDateTime> {
    events
        .try_iter()
        .map(|e| match e {
            Event::Archive(a) => a.timestamp,
            other => panic!("unexpected event {other:?}"),
        })
        .collect()
}

#[test]
fn command_acked_and_response_read() {
    let (mut conn, writes) = conn_with_script(vec![vec![ACK], CONS_TIME.to_vec()]);

    let t = conn.get_console_time().unwrap();
    assert_eq!(ts(15, 44).with_second(2).unwrap(), t);

    let writes = writes.lock().unwrap();
    assert_eq!(vec![b"GETTIME\n".to_vec()], *writes);
}

#[test]
fn bad_ack_soft_resets_and_retries() {
    let (mut conn, writes) = conn_with_script(vec![
        vec![NAK], // first attempt gets a bad acknowledgement
        vec![ACK],
        CONS_TIME.to_vec(),
    ]);

    let t = conn.get_console_time().unwrap();
    assert_eq!(2, t.second());

    let writes = writes.lock().unwrap();
    assert_eq!(b"GETTIME\n".to_vec(), writes[0]);
    assert_eq!(vec![LF], writes[1]); // soft reset between attempts
    assert_eq!(b"GETTIME\n".to_vec(), writes[2]);
}

#[test]
fn command_fails_after_three_attempts() {
    let (mut conn, writes) = conn_with_script(vec![vec![NAK], vec![NAK], vec![NAK]]);

    assert!(matches!(
        conn.get_console_time(),
        Err(ProtocolError::CommandFailed)
    ));
    // Three command writes interleaved with soft resets.
    let writes = writes.lock().unwrap();
    assert_eq!(
        3,
        writes.iter().filter(|w| w.as_slice() == b"GETTIME\n").count()
    );
}

#[test]
fn archive_download_pages_and_offsets() {
    let page0 = ArchivePage {
        sequence: 0,
        records: (0..5).map(|i| record(ts(10, i * 5))).collect(),
    };
    let page1 = ArchivePage {
        sequence: 1,
        records: (5..10).map(|i| record(ts(10, i * 5))).collect(),
    };
    let meta = ArchivePageMeta {
        pages: 2,
        first_page_offset: 1,
    };

    let (mut conn, writes) = conn_with_script(vec![
        vec![ACK], // DMPAFT
        vec![ACK], // cutoff timestamp
        meta.to_bytes(),
        page0.to_bytes(),
        page1.to_bytes(),
    ]);

    let (tx, rx) = unbounded();
    conn.get_archives(&tx).unwrap();

    // The first record of the first page sits before the offset.
    let got = archive_timestamps(&rx);
    let want: Vec<_> = (1..10).map(|i| ts(10, i * 5)).collect();
    assert_eq!(want, got);
    assert_eq!(Some(ts(10, 45)), conn.last_archive);

    // Client acks: download start plus one per page.
    let writes = writes.lock().unwrap();
    assert_eq!(
        3,
        writes.iter().filter(|w| w.as_slice() == [ACK]).count()
    );
}

#[test]
fn archive_download_retries_bad_page_with_nak() {
    let page = ArchivePage {
        sequence: 0,
        records: (0..5).map(|i| record(ts(10, i * 5))).collect(),
    };
    let mut corrupt = page.to_bytes();
    corrupt[10] ^= 0xff;

    let meta = ArchivePageMeta {
        pages: 1,
        first_page_offset: 0,
    };

    let (mut conn, writes) = conn_with_script(vec![
        vec![ACK],
        vec![ACK],
        meta.to_bytes(),
        corrupt,
        page.to_bytes(), // retransmission after the NAK
    ]);

    let (tx, rx) = unbounded();
    conn.get_archives(&tx).unwrap();

    assert_eq!(5, archive_timestamps(&rx).len());
    let writes = writes.lock().unwrap();
    assert_eq!(
        1,
        writes.iter().filter(|w| w.as_slice() == [NAK]).count()
    );
}

#[test]
fn archive_download_stops_on_wrap() {
    // The last page wraps around to a record older than the
    // previously emitted one.
    let page = ArchivePage {
        sequence: 0,
        records: vec![record(ts(10, 0)), record(ts(10, 5)), record(ts(9, 0))],
    };
    let meta = ArchivePageMeta {
        pages: 1,
        first_page_offset: 0,
    };

    let (mut conn, _) = conn_with_script(vec![
        vec![ACK],
        vec![ACK],
        meta.to_bytes(),
        page.to_bytes(),
    ]);

    let (tx, rx) = unbounded();
    conn.get_archives(&tx).unwrap();

    assert_eq!(vec![ts(10, 0), ts(10, 5)], archive_timestamps(&rx));
    assert_eq!(Some(ts(10, 5)), conn.last_archive);
}

#[test]
fn archive_download_zero_pages_is_clean() {
    let meta = ArchivePageMeta {
        pages: 0,
        first_page_offset: 0,
    };
    let (mut conn, _) = conn_with_script(vec![vec![ACK], vec![ACK], meta.to_bytes()]);
    conn.last_archive = Some(ts(10, 0));

    let (tx, rx) = unbounded();
    conn.get_archives(&tx).unwrap();

    assert!(rx.is_empty());
    assert_eq!(Some(ts(10, 0)), conn.last_archive);
}

#[test]
fn archive_download_cancels_on_bad_metadata() {
    const ESC: u8 = 0x1b;

    let mut meta = ArchivePageMeta {
        pages: 4,
        first_page_offset: 0,
    }
    .to_bytes();
    meta[0] ^= 0xff;

    let (mut conn, writes) = conn_with_script(vec![vec![ACK], vec![ACK], meta]);
    conn.last_archive = Some(ts(10, 0));

    let (tx, rx) = unbounded();
    assert!(matches!(
        conn.get_archives(&tx),
        Err(ProtocolError::BadCrc)
    ));
    assert!(rx.is_empty());
    assert_eq!(Some(ts(10, 0)), conn.last_archive);

    let writes = writes.lock().unwrap();
    assert_eq!(Some(&vec![ESC]), writes.last());
}

#[test]
fn archive_download_keeps_position_on_interruption() {
    let page0 = ArchivePage {
        sequence: 0,
        records: (0..5).map(|i| record(ts(10, i * 5))).collect(),
    };
    let meta = ArchivePageMeta {
        pages: 2,
        first_page_offset: 0,
    };

    // The second page never arrives.
    let (mut conn, _) = conn_with_script(vec![
        vec![ACK],
        vec![ACK],
        meta.to_bytes(),
        page0.to_bytes(),
    ]);

    let (tx, rx) = unbounded();
    assert!(conn.get_archives(&tx).is_err());

    assert_eq!(5, archive_timestamps(&rx).len());
    assert_eq!(Some(ts(10, 20)), conn.last_archive);
}
