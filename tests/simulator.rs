//! End-to-end flows against the simulated console at /dev/null.

use std::time::Duration;

use chrono::{Local, NaiveDate};
use crossbeam_channel::unbounded;

use vantage::{std_idle, Command, Connection, Event};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn single_command_operations() {
    init_logs();
    let mut conn = Connection::dial("/dev/null").unwrap();

    // Console clock reads close to the local clock.
    let t = conn.get_console_time().unwrap();
    assert!((Local::now().naive_local() - t).num_seconds().abs() < 5);

    // Clock sync finds nothing to correct.
    conn.sync_console_time().unwrap();

    // Firmware identification.
    let ft = conn.get_firmware_time().unwrap();
    assert_eq!(NaiveDate::from_ymd_opt(2002, 4, 24).unwrap(), ft.0);
    let fv = conn.get_firmware_version().unwrap();
    assert_eq!("1.73", fv.0);

    // Lamps and the self test follow the long textual ack.
    conn.set_lamps(true).unwrap();
    conn.set_lamps(false).unwrap();
    conn.test().unwrap();

    conn.close().unwrap();
}

#[test]
fn archive_download_with_no_cutoff_is_empty() {
    init_logs();
    let mut conn = Connection::dial("/dev/null").unwrap();

    let (tx, rx) = unbounded();
    conn.get_archives(&tx).unwrap();

    assert!(rx.is_empty());
    assert_eq!(None, conn.last_archive);
}

#[test]
fn broker_streams_merged_loops_and_preempts_for_commands() {
    init_logs();
    let conn = Connection::dial("/dev/null").unwrap();
    let station = conn.start(std_idle);
    let events = station.events();

    // The first emitted observation already merges loop1 and loop2,
    // so the loop2-only altimeter is populated and plausible.
    let mut loops = 0;
    for event in events.iter() {
        if let Event::Loop(l) = event {
            assert!(
                l.bar.altimeter > 25.0 && l.bar.altimeter < 32.0,
                "altimeter {} out of range",
                l.bar.altimeter
            );
            loops += 1;
            if loops == 2 {
                break;
            }
        }
    }

    // A queued command preempts the loop stream within a packet.
    station.queue(Command::GetFirmware).unwrap();
    let mut saw_time = false;
    let mut saw_version = false;
    for event in events.iter() {
        match event {
            Event::FirmwareTime(ft) => {
                assert_eq!(NaiveDate::from_ymd_opt(2002, 4, 24).unwrap(), ft.0);
                saw_time = true;
            }
            Event::FirmwareVersion(fv) => {
                assert_eq!("1.73", fv.0);
                saw_version = true;
            }
            Event::Loop(_) => {}
            other => panic!("unexpected event {other:?}"),
        }
        if saw_time && saw_version {
            break;
        }
    }

    // Stop drains the queue and closes the event channel.
    station.stop();
    loop {
        match events.recv_timeout(Duration::from_secs(10)) {
            Ok(_) => continue, // drain events buffered before the stop
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                panic!("event channel did not close")
            }
        }
    }
}
