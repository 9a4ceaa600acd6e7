//! Archive download ("DMP after").

use crossbeam_channel::Sender;
use log::{debug, error, info, trace};

use super::{Connection, ACK, ESC, NAK};
use crate::data::{ArchiveAfter, ArchivePage, ArchivePageMeta, Event, PAGE_SIZE};
use crate::error::ProtocolError;

impl Connection {
    /// Downloads all archive records newer than
    /// [`last_archive`](Connection::last_archive) and sends them to
    /// the event channel ordered from oldest to newest.
    /// `last_archive` tracks the newest record delivered, so a
    /// mid-stream failure never loses the download position.
    ///
    /// If `last_archive` does not match an existing archive timestamp
    /// (which is the case when it is `None`) then all records in
    /// memory are delivered.
    pub fn get_archives(&mut self, events: &Sender<Event>) -> Result<(), ProtocolError> {
        let cutoff = self.last_archive;
        debug!("retrieving archive records since {cutoff:?}");

        // Setup download.
        if let Err(e) = self.write_cmd(b"DMPAFT\n", &[ACK], 0) {
            error!("DMPAFT command error: {e}, aborting");
            return Err(e);
        }
        let p = match self.write_cmd(&ArchiveAfter(cutoff).to_bytes(), &[ACK], 6) {
            Ok(p) => p,
            Err(e) => {
                error!("download metadata read error: {e}, aborting");
                return Err(e);
            }
        };

        // The metadata tells us the number of pages to download and
        // the offset of the first record to look at within the first
        // page.
        let meta = match ArchivePageMeta::from_bytes(&p) {
            Ok(m) => m,
            Err(e) => {
                // Most likely a CRC error so cancel gracefully.
                error!("download metadata decode error: {e}, aborting");
                let _ = self.dev.write(&[ESC]);
                return Err(e);
            }
        };
        // Zero pages means there's nothing newer than what we have.
        if meta.pages == 0 {
            debug!("no newer archive records");
            return Ok(());
        }

        // ACK to begin and then loop through all the pages we were
        // told are available.
        debug!("starting {} page download", meta.pages);
        self.dev.write(&[ACK])?;
        let mut p = vec![0u8; PAGE_SIZE];
        let mut emitted = false;
        let mut page_num = 0;
        while page_num < u32::from(meta.pages) {
            if let Err(e) = self.dev.read_exact(&mut p) {
                // Page read failed before we got all of the expected
                // pages.
                error!(
                    "download {page_num}/{} interrupted: {e}, aborting",
                    meta.pages
                );
                return Err(e.into());
            }

            let page = match ArchivePage::from_bytes(&p) {
                Ok(page) => page,
                Err(ProtocolError::BadCrc) => {
                    // NAK and retry the same page.
                    error!(
                        "download page {page_num}/{} failed CRC, retrying",
                        meta.pages
                    );
                    self.dev.write(&[NAK])?;
                    continue;
                }
                Err(e) => {
                    error!("download page {page_num}/{} error: {e}, aborting", meta.pages);
                    return Err(e);
                }
            };

            trace!(
                "valid download page ({page_num}:{}/{})",
                page.sequence,
                meta.pages - 1
            );

            for (rec_num, rec) in page.records.iter().enumerate() {
                // On the first page skip anything before the offset
                // given during the download setup.
                //
                // On the last page, after emitting at least one
                // record, stop as soon as a record is not newer than
                // the previous one: the circular archive has wrapped.
                if page_num == 0 && rec_num < usize::from(meta.first_page_offset) {
                    continue;
                }
                if page_num + 1 == u32::from(meta.pages) && emitted {
                    if let Some(prev) = self.last_archive {
                        if rec.timestamp <= prev {
                            break;
                        }
                    }
                }

                self.last_archive = Some(rec.timestamp);
                emitted = true;
                let _ = events.send(Event::Archive(rec.clone()));
                info!("retrieved archive record for {}", rec.timestamp);
            }

            // ACK the page as received OK so the next is sent.
            self.dev.write(&[ACK])?;
            page_num += 1;
        }

        Ok(())
    }
}
