//! Loop packet stream.

use crossbeam_channel::{Sender, TrySendError};
use log::{debug, error, info, trace, warn};

use super::{Connection, ACK};
use crate::data::{Event, Loop, LOOP_SIZE};
use crate::error::ProtocolError;

impl Connection {
    /// Starts a stream of loop packets and sends the merged
    /// observations to the event channel.  It exits when the loop
    /// count is exhausted, an archive record was written, or a
    /// command is pending.
    pub fn get_loops(&mut self, events: &Sender<Event>) -> Result<(), ProtocolError> {
        // The preferred exit condition is sensing a new archive
        // record, so ask for 30 seconds beyond the archive interval.
        let num_loops = (self.archive_interval_secs() + 30) / 2;

        info!("retrieving {num_loops} loop packets");

        if let Err(e) = self.write_cmd(format!("LPS 3 {num_loops}\n").as_bytes(), &[ACK], 0) {
            error!("LPS command error: {e}, aborting");
            return Err(e);
        }

        let mut p = vec![0u8; LOOP_SIZE];
        let mut l = Loop::default();
        let mut next_archive: Option<u16> = None;
        for loop_num in 0..num_loops {
            if let Err(e) = self.dev.read_exact(&mut p) {
                // The stream was interrupted before all of the
                // expected packets arrived.
                warn!("loop stream {loop_num}/{num_loops} read interrupted: {e}, aborting");
                return Err(e.into());
            }

            if let Err(e) = l.update_from_bytes(&p) {
                // Most likely a CRC error.  The 99-byte packets carry
                // no delimiter so we are probably out of sync with
                // the stream and the safest action is to abort.
                error!("loop stream {loop_num}/{num_loops} decode error: {e}, aborting");
                return Err(e);
            }

            trace!("valid loop {l:?}");

            // The merge of loop1 and loop2 is incomplete until one of
            // each has been decoded, so suppress the very first
            // packet.
            if loop_num > 0 {
                if let Err(TrySendError::Full(_)) = events.try_send(Event::Loop(Box::new(l.clone())))
                {
                    warn!("event channel is full, discarding latest loop");
                }
            }

            // A loop1 decode includes the next archive record
            // indicator; when it changes a new archive record is
            // ready to be read.
            if l.loop_type == 1 {
                match next_archive {
                    None => next_archive = Some(l.next_archive_record),
                    Some(n) if n != l.next_archive_record => {
                        debug!(
                            "new archive record is available ({n}->{})",
                            l.next_archive_record
                        );
                        self.new_archive_record = true;
                        return Ok(());
                    }
                    Some(_) => {}
                }
            }

            // Loops are low priority, so if something else is waiting
            // to run interrupt the console and exit.
            if self.commands_pending() {
                debug!("command queue is not empty, cancelling loop stream");
                self.soft_reset();
                break;
            }
        }

        Ok(())
    }
}
