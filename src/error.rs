//! Protocol errors

use thiserror::Error;

/// Errors that can occur while decoding packets or talking to a console.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("CRC check failed")]
    BadCrc,

    #[error("location is inconsistent with hemisphere flags")]
    BadLocation,

    #[error("firmware version must look like N.NN")]
    BadFirmwareVersion,

    #[error("malformed firmware build time: {0}")]
    BadFirmwareTime(#[from] chrono::ParseError),

    #[error("not a revision B archive record")]
    NotArchiveRevisionB,

    #[error("not a download memory page")]
    NotDownloadPage,

    #[error("not a download memory page metadata packet")]
    NotDownloadMeta,

    #[error("not a loop packet")]
    NotLoop,

    #[error("unknown loop packet version")]
    UnknownLoopVersion,

    #[error("command failed after repeated attempts")]
    CommandFailed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
