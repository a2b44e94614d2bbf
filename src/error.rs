use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure kinds of the modem.
///
/// The radio pipeline itself never fails: corrupted frames flow through
/// as garbage bits and are rejected by the CRC gates, which report
/// [`Error::CrcMismatch`] per record so the surrounding decode can
/// continue best-effort. Only structural problems abort a call.
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed input: {0}")]
    InputMalformed(String),

    #[error("payload of {0} bytes does not fit the 24-bit length field")]
    PayloadTooLarge(usize),

    #[error("CRC mismatch")]
    CrcMismatch,

    #[error("record too short")]
    TooShort,

    #[error("segment {0} missing during reassembly")]
    MissingSegment(u16),

    #[error("segment {0} received but never with a valid CRC")]
    CorruptSegment(u16),

    #[error("internal error: {0}")]
    Internal(&'static str),

    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),
}
