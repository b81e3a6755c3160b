use std::{
    fmt::{self, Display, Formatter},
    io,
};

/// * Everything that can go wrong while building or driving an `Encoder`.
#[derive(Debug)]
pub enum EncoderError {
    /// * The caller asked for a configuration this crate does not implement
    ///   (e.g. more than 2 channels, a sample rate with no matching template).
    UnsupportedConfig(String),

    /// * A packet buffer passed in by the caller was too small to hold the
    ///   data the encoder needed to write into it.
    BufferTooSmall {
        needed_bits: usize,
        available_bits: usize,
    },

    /// * Audio was pushed in after `finish()` was called, or a packet was
    ///   requested before the codec setup was initialized.
    InvalidState(String),

    /// * Bubbled up from the bitstream writer/reader (`io::Error`).
    Io(io::Error),
}

impl Display for EncoderError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::UnsupportedConfig(msg) => write!(f, "unsupported encoder configuration: {msg}"),
            Self::BufferTooSmall{needed_bits, available_bits} => write!(f, "packet buffer too small: needed {needed_bits} bits, had {available_bits}"),
            Self::InvalidState(msg) => write!(f, "invalid encoder state: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for EncoderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for EncoderError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<EncoderError> for io::Error {
    fn from(e: EncoderError) -> Self {
        match e {
            EncoderError::Io(e) => e,
            other => io::Error::new(io::ErrorKind::Other, other.to_string()),
        }
    }
}
