//! Session errors

use balboa_protocol::FrameError;

/// Which direction of the link failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkFault {
    Read,
    Write,
}

/// Errors returned by [`super::Session::poll`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionError {
    /// The serial link reported an I/O error; the session is now faulted
    Link(LinkFault),
    /// A previous link error has not been cleared with `reinitialize()`
    Faulted,
    /// A frame could not be built
    Frame(FrameError),
}

impl From<FrameError> for SessionError {
    fn from(e: FrameError) -> Self {
        SessionError::Frame(e)
    }
}

/// Errors returned when a command is rejected before it is queued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Value outside what the spa accepts
    OutOfRange,
    /// No status received yet, so the temperature scale is unknown
    ScaleUnknown,
}
