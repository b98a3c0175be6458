use core::fmt::Display;
use std::borrow::Cow;

/// Error types used throughout the `rawmem` library.
/// These errors represent the failure conditions that can occur while
/// accessing memory, converting structs, or reading from byte sources.
#[derive(Debug)]
pub enum Error {
    /// A read or write against a memory source failed.
    ///
    /// This error typically indicates issues such as:
    /// * Invalid or unmapped address
    /// * Protected page
    /// * Target process has exited
    Memory {
        /// A descriptive message, including the OS error code when available.
        msg: Cow<'static, str>,
    },

    /// A memory allocation request failed.
    ///
    /// This error typically indicates issues such as:
    /// * Address space exhaustion
    /// * Access denied by the OS
    Allocation {
        /// A descriptive message, including the OS error code when available.
        msg: Cow<'static, str>,
    },

    /// A protection change on a memory region failed.
    Permission {
        /// A descriptive message, including the OS error code when available.
        msg: Cow<'static, str>,
    },

    /// The operation is not available on the current OS or architecture.
    Unsupported {
        /// A descriptive message naming the missing capability.
        msg: Cow<'static, str>,
    },

    /// A stream reader ran out of data before a read could complete.
    End {
        /// A descriptive message about the exhausted read.
        msg: Cow<'static, str>,
    },

    /// An argument violated a codec or buffer contract.
    ///
    /// This error typically indicates issues such as:
    /// * A byte buffer smaller than the requested type
    /// * A byte buffer whose length is not a multiple of the element size
    Argument {
        /// A descriptive message about the violated contract.
        msg: Cow<'static, str>,
    },

    /// An error occurred while reading from an underlying byte source.
    Io {
        /// A descriptive message about the I/O error.
        msg: Cow<'static, str>,
    },
}

impl Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Memory { msg } => write!(f, "Memory access error: {msg}"),
            Error::Allocation { msg } => write!(f, "Memory allocation error: {msg}"),
            Error::Permission { msg } => write!(f, "Memory protection error: {msg}"),
            Error::Unsupported { msg } => write!(f, "Unsupported platform operation: {msg}"),
            Error::End { msg } => write!(f, "End of stream: {msg}"),
            Error::Argument { msg } => write!(f, "Argument error: {msg}"),
            Error::Io { msg } => write!(f, "I/O error: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

/// Creates a memory access error with the specified message.
#[cold]
#[inline(never)]
pub(crate) fn memory_error(msg: impl Into<Cow<'static, str>>) -> Error {
    Error::Memory { msg: msg.into() }
}

/// Creates an allocation error with the specified message.
#[cold]
#[inline(never)]
pub(crate) fn alloc_error(msg: impl Into<Cow<'static, str>>) -> Error {
    Error::Allocation { msg: msg.into() }
}

/// Creates a protection-change error with the specified message.
#[cold]
#[inline(never)]
pub(crate) fn permission_error(msg: impl Into<Cow<'static, str>>) -> Error {
    Error::Permission { msg: msg.into() }
}

/// Creates an unsupported-platform error with the specified message.
#[cfg(unix)]
#[cold]
#[inline(never)]
pub(crate) fn unsupported_error(msg: impl Into<Cow<'static, str>>) -> Error {
    Error::Unsupported { msg: msg.into() }
}

/// Creates an end-of-stream error with the specified message.
#[cold]
#[inline(never)]
pub(crate) fn end_error(msg: impl Into<Cow<'static, str>>) -> Error {
    Error::End { msg: msg.into() }
}

/// Creates an argument error with the specified message.
#[cold]
#[inline(never)]
pub(crate) fn argument_error(msg: impl Into<Cow<'static, str>>) -> Error {
    Error::Argument { msg: msg.into() }
}

/// Creates an I/O error with the specified message.
#[cold]
#[inline(never)]
pub(crate) fn io_error(msg: impl Into<Cow<'static, str>>) -> Error {
    Error::Io { msg: msg.into() }
}
