// Copyright (C) 2026 beanwire contributors
//
// This file is part of beanwire.
//
// beanwire is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// beanwire is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with beanwire.  If not, see <http://www.gnu.org/licenses/>.
//! error
//!
//! # Introduction
//!
//! The error type shared by every module in this crate. Every fallible
//! operation in `beanwire` returns [`Result<T>`], whose `Err` side is this
//! module's [`Error`].
//!
//! # Discussion
//!
//! [`Cause`] is an enumerated status code; textual descriptions are
//! synthesized from it (via [`parse_display::Display`]) only when an error
//! needs to be shown to a human. An `Error` optionally chains a lower-level
//! `source` and captures a `Backtrace` at construction time.

use parse_display::Display;

/// Enumerated failure reasons. Each variant corresponds to one of the
/// error kinds from the codec's error handling design: configuration
/// errors are fatal at first use of a record type, `EndOfInput` is a
/// signal rather than a failure, `DecodeFailure`/`EncodeFailure` wrap a
/// lower-level read/write error with the offending class name, and
/// `UnknownClassName` covers a named `Externalizable` or list class that
/// cannot be resolved via the type registry.
#[derive(Debug, Display)]
pub enum Cause {
    /// An error in another crate or module took place-- cf. source.
    #[display("An error in another crate or module-- cf. source.")]
    Other,
    /// Clean end of the record stream; not a failure.
    #[display("end of input")]
    EndOfInput,
    /// A record class has no nullary constructor / `Default` impl.
    #[display("record type {0} has no usable default constructor")]
    NoDefaultConstructor(String),
    /// Two fields of the same class declared the same field index.
    #[display("duplicate field index {0} in record type {1}")]
    DuplicateFieldIndex(u8, String),
    /// A record type's descriptor has no fields at all.
    #[display("record type {0} declares no externalized fields")]
    NoFields(String),
    /// An enum used as an `EnumSet` has more than 64 variants.
    #[display("enum {0} has more than 64 variants; cannot be used as an EnumSet")]
    TooManyEnumValues(String),
    /// Failed to decode a record, wrapping the low-level cause.
    #[display("failed to read externalized instance of {0}-- maybe field order changed")]
    DecodeFailure(String),
    /// Failed to encode a record, wrapping the low-level cause.
    #[display("failed to write externalized instance of {0}")]
    EncodeFailure(String),
    /// An explicitly-named `Externalizable` or list class could not be resolved.
    #[display("unknown class name {0!r} on the wire")]
    UnknownClassName(String),
    /// An unrecognized variant tag byte was encountered for a field whose
    /// payload is not length-prefixed, so no safe skip is possible.
    #[display("unrecognized variant tag {0} for field index {1}; cannot safely skip")]
    UnrecognizedTag(u8, u8),
    /// A UTF payload's length prefix did not correspond to valid UTF-8.
    #[display("malformed UTF payload on the wire")]
    BadUtf,
}

/// The crate's error type: an enumerated [`Cause`], an optional boxed
/// lower-level source, and an optional backtrace captured at the point of
/// construction.
#[derive(Debug, Display)]
#[display("{cause} Source (if any): {source} Stack trace (if any): {trace}")]
pub struct Error {
    cause: Cause,
    #[display("{:?}")]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
    #[display("{:?}")]
    trace: Option<backtrace::Backtrace>,
}

impl Error {
    pub fn new(cause: Cause) -> Error {
        Error {
            cause,
            source: None,
            trace: Some(backtrace::Backtrace::new()),
        }
    }

    pub fn wrap(cause: Cause, source: impl std::error::Error + Send + Sync + 'static) -> Error {
        Error {
            cause,
            source: Some(Box::new(source)),
            trace: Some(backtrace::Backtrace::new()),
        }
    }

    /// True iff this error is the `EndOfInput` signal-- callers streaming a
    /// sequence of records use this to distinguish "clean stop" from a real
    /// decode failure.
    pub fn is_end_of_input(&self) -> bool {
        matches!(self.cause, Cause::EndOfInput)
    }

    pub fn cause(&self) -> &Cause {
        &self.cause
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.source {
            Some(bx) => Some(bx.as_ref()),
            None => None,
        }
    }
}

/// Every IO error-- including a clean `UnexpectedEof`-- becomes
/// `Cause::Other` here. `Cause::EndOfInput` is not synthesized by this
/// blanket conversion: it is only ever produced at the specific "header"
/// read sites (`codec::decode_record`'s leading field count and each
/// field's index/tag pair) that the wire format's error semantics carve
/// out as legitimate places to detect a clean end of stream. An
/// `UnexpectedEof` anywhere else-- partway through a string, an array, a
/// nested `Externalizable`-- is a truncated/corrupt record, not a clean
/// stop, and must reach the caller as a decode failure.
impl std::convert::From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::wrap(Cause::Other, err)
    }
}

impl std::convert::From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Self {
        let _ = err;
        Error::new(Cause::BadUtf)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
