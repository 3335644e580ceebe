//! Non-fatal findings reported while transcoding.
//!
//! Nothing here stops a conversion. The engine hands each [`Warning`] (and, for callers that
//! want a per code point trace, each [`Trace`]) to a [`DiagnosticSink`] in ascending input
//! offset order and carries on.

use log::{trace, warn};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurrogateHalf {
    High,
    Low,
}

impl fmt::Display for SurrogateHalf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurrogateHalf::High => write!(f, "High"),
            SurrogateHalf::Low => write!(f, "Low"),
        }
    }
}

/// What the engine did with the offending bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Replaced by a single `?`.
    Replaced,
    /// Copied to the output verbatim.
    LeftUnchanged,
}

impl Resolution {
    pub(crate) fn from_fix(fix: bool) -> Self {
        if fix {
            Resolution::Replaced
        } else {
            Resolution::LeftUnchanged
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Replaced => write!(f, "Converted to '?'"),
            Resolution::LeftUnchanged => write!(f, "Left unchanged"),
        }
    }
}

/// Offsets are absolute positions in the input stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A surrogate triplet without its partner (CESU-8 to UTF-8 only).
    UnpairedSurrogate {
        offset: u64,
        half: SurrogateHalf,
        code_unit: u16,
        resolution: Resolution,
    },
    /// A four-byte sequence that is overlong or above `U+10FFFF` (UTF-8 to CESU-8 only).
    InvalidCodePoint {
        offset: u64,
        code_point: u32,
        resolution: Resolution,
    },
    /// A four-byte lead byte not followed by three continuation bytes (UTF-8 to CESU-8 only).
    InvalidSequence { offset: u64 },
}

impl Warning {
    pub fn offset(&self) -> u64 {
        match self {
            Warning::UnpairedSurrogate { offset, .. }
            | Warning::InvalidCodePoint { offset, .. }
            | Warning::InvalidSequence { offset } => *offset,
        }
    }

    pub fn resolution(&self) -> Resolution {
        match self {
            Warning::UnpairedSurrogate { resolution, .. }
            | Warning::InvalidCodePoint { resolution, .. } => *resolution,
            Warning::InvalidSequence { .. } => Resolution::LeftUnchanged,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnpairedSurrogate {
                offset,
                half,
                code_unit,
                ..
            } => write!(
                f,
                "Unpaired {half} surrogate U+{code_unit:04X} found at 0x{offset:06x}"
            ),
            Warning::InvalidCodePoint {
                offset, code_point, ..
            } => write!(
                f,
                "Invalid 4-byte U+{code_point:06X} found at 0x{offset:06x}"
            ),
            Warning::InvalidSequence { offset } => {
                write!(f, "Invalid UTF-8 sequence found at 0x{offset:06x}")
            }
        }
    }
}

/// The encoding a lead byte starts a sequence of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadEncoding {
    /// `0xED`, the first byte of a surrogate triplet.
    Cesu8,
    /// `1111 0xxx`, the first byte of a four-byte sequence.
    Utf8,
}

impl fmt::Display for LeadEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeadEncoding::Cesu8 => write!(f, "CESU-8"),
            LeadEncoding::Utf8 => write!(f, "UTF-8"),
        }
    }
}

/// Per lead byte trace, only interesting to verbose callers. Every lead byte the scanner
/// classifies produces exactly one trace, emitted before any warning about the same bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trace {
    /// A sequence starting at `offset` was rewritten.
    Converted {
        offset: u64,
        lead: LeadEncoding,
        code_point: u32,
    },
    /// An `0xED` lead byte at `offset` starts an ordinary `U+D000..U+D7FF` character or a stray byte.
    NotSurrogate { offset: u64 },
    /// The lead byte at `offset` starts a malformed sequence. A [`Warning`] follows.
    Malformed { offset: u64, lead: LeadEncoding },
}

impl Trace {
    pub fn offset(&self) -> u64 {
        match *self {
            Trace::Converted { offset, .. }
            | Trace::NotSurrogate { offset }
            | Trace::Malformed { offset, .. } => offset,
        }
    }

    pub fn lead(&self) -> LeadEncoding {
        match *self {
            Trace::Converted { lead, .. } | Trace::Malformed { lead, .. } => lead,
            Trace::NotSurrogate { .. } => LeadEncoding::Cesu8,
        }
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Lead byte found at 0x{:06x}; ",
            self.lead(),
            self.offset()
        )?;
        match *self {
            Trace::Converted { code_point, .. } => {
                write!(f, "Unicode U+{code_point:04X}")?;
                if let Some(c) = char::from_u32(code_point) {
                    write!(f, " ({c})")?;
                }
                Ok(())
            }
            Trace::NotSurrogate { .. } => write!(f, "Not a surrogate; Left unchanged"),
            Trace::Malformed { .. } => write!(f, "Malformed"),
        }
    }
}

pub trait DiagnosticSink {
    fn warning(&mut self, warning: Warning);

    fn trace(&mut self, _trace: Trace) {}
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn warning(&mut self, warning: Warning) {
        (**self).warning(warning)
    }

    fn trace(&mut self, trace: Trace) {
        (**self).trace(trace)
    }
}

/// Collects warnings, drops traces.
impl DiagnosticSink for Vec<Warning> {
    fn warning(&mut self, warning: Warning) {
        self.push(warning)
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn warning(&mut self, _warning: Warning) {}
}

/// Forwards warnings to `log::warn!` and traces to `log::trace!`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn warning(&mut self, warning: Warning) {
        warn!("{}! {}", warning, warning.resolution());
    }

    fn trace(&mut self, t: Trace) {
        trace!("{}", t);
    }
}
