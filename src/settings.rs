use crate::err::{Result, TranscodeError};

use std::fmt;
use std::str::FromStr;

/// Default read buffer capacity, in bytes.
pub const DEFAULT_BUFFER_CAPACITY: usize = 4096;

/// Smallest read buffer that still leaves room to make progress past a deferred six-byte sequence.
pub const MIN_BUFFER_CAPACITY: usize = 16;

/// Largest read buffer accepted (1 GiB). Keeps the expanding output buffer size from overflowing.
pub const MAX_BUFFER_CAPACITY: usize = 1 << 30;

/// Which way bytes are rewritten. Fixed for the lifetime of a transcode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// CESU-8 to UTF-8: six-byte surrogate pairs become four-byte sequences (in place).
    #[default]
    Contract,
    /// UTF-8 to CESU-8: four-byte sequences become six-byte surrogate pairs.
    Expand,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Contract => write!(f, "c2u"),
            Direction::Expand => write!(f, "u2c"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "c2u" | "contract" => Ok(Direction::Contract),
            "u2c" | "expand" => Ok(Direction::Expand),
            other => Err(format!(
                "unknown direction `{other}`, expected one of `c2u`, `u2c`"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeSettings {
    direction: Direction,
    fix: bool,
    buffer_capacity: usize,
}

impl Default for TranscodeSettings {
    fn default() -> Self {
        TranscodeSettings {
            direction: Direction::default(),
            fix: false,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

impl TranscodeSettings {
    pub fn new() -> Self {
        TranscodeSettings::default()
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// When set, unpaired surrogates (contracting) and out of range four-byte codes (expanding)
    /// are replaced by `?` instead of being left unchanged.
    pub fn fix(mut self, fix: bool) -> Self {
        self.fix = fix;
        self
    }

    /// Sets the read buffer capacity. The expanding direction additionally allocates
    /// an output buffer of one and a half times this size.
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    pub fn get_direction(&self) -> Direction {
        self.direction
    }

    pub fn should_fix(&self) -> bool {
        self.fix
    }

    pub fn get_buffer_capacity(&self) -> usize {
        self.buffer_capacity
    }

    /// Size of the output buffer needed for one chunk in the configured direction.
    pub(crate) fn output_capacity(&self) -> usize {
        match self.direction {
            Direction::Contract => 0,
            Direction::Expand => self.buffer_capacity + self.buffer_capacity / 2,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !(MIN_BUFFER_CAPACITY..=MAX_BUFFER_CAPACITY).contains(&self.buffer_capacity) {
            return Err(TranscodeError::InvalidBufferCapacity {
                capacity: self.buffer_capacity,
                minimum: MIN_BUFFER_CAPACITY,
                maximum: MAX_BUFFER_CAPACITY,
            });
        }
        Ok(())
    }
}
