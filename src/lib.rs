//! Streaming conversion between CESU-8 and UTF-8.
//!
//! CESU-8 spells characters above `U+FFFF` as two three-byte surrogate halves (six bytes),
//! UTF-8 spells them as a single four-byte sequence. Everything at or below `U+FFFF` is
//! byte-identical in both, so conversion only rewrites those sequences and copies the
//! rest of the input verbatim. Input is never validated beyond that.
//!
//! ```
//! use cesu8conv::{Direction, TranscodeSettings, transcode_bytes};
//!
//! let cesu8 = [0xED, 0xA0, 0xBD, 0xED, 0xB8, 0x80];
//! let utf8 = transcode_bytes(&cesu8, &TranscodeSettings::new()).unwrap();
//! assert_eq!(utf8.output, "\u{1F600}".as_bytes());
//!
//! let settings = TranscodeSettings::new().direction(Direction::Expand);
//! let back = transcode_bytes(&utf8.output, &settings).unwrap();
//! assert_eq!(back.output, cesu8);
//! ```

#![deny(unused_must_use)]
#![forbid(unsafe_code)]

pub mod diagnostics;
pub mod err;
pub mod patterns;
pub mod sequence;
mod settings;
mod transcoder;

pub use diagnostics::{
    DiagnosticSink, LeadEncoding, LogSink, NullSink, Resolution, SurrogateHalf, Trace, Warning,
};
pub use err::{Result, TranscodeError};
pub use settings::{
    DEFAULT_BUFFER_CAPACITY, Direction, MAX_BUFFER_CAPACITY, MIN_BUFFER_CAPACITY,
    TranscodeSettings,
};
pub use transcoder::{TranscodeSummary, Transcoded, Transcoder, transcode, transcode_bytes};

#[cfg(test)]
use std::sync::Once;

#[cfg(test)]
static LOGGER_INIT: Once = Once::new();

// Rust runs the tests concurrently, so unless we synchronize logging access
// it will crash when attempting to run `cargo test` with some logging facilities.
#[cfg(test)]
pub fn ensure_env_logger_initialized() {
    use std::io::Write;

    LOGGER_INIT.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();
        builder
            .format(|buf, record| writeln!(buf, "[{}] - {}", record.level(), record.args()))
            .is_test(true)
            .init();
    });
}
