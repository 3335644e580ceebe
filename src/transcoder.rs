//! The chunked streaming engine.
//!
//! Input is pulled into a fixed size read buffer. The scanner looks for lead bytes, copies the
//! bytes in between verbatim, and rewrites recognized sequences:
//!
//! - CESU-8 to UTF-8 shrinks every pair from six bytes to four, so output is written back into
//!   the read buffer itself. The write cursor never overtakes the read cursor.
//! - UTF-8 to CESU-8 grows every sequence from four bytes to six, so output goes to a separate
//!   buffer one and a half times the size of the read buffer.
//!
//! A sequence cut by the end of the buffer is left in place and shifted to the front by the next
//! refill, so chunk boundaries never change the output.

use crate::diagnostics::{
    DiagnosticSink, LeadEncoding, Resolution, SurrogateHalf, Trace, Warning,
};
use crate::err::{Result, TranscodeError};
use crate::patterns::{
    FOUR_LEN, PAIR_LEN, TRIPLET_LEN, find_lead4, find_lead6, is_high_triplet, is_low_triplet,
    is_standard_four, is_surrogate_pair,
};
use crate::sequence::{
    OutOfRange, contract_pair, expand_four, four_code_point, pair_code_point, triplet_code_unit,
};
use crate::settings::{Direction, TranscodeSettings};

use log::{debug, info, trace};
use std::io::{self, Read, Write};

const REPLACEMENT: &[u8] = b"?";

/// Counters collected over one transcode call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TranscodeSummary {
    pub bytes_read: u64,
    pub bytes_written: u64,
    /// Surrogate pairs contracted, or four-byte sequences expanded.
    pub sequences_converted: u64,
    /// Sequences replaced by `?`.
    pub replacements: u64,
    pub warnings: u64,
}

pub struct Transcoder<R: Read, W: Write, D: DiagnosticSink> {
    source: R,
    sink: W,
    diagnostics: D,
    direction: Direction,
    fix: bool,

    /// Read buffer. Also the write buffer when contracting.
    buf: Vec<u8>,
    /// Write buffer when expanding, empty otherwise.
    out: Vec<u8>,
    /// Valid bytes in `buf`.
    filled: usize,
    /// Bytes of `buf` already processed.
    read_cursor: usize,
    /// Bytes of converted output ready to flush.
    write_cursor: usize,
    /// Absolute input offset of `buf[0]`.
    origin: u64,
    eof: bool,

    summary: TranscodeSummary,
}

impl<R: Read, W: Write, D: DiagnosticSink> Transcoder<R, W, D> {
    pub fn new(source: R, sink: W, diagnostics: D, settings: &TranscodeSettings) -> Result<Self> {
        settings.validate()?;

        Ok(Transcoder {
            source,
            sink,
            diagnostics,
            direction: settings.get_direction(),
            fix: settings.should_fix(),
            buf: vec![0; settings.get_buffer_capacity()],
            out: vec![0; settings.output_capacity()],
            filled: 0,
            read_cursor: 0,
            write_cursor: 0,
            origin: 0,
            eof: false,
            summary: TranscodeSummary::default(),
        })
    }

    /// Transcodes the whole source into the sink.
    pub fn run(mut self) -> Result<TranscodeSummary> {
        debug!(
            "Transcoding ({}) with a {} byte buffer",
            self.direction,
            self.buf.len()
        );

        while self.refill()? {
            match self.direction {
                Direction::Contract => self.contract_chunk(),
                Direction::Expand => self.expand_chunk(),
            }
        }

        let written = self.summary.bytes_written;
        self.sink
            .flush()
            .map_err(|e| TranscodeError::write(written, e))?;

        info!(
            "Transcoded {} bytes into {} bytes ({} sequences converted, {} warnings)",
            self.summary.bytes_read,
            self.summary.bytes_written,
            self.summary.sequences_converted,
            self.summary.warnings
        );

        Ok(self.summary)
    }

    /// Flushes finished output, moves unprocessed bytes to the front of the buffer and tops it
    /// up from the source. Returns `false` once there is nothing left to process.
    fn refill(&mut self) -> Result<bool> {
        self.flush_output()?;

        self.origin += self.read_cursor as u64;
        if self.read_cursor < self.filled {
            // Areas may overlap.
            self.buf.copy_within(self.read_cursor..self.filled, 0);
            self.filled -= self.read_cursor;
        } else {
            self.filled = 0;
        }
        self.read_cursor = 0;
        self.write_cursor = 0;

        while !self.eof && self.filled < self.buf.len() {
            match self.source.read(&mut self.buf[self.filled..]) {
                Ok(0) => self.eof = true,
                Ok(n) => {
                    self.filled += n;
                    self.summary.bytes_read += n as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(TranscodeError::read(self.origin + self.filled as u64, e));
                }
            }
        }

        debug!(
            "Loaded chunk at offset 0x{:06x}: {} bytes{}",
            self.origin,
            self.filled,
            if self.eof { " (end of input)" } else { "" }
        );

        Ok(self.filled > 0)
    }

    fn flush_output(&mut self) -> Result<()> {
        if self.write_cursor == 0 {
            return Ok(());
        }

        let pending = match self.direction {
            Direction::Contract => &self.buf[..self.write_cursor],
            Direction::Expand => &self.out[..self.write_cursor],
        };

        self.sink
            .write_all(pending)
            .map_err(|e| TranscodeError::write(self.summary.bytes_written, e))?;
        self.summary.bytes_written += self.write_cursor as u64;

        Ok(())
    }

    /// CESU-8 to UTF-8, rewriting `buf` in place.
    fn contract_chunk(&mut self) {
        if self.filled < TRIPLET_LEN {
            self.pass_through(self.filled);
            return;
        }

        while self.read_cursor < self.filled {
            let lead = find_lead6(&self.buf[..self.filled], self.read_cursor);
            self.pass_through(lead);

            if lead == self.filled {
                break;
            }

            // More bytes may complete the pair, wait for them.
            if lead + PAIR_LEN > self.filled && !self.eof {
                return;
            }

            let window = &self.buf[..self.filled];
            if is_surrogate_pair(window, lead) {
                let pair = self.window::<PAIR_LEN>();
                let code_point = pair_code_point(&pair);
                self.trace_conversion(code_point);
                self.read_cursor += PAIR_LEN;
                self.put(&contract_pair(&pair));
            } else if is_high_triplet(window, lead) {
                self.unpaired_surrogate(SurrogateHalf::High);
            } else if is_low_triplet(window, lead) {
                self.unpaired_surrogate(SurrogateHalf::Low);
            } else {
                let offset = self.offset();
                self.diagnostics.trace(Trace::NotSurrogate { offset });
                self.pass_through(lead + 1);
            }
        }
    }

    /// UTF-8 to CESU-8, writing into `out`.
    fn expand_chunk(&mut self) {
        if self.filled < FOUR_LEN {
            self.pass_through(self.filled);
            return;
        }

        while self.read_cursor < self.filled {
            let lead = find_lead4(&self.buf[..self.filled], self.read_cursor);
            self.pass_through(lead);

            if lead == self.filled {
                break;
            }

            // Partial sequence at the tail. At end of input the next refill leaves fewer than
            // four bytes, which pass through verbatim.
            if lead + FOUR_LEN > self.filled {
                return;
            }

            if is_standard_four(&self.buf[..self.filled], lead) {
                let seq = self.window::<FOUR_LEN>();
                match expand_four(&seq) {
                    Ok(pair) => {
                        self.trace_conversion(four_code_point(&seq));
                        self.read_cursor += FOUR_LEN;
                        self.put(&pair);
                    }
                    Err(OutOfRange { code_point }) => self.invalid_code_point(code_point),
                }
            } else {
                self.trace_malformed();
                self.warn(Warning::InvalidSequence {
                    offset: self.offset(),
                });
                self.pass_through(lead + 1);
            }
        }
    }

    fn unpaired_surrogate(&mut self, half: SurrogateHalf) {
        self.trace_malformed();
        let triplet = self.window::<TRIPLET_LEN>();
        self.warn(Warning::UnpairedSurrogate {
            offset: self.offset(),
            half,
            code_unit: triplet_code_unit(&triplet),
            resolution: Resolution::from_fix(self.fix),
        });

        if self.fix {
            self.read_cursor += TRIPLET_LEN;
            self.replace();
        } else {
            self.pass_through(self.read_cursor + TRIPLET_LEN);
        }
    }

    fn invalid_code_point(&mut self, code_point: u32) {
        self.trace_malformed();
        self.warn(Warning::InvalidCodePoint {
            offset: self.offset(),
            code_point,
            resolution: Resolution::from_fix(self.fix),
        });

        if self.fix {
            self.read_cursor += FOUR_LEN;
            self.replace();
        } else {
            // The continuation bytes that follow can never be taken for a lead byte,
            // so they pass through on the next scan.
            self.pass_through(self.read_cursor + 1);
        }
    }

    /// Copies `buf[read_cursor..target]` to the write buffer unchanged.
    fn pass_through(&mut self, target: usize) {
        debug_assert!(self.read_cursor <= target && target <= self.filled);

        let len = target - self.read_cursor;
        if len == 0 {
            return;
        }

        match self.direction {
            Direction::Contract => {
                debug_assert!(self.write_cursor <= self.read_cursor);
                if self.write_cursor != self.read_cursor {
                    self.buf
                        .copy_within(self.read_cursor..target, self.write_cursor);
                }
            }
            Direction::Expand => {
                self.out[self.write_cursor..self.write_cursor + len]
                    .copy_from_slice(&self.buf[self.read_cursor..target]);
            }
        }

        self.read_cursor = target;
        self.write_cursor += len;
    }

    /// Appends converted bytes. Callers advance `read_cursor` past the consumed input first,
    /// which keeps the in-place write behind the read head.
    fn put(&mut self, bytes: &[u8]) {
        let end = self.write_cursor + bytes.len();
        match self.direction {
            Direction::Contract => {
                debug_assert!(end <= self.read_cursor);
                self.buf[self.write_cursor..end].copy_from_slice(bytes);
            }
            Direction::Expand => self.out[self.write_cursor..end].copy_from_slice(bytes),
        }
        self.write_cursor = end;
    }

    fn replace(&mut self) {
        self.put(REPLACEMENT);
        self.summary.replacements += 1;
    }

    fn warn(&mut self, warning: Warning) {
        self.summary.warnings += 1;
        self.diagnostics.warning(warning);
    }

    fn trace_conversion(&mut self, code_point: u32) {
        let offset = self.offset();
        trace!("Offset 0x{offset:06x}: converting U+{code_point:04X}");
        let lead = self.lead_encoding();
        self.diagnostics.trace(Trace::Converted {
            offset,
            lead,
            code_point,
        });
        self.summary.sequences_converted += 1;
    }

    fn trace_malformed(&mut self) {
        let offset = self.offset();
        let lead = self.lead_encoding();
        self.diagnostics.trace(Trace::Malformed { offset, lead });
    }

    fn lead_encoding(&self) -> LeadEncoding {
        match self.direction {
            Direction::Contract => LeadEncoding::Cesu8,
            Direction::Expand => LeadEncoding::Utf8,
        }
    }

    /// The `N` bytes at the read cursor. Callers have checked they are in the buffer.
    fn window<const N: usize>(&self) -> [u8; N] {
        std::array::from_fn(|i| self.buf[self.read_cursor + i])
    }

    /// Absolute input offset of the read cursor.
    fn offset(&self) -> u64 {
        self.origin + self.read_cursor as u64
    }
}

/// Transcodes everything `source` yields into `sink`.
///
/// I/O errors abort the call. Malformed input never does: it is reported to `diagnostics`
/// and either copied through or replaced by `?`, depending on [`TranscodeSettings::fix`].
pub fn transcode<R: Read, W: Write, D: DiagnosticSink>(
    source: R,
    sink: W,
    settings: &TranscodeSettings,
    diagnostics: D,
) -> Result<TranscodeSummary> {
    Transcoder::new(source, sink, diagnostics, settings)?.run()
}

/// Output of [`transcode_bytes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcoded {
    pub output: Vec<u8>,
    pub warnings: Vec<Warning>,
    pub summary: TranscodeSummary,
}

/// In-memory convenience over [`transcode`].
pub fn transcode_bytes(input: &[u8], settings: &TranscodeSettings) -> Result<Transcoded> {
    let mut output = Vec::with_capacity(input.len() + input.len() / 2);
    let mut warnings = Vec::new();
    let summary = transcode(input, &mut output, settings, &mut warnings)?;

    Ok(Transcoded {
        output,
        warnings,
        summary,
    })
}
