use cesu8conv::{DiagnosticSink, Resolution, Trace, Warning};

/// Prints warnings (unless `-s`) and the `-v` code point trace to stderr.
pub struct StderrSink {
    warnings: bool,
    trace: bool,
}

impl StderrSink {
    pub fn new(warnings: bool, trace: bool) -> Self {
        StderrSink { warnings, trace }
    }
}

pub fn format_warning(warning: &Warning) -> String {
    let action = match (warning.resolution(), warning) {
        (Resolution::Replaced, _) => "Converted to '?'",
        (Resolution::LeftUnchanged, Warning::InvalidSequence { .. }) => "Left unchanged",
        (Resolution::LeftUnchanged, _) => "Left unchanged (see -f)",
    };
    format!("cesu8: Warning: {warning}! {action}")
}

impl DiagnosticSink for StderrSink {
    fn warning(&mut self, warning: Warning) {
        if self.warnings {
            eprintln!("{}", format_warning(&warning));
        }
    }

    fn trace(&mut self, trace: Trace) {
        if self.trace {
            eprintln!("{trace}");
        }
    }
}
