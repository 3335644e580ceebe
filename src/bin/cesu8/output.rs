//! The current `-o` target. Each `-o` closes the previous file before opening the next one.

use anyhow::{Context, Result, bail};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

enum Target {
    Stdout(io::Stdout),
    File(BufWriter<File>),
}

pub struct Output {
    name: String,
    target: Target,
}

impl Output {
    pub fn stdout() -> Self {
        Output {
            name: "-".to_owned(),
            target: Target::Stdout(io::stdout()),
        }
    }

    /// Opens `path` for writing, `-` meaning stdout.
    /// Parent directories are created as needed, directories are never overwritten.
    pub fn create(path: &str) -> Result<Self> {
        if path == "-" {
            return Ok(Output::stdout());
        }

        let p = Path::new(path);
        if p.is_dir() {
            bail!("There is a directory at {}, refusing to overwrite", p.display());
        }

        if let Some(parent) = p.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create parent directory `{}`", parent.display())
                })?;
            }
        }

        let file = File::create(p)
            .with_context(|| format!("failed to create output file `{}`", p.display()))?;

        Ok(Output {
            name: path.to_owned(),
            target: Target::File(BufWriter::new(file)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_stdout(&self) -> bool {
        matches!(self.target, Target::Stdout(_))
    }

    /// How write failures refer to this output.
    pub fn describe(&self) -> &str {
        if self.is_stdout() {
            "all text"
        } else {
            &self.name
        }
    }

    /// Flushes and closes the output. Closing stdout only flushes it.
    pub fn close(self) -> io::Result<()> {
        match self.target {
            Target::Stdout(mut stdout) => stdout.flush(),
            Target::File(writer) => writer.into_inner().map(drop).map_err(|e| e.into_error()),
        }
    }
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.target {
            Target::Stdout(stdout) => stdout.write(buf),
            Target::File(file) => file.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.target {
            Target::Stdout(stdout) => stdout.flush(),
            Target::File(file) => file.flush(),
        }
    }
}
