//! Utilities for writing Python-style (colon + indented) source code.

use std::io::{Result, Write};

/// Simplified utility to facilitate writing pretty-printed Python or Cython code with idiomatic
/// block indentation after colons.
pub struct PyWriter<W: Write> {
    /// How many blocks have been opened but not closed? This determines how indented new lines
    /// should be.
    open_blocks: usize,

    /// Is there a line already in progress?
    line_in_progress: bool,

    /// Has anything been written in the innermost open block?
    block_has_body: bool,

    /// Inner writer
    inner: W,
}

/// Indentation aware writer
///
/// Automatically adds indentation after newlines in the text written. Lines that are empty (or
/// start with whitespace) are written out as they are.
impl<W: Write> Write for PyWriter<W> {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        for line in buf.split_inclusive(|b| *b == b'\n') {
            if line.first().filter(|b| b.is_ascii_whitespace()).is_none() {
                self.ensure_line_indented()?;
                self.block_has_body = true;
            }
            self.inner.write_all(line)?;
            self.line_in_progress = false;
        }
        self.line_in_progress = buf.last().copied() != Some(b'\n');
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }
}

impl<W: Write> PyWriter<W> {
    pub fn new(inner: W) -> PyWriter<W> {
        PyWriter {
            open_blocks: 0,
            line_in_progress: false,
            block_has_body: false,
            inner,
        }
    }

    /// If we are on a fresh line, make sure the indent is present
    fn ensure_line_indented(&mut self) -> Result<()> {
        if !self.line_in_progress {
            for _ in 0..self.open_blocks {
                self.inner.write_all(b"    ")?;
            }
            self.line_in_progress = true;
        }
        Ok(())
    }

    /// Start a new line
    pub fn newline(&mut self) -> Result<()> {
        self.inner.write_all(b"\n")?;
        self.line_in_progress = false;
        Ok(())
    }

    /// Open a new indented block
    ///
    /// If we were mid line, this tacks a `:` on to the current line then opens a new line.
    pub fn open_block(&mut self) -> Result<()> {
        if self.line_in_progress {
            writeln!(self, ":")?;
        }
        self.open_blocks += 1;
        self.block_has_body = false;
        Ok(())
    }

    /// Close an indented block
    ///
    /// A block nothing was written in gets a `pass`, so the output stays valid.
    pub fn close_block(&mut self) -> Result<()> {
        assert!(self.open_blocks > 0, "no blocks to close");
        if self.line_in_progress {
            self.newline()?;
        }
        if !self.block_has_body {
            writeln!(self, "pass")?;
        }
        self.open_blocks -= 1;
        self.block_has_body = true;
        Ok(())
    }

    /// Write a line, then open a block under it
    pub fn block_header(&mut self, header: impl AsRef<str>) -> Result<()> {
        write!(self, "{}", header.as_ref())?;
        self.open_block()
    }

    /// Close the writer
    pub fn close(mut self) -> Result<()> {
        assert_eq!(self.open_blocks, 0, "un-closed blocks remain");
        self.inner.flush()?;
        Ok(())
    }
}
