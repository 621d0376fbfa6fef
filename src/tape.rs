//! Reading and writing the ASCII punched-tape format.
//!
//! A tape is a text rendering of the paper tape a word image would be
//! punched to. It opens with the column header `  3 2 1`, and each word is
//! a block of rows 8 down to 1: rows 8 and 7 are fixed leader, and rows 6
//! through 1 carry three bit cells each (`" O"` punched, blank otherwise)
//! for bits `row-1`, `row+5`, and `row+11`. Between rows 4 and 3 sits an
//! annotation line (`------- <source line>`) showing the assembly the word
//! came from.
//!
//! ```text
//!   3 2 1
//! 8 O O O
//! 7
//! 6
//! 5     O
//! 4
//! -------  lac buf
//! 3
//! 2 O
//! 1
//! ```
//!
//! The reader is deliberately forgiving: the first malformed or missing
//! block simply ends the tape, so trailing junk is never an error. Only
//! real I/O failures surface as errors.
//!
//! # Usage
//! ```
//! use pdp1_toolchain::asm::assemble;
//! use pdp1_toolchain::tape::{TapeReader, TapeWriter};
//!
//! let assembly = assemble(" lac buf\n hlt\nbuf: .fill 42").unwrap();
//!
//! let mut out = Vec::new();
//! let mut writer = TapeWriter::new(&mut out).unwrap();
//! writer.write_assembly(&assembly).unwrap();
//!
//! let words = TapeReader::new(out.as_slice()).unwrap().read_image().unwrap();
//! assert_eq!(words, assembly.words());
//! ```

use std::io::{self, BufRead, Write};

use crate::asm::Assembly;
use crate::ast::Word;

/// Writes words out in the punched-tape format.
pub struct TapeWriter<W: Write> {
    out: W,
}

impl<W: Write> TapeWriter<W> {
    /// Creates a writer, emitting the tape header.
    pub fn new(mut out: W) -> io::Result<Self> {
        writeln!(out, "  3 2 1")?;
        Ok(TapeWriter { out })
    }

    /// Punches one word, with its annotation line.
    pub fn write_word(&mut self, word: Word, annotation: &str) -> io::Result<()> {
        writeln!(self.out, "8 O O O")?;
        writeln!(self.out, "7      ")?;
        for row in (1..=6u32).rev() {
            let cell = |bit: u32| if word.bit(bit) { " O" } else { "  " };
            writeln!(
                self.out,
                "{}{}{}{}",
                row,
                cell(row - 1),
                cell(row + 5),
                cell(row + 11)
            )?;
            if row == 4 {
                writeln!(self.out, "------- {annotation}")?;
            }
        }
        Ok(())
    }

    /// Punches a whole assembly, using its listing as annotations.
    pub fn write_assembly(&mut self, assembly: &Assembly) -> io::Result<()> {
        for (word, line) in assembly.iter() {
            self.write_word(word, line)?;
        }
        Ok(())
    }

    /// Unwraps the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Reads words back from the punched-tape format.
pub struct TapeReader<R: BufRead> {
    input: R,
}

impl<R: BufRead> TapeReader<R> {
    /// Creates a reader, consuming (and ignoring) the tape header line.
    pub fn new(mut input: R) -> io::Result<Self> {
        let mut header = String::new();
        input.read_line(&mut header)?;
        Ok(TapeReader { input })
    }

    fn next_line(&mut self) -> io::Result<Option<String>> {
        let mut buf = String::new();
        if self.input.read_line(&mut buf)? == 0 {
            return Ok(None);
        }
        while buf.ends_with('\n') || buf.ends_with('\r') {
            buf.pop();
        }
        Ok(Some(buf))
    }

    /// Reads the next word block.
    ///
    /// Returns `Ok(None)` at end of tape, including on any malformed
    /// block.
    pub fn read_word(&mut self) -> io::Result<Option<Word>> {
        let mut rows = Vec::with_capacity(8);
        for i in 0..8 {
            let Some(mut line) = self.next_line()? else { return Ok(None) };
            // the annotation sits between rows 4 and 3; step over it
            if i == 5 {
                let Some(replacement) = self.next_line()? else { return Ok(None) };
                line = replacement;
            }
            rows.push(line);
        }
        if rows[0] != "8 O O O" || rows[1] != "7      " {
            return Ok(None);
        }

        let mut bits = 0u32;
        for row in (1..=6u32).rev() {
            let line = rows[(8 - row) as usize].as_bytes();
            for (col, bit) in [(2usize, row - 1), (4, row + 5), (6, row + 11)] {
                if line.get(col) == Some(&b'O') {
                    bits |= 1 << bit;
                }
            }
        }
        Ok(Some(Word::new(bits)))
    }

    /// Reads every remaining word on the tape.
    pub fn read_image(mut self) -> io::Result<Vec<Word>> {
        let mut words = Vec::new();
        while let Some(word) = self.read_word()? {
            words.push(word);
        }
        Ok(words)
    }
}
