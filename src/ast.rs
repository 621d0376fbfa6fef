//! Components shared between the assembler and the simulator:
//! the 18-bit machine word and the classified line records.
//!
//! These components together are used to construct...
//! - [`Word`] (an 18-bit one's-complement machine word),
//! - [`InstrLine`], [`DirectiveLine`], [`MacroCall`] (line records produced
//!   by the [line classifier](crate::parse)),
//! - and [`Line`] (any one of the above).

use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Not};

/// The number of bits in a machine word.
pub const WORD_BITS: u32 = 18;
/// All 18 word bits set.
pub const WORD_MASK: u32 = 0o777777;
/// The sign bit of a machine word (bit 17).
pub const SIGN_BIT: u32 = 0o400000;

/// An 18-bit one's-complement machine word.
///
/// The word is stored as its raw bit pattern, always masked to 18 bits.
/// Signed interpretation follows one's complement: a negative value is the
/// bitwise complement of its magnitude, so the all-ones pattern `0o777777`
/// is "negative zero" and decodes to 0.
///
/// # Example
/// ```
/// use pdp1_toolchain::ast::Word;
///
/// assert_eq!(Word::from_int(-5).bits(), 0o777772);
/// assert_eq!(Word::new(0o777772).to_int(), -5);
/// assert_eq!(Word::MINUS_ZERO.to_int(), 0);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Word(u32);

impl Word {
    /// Positive zero.
    pub const ZERO: Word = Word(0);
    /// The all-ones pattern, which decodes to 0.
    pub const MINUS_ZERO: Word = Word(WORD_MASK);

    /// Creates a word from a bit pattern, masking it to 18 bits.
    pub fn new(bits: u32) -> Self {
        Word(bits & WORD_MASK)
    }

    /// The raw 18-bit pattern of this word.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Encodes a signed integer as an 18-bit one's-complement word.
    ///
    /// Magnitudes beyond 17 bits are truncated.
    pub fn from_int(val: i32) -> Self {
        if val < 0 {
            Word((!val.unsigned_abs() & 0o377777) | SIGN_BIT)
        } else {
            Word(val as u32 & 0o377777)
        }
    }

    /// Decodes this word as a signed one's-complement integer.
    pub fn to_int(self) -> i32 {
        if self.0 & SIGN_BIT != 0 {
            -((!self.0 & 0o377777) as i32)
        } else {
            self.0 as i32
        }
    }

    /// Whether bit `n` (0 = least significant) is set.
    pub fn bit(self, n: u32) -> bool {
        self.0 >> n & 1 != 0
    }

    /// Whether the sign bit (bit 17) is set.
    pub fn sign(self) -> bool {
        self.bit(WORD_BITS - 1)
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Word({:06o})", self.0)
    }
}
impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06o}", self.0)
    }
}
impl BitAnd for Word {
    type Output = Word;
    fn bitand(self, rhs: Word) -> Word {
        Word(self.0 & rhs.0)
    }
}
impl BitOr for Word {
    type Output = Word;
    fn bitor(self, rhs: Word) -> Word {
        Word(self.0 | rhs.0)
    }
}
impl BitXor for Word {
    type Output = Word;
    fn bitxor(self, rhs: Word) -> Word {
        Word(self.0 ^ rhs.0)
    }
}
impl Not for Word {
    type Output = Word;
    fn not(self) -> Word {
        Word(!self.0 & WORD_MASK)
    }
}

/// An instruction line: optional label, a 3-4 letter lowercase mnemonic,
/// and at most one operand (optionally marked indirect with `&`).
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct InstrLine {
    /// The label attached to this line, if any.
    pub label: Option<String>,
    /// The mnemonic.
    pub opcode: String,
    /// Whether the operand was prefixed with `&`.
    pub indirect: bool,
    /// The operand, verbatim (e.g. `#5`, `buf`, `12f`, `za|pa`).
    pub operand: Option<String>,
    /// The position of this line in the expanded line stream.
    pub line: usize,
}

/// A directive line: optional label, a `.`-prefixed directive name, and
/// any number of operands.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct DirectiveLine {
    /// The label attached to this line, if any.
    pub label: Option<String>,
    /// The directive name, including the leading dot.
    pub directive: String,
    /// The operands, verbatim.
    pub operands: Vec<String>,
    /// The position of this line in the expanded line stream.
    pub line: usize,
}

/// A macro invocation line: optional label, an alphanumeric macro name
/// that is not an instruction mnemonic shape, and its arguments.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct MacroCall {
    /// The label attached to this line, if any.
    pub label: Option<String>,
    /// The macro name.
    pub name: String,
    /// The arguments, verbatim.
    pub operands: Vec<String>,
    /// The position of this line in the raw line stream.
    pub line: usize,
}

/// Any classified source line.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Line {
    /// An instruction line.
    Instr(InstrLine),
    /// A directive line.
    Directive(DirectiveLine),
    /// A macro invocation line.
    MacroCall(MacroCall),
}

impl Line {
    /// The label attached to this line, if any.
    pub fn label(&self) -> Option<&str> {
        match self {
            Line::Instr(line) => line.label.as_deref(),
            Line::Directive(line) => line.label.as_deref(),
            Line::MacroCall(line) => line.label.as_deref(),
        }
    }
}
