//! Assembling assembly source into machine words.
//!
//! This module is used to convert source text into a word image
//! that can be executed by the simulator or punched to tape.
//!
//! The assembler module notably consists of:
//! - [`assemble`]: the main function, which runs the full pass pipeline
//! - [`LabelTable`]: a struct holding label positions after the labeling pass
//! - [`Assembly`]: the output image, with the expanded listing retained for
//!   tape annotations
//!
//! Assembly is four passes over the line stream:
//! 1. macro definitions are collected ([`expand::MacroTable::scan`]),
//! 2. directives and macro invocations are expanded into a flat line stream
//!    ([`expand::expand_lines`]),
//! 3. labels are registered, keyed by expanded line index (each line is one
//!    word, so position and address coincide, starting from 0),
//! 4. each line is encoded into its word ([`encode`]).

pub mod encode;
pub mod expand;

use std::borrow::Cow;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tracing::debug;

use crate::ast::{Line, Word};
use crate::parse::{self, ParseErr};
use expand::MacroTable;

/// Assembles source text into a word image.
///
/// Reading stops at the first fully empty line. Code is contiguous from
/// address 0: expanded line `i` becomes the word at address `i`.
///
/// # Example
/// ```
/// use pdp1_toolchain::asm::assemble;
///
/// let assembly = assemble("lac 2f\n hlt\n2: .fill -1").unwrap();
/// assert_eq!(assembly.words()[2].to_int(), -1);
/// ```
pub fn assemble(src: &str) -> Result<Assembly, AsmErr> {
    let lines: Vec<&str> = src.lines().take_while(|line| !line.is_empty()).collect();

    let macros = MacroTable::scan(&lines);
    debug!(definitions = macros.len(), "macro scan complete");

    let expanded = expand::expand_lines(&lines, &macros)?;
    debug!(raw = lines.len(), expanded = expanded.len(), "expansion complete");

    let mut labels = LabelTable::new();
    let mut parsed = Vec::with_capacity(expanded.len());
    for (position, line) in expanded.iter().enumerate() {
        let record = parse::classify(line, position)?;
        if let Some(label) = record.label() {
            labels.add(label, position)?;
        }
        parsed.push(record);
    }

    let mut words = Vec::with_capacity(parsed.len());
    for record in &parsed {
        let word = match record {
            Line::Instr(instr) => encode::encode_instr(instr, &labels)?,
            Line::Directive(dir) => encode::encode_directive(dir, &labels)?,
            // expansion leaves no invocations behind, but an unexpanded
            // name reaching this far is an undefined macro either way
            Line::MacroCall(call) => {
                return Err(AsmErr::new(AsmErrKind::UndefinedMacro(call.name.clone()), call.line))
            }
        };
        words.push(word);
    }
    debug!(words = words.len(), "assembly complete");

    Ok(Assembly { words, listing: expanded })
}

/// The output of [`assemble`]: the word image and the expanded source
/// listing it was encoded from.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Assembly {
    words: Vec<Word>,
    listing: Vec<String>,
}
impl Assembly {
    /// The machine words, in address order from 0.
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// The expanded source lines, parallel to [`Assembly::words`].
    ///
    /// These are the lines the tape writer uses as annotations.
    pub fn listing(&self) -> &[String] {
        &self.listing
    }

    /// Iterates over words paired with their listing lines.
    pub fn iter(&self) -> impl Iterator<Item = (Word, &str)> {
        self.words.iter().copied().zip(self.listing.iter().map(String::as_str))
    }
}

/// The maximum numeric label value.
const NUMERIC_LABELS: usize = 256;

/// A table mapping labels to their positions in the expanded line stream.
///
/// Symbolic labels (1-8 characters, starting with a letter) are unique.
/// Numeric labels (0-255) are repeatable; each value keeps its positions in
/// order, and references select among them with a direction suffix:
/// `Nf` resolves to the first position after the referencing line, `Nb` to
/// the nearest position strictly before it.
#[derive(Debug, Clone)]
pub struct LabelTable {
    symbolic: HashMap<String, usize>,
    numeric: [Vec<usize>; NUMERIC_LABELS],
}

impl LabelTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        LabelTable {
            symbolic: HashMap::new(),
            numeric: std::array::from_fn(|_| Vec::new()),
        }
    }

    /// Registers a label at a position.
    pub fn add(&mut self, label: &str, position: usize) -> Result<(), AsmErr> {
        if is_symbolic(label) {
            match self.symbolic.entry(label.to_string()) {
                Entry::Occupied(_) => {
                    Err(AsmErr::new(AsmErrKind::DuplicateLabel(label.to_string()), position))
                }
                Entry::Vacant(entry) => {
                    entry.insert(position);
                    Ok(())
                }
            }
        } else if let Some(value) = numeric_value(label) {
            self.numeric[value].push(position);
            Ok(())
        } else {
            Err(AsmErr::new(AsmErrKind::InvalidLabel(label.to_string()), position))
        }
    }

    /// Resolves a label reference made from `position`.
    ///
    /// Symbolic references resolve to the label's position. Numeric
    /// references take a direction suffix: `5f` is the first `5` strictly
    /// after `position`, `5b` the nearest `5` strictly before it.
    pub fn resolve(&self, reference: &str, position: usize) -> Result<usize, AsmErr> {
        if is_symbolic(reference) {
            return self
                .symbolic
                .get(reference)
                .copied()
                .ok_or_else(|| AsmErr::new(AsmErrKind::UndefinedLabel(reference.to_string()), position));
        }

        let undefined = || AsmErr::new(AsmErrKind::UndefinedLabel(reference.to_string()), position);
        let invalid = || AsmErr::new(AsmErrKind::InvalidLabel(reference.to_string()), position);

        let (digits, direction) = match reference.char_indices().last() {
            Some((i, dir @ ('f' | 'b'))) => (&reference[..i], dir),
            _ => return Err(invalid()),
        };
        if !(1..=3).contains(&digits.len()) || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let value: usize = digits.parse().map_err(|_| invalid())?;
        let positions = self.numeric.get(value).ok_or_else(invalid)?;
        if positions.is_empty() {
            return Err(undefined());
        }

        match direction {
            'f' => positions.iter().copied().find(|&p| p > position).ok_or_else(undefined),
            _ => match positions.iter().position(|&p| p >= position) {
                // the reference precedes every definition
                Some(0) => Err(undefined()),
                Some(i) => Ok(positions[i - 1]),
                None => positions.last().copied().ok_or_else(undefined),
            },
        }
    }
}

impl Default for LabelTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a token is a well-formed symbolic label
/// (`[A-Za-z][A-Za-z0-9]{0,7}`).
fn is_symbolic(label: &str) -> bool {
    let mut bytes = label.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_alphabetic() => {}
        _ => return false,
    }
    label.len() <= 8 && bytes.all(|b| b.is_ascii_alphanumeric())
}

/// The value of a well-formed numeric label (1-3 digits, at most 255).
fn numeric_value(label: &str) -> Option<usize> {
    if !(1..=3).contains(&label.len()) || !label.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: usize = label.parse().ok()?;
    (value < NUMERIC_LABELS).then_some(value)
}

/// The kinds of errors that can result from assembling.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AsmErrKind {
    /// A line matched none of the line forms (any pass).
    LineParse(String),
    /// A label token was neither a symbolic nor a numeric label (pass 3).
    InvalidLabel(String),
    /// A symbolic label was defined more than once (pass 3).
    DuplicateLabel(String),
    /// A label reference did not resolve to a position (pass 4).
    UndefinedLabel(String),
    /// A macro was invoked without being defined (pass 2).
    UndefinedMacro(String),
    /// A directive is unknown or used where it cannot be (passes 2, 4).
    InvalidDirective(String),
    /// A directive had the wrong number or shape of operands (passes 2, 4).
    InvalidDirectiveOperands(String),
    /// A mnemonic is not part of the instruction set (pass 4).
    InvalidOpcode(String),
    /// An operand was malformed or out of range for its mnemonic (pass 4).
    InvalidOperand {
        /// The mnemonic being encoded.
        opcode: String,
        /// The offending operand, verbatim.
        operand: String,
    },
    /// A mnemonic that requires an operand was given none (pass 4).
    MissingOperand(String),
    /// A macro was invoked with fewer arguments than parameters (pass 2).
    MacroArity(String),
}
impl std::fmt::Display for AsmErrKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LineParse(text) => write!(f, "could not parse line: {text}"),
            Self::InvalidLabel(label) => write!(f, "invalid label: {label}"),
            Self::DuplicateLabel(label) => write!(f, "label was defined multiple times: {label}"),
            Self::UndefinedLabel(label) => write!(f, "label could not be resolved: {label}"),
            Self::UndefinedMacro(name) => write!(f, "macro is not defined: {name}"),
            Self::InvalidDirective(name) => write!(f, "invalid directive: {name}"),
            Self::InvalidDirectiveOperands(name) => write!(f, "invalid operands for directive {name}"),
            Self::InvalidOpcode(opcode) => write!(f, "invalid opcode: {opcode}"),
            Self::InvalidOperand { opcode, operand } => {
                write!(f, "invalid operand for {opcode}: {operand}")
            }
            Self::MissingOperand(opcode) => {
                write!(f, "{opcode} instruction missing required operand")
            }
            Self::MacroArity(name) => write!(f, "not enough arguments for macro {name}"),
        }
    }
}

/// Error from assembling given assembly code.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct AsmErr {
    /// The kind of error.
    pub kind: AsmErrKind,
    /// The expanded-stream line index associated with this error, if known.
    pub line: Option<usize>,
}
impl AsmErr {
    /// Creates a new [`AsmErr`] at a line.
    pub fn new(kind: AsmErrKind, line: usize) -> Self {
        AsmErr { kind, line: Some(line) }
    }
}
impl std::fmt::Display for AsmErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.kind.fmt(f)
    }
}
impl std::error::Error for AsmErr {}
impl From<ParseErr> for AsmErr {
    fn from(err: ParseErr) -> Self {
        AsmErr {
            line: crate::err::Error::line(&err),
            kind: AsmErrKind::LineParse(err.text().to_string()),
        }
    }
}
impl crate::err::Error for AsmErr {
    fn line(&self) -> Option<usize> {
        self.line
    }

    fn help(&self) -> Option<Cow<str>> {
        match &self.kind {
            AsmErrKind::LineParse(_) => Some("a line is an instruction, a directive, or a macro invocation, optionally preceded by `label: `".into()),
            AsmErrKind::InvalidLabel(_) => Some("symbolic labels are 1-8 characters starting with a letter; numeric labels are 0-255, referenced as `Nf` or `Nb`".into()),
            AsmErrKind::DuplicateLabel(_) => Some("symbolic labels must be unique; use numeric labels for repeatable targets".into()),
            AsmErrKind::UndefinedLabel(_) => Some("check the spelling, or the direction suffix of a numeric reference".into()),
            AsmErrKind::UndefinedMacro(_) => Some("define it with `.macro NAME PARAMS` ... `.endmacro` before the invocation".into()),
            AsmErrKind::InvalidDirective(_) => Some("the recognized directives are `.`, `.fill`, `.space`, `.macro`, and `.endmacro`".into()),
            AsmErrKind::InvalidDirectiveOperands(_) => Some("`.fill` takes exactly one value; `.space` takes a non-negative count".into()),
            AsmErrKind::InvalidOpcode(_) => None,
            AsmErrKind::InvalidOperand { .. } => None,
            AsmErrKind::MissingOperand(_) => Some("memory reference instructions take a label or a `#` immediate".into()),
            AsmErrKind::MacroArity(_) => Some("supply one argument per declared parameter".into()),
        }
    }
}
