//! Tokenizing PDP-1 assembly lines.
//!
//! This module holds the tokens that characterize the assembly dialect
//! ([`Token`]). The [line classifier](crate::parse) pulls these tokens off
//! a single source line and groups them into whitespace-free fields.
//!
//! The token set is deliberately loose: mnemonics, labels, macro names, and
//! numeric label references all lex as [`Token::Word`], and it is the
//! classifier (or the encoder, for operands) that decides what a word means
//! in context.

use logos::{Lexer, Logos};

/// A unit of information in PDP-1 source code.
#[derive(Debug, Logos, PartialEq, Eq, Clone)]
#[logos(skip r"[ \t\r]+", error = LexErr)]
pub enum Token {
    /// An immediate operand with the `#` prefix (e.g. `#5`, `#-12`).
    #[regex(r"#-?\d+", lex_imm)]
    Imm(i32),

    /// A bare negative integer literal, as accepted by `.fill`.
    #[regex(r"-\d+", lex_signed)]
    Signed(i32),

    /// An alphanumeric word.
    ///
    /// This can refer to a mnemonic, a label, a macro name, a numeric label
    /// reference (`12f`), or a skip condition code, depending on position.
    #[regex(r"[A-Za-z0-9]+", |lx| lx.slice().to_string())]
    Word(String),

    /// A directive (e.g. `.fill`, `.macro`), including the bare comment
    /// marker `.`.
    #[regex(r"\.[a-z]*", |lx| lx.slice().to_string())]
    Directive(String),

    /// A colon, which attaches a label to a line.
    #[token(":")]
    Colon,

    /// An ampersand, which marks an operand as indirect.
    #[token("&")]
    Amp,

    /// A pipe, which joins skip condition codes (e.g. `za|pa`).
    #[token("|")]
    Pipe,
}

fn lex_imm(lx: &mut Lexer<'_, Token>) -> Result<i32, LexErr> {
    lx.slice()[1..].parse().map_err(|_| LexErr::DoesNotFitInt)
}

fn lex_signed(lx: &mut Lexer<'_, Token>) -> Result<i32, LexErr> {
    lx.slice().parse().map_err(|_| LexErr::DoesNotFitInt)
}

/// Any errors raised in attempting to tokenize an input line.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum LexErr {
    /// Numeric literal cannot fit within the range of an i32.
    DoesNotFitInt,
    /// A symbol was used which is not allowed in this assembly dialect.
    #[default]
    InvalidSymbol,
}
impl std::fmt::Display for LexErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LexErr::DoesNotFitInt => f.write_str("numeric token is out of range"),
            LexErr::InvalidSymbol => f.write_str("unrecognized symbol"),
        }
    }
}
impl std::error::Error for LexErr {}
impl crate::err::Error for LexErr {}
