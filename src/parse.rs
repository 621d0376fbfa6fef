//! Classifying a line of source code into a [`Line`] record.
//!
//! A line is, after an optional `label: ` prefix, one of:
//! - an *instruction*: a 3-4 letter lowercase mnemonic and at most one
//!   operand, optionally marked indirect with `&` (e.g. `loop: lac &buf`),
//! - a *directive*: a `.`-prefixed name and any operands (e.g. `.fill 0`),
//! - a *macro invocation*: any other alphanumeric name and its arguments
//!   (e.g. `INC counter`).
//!
//! Anything else fails with [`ParseErr`]. Classification is attempted in
//! the order above, so `add x y` (too many operands for an instruction)
//! classifies as an invocation of a macro named `add`.
//!
//! The grammar lives in the compile-time token definitions of [`lex`];
//! no tables are built at call time.

pub mod lex;

use std::borrow::Cow;
use std::ops::Range;

use logos::Logos;

use crate::ast::{DirectiveLine, InstrLine, Line, MacroCall};
use lex::{LexErr, Token};

/// Classifies one source line.
///
/// `position` is the line's index in the stream it came from; it is stored
/// on the resulting record and used for label registration and diagnostics.
///
/// # Example
/// ```
/// use pdp1_toolchain::parse::classify;
/// use pdp1_toolchain::ast::Line;
///
/// let line = classify("loop: lac &buf", 3).unwrap();
/// let Line::Instr(instr) = line else { panic!("expected instruction") };
/// assert_eq!(instr.label.as_deref(), Some("loop"));
/// assert_eq!(instr.opcode, "lac");
/// assert!(instr.indirect);
/// assert_eq!(instr.operand.as_deref(), Some("buf"));
/// ```
pub fn classify(line: &str, position: usize) -> Result<Line, ParseErr> {
    let mut fields = Fields::new(line);
    let fail = |cause: Option<LexErr>| ParseErr::new(line, position, cause);

    let first = match fields.next_field() {
        Ok(Some(field)) => field,
        Ok(None) => return Err(fail(None)),
        Err(e) => return Err(fail(Some(e))),
    };

    // an optional label is a whole `name:` field followed by whitespace
    let (label, head) = if let [Token::Word(name), Token::Colon] = &first.tokens[..] {
        let head = match fields.next_field() {
            Ok(Some(field)) => field,
            Ok(None) => return Err(fail(None)),
            Err(e) => return Err(fail(Some(e))),
        };
        (Some(name.clone()), head)
    } else {
        (None, first)
    };

    match &head.tokens[..] {
        [Token::Directive(directive)] => {
            // the bare marker introduces a comment; the rest of the line is
            // arbitrary text and must not be tokenized
            if directive == "." {
                return Ok(Line::Directive(DirectiveLine {
                    label,
                    directive: ".".to_string(),
                    operands: Vec::new(),
                    line: position,
                }));
            }
            let mut operands = Vec::new();
            loop {
                match fields.next_field() {
                    Ok(Some(field)) => operands.push(field.text.to_string()),
                    Ok(None) => break,
                    Err(e) => return Err(fail(Some(e))),
                }
            }
            Ok(Line::Directive(DirectiveLine {
                label,
                directive: directive.clone(),
                operands,
                line: position,
            }))
        }
        [Token::Word(name)] => {
            let mut op_fields = Vec::new();
            loop {
                match fields.next_field() {
                    Ok(Some(field)) => op_fields.push(field),
                    Ok(None) => break,
                    Err(e) => return Err(fail(Some(e))),
                }
            }

            if is_mnemonic(name) && op_fields.len() <= 1 {
                let (indirect, operand) = match op_fields.first() {
                    None => (false, None),
                    Some(field) => match field.tokens.first() {
                        Some(Token::Amp) => (true, Some(field.text[1..].to_string())),
                        _ => (false, Some(field.text.to_string())),
                    },
                };
                Ok(Line::Instr(InstrLine {
                    label,
                    opcode: name.clone(),
                    indirect,
                    operand,
                    line: position,
                }))
            } else {
                Ok(Line::MacroCall(MacroCall {
                    label,
                    name: name.clone(),
                    operands: op_fields.iter().map(|f| f.text.to_string()).collect(),
                    line: position,
                }))
            }
        }
        _ => Err(fail(None)),
    }
}

/// Whether a word has the shape of an instruction mnemonic
/// (3-4 lowercase letters).
fn is_mnemonic(word: &str) -> bool {
    (3..=4).contains(&word.len()) && word.bytes().all(|b| b.is_ascii_lowercase())
}

/// A maximal whitespace-free run of tokens, with its source text.
struct Field<'s> {
    tokens: Vec<Token>,
    text: &'s str,
}

struct Fields<'s> {
    line: &'s str,
    lexer: std::iter::Peekable<logos::SpannedIter<'s, Token>>,
}
impl<'s> Fields<'s> {
    fn new(line: &'s str) -> Self {
        Fields { line, lexer: Token::lexer(line).spanned().peekable() }
    }

    /// Pulls the next field off the line.
    ///
    /// A lex error separated from the current field by whitespace is left
    /// in place, so a caller that stops asking for fields (the comment
    /// case) never observes it.
    fn next_field(&mut self) -> Result<Option<Field<'s>>, LexErr> {
        let (mut tokens, mut span): (Vec<Token>, Range<usize>) = match self.lexer.next() {
            None => return Ok(None),
            Some((Err(e), _)) => return Err(e),
            Some((Ok(token), span)) => (vec![token], span),
        };
        loop {
            match self.lexer.peek() {
                Some((Ok(_), next)) if next.start == span.end => {
                    if let Some((Ok(token), next)) = self.lexer.next() {
                        tokens.push(token);
                        span.end = next.end;
                    }
                }
                Some((Err(e), next)) if next.start == span.end => return Err(*e),
                _ => break,
            }
        }
        Ok(Some(Field { tokens, text: &self.line[span] }))
    }
}

/// An error from classifying a source line.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ParseErr {
    text: String,
    position: usize,
    cause: Option<LexErr>,
}
impl ParseErr {
    fn new(line: &str, position: usize, cause: Option<LexErr>) -> Self {
        ParseErr { text: line.to_string(), position, cause }
    }

    /// The offending line, verbatim.
    pub fn text(&self) -> &str {
        &self.text
    }
}
impl std::fmt::Display for ParseErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "could not parse line: {}", self.text)
    }
}
impl std::error::Error for ParseErr {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.cause {
            Some(e) => Some(e),
            None => None,
        }
    }
}
impl crate::err::Error for ParseErr {
    fn line(&self) -> Option<usize> {
        Some(self.position)
    }

    fn help(&self) -> Option<Cow<str>> {
        Some("a line is an instruction, a directive, or a macro invocation, optionally preceded by `label: `".into())
    }
}

#[cfg(test)]
mod tests {
    use super::classify;
    use crate::ast::{DirectiveLine, InstrLine, Line, MacroCall};

    #[test]
    fn classify_plain_instruction() {
        assert_eq!(classify(" hlt", 0), Ok(Line::Instr(InstrLine {
            label: None,
            opcode: "hlt".to_string(),
            indirect: false,
            operand: None,
            line: 0,
        })));
    }

    #[test]
    fn classify_labeled_indirect_instruction() {
        assert_eq!(classify("loop: lac &buf", 3), Ok(Line::Instr(InstrLine {
            label: Some("loop".to_string()),
            opcode: "lac".to_string(),
            indirect: true,
            operand: Some("buf".to_string()),
            line: 3,
        })));
    }

    #[test]
    fn classify_immediate_operand() {
        assert_eq!(classify("law #-5", 1), Ok(Line::Instr(InstrLine {
            label: None,
            opcode: "law".to_string(),
            indirect: false,
            operand: Some("#-5".to_string()),
            line: 1,
        })));
    }

    #[test]
    fn classify_condition_list_as_one_operand() {
        let line = classify("skp za|pa|ma", 0).unwrap();
        let Line::Instr(instr) = line else { panic!("expected instruction") };
        assert_eq!(instr.operand.as_deref(), Some("za|pa|ma"));
    }

    #[test]
    fn classify_directive() {
        assert_eq!(classify("buf: .fill 42", 7), Ok(Line::Directive(DirectiveLine {
            label: Some("buf".to_string()),
            directive: ".fill".to_string(),
            operands: vec!["42".to_string()],
            line: 7,
        })));
    }

    #[test]
    fn classify_macro_definition_header() {
        assert_eq!(classify(".macro INC X", 0), Ok(Line::Directive(DirectiveLine {
            label: None,
            directive: ".macro".to_string(),
            operands: vec!["INC".to_string(), "X".to_string()],
            line: 0,
        })));
    }

    #[test]
    fn classify_comment_ignores_arbitrary_text() {
        let line = classify(". anything goes here!!! (even this)", 0).unwrap();
        let Line::Directive(dir) = line else { panic!("expected directive") };
        assert_eq!(dir.directive, ".");
    }

    #[test]
    fn classify_macro_invocation() {
        assert_eq!(classify("INC counter", 2), Ok(Line::MacroCall(MacroCall {
            label: None,
            name: "INC".to_string(),
            operands: vec!["counter".to_string()],
            line: 2,
        })));
    }

    #[test]
    fn classify_overloaded_mnemonic_with_two_operands_is_an_invocation() {
        let line = classify("add x y", 0).unwrap();
        let Line::MacroCall(call) = line else { panic!("expected macro call") };
        assert_eq!(call.name, "add");
        assert_eq!(call.operands, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn classify_numeric_label() {
        let line = classify("5: dac buf", 9).unwrap();
        assert_eq!(line.label(), Some("5"));
    }

    #[test]
    fn classify_rejects_garbage() {
        assert!(classify("???", 0).is_err());
        assert!(classify("", 0).is_err());
        assert!(classify("   ", 0).is_err());
    }

    #[test]
    fn classify_rejects_label_without_statement() {
        assert!(classify("foo:", 0).is_err());
    }

    #[test]
    fn classify_rejects_label_glued_to_statement() {
        assert!(classify("foo:hlt", 0).is_err());
    }
}
