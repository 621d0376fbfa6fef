//! Macro collection and line expansion (assembler passes 1 and 2).
//!
//! Macros are textual: `.macro NAME PARAMS` ... `.endmacro` captures its
//! body lines verbatim, and an invocation splices the body back in with
//! each parameter replaced, wherever it occurs as a whole alphanumeric
//! token, by the corresponding argument. Expansion is single-pass; a macro
//! invoked from another macro's body is not expanded further.
//!
//! The expander also resolves the simple directives: comment lines and
//! definition regions are dropped, `.space K` becomes K zero fills, and
//! `.fill` passes through untouched for the encoder.

use std::collections::HashMap;

use tracing::warn;

use crate::ast::Line;
use crate::parse;

use super::{AsmErr, AsmErrKind};

/// A single macro definition.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct MacroDef {
    /// The parameter names, in declaration order.
    pub params: Vec<String>,
    /// The body lines, verbatim.
    pub body: Vec<String>,
}

/// The macro table built by pass 1.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct MacroTable {
    defs: HashMap<String, MacroDef>,
}

impl MacroTable {
    /// Scans the raw line stream for macro definitions.
    ///
    /// Redefining a name silently overwrites the previous definition
    /// (last one wins). A definition left unterminated at end of input
    /// contributes nothing. Scanning never fails; malformed lines are left
    /// for the later passes to report.
    pub fn scan(lines: &[&str]) -> Self {
        let mut defs = HashMap::new();
        let mut current: Option<(String, MacroDef)> = None;

        for line in lines {
            match current.take() {
                Some((name, mut def)) => {
                    if is_endmacro(line) {
                        defs.insert(name, def);
                    } else {
                        def.body.push(line.to_string());
                        current = Some((name, def));
                    }
                }
                None => {
                    if let Some((name, params)) = parse_macro_begin(line) {
                        current = Some((name, MacroDef { params, body: Vec::new() }));
                    }
                }
            }
        }
        defs.into()
    }

    /// Looks up a definition by name.
    pub fn get(&self, name: &str) -> Option<&MacroDef> {
        self.defs.get(name)
    }

    /// The number of definitions.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Whether the table has no definitions.
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}
impl From<HashMap<String, MacroDef>> for MacroTable {
    fn from(defs: HashMap<String, MacroDef>) -> Self {
        MacroTable { defs }
    }
}

/// Expands the raw line stream into the flat stream the labeling and
/// encoding passes consume.
pub fn expand_lines(lines: &[&str], macros: &MacroTable) -> Result<Vec<String>, AsmErr> {
    let mut out: Vec<String> = Vec::new();
    let mut in_macro = false;

    for line in lines {
        if in_macro {
            if is_endmacro(line) {
                in_macro = false;
            }
            continue;
        }
        if parse_macro_begin(line).is_some() {
            in_macro = true;
            continue;
        }

        let position = out.len();
        match parse::classify(line, position)? {
            Line::Instr(instr) => {
                // an instruction-shaped mnemonic can still name a macro;
                // its lone operand becomes the lone argument
                if let Some(def) = macros.get(&instr.opcode) {
                    let args: Vec<String> = instr.operand.into_iter().collect();
                    splice(&instr.opcode, def, &args, position, &mut out)?;
                } else {
                    out.push(line.to_string());
                }
            }
            Line::Directive(dir) => match dir.directive.as_str() {
                "." => {}
                ".fill" => out.push(line.to_string()),
                ".space" => {
                    let count = space_count(&dir.operands)
                        .ok_or_else(|| AsmErr::new(AsmErrKind::InvalidDirectiveOperands(".space".to_string()), position))?;
                    for _ in 0..count {
                        out.push(" .fill 0".to_string());
                    }
                }
                other => {
                    warn!(directive = other, "dropping unrecognized directive");
                }
            },
            Line::MacroCall(call) => {
                let def = macros.get(&call.name).ok_or_else(|| {
                    AsmErr::new(AsmErrKind::UndefinedMacro(call.name.clone()), position)
                })?;
                splice(&call.name, def, &call.operands, position, &mut out)?;
            }
        }
    }
    Ok(out)
}

/// Validates the `.space` operand list: exactly one non-negative count.
fn space_count(operands: &[String]) -> Option<usize> {
    match operands {
        [op] => op.parse::<i32>().ok().and_then(|k| usize::try_from(k).ok()),
        _ => None,
    }
}

/// Splices a macro body into the output with arguments substituted.
fn splice(
    name: &str,
    def: &MacroDef,
    args: &[String],
    position: usize,
    out: &mut Vec<String>,
) -> Result<(), AsmErr> {
    // extra arguments are ignored, missing ones are not
    if args.len() < def.params.len() {
        return Err(AsmErr::new(AsmErrKind::MacroArity(name.to_string()), position));
    }
    for body_line in &def.body {
        let mut expanded = body_line.clone();
        for (param, arg) in def.params.iter().zip(args) {
            expanded = replace_token(&expanded, param, arg);
        }
        out.push(expanded);
    }
    Ok(())
}

/// Replaces every occurrence of `param` as a whole alphanumeric token.
fn replace_token(text: &str, param: &str, arg: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run = String::new();
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            run.push(c);
        } else {
            if !run.is_empty() {
                out.push_str(if run == param { arg } else { &run });
                run.clear();
            }
            out.push(c);
        }
    }
    if !run.is_empty() {
        out.push_str(if run == param { arg } else { &run });
    }
    out
}

/// Whether a line closes a macro definition.
fn is_endmacro(line: &str) -> bool {
    line.trim() == ".endmacro"
}

/// Parses a line as a macro definition opener, returning its name and
/// parameters.
///
/// The name and every parameter must be alphanumeric words; anything else
/// is not treated as an opener and falls through the normal expander path.
fn parse_macro_begin(line: &str) -> Option<(String, Vec<String>)> {
    let Ok(Line::Directive(dir)) = parse::classify(line, 0) else { return None };
    if dir.directive != ".macro" {
        return None;
    }
    let (name, params) = dir.operands.split_first()?;
    let word = |s: &String| !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric());
    if !word(name) || !params.iter().all(word) {
        return None;
    }
    Some((name.clone(), params.to_vec()))
}
