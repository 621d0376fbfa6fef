//! Encoding classified lines into machine words (assembler pass 4).
//!
//! Dispatch is a single match over the canonical mnemonic table
//! ([`rule`]), which maps each mnemonic to its encoding group and fixed
//! bits. The memory reference group places its 6-bit opcode at bits 17-12
//! (with bit 12 doubling as the indirect flag); the shift group places a
//! 9-bit sub-opcode at bits 17-9; the skip and operate groups OR their
//! micro-op bits into the operand field.

use crate::ast::{DirectiveLine, InstrLine, Word};

use super::{AsmErr, AsmErrKind, LabelTable};

/// How a mnemonic maps onto instruction bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    /// Memory reference: 6-bit opcode, address operand.
    MemRef(u32),
    /// `law`: 13-bit one's complement immediate.
    Law,
    /// Shift group: 9-bit sub-opcode, unary-coded shift count.
    Shift(u32),
    /// Skip group form with fixed condition bits.
    SkipFixed(u32),
    /// `skp`/`skpn` with an explicit condition list.
    Skip { negate: bool },
    /// `szs`: sense switch selector at bits 5-3.
    SwitchTest,
    /// `szf`: program flag selector in the low bits.
    FlagTest,
    /// Operate group form with fixed micro-op bits.
    Operate(u32),
    /// `clf`: clear a program flag.
    FlagClear,
    /// `stf`: set a program flag.
    FlagSet,
}

/// The canonical mnemonic table.
fn rule(mnemonic: &str) -> Option<Rule> {
    Some(match mnemonic {
        "add" => Rule::MemRef(0o40),
        "sub" => Rule::MemRef(0o42),
        "mul" => Rule::MemRef(0o54),
        "div" => Rule::MemRef(0o56),
        "idx" => Rule::MemRef(0o44),
        "isp" => Rule::MemRef(0o46),
        "and" => Rule::MemRef(0o02),
        "xor" => Rule::MemRef(0o06),
        "ior" => Rule::MemRef(0o04),
        "lac" => Rule::MemRef(0o20),
        "dac" => Rule::MemRef(0o24),
        "dap" => Rule::MemRef(0o26),
        "dip" => Rule::MemRef(0o30),
        "lio" => Rule::MemRef(0o22),
        "dio" => Rule::MemRef(0o32),
        "dzm" => Rule::MemRef(0o34),
        "xct" => Rule::MemRef(0o10),
        "jmp" => Rule::MemRef(0o60),
        "jsp" => Rule::MemRef(0o62),
        "cal" => Rule::MemRef(0o16),
        "jda" => Rule::MemRef(0o17),
        "sad" => Rule::MemRef(0o50),
        "sas" => Rule::MemRef(0o52),

        "law" => Rule::Law,

        "rar" => Rule::Shift(0o671),
        "ral" => Rule::Shift(0o661),
        "sar" => Rule::Shift(0o675),
        "sal" => Rule::Shift(0o665),
        "rir" => Rule::Shift(0o672),
        "ril" => Rule::Shift(0o662),
        "sir" => Rule::Shift(0o676),
        "sil" => Rule::Shift(0o666),
        "rcr" => Rule::Shift(0o673),
        "rcl" => Rule::Shift(0o663),
        "scr" => Rule::Shift(0o677),
        "scl" => Rule::Shift(0o667),

        "sza" => Rule::SkipFixed(0o100),
        "spa" => Rule::SkipFixed(0o200),
        "sma" => Rule::SkipFixed(0o400),
        "szo" => Rule::SkipFixed(0o1000),
        "spi" => Rule::SkipFixed(0o2000),
        "snza" => Rule::SkipFixed(0o10100),
        "snpa" => Rule::SkipFixed(0o10200),
        "snma" => Rule::SkipFixed(0o10400),
        "snzo" => Rule::SkipFixed(0o11000),
        "snpi" => Rule::SkipFixed(0o12000),
        "skp" => Rule::Skip { negate: false },
        "skpn" => Rule::Skip { negate: true },
        "szs" => Rule::SwitchTest,
        "szf" => Rule::FlagTest,

        "cli" => Rule::Operate(0o4000),
        "lat" => Rule::Operate(0o2000),
        "lap" => Rule::Operate(0o100),
        "cma" => Rule::Operate(0o1000),
        "hlt" => Rule::Operate(0o400),
        "cla" => Rule::Operate(0o200),
        "nop" => Rule::Operate(0),
        "clf" => Rule::FlagClear,
        "stf" => Rule::FlagSet,

        _ => return None,
    })
}

/// The 6-bit skip-group opcode, positioned.
const SKIP_GROUP: u32 = 0o64 << 12;
/// The 6-bit operate-group opcode, positioned.
const OPERATE_GROUP: u32 = 0o76 << 12;
/// The indirect (or skip-negate) bit.
const INDIRECT_BIT: u32 = 0o10000;

/// Encodes an instruction line.
pub fn encode_instr(instr: &InstrLine, labels: &LabelTable) -> Result<Word, AsmErr> {
    let missing = || AsmErr::new(AsmErrKind::MissingOperand(instr.opcode.clone()), instr.line);
    let invalid = |operand: &str| {
        AsmErr::new(
            AsmErrKind::InvalidOperand { opcode: instr.opcode.clone(), operand: operand.to_string() },
            instr.line,
        )
    };

    let Some(rule) = rule(&instr.opcode) else {
        return Err(AsmErr::new(AsmErrKind::InvalidOpcode(instr.opcode.clone()), instr.line));
    };

    let bits = match rule {
        Rule::MemRef(opcode) => {
            let mut bits = opcode << 12;
            if instr.indirect {
                bits |= INDIRECT_BIT;
            }
            let operand = instr.operand.as_deref().ok_or_else(missing)?;
            match parse_immediate(operand, true) {
                Some(imm) => bits | (imm as u32 & 0o7777),
                None => {
                    let addr = labels.resolve(operand, instr.line)? as u32;
                    bits | (addr & 0o777)
                }
            }
        }
        Rule::Law => {
            let operand = instr.operand.as_deref().ok_or_else(missing)?;
            let imm = parse_immediate(operand, true).ok_or_else(|| invalid(operand))?;
            (0o70 << 12) | ones_complement(imm, 13)
        }
        Rule::Shift(sub_opcode) => {
            let operand = instr.operand.as_deref().ok_or_else(missing)?;
            let count = parse_immediate(operand, true)
                .filter(|n| (0..=12).contains(n))
                .ok_or_else(|| invalid(operand))?;
            // the shift count is unary: N low bits set
            (sub_opcode << 9) | ones_complement((1 << count) - 1, 13)
        }
        Rule::SkipFixed(cond) => SKIP_GROUP | cond,
        Rule::Skip { negate } => {
            let operand = instr.operand.as_deref().ok_or_else(missing)?;
            let mut bits = SKIP_GROUP;
            if negate {
                bits |= INDIRECT_BIT;
            }
            for code in operand.split('|') {
                bits |= match code {
                    "za" => 0o100,
                    "pa" => 0o200,
                    "ma" => 0o400,
                    "zo" => 0o1000,
                    "pi" => 0o2000,
                    _ => return Err(invalid(operand)),
                };
            }
            bits
        }
        Rule::SwitchTest => {
            let operand = instr.operand.as_deref().ok_or_else(missing)?;
            let selector = parse_immediate(operand, true)
                .filter(|n| (0..=7).contains(n))
                .ok_or_else(|| invalid(operand))?;
            SKIP_GROUP | ((selector as u32) << 3)
        }
        Rule::FlagTest => {
            let operand = instr.operand.as_deref().ok_or_else(missing)?;
            let selector = parse_immediate(operand, true)
                .filter(|n| (0..=7).contains(n))
                .ok_or_else(|| invalid(operand))?;
            SKIP_GROUP | selector as u32
        }
        Rule::Operate(micro) => OPERATE_GROUP | micro,
        Rule::FlagClear => {
            let operand = instr.operand.as_deref().ok_or_else(missing)?;
            let flag = parse_immediate(operand, true)
                .filter(|n| (0..=7).contains(n))
                .ok_or_else(|| invalid(operand))?;
            OPERATE_GROUP | flag as u32
        }
        Rule::FlagSet => {
            let operand = instr.operand.as_deref().ok_or_else(missing)?;
            let flag = parse_immediate(operand, true)
                .filter(|n| (0..=7).contains(n))
                .ok_or_else(|| invalid(operand))?;
            OPERATE_GROUP | (0o10 + flag as u32)
        }
    };
    Ok(Word::new(bits))
}

/// Encodes a directive line. Only `.fill` survives expansion.
pub fn encode_directive(dir: &DirectiveLine, labels: &LabelTable) -> Result<Word, AsmErr> {
    if dir.directive != ".fill" {
        return Err(AsmErr::new(AsmErrKind::InvalidDirective(dir.directive.clone()), dir.line));
    }
    let [operand] = &dir.operands[..] else {
        return Err(AsmErr::new(
            AsmErrKind::InvalidDirectiveOperands(".fill".to_string()),
            dir.line,
        ));
    };
    // a fill value is a literal (the # prefix is optional here) or a label
    let value = match parse_immediate(operand, false) {
        Some(value) => value,
        None => labels.resolve(operand, dir.line)? as i32,
    };
    Ok(Word::from_int(value))
}

/// Parses an integer operand of the form `#-?[0-9]+` (prefix optional for
/// directive operands).
fn parse_immediate(text: &str, require_prefix: bool) -> Option<i32> {
    let body = match text.strip_prefix('#') {
        Some(rest) => rest,
        None if require_prefix => return None,
        None => text,
    };
    let digits = body.strip_prefix('-').unwrap_or(body);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    body.parse().ok()
}

/// Encodes a signed value as a `bits`-wide one's-complement field.
fn ones_complement(value: i32, bits: u32) -> u32 {
    let sign = 1u32 << (bits - 1);
    let mask = sign - 1;
    if value < 0 {
        sign | (!value.unsigned_abs() & mask)
    } else {
        value as u32 & mask
    }
}

#[cfg(test)]
mod tests {
    use super::{encode_directive, encode_instr, ones_complement, parse_immediate};
    use crate::asm::{AsmErrKind, LabelTable};
    use crate::ast::{DirectiveLine, InstrLine};

    fn instr(opcode: &str, indirect: bool, operand: Option<&str>) -> InstrLine {
        InstrLine {
            label: None,
            opcode: opcode.to_string(),
            indirect,
            operand: operand.map(str::to_string),
            line: 0,
        }
    }

    fn encode(opcode: &str, indirect: bool, operand: Option<&str>) -> u32 {
        encode_instr(&instr(opcode, indirect, operand), &LabelTable::new())
            .unwrap()
            .bits()
    }

    #[test]
    fn memory_reference_opcodes() {
        for (mnemonic, opcode) in [
            ("add", 0o40), ("sub", 0o42), ("mul", 0o54), ("div", 0o56),
            ("idx", 0o44), ("isp", 0o46), ("and", 0o02), ("xor", 0o06),
            ("ior", 0o04), ("lac", 0o20), ("dac", 0o24), ("dap", 0o26),
            ("dip", 0o30), ("lio", 0o22), ("dio", 0o32), ("dzm", 0o34),
            ("xct", 0o10), ("jmp", 0o60), ("jsp", 0o62), ("cal", 0o16),
            ("jda", 0o17), ("sad", 0o50), ("sas", 0o52),
        ] {
            let bits = encode(mnemonic, false, Some("#5"));
            assert_eq!(bits >> 12, opcode, "opcode field of {mnemonic}");
            assert_eq!(bits & 0o7777, 5, "address field of {mnemonic}");
        }
    }

    #[test]
    fn memory_reference_indirect_bit_round_trips() {
        let direct = encode("lac", false, Some("#5"));
        let indirect = encode("lac", true, Some("#5"));
        assert_eq!(direct & 0o10000, 0);
        assert_eq!(indirect & 0o10000, 0o10000);
        // the decoder's view of both words
        assert_eq!((direct >> 12) & 0o76, 0o20);
        assert_eq!((indirect >> 12) & 0o76, 0o20);
    }

    #[test]
    fn memory_reference_label_operand() {
        let mut labels = LabelTable::new();
        labels.add("buf", 0o1234).unwrap();
        let word = encode_instr(&instr("lac", false, Some("buf")), &labels).unwrap();
        // only the low 9 bits of the label position are encoded
        assert_eq!(word.bits(), 0o200234);
    }

    #[test]
    fn memory_reference_requires_operand() {
        let err = encode_instr(&instr("lac", false, None), &LabelTable::new()).unwrap_err();
        assert!(matches!(err.kind, AsmErrKind::MissingOperand(_)));
        assert_eq!(
            err.kind.to_string(),
            "lac instruction missing required operand"
        );
    }

    #[test]
    fn law_immediates() {
        assert_eq!(encode("law", false, Some("#5")), 0o700005);
        assert_eq!(encode("law", false, Some("#-5")), 0o717772);
    }

    #[test]
    fn shift_count_is_unary() {
        assert_eq!(encode("rar", false, Some("#1")), (0o671 << 9) | 0o1);
        assert_eq!(encode("rar", false, Some("#3")), (0o671 << 9) | 0o7);
        assert_eq!(encode("scl", false, Some("#9")), (0o667 << 9) | 0o777);
        assert_eq!(encode("sal", false, Some("#0")), 0o665 << 9);
    }

    #[test]
    fn shift_count_out_of_range() {
        let err = encode_instr(&instr("rar", false, Some("#13")), &LabelTable::new()).unwrap_err();
        assert!(matches!(err.kind, AsmErrKind::InvalidOperand { .. }));
    }

    #[test]
    fn skip_fixed_forms() {
        assert_eq!(encode("sza", false, None), 0o640100);
        assert_eq!(encode("snza", false, None), 0o650100);
        assert_eq!(encode("spi", false, None), 0o642000);
    }

    #[test]
    fn skip_condition_lists() {
        assert_eq!(encode("skp", false, Some("za|pa|ma")), 0o640700);
        assert_eq!(encode("skpn", false, Some("zo")), 0o651000);
    }

    #[test]
    fn skip_rejects_unknown_condition() {
        let err = encode_instr(&instr("skp", false, Some("za|xx")), &LabelTable::new()).unwrap_err();
        assert!(matches!(err.kind, AsmErrKind::InvalidOperand { .. }));
    }

    #[test]
    fn switch_and_flag_tests() {
        assert_eq!(encode("szs", false, Some("#7")), 0o640070);
        assert_eq!(encode("szs", false, Some("#1")), 0o640010);
        assert_eq!(encode("szf", false, Some("#7")), 0o640007);
    }

    #[test]
    fn operate_forms() {
        assert_eq!(encode("cli", false, None), 0o764000);
        assert_eq!(encode("lat", false, None), 0o762000);
        assert_eq!(encode("cma", false, None), 0o761000);
        assert_eq!(encode("hlt", false, None), 0o760400);
        assert_eq!(encode("cla", false, None), 0o760200);
        assert_eq!(encode("lap", false, None), 0o760100);
        assert_eq!(encode("nop", false, None), 0o760000);
        assert_eq!(encode("clf", false, Some("#3")), 0o760003);
        assert_eq!(encode("stf", false, Some("#3")), 0o760013);
    }

    #[test]
    fn unknown_mnemonic() {
        let err = encode_instr(&instr("zzz", false, None), &LabelTable::new()).unwrap_err();
        assert!(matches!(err.kind, AsmErrKind::InvalidOpcode(_)));
    }

    #[test]
    fn fill_directive() {
        let fill = |operands: &[&str]| DirectiveLine {
            label: None,
            directive: ".fill".to_string(),
            operands: operands.iter().map(|s| s.to_string()).collect(),
            line: 4,
        };
        let mut labels = LabelTable::new();
        labels.add("buf", 7).unwrap();

        assert_eq!(encode_directive(&fill(&["42"]), &labels).unwrap().to_int(), 42);
        assert_eq!(encode_directive(&fill(&["-1"]), &labels).unwrap().bits(), 0o777776);
        assert_eq!(encode_directive(&fill(&["#3"]), &labels).unwrap().to_int(), 3);
        assert_eq!(encode_directive(&fill(&["buf"]), &labels).unwrap().to_int(), 7);

        let err = encode_directive(&fill(&[]), &labels).unwrap_err();
        assert!(matches!(err.kind, AsmErrKind::InvalidDirectiveOperands(_)));
        let err = encode_directive(&fill(&["1", "2"]), &labels).unwrap_err();
        assert!(matches!(err.kind, AsmErrKind::InvalidDirectiveOperands(_)));
    }

    #[test]
    fn immediate_parsing() {
        assert_eq!(parse_immediate("#5", true), Some(5));
        assert_eq!(parse_immediate("#-5", true), Some(-5));
        assert_eq!(parse_immediate("5", true), None);
        assert_eq!(parse_immediate("5", false), Some(5));
        assert_eq!(parse_immediate("-5", false), Some(-5));
        assert_eq!(parse_immediate("#5x", true), None);
        assert_eq!(parse_immediate("#", true), None);
        assert_eq!(parse_immediate("", false), None);
    }

    #[test]
    fn ones_complement_fields() {
        assert_eq!(ones_complement(5, 13), 0o5);
        assert_eq!(ones_complement(-5, 13), 0o17772);
        assert_eq!(ones_complement(0, 13), 0);
        assert_eq!(ones_complement(-1, 13), 0o17776);
    }
}
