//! Simulating and executing assembled PDP-1 code.
//!
//! This module is focused on executing fully assembled word images.
//!
//! This module consists of:
//! - [`Simulator`]: the struct that simulates assembled code.
//! - [`SimFlags`]: the machine configuration (memory size, sense switches,
//!   extend mode).
//! - [`mem`]: the module handling core memory and indirect addressing.
//!
//! # Usage
//!
//! To simulate some code, instantiate a [`Simulator`] and load a word
//! image into it:
//! ```
//! use pdp1_toolchain::asm::assemble;
//! use pdp1_toolchain::sim::{SimFlags, Simulator};
//!
//! let assembly = assemble(" law #0\n hlt").unwrap();
//!
//! let mut sim = Simulator::new(SimFlags::default());
//! sim.load_image(assembly.words());
//! while sim.step() {}
//! assert!(!sim.running());
//! ```
//!
//! # Fatal instructions
//!
//! A word whose opcode (or shift/operate sub-pattern) matches nothing in
//! the instruction set is a fatal emulation failure: the process logs the
//! offending word and exits with status 1. It is not surfaced as a value.

pub mod mem;

use std::str::FromStr;

use tracing::{error, trace, warn};

use crate::ast::Word;
use mem::{CoreMem, ADDR_MASK};

/// The configured size of core memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemSize {
    /// 4096 words (one bank).
    #[default]
    K4,
    /// 8192 words.
    K8,
    /// 16384 words.
    K16,
    /// 32768 words.
    K32,
}
impl MemSize {
    /// The number of words this size provides.
    pub fn word_count(self) -> usize {
        match self {
            MemSize::K4 => 4096,
            MemSize::K8 => 8192,
            MemSize::K16 => 16384,
            MemSize::K32 => 32768,
        }
    }
}
impl FromStr for MemSize {
    type Err = InvalidMemSize;

    /// Accepts the bank spellings (`1x`-`4x`), the K spellings
    /// (`4K`-`32K`), and exact word counts.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1x" | "4K" | "4096" => Ok(MemSize::K4),
            "2x" | "8K" | "8192" => Ok(MemSize::K8),
            "3x" | "16K" | "16384" => Ok(MemSize::K16),
            "4x" | "32K" | "32768" => Ok(MemSize::K32),
            _ => Err(InvalidMemSize(s.to_string())),
        }
    }
}

/// Error from parsing a [`MemSize`].
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct InvalidMemSize(String);
impl std::fmt::Display for InvalidMemSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unrecognized memory size: {}", self.0)
    }
}
impl std::error::Error for InvalidMemSize {}
impl crate::err::Error for InvalidMemSize {
    fn help(&self) -> Option<std::borrow::Cow<str>> {
        Some("memory sizes are 4096, 8192, 16384, or 32768 words (1x-4x, 4K-32K)".into())
    }
}

/// Configuration flags for a [`Simulator`], set at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SimFlags {
    /// The core memory size.
    pub mem_size: MemSize,
    /// The console sense switches, readable by the skip group.
    pub sense_switches: [bool; 6],
    /// Whether extend mode is enabled.
    pub extend: bool,
}

/// The indirect bit of an instruction word (doubling as the skip-group
/// negate bit).
const INDIRECT_BIT: u32 = 0o10000;

/// Executes assembled code.
#[derive(Debug, Clone)]
pub struct Simulator {
    /// The core memory.
    pub mem: CoreMem,
    /// The program counter (12 bits).
    pub pc: u16,
    /// The accumulator.
    pub ac: Word,
    /// The in-out register.
    pub io: Word,
    /// The overflow flag, set by add/sub and consumed by `szo`.
    pub overflow: bool,
    /// The six program flags.
    pub program_flags: [bool; 6],
    /// Whether extend mode is enabled.
    pub extend: bool,
    sense_switches: [bool; 6],
    running: bool,
}

impl Simulator {
    /// Creates a powered-on machine with zeroed memory and registers.
    pub fn new(flags: SimFlags) -> Self {
        Simulator {
            mem: CoreMem::new(flags.mem_size.word_count()),
            pc: 0,
            ac: Word::ZERO,
            io: Word::ZERO,
            overflow: false,
            program_flags: [false; 6],
            extend: flags.extend,
            sense_switches: flags.sense_switches,
            running: true,
        }
    }

    /// Loads a word image at address 0.
    ///
    /// An image longer than memory is truncated.
    pub fn load_image(&mut self, words: &[Word]) {
        if words.len() > self.mem.len() {
            warn!(
                image = words.len(),
                memory = self.mem.len(),
                "image does not fit in memory, truncating"
            );
        }
        self.mem.load_words(words);
    }

    /// Whether the machine is still running (i.e. has not executed `hlt`).
    pub fn running(&self) -> bool {
        self.running
    }

    /// Executes the instruction at PC.
    ///
    /// Returns whether the machine is still running afterwards; a halted
    /// machine does nothing and returns false immediately.
    pub fn step(&mut self) -> bool {
        if !self.running {
            return false;
        }
        let instr = self.mem.load(self.pc).bits();
        trace!(pc = self.pc, "execute {:06o}", instr);
        self.execute(instr);
        self.running
    }

    /// Runs until the machine halts.
    pub fn run(&mut self) {
        while self.step() {}
    }

    fn skip(&mut self) {
        self.pc = (self.pc + 1) & ADDR_MASK;
    }

    /// The word `jsp`/`jda`/`cal` deposit in AC: the return address, with
    /// bit 17 holding overflow and bit 16 extend.
    fn return_word(&self) -> Word {
        let mut bits = self.pc as u32 + 1;
        if self.overflow {
            bits |= 0o400000;
        } else {
            bits &= !0o400000;
        }
        if self.extend {
            bits |= 0o200000;
        }
        Word::new(bits)
    }

    fn halt_and_catch_fire(&self, instr: u32) -> ! {
        error!(pc = self.pc, "unrecognized instruction {:06o}", instr);
        std::process::exit(1);
    }

    /// Decodes and executes one instruction word. `xct` re-enters this
    /// with the referenced word; the recursion is unbounded.
    fn execute(&mut self, instr: u32) {
        let opcode = (instr >> 12) & 0o76;
        let indirect = instr & INDIRECT_BIT != 0;
        let operand = (instr & 0o7777) as u16;
        let mut inc_pc = true;

        match opcode {
            // add
            0o40 => {
                let cy = self.mem.read(operand, indirect);
                let mut sum = self.ac.bits() + cy.bits();
                if sum & 0o1000000 != 0 {
                    // end-around carry
                    sum = (sum & 0o777777) + 1;
                }
                if sum == 0o777777 {
                    sum = 0;
                }
                let new_ac = Word::new(sum);
                if self.ac.sign() == cy.sign() && new_ac.sign() != self.ac.sign() {
                    self.overflow = true;
                }
                self.ac = new_ac;
            }
            // sub
            0o42 => {
                let cy = self.mem.read(operand, indirect);
                let minuend = self.ac.bits() | 0o1000000;
                let mut diff = minuend - cy.bits();
                if diff & 0o1000000 == 0 {
                    diff -= 1;
                } else {
                    diff &= 0o777777;
                }
                if diff == 0o777777 {
                    diff = 0;
                }
                let new_ac = Word::new(diff);
                if self.ac.sign() != new_ac.sign() {
                    self.overflow = true;
                }
                self.ac = new_ac;
            }
            // mul, div
            0o54 => warn!("mul is not implemented"),
            0o56 => warn!("div is not implemented"),
            // idx, isp
            0o44 | 0o46 => {
                let cy = self.mem.read(operand, indirect).to_int();
                let incremented = Word::from_int(cy + 1);
                self.ac = incremented;
                self.mem.write(operand, indirect, incremented);
                if opcode == 0o46 && cy + 1 >= 0 {
                    self.skip();
                }
            }
            // and, ior, xor
            0o02 => self.ac = self.mem.read(operand, indirect) & self.ac,
            0o04 => self.ac = self.mem.read(operand, indirect) | self.ac,
            0o06 => self.ac = self.mem.read(operand, indirect) ^ self.ac,
            // lac, dac
            0o20 => self.ac = self.mem.read(operand, indirect),
            0o24 => self.mem.write(operand, indirect, self.ac),
            // dap: deposit AC's address part
            0o26 => {
                let cy = self.mem.read(operand, indirect).bits();
                let merged = Word::new((cy & 0o770000) | (self.ac.bits() & 0o7777));
                self.mem.write(operand, indirect, merged);
            }
            // dip: deposit AC's instruction part
            0o30 => {
                let cy = self.mem.read(operand, indirect).bits();
                let merged = Word::new((cy & 0o017777) | (self.ac.bits() & 0o760000));
                self.mem.write(operand, indirect, merged);
            }
            // lio, dio, dzm
            0o22 => self.io = self.mem.read(operand, indirect),
            0o32 => self.mem.write(operand, indirect, self.io),
            0o34 => self.mem.write(operand, indirect, Word::ZERO),
            // xct
            0o10 => {
                let word = self.mem.read(operand, indirect);
                self.execute(word.bits());
            }
            // jmp
            0o60 => {
                self.pc = operand;
                inc_pc = false;
            }
            // jsp
            0o62 => {
                self.ac = self.return_word();
                self.pc = operand;
                inc_pc = false;
            }
            // cal/jda share an opcode; the indirect bit selects jda
            0o16 => {
                if indirect {
                    self.mem.write(operand, false, self.ac);
                    self.ac = self.return_word();
                    self.pc = (operand + 1) & ADDR_MASK;
                } else {
                    self.mem.write(0o100, false, self.ac);
                    self.ac = self.return_word();
                    self.pc = 0o101;
                }
                inc_pc = false;
            }
            // sad, sas
            0o50 => {
                if self.mem.read(operand, indirect) != self.ac {
                    self.skip();
                }
            }
            0o52 => {
                if self.mem.read(operand, indirect) == self.ac {
                    self.skip();
                }
            }
            // law encodes its value at assembly; execution moves nothing
            0o70 => {}
            // shift group
            0o66 => {
                let sub_opcode = (instr & 0o777000) >> 9;
                let n = (instr & 0o777).count_ones();
                let ac = self.ac.bits();
                let io = self.io.bits();
                match sub_opcode {
                    // rar, ral: rotate AC
                    0o671 => self.ac = Word::new((ac >> n) | (ac << (18 - n))),
                    0o661 => self.ac = Word::new((ac << n) | (ac >> (18 - n))),
                    // sar, sal: shift AC
                    0o675 => self.ac = Word::new(ac >> n),
                    0o665 => self.ac = Word::new(ac << n),
                    // rir, ril: rotate IO
                    0o672 => self.io = Word::new((io >> n) | (io << (18 - n))),
                    0o662 => self.io = Word::new((io << n) | (io >> (18 - n))),
                    // sir, sil: shift IO
                    0o676 => self.io = Word::new(io >> n),
                    0o666 => self.io = Word::new(io << n),
                    // rcr, rcl: rotate the 36-bit AC.IO pair
                    0o673 => {
                        self.ac = Word::new((ac >> n) | (io << (18 - n)));
                        self.io = Word::new((io >> n) | (ac << (18 - n)));
                    }
                    0o663 => {
                        self.ac = Word::new((ac << n) | (io >> (18 - n)));
                        self.io = Word::new((io << n) | (ac >> (18 - n)));
                    }
                    // scr, scl: shift the 36-bit AC.IO pair
                    0o677 => {
                        self.ac = Word::new(ac >> n);
                        self.io = Word::new((io >> n) | (ac << (18 - n)));
                    }
                    0o667 => {
                        self.ac = Word::new((ac << n) | (io >> (18 - n)));
                        self.io = Word::new(io << n);
                    }
                    _ => self.halt_and_catch_fire(instr),
                }
            }
            // skip group; the negate bit inverts the whole condition
            0o64 => {
                let operand = operand as u32;
                let mut matched = false;
                if operand & 0o100 != 0 {
                    matched = matched || self.ac == Word::ZERO;
                }
                if operand & 0o200 != 0 {
                    matched = matched || !self.ac.sign();
                }
                if operand & 0o400 != 0 {
                    matched = matched || self.ac.sign();
                }
                if operand & 0o1000 != 0 {
                    matched = matched || !self.overflow;
                    self.overflow = false;
                }
                if operand & 0o2000 != 0 {
                    matched = matched || !self.io.sign();
                }
                if operand & 0o70 != 0 {
                    let selector = ((operand >> 3) & 0o7) as usize;
                    matched = matched
                        || if selector == 7 {
                            self.sense_switches.iter().all(|&s| s)
                        } else {
                            self.sense_switches[selector - 1]
                        };
                }
                if operand & 0o7 != 0 {
                    let selector = (operand & 0o7) as usize;
                    matched = matched
                        || if selector == 7 {
                            self.program_flags.iter().all(|&f| f)
                        } else {
                            self.program_flags[selector - 1]
                        };
                }
                if matched != indirect {
                    self.skip();
                }
            }
            // operate group
            0o76 => match operand as u32 {
                // cli
                0o4000 => self.io = Word::ZERO,
                // lap
                0o100 => {
                    let mut bits = self.pc as u32;
                    if self.ac.sign() || self.overflow {
                        bits |= 0o400000;
                    }
                    if self.extend {
                        bits |= 0o200000;
                    }
                    self.ac = Word::new(bits);
                }
                // cma
                0o1000 => self.ac = !self.ac,
                // hlt
                0o400 => {
                    self.running = false;
                    inc_pc = false;
                }
                // cla
                0o200 => self.ac = Word::ZERO,
                // nop
                0 => {}
                // stf/clf: flag micro-ops, selector 7 meaning all flags
                other => {
                    if other & 0o7 != 0 {
                        let set = other & 0o10 != 0;
                        let selector = (other & 0o7) as usize;
                        if selector == 7 {
                            self.program_flags = [set; 6];
                        } else {
                            self.program_flags[selector - 1] = set;
                        }
                    } else {
                        self.halt_and_catch_fire(instr);
                    }
                }
            },
            _ => self.halt_and_catch_fire(instr),
        }

        if inc_pc {
            self.pc = (self.pc + 1) & ADDR_MASK;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MemSize, SimFlags, Simulator};
    use crate::asm::assemble;
    use crate::ast::Word;

    fn sim() -> Simulator {
        Simulator::new(SimFlags::default())
    }

    /// Runs to halt, returning how many steps it took.
    fn run_counted(sim: &mut Simulator) -> usize {
        let mut steps = 0;
        loop {
            steps += 1;
            if !sim.step() {
                return steps;
            }
        }
    }

    #[test]
    fn end_to_end_load_store_halt() {
        let assembly = assemble(" lac #3\n dac #10\n hlt\n .fill 5").unwrap();
        let mut sim = sim();
        sim.load_image(assembly.words());

        assert_eq!(run_counted(&mut sim), 3);
        assert!(!sim.running());
        assert_eq!(sim.ac.to_int(), 5);
        assert_eq!(sim.mem.load(10).to_int(), 5);
        // hlt freezes the program counter
        assert_eq!(sim.pc, 2);
    }

    #[test]
    fn add_cancels_to_positive_zero() {
        let mut sim = sim();
        sim.ac = Word::from_int(5);
        sim.mem.store(2, Word::from_int(-5));
        sim.mem.store(0, Word::new(0o400002)); // add 2
        sim.step();

        assert_eq!(sim.ac, Word::ZERO);
        assert!(!sim.overflow);
    }

    #[test]
    fn add_sets_overflow_on_same_sign_wrap() {
        let mut sim = sim();
        sim.ac = Word::from_int(131071);
        sim.mem.store(2, Word::from_int(131071));
        sim.mem.store(0, Word::new(0o400002)); // add 2
        sim.step();

        assert!(sim.overflow);
        assert!(sim.ac.sign());
    }

    #[test]
    fn add_end_around_carry() {
        let mut sim = sim();
        sim.ac = Word::from_int(-1);
        sim.mem.store(2, Word::from_int(2));
        sim.mem.store(0, Word::new(0o400002)); // add 2
        sim.step();

        assert_eq!(sim.ac.to_int(), 1);
    }

    #[test]
    fn sub_normalizes_negative_zero() {
        let mut sim = sim();
        sim.ac = Word::MINUS_ZERO;
        sim.mem.store(2, Word::ZERO);
        sim.mem.store(0, Word::new(0o420002)); // sub 2
        sim.step();

        assert_eq!(sim.ac, Word::ZERO);
    }

    #[test]
    fn sub_computes_difference() {
        let mut sim = sim();
        sim.ac = Word::from_int(3);
        sim.mem.store(2, Word::from_int(5));
        sim.mem.store(0, Word::new(0o420002)); // sub 2
        sim.step();

        assert_eq!(sim.ac.to_int(), -2);
    }

    #[test]
    fn indirect_operand_reaches_target() {
        let mut sim = sim();
        sim.mem.store(0, Word::new(0o210005)); // lac &5
        sim.mem.store(5, Word::new(0o10007)); // pointer to 7
        sim.mem.store(7, Word::from_int(42));
        sim.step();

        assert_eq!(sim.ac.to_int(), 42);
    }

    #[test]
    fn idx_and_isp() {
        let mut sim = sim();
        sim.mem.store(0, Word::new(0o440005)); // idx 5
        sim.mem.store(1, Word::new(0o460006)); // isp 6
        sim.mem.store(5, Word::from_int(7));
        sim.mem.store(6, Word::from_int(-1));

        sim.step();
        assert_eq!(sim.ac.to_int(), 8);
        assert_eq!(sim.mem.load(5).to_int(), 8);
        assert_eq!(sim.pc, 1);

        // -1 + 1 = 0, which satisfies the skip condition
        sim.step();
        assert_eq!(sim.mem.load(6).to_int(), 0);
        assert_eq!(sim.pc, 3);
    }

    #[test]
    fn deposit_address_and_instruction_parts() {
        let mut sim = sim();
        sim.ac = Word::new(0o123456);
        sim.mem.store(0, Word::new(0o260005)); // dap 5
        sim.mem.store(1, Word::new(0o300006)); // dip 6
        sim.mem.store(5, Word::new(0o777777));
        sim.mem.store(6, Word::new(0o777777));

        sim.step();
        assert_eq!(sim.mem.load(5).bits(), 0o773456);
        sim.step();
        assert_eq!(sim.mem.load(6).bits(), 0o137777);
    }

    #[test]
    fn jumps_and_subroutine_linkage() {
        // jsp 0o100 from address 0, with overflow set
        let mut sim = sim();
        sim.overflow = true;
        sim.mem.store(0, Word::new(0o620100));
        sim.step();
        assert_eq!(sim.pc, 0o100);
        assert_eq!(sim.ac.bits(), 0o400001);

        // jmp ignores its indirect bit
        let mut sim = self::sim();
        sim.mem.store(0, Word::new(0o610007));
        sim.step();
        assert_eq!(sim.pc, 7);
    }

    #[test]
    fn jda_deposits_and_links() {
        let mut sim = sim();
        sim.ac = Word::from_int(42);
        sim.mem.store(0, Word::new(0o170200)); // jda 0o200
        sim.step();

        assert_eq!(sim.mem.load(0o200).to_int(), 42);
        assert_eq!(sim.ac.bits(), 1);
        assert_eq!(sim.pc, 0o201);
    }

    #[test]
    fn cal_uses_fixed_linkage_address() {
        let mut sim = sim();
        sim.ac = Word::from_int(42);
        sim.mem.store(0, Word::new(0o160777)); // cal (operand ignored)
        sim.step();

        assert_eq!(sim.mem.load(0o100).to_int(), 42);
        assert_eq!(sim.pc, 0o101);
    }

    #[test]
    fn sad_sas_skip() {
        let mut sim = sim();
        sim.ac = Word::from_int(5);
        sim.mem.store(2, Word::from_int(5));
        sim.mem.store(0, Word::new(0o520002)); // sas 2
        sim.step();
        assert_eq!(sim.pc, 2);

        let mut sim = self::sim();
        sim.ac = Word::from_int(5);
        sim.mem.store(2, Word::from_int(6));
        sim.mem.store(0, Word::new(0o500002)); // sad 2
        sim.step();
        assert_eq!(sim.pc, 2);
    }

    #[test]
    fn law_leaves_accumulator_alone() {
        let mut sim = sim();
        sim.ac = Word::from_int(9);
        sim.mem.store(0, Word::new(0o700005)); // law #5
        sim.step();

        assert_eq!(sim.ac.to_int(), 9);
        assert_eq!(sim.pc, 1);
    }

    #[test]
    fn rotate_and_shift() {
        let mut sim = sim();
        sim.ac = Word::new(0o400001);
        sim.mem.store(0, Word::new((0o671 << 9) | 0o1)); // rar 1
        sim.step();
        assert_eq!(sim.ac.bits(), 0o600000);

        let mut sim = self::sim();
        sim.ac = Word::new(0o000010);
        sim.mem.store(0, Word::new((0o675 << 9) | 0o7)); // sar 3
        sim.step();
        assert_eq!(sim.ac.bits(), 0o000001);
    }

    #[test]
    fn combined_rotate_spans_both_registers() {
        let mut sim = sim();
        sim.ac = Word::new(1);
        sim.io = Word::ZERO;
        sim.mem.store(0, Word::new((0o673 << 9) | 0o1)); // rcr 1
        sim.step();

        assert_eq!(sim.ac, Word::ZERO);
        assert_eq!(sim.io.bits(), 0o400000);
    }

    #[test]
    fn combined_shift_spans_both_registers() {
        let mut sim = sim();
        sim.ac = Word::new(0o000001);
        sim.io = Word::new(0o400000);
        sim.mem.store(0, Word::new((0o677 << 9) | 0o1)); // scr 1
        sim.step();

        assert_eq!(sim.ac, Word::ZERO);
        assert_eq!(sim.io.bits(), 0o600000);
    }

    #[test]
    fn skip_group_conditions() {
        // sza skips on a zero accumulator
        let mut sim = sim();
        sim.mem.store(0, Word::new(0o640100));
        sim.step();
        assert_eq!(sim.pc, 2);

        // ...but not on negative zero (the bit pattern is inspected)
        let mut sim = self::sim();
        sim.ac = Word::MINUS_ZERO;
        sim.mem.store(0, Word::new(0o640100));
        sim.step();
        assert_eq!(sim.pc, 1);

        // snza is the negation
        let mut sim = self::sim();
        sim.mem.store(0, Word::new(0o650100));
        sim.step();
        assert_eq!(sim.pc, 1);
    }

    #[test]
    fn szo_consumes_overflow() {
        let mut sim = sim();
        sim.overflow = true;
        sim.mem.store(0, Word::new(0o641000)); // szo
        sim.step();

        // overflow was set: no skip, but the flag clears
        assert_eq!(sim.pc, 1);
        assert!(!sim.overflow);

        sim.mem.store(1, Word::new(0o641000));
        sim.step();
        assert_eq!(sim.pc, 3);
    }

    #[test]
    fn sense_switch_tests() {
        let mut flags = SimFlags::default();
        flags.sense_switches[2] = true;
        let mut sim = Simulator::new(flags);
        sim.mem.store(0, Word::new(0o640030)); // szs #3
        sim.step();
        assert_eq!(sim.pc, 2);
    }

    #[test]
    fn program_flag_micro_ops() {
        let mut sim = sim();
        sim.mem.store(0, Word::new(0o760013)); // stf #3
        sim.mem.store(1, Word::new(0o760017)); // stf #7 (all)
        sim.mem.store(2, Word::new(0o760007)); // clf #7 (all)

        sim.step();
        assert_eq!(sim.program_flags, [false, false, true, false, false, false]);
        sim.step();
        assert_eq!(sim.program_flags, [true; 6]);
        sim.step();
        assert_eq!(sim.program_flags, [false; 6]);
    }

    #[test]
    fn operate_micro_ops() {
        let mut sim = sim();
        sim.ac = Word::from_int(3);
        sim.io = Word::from_int(4);
        sim.mem.store(0, Word::new(0o761000)); // cma
        sim.mem.store(1, Word::new(0o764000)); // cli
        sim.mem.store(2, Word::new(0o760200)); // cla

        sim.step();
        assert_eq!(sim.ac.to_int(), -3);
        sim.step();
        assert_eq!(sim.io, Word::ZERO);
        sim.step();
        assert_eq!(sim.ac, Word::ZERO);
    }

    #[test]
    fn xct_executes_referenced_word() {
        let mut sim = sim();
        sim.mem.store(0, Word::new(0o100005)); // xct 5
        sim.mem.store(5, Word::new(0o761000)); // cma
        sim.ac = Word::from_int(1);
        sim.step();

        assert_eq!(sim.ac.to_int(), -1);
    }

    #[test]
    fn mul_is_stubbed() {
        let mut sim = sim();
        sim.ac = Word::from_int(3);
        sim.mem.store(0, Word::new(0o540005)); // mul 5
        assert!(sim.step());

        assert_eq!(sim.ac.to_int(), 3);
        assert_eq!(sim.pc, 1);
    }

    #[test]
    fn image_fills_larger_memory_configurations() {
        let mut flags = SimFlags::default();
        flags.mem_size = MemSize::K8;
        let mut sim = Simulator::new(flags);
        let mut image = vec![Word::from_int(1); 5000];
        image[0] = Word::from_int(7);
        sim.load_image(&image);

        assert_eq!(sim.mem.len(), 8192);
        assert_eq!(sim.mem.load(0).to_int(), 7);
    }

    #[test]
    fn image_longer_than_memory_is_truncated() {
        let mut sim = sim();
        let image = vec![Word::from_int(1); 5000];
        sim.load_image(&image);
        assert_eq!(sim.mem.len(), 4096);
        assert_eq!(sim.mem.load(0o7777).to_int(), 1);
    }

    #[test]
    fn mem_size_parsing() {
        assert_eq!("1x".parse::<MemSize>().unwrap(), MemSize::K4);
        assert_eq!("8K".parse::<MemSize>().unwrap(), MemSize::K8);
        assert_eq!("16384".parse::<MemSize>().unwrap(), MemSize::K16);
        assert_eq!("4x".parse::<MemSize>().unwrap().word_count(), 32768);
        assert!("5x".parse::<MemSize>().is_err());
    }
}
