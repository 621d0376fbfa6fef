//! Core memory for the simulator.
//!
//! This module consists of:
//! - [`CoreMem`]: the machine's core memory, zero-filled at power-on.
//!
//! Instruction-level reads and writes go through 12-bit addresses, so every
//! access lands in the first 4096 words regardless of the configured size.
//! Image loading ([`CoreMem::load_words`]) addresses the whole array, so a
//! larger configuration holds a larger image even though generated code can
//! only reach the first bank.

use crate::ast::Word;

/// The width of an address, as encoded in an instruction's operand field.
pub const ADDR_MASK: u16 = 0o7777;

/// The machine's core memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreMem {
    data: Vec<Word>,
}

impl CoreMem {
    /// Creates a zero-filled memory of `words` words.
    ///
    /// `words` must be at least 4096 (the reach of an address field);
    /// the configured [`MemSize`](crate::sim::MemSize) variants all are.
    pub fn new(words: usize) -> Self {
        CoreMem { data: vec![Word::ZERO; words.max(4096)] }
    }

    /// The number of words in this memory.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the memory is empty (it never is).
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Copies a word image into memory starting at address 0.
    ///
    /// Unlike the instruction-level accessors, this addresses the whole
    /// memory, so words past the first bank land at their real locations.
    /// Returns the number of words written (the image length, unless it
    /// exceeds memory).
    pub fn load_words(&mut self, words: &[Word]) -> usize {
        let n = words.len().min(self.data.len());
        self.data[..n].copy_from_slice(&words[..n]);
        n
    }

    /// Reads the word at an address, without indirection.
    pub fn load(&self, addr: u16) -> Word {
        self.data[(addr & ADDR_MASK) as usize]
    }

    /// Writes the word at an address, without indirection.
    pub fn store(&mut self, addr: u16, word: Word) {
        self.data[(addr & ADDR_MASK) as usize] = word;
    }

    /// Resolves an effective address.
    ///
    /// With `indirect` set, the word at the current address is inspected:
    /// while its bit 12 is set, its low 12 bits name the next address.
    /// The chain has no cycle detection; a self-referential pointer word
    /// loops forever.
    pub fn resolve(&self, addr: u16, indirect: bool) -> u16 {
        let mut addr = addr & ADDR_MASK;
        if !indirect {
            return addr;
        }
        let mut word = self.load(addr);
        while word.bit(12) {
            addr = word.bits() as u16 & ADDR_MASK;
            word = self.load(addr);
        }
        addr
    }

    /// Reads through an (optionally indirect) operand address.
    pub fn read(&self, addr: u16, indirect: bool) -> Word {
        self.load(self.resolve(addr, indirect))
    }

    /// Writes through an (optionally indirect) operand address.
    pub fn write(&mut self, addr: u16, indirect: bool, word: Word) {
        let addr = self.resolve(addr, indirect);
        self.store(addr, word);
    }
}
