//! A PDP-1 assembler, simulator, and punched-tape suite.
//!
//! This crate assembles the classic 18-bit one's-complement assembly dialect
//! into machine words, writes and reads the ASCII punched-tape interchange
//! format, and simulates the resulting programs.
//!
//! # Usage
//!
//! Source code is assembled into a word image (plus a listing used for
//! tape annotations):
//! ```
//! use pdp1_toolchain::asm::assemble;
//!
//! let code = "\
//! start: lac buf
//!  hlt
//! buf: .fill 42";
//!
//! let assembly = assemble(code).unwrap();
//! assert_eq!(assembly.words().len(), 3);
//! ```
//!
//! Once assembled, the image can be executed with the simulator:
//! ```
//! # use pdp1_toolchain::asm::assemble;
//! # let assembly = assemble("start: lac buf\n hlt\nbuf: .fill 42").unwrap();
//! use pdp1_toolchain::sim::{Simulator, SimFlags};
//!
//! let mut simulator = Simulator::new(SimFlags::default());
//! simulator.load_image(assembly.words());
//! while simulator.step() {}
//!
//! assert_eq!(simulator.ac.to_int(), 42);
//! ```
//!
//! Images can also round-trip through the punched-tape format.
//! See the [`tape`] module for more details.
#![warn(missing_docs)]

pub mod parse;
pub mod ast;
pub mod asm;
pub mod sim;
pub mod tape;
pub mod err;
