//! AkbarLang Compiler (akbarc).
//!
//! Source-to-source compiler that translates _AkbarLang_, a small imperative
//! language with Farsi-transliterated keywords, into equivalent C++ source
//! text for a host C++ toolchain to compile and run.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

pub mod compiler;
pub mod error;

pub use compiler::compile;
pub use error::{CompileError, Result};
