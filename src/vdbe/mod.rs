//! Virtual Database Engine (VDBE) instruction model and code generation

pub mod builder;
pub mod codegen;
pub mod ops;

pub use builder::{explain_program, ProgramBuilder};
pub use codegen::CodeGenerator;
pub use ops::{Opcode, VdbeOp, P4};
