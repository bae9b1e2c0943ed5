//! Program builder
//!
//! Accumulates VDBE instructions into an index-addressable list so that
//! forward jump targets can be patched in place, tracks the size of the
//! register pool, and renders EXPLAIN-style listings.

use std::fmt::Write;

use crate::vdbe::ops::{Opcode, VdbeOp, P4};

/// Helper for building VDBE programs
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    /// Accumulated instructions
    ops: Vec<VdbeOp>,
    /// Size of the register pool (registers are 1-indexed)
    n_mem: i32,
    /// Number of cursor slots handed out
    n_cursor: i32,
}

impl ProgramBuilder {
    /// Create a new program builder
    pub fn new() -> Self {
        ProgramBuilder::default()
    }

    /// Current number of instructions (also the address the next
    /// instruction will get)
    pub fn num_ops(&self) -> i32 {
        self.ops.len() as i32
    }

    /// Add an instruction, returning its address
    pub fn add_op(&mut self, opcode: Opcode, p1: i32, p2: i32, p3: i32) -> i32 {
        let addr = self.ops.len() as i32;
        self.ops.push(VdbeOp::new(opcode, p1, p2, p3));
        addr
    }

    /// Add an instruction with a P4 operand
    pub fn add_op4(&mut self, opcode: Opcode, p1: i32, p2: i32, p3: i32, p4: P4) -> i32 {
        let addr = self.ops.len() as i32;
        self.ops.push(VdbeOp::with_p4(opcode, p1, p2, p3, p4));
        addr
    }

    /// Add an instruction with a text P4
    pub fn add_op_p4_str(&mut self, opcode: Opcode, p1: i32, p2: i32, p3: i32, s: &str) -> i32 {
        self.add_op4(opcode, p1, p2, p3, P4::Text(s.to_string()))
    }

    /// Add an instruction with an integer P4
    pub fn add_op_p4_int(&mut self, opcode: Opcode, p1: i32, p2: i32, p3: i32, v: i32) -> i32 {
        self.add_op4(opcode, p1, p2, p3, P4::Int64(v as i64))
    }

    /// Change P2 of an emitted instruction (jump patching)
    pub fn change_p2(&mut self, addr: i32, p2: i32) {
        if addr >= 0 && (addr as usize) < self.ops.len() {
            self.ops[addr as usize].p2 = p2;
        }
    }

    /// Change P3 of an emitted instruction
    pub fn change_p3(&mut self, addr: i32, p3: i32) {
        if addr >= 0 && (addr as usize) < self.ops.len() {
            self.ops[addr as usize].p3 = p3;
        }
    }

    /// Set the comment on an emitted instruction
    pub fn set_comment(&mut self, addr: i32, comment: impl Into<String>) {
        if addr >= 0 && (addr as usize) < self.ops.len() {
            self.ops[addr as usize].comment = Some(comment.into());
        }
    }

    /// Grow the register pool so that register n exists
    pub fn alloc_memory(&mut self, n: i32) {
        if n > self.n_mem {
            self.n_mem = n;
        }
    }

    /// Size of the register pool
    pub fn num_mem(&self) -> i32 {
        self.n_mem
    }

    /// Hand out the next cursor slot
    pub fn alloc_cursor(&mut self) -> i32 {
        let slot = self.n_cursor;
        self.n_cursor += 1;
        slot
    }

    /// Number of cursor slots handed out
    pub fn num_cursors(&self) -> i32 {
        self.n_cursor
    }

    /// Get instruction at address
    pub fn op_at(&self, addr: i32) -> Option<&VdbeOp> {
        self.ops.get(addr as usize)
    }

    /// View the accumulated instructions
    pub fn ops(&self) -> &[VdbeOp] {
        &self.ops
    }

    /// Consume the builder, returning the instruction list
    pub fn build(self) -> Vec<VdbeOp> {
        self.ops
    }

    /// Render the program as an EXPLAIN-style listing
    pub fn explain(&self) -> String {
        explain_program(&self.ops)
    }
}

// ============================================================================
// EXPLAIN Output
// ============================================================================

/// Render a VDBE program as a columned listing
pub fn explain_program(ops: &[VdbeOp]) -> String {
    let mut output = String::new();

    let _ = writeln!(
        output,
        "{:>4}  {:<12}  {:>4}  {:>4}  {:>4}  {:<13}  {}",
        "addr", "opcode", "p1", "p2", "p3", "p4", "comment"
    );
    let _ = writeln!(
        output,
        "----  ------------  ----  ----  ----  -------------  -------"
    );

    for (i, op) in ops.iter().enumerate() {
        let _ = writeln!(
            output,
            "{:>4}  {:<12}  {:>4}  {:>4}  {:>4}  {:<13}  {}",
            i,
            op.opcode.name(),
            op.p1,
            op.p2,
            op.p3,
            format_p4(&op.p4),
            op.comment.as_deref().unwrap_or("")
        );
    }

    output
}

/// Format a P4 operand for listings
fn format_p4(p4: &P4) -> String {
    match p4 {
        P4::Unused => String::new(),
        P4::Int64(i) => i.to_string(),
        P4::Real(r) => format!("{:?}", r),
        P4::Text(s) => {
            if s.len() > 20 {
                format!("'{:.17}...'", s)
            } else {
                format!("'{}'", s)
            }
        }
        P4::Blob(b) => {
            if b.len() > 10 {
                format!("x'{}'...", hex::encode(&b[..10]))
            } else {
                format!("x'{}'", hex::encode(b))
            }
        }
        P4::FuncDef(f) => format!("func({})", f),
    }
}

// ============================================================================
// Tests
// ============================================================================
