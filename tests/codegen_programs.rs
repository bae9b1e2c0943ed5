//! Code generation over the public API: emitted instruction shapes,
//! jump closure, and schema-backed column resolution

use sqlfront::parser::ast::Stmt;
use sqlfront::parser::{parse_expression, parse_single};
use sqlfront::vdbe::{CodeGenerator, Opcode, VdbeOp};
use sqlfront::Schema;

fn generate(sql: &str) -> Vec<VdbeOp> {
    let expr = parse_expression(sql).unwrap();
    let mut gen = CodeGenerator::new();
    gen.register_cursor("t", 0);
    gen.generate_expr(&expr).unwrap();
    gen.finish().build()
}

fn opcodes(ops: &[VdbeOp]) -> Vec<Opcode> {
    ops.iter().map(|op| op.opcode).collect()
}

/// Every instruction that interprets p2 as a jump target must point
/// inside the program (the end address included, since a forward jump
/// may land on the next instruction to be emitted)
fn assert_jumps_closed(ops: &[VdbeOp]) {
    for (addr, op) in ops.iter().enumerate() {
        if op.opcode.is_jump() {
            assert!(
                op.p2 >= 0 && op.p2 <= ops.len() as i32,
                "unpatched jump at {}: {:?}",
                addr,
                op
            );
        }
    }
}

#[test]
fn and_emits_copy_ifnot_copy() {
    let ops = generate("a AND b");
    assert_eq!(
        opcodes(&ops),
        vec![
            Opcode::Column,
            Opcode::Copy,
            Opcode::IfNot,
            Opcode::Column,
            Opcode::Copy,
        ]
    );
    // The IfNot's target is the address one past the program
    assert_eq!(ops[2].p2, ops.len() as i32);
    assert_jumps_closed(&ops);
}

#[test]
fn or_uses_if() {
    let ops = generate("a OR b");
    assert_eq!(ops[2].opcode, Opcode::If);
    assert_eq!(ops[2].p2, ops.len() as i32);
    assert_jumps_closed(&ops);
}

#[test]
fn in_list_emits_one_eq_per_member() {
    let ops = generate("x IN (1, 2, 3)");
    let eq_count = ops.iter().filter(|op| op.opcode == Opcode::Eq).count();
    assert_eq!(eq_count, 3);
    assert_jumps_closed(&ops);
}

#[test]
fn nested_control_flow_is_fully_patched() {
    let ops = generate(
        "CASE WHEN a AND b THEN 1 WHEN x IN (1, 2) OR y THEN 2 ELSE 3 END",
    );
    assert_jumps_closed(&ops);
}

#[test]
fn deep_expression_jump_closure() {
    let ops = generate(
        "(a AND b OR c) AND (x BETWEEN 1 AND 10) AND \
         CASE q WHEN 1 THEN a ELSE b END AND z NOT IN (1, 2, 3, 4)",
    );
    assert_jumps_closed(&ops);
}

#[test]
fn column_indices_resolve_through_schema() {
    let mut schema = Schema::new();
    for sql in [
        "CREATE TABLE users (id INTEGER, name TEXT, age INT)",
        "CREATE TABLE posts (id INTEGER, author_id INT, title TEXT)",
    ] {
        match parse_single(sql).unwrap() {
            Stmt::CreateTable(ct) => schema.create_table(&ct).unwrap(),
            other => panic!("expected create table, got {:?}", other),
        }
    }

    let expr = parse_expression("users.age > posts.author_id").unwrap();
    let mut gen = CodeGenerator::with_schema(&schema);
    gen.register_cursor("users", 0);
    gen.register_cursor("posts", 1);
    gen.generate_expr(&expr).unwrap();
    let ops = gen.finish().build();

    let columns: Vec<(i32, i32)> = ops
        .iter()
        .filter(|op| op.opcode == Opcode::Column)
        .map(|op| (op.p1, op.p2))
        .collect();
    // users.age is cursor 0 column 2; posts.author_id cursor 1 column 1
    assert_eq!(columns, vec![(0, 2), (1, 1)]);
}

#[test]
fn unqualified_column_resolves_against_schema() {
    let mut schema = Schema::new();
    match parse_single("CREATE TABLE users (id INTEGER, name TEXT)").unwrap() {
        Stmt::CreateTable(ct) => schema.create_table(&ct).unwrap(),
        other => panic!("expected create table, got {:?}", other),
    }

    let expr = parse_expression("name").unwrap();
    let mut gen = CodeGenerator::with_schema(&schema);
    gen.register_cursor("users", 3);
    gen.generate_expr(&expr).unwrap();
    let ops = gen.finish().build();

    assert_eq!(ops[0].opcode, Opcode::Column);
    assert_eq!(ops[0].p1, 3);
    assert_eq!(ops[0].p2, 1);
    assert_eq!(ops[0].comment.as_deref(), Some("users.name"));
}

#[test]
fn stub_column_index_records_name_in_comment() {
    let ops = generate("t.salary");
    assert_eq!(ops[0].opcode, Opcode::Column);
    assert_eq!(ops[0].p2, 0);
    assert_eq!(ops[0].comment.as_deref(), Some("t.salary"));
}

#[test]
fn unknown_table_is_an_error() {
    let expr = parse_expression("nowhere.x").unwrap();
    let mut gen = CodeGenerator::new();
    gen.register_cursor("t", 0);
    let err = gen.generate_expr(&expr).unwrap_err();
    assert_eq!(err.to_string(), "unknown table: nowhere");
    // The failed expression aborts; the caller discards the partial
    // program by convention
}

#[test]
fn where_clause_wrapper() {
    let stmt = parse_single("SELECT * FROM t WHERE x > 5").unwrap();
    let where_expr = match &stmt {
        Stmt::Select(sel) => match &sel.body {
            sqlfront::parser::ast::SelectBody::Select(core) => {
                core.where_clause.as_deref().unwrap()
            }
            other => panic!("expected select core, got {:?}", other),
        },
        other => panic!("expected select, got {:?}", other),
    };

    let mut gen = CodeGenerator::new();
    gen.register_cursor("t", 0);
    let addr = gen
        .generate_where_clause(Some(where_expr), 0)
        .unwrap()
        .unwrap();
    gen.patch_jump(addr);
    let builder = gen.finish();

    let ops = builder.ops();
    assert_eq!(ops[addr as usize].opcode, Opcode::IfNot);
    assert_eq!(ops[addr as usize].p2, ops.len() as i32);
}

#[test]
fn explain_listing_shows_comments() {
    let mut schema = Schema::new();
    match parse_single("CREATE TABLE t (a INT, b INT)").unwrap() {
        Stmt::CreateTable(ct) => schema.create_table(&ct).unwrap(),
        other => panic!("expected create table, got {:?}", other),
    }

    let expr = parse_expression("t.a + t.b").unwrap();
    let mut gen = CodeGenerator::with_schema(&schema);
    gen.register_cursor("t", 0);
    gen.generate_expr(&expr).unwrap();
    let listing = gen.finish().explain();

    assert!(listing.contains("Column"));
    assert!(listing.contains("Add"));
    assert!(listing.contains("t.a"));
    assert!(listing.contains("t.b"));
}

#[test]
fn register_pool_covers_all_registers() {
    let expr = parse_expression("1 + 2 + 3 + 4 + 5").unwrap();
    let mut gen = CodeGenerator::new();
    gen.generate_expr(&expr).unwrap();
    let builder = gen.finish();

    let max_reg = builder
        .ops()
        .iter()
        .flat_map(|op| {
            // Registers appear in p1/p2/p3 depending on the opcode;
            // the pool must cover the largest of them
            [op.p1, op.p2, op.p3]
        })
        .max()
        .unwrap_or(0);
    assert!(builder.num_mem() >= max_reg);
}

#[test]
fn emission_order_is_postorder() {
    // left operand's instructions come before the right's, which come
    // before the operator
    let ops = generate("(1 + 2) * (3 - 4)");
    let kinds = opcodes(&ops);
    assert_eq!(
        kinds,
        vec![
            Opcode::Integer,
            Opcode::Integer,
            Opcode::Add,
            Opcode::Integer,
            Opcode::Integer,
            Opcode::Subtract,
            Opcode::Multiply,
        ]
    );
}

#[test]
fn count_star_is_a_constant_placeholder() {
    let ops = generate("count(*)");
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].opcode, Opcode::Integer);
    assert_eq!(ops[0].p1, 1);
}
