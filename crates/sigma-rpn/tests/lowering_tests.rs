//! Structural tests for AST-to-RPN lowering: the concrete pipeline
//! scenarios, control-flow shapes, label resolution, and slot assignment.

use sigma_analysis::analyze;
use sigma_parser::parse;
use sigma_rpn::instruction::Operand;
use sigma_rpn::{generate, Opcode, Program};

fn lower(source: &str) -> Program {
    let parsed = parse(source);
    assert!(
        parsed.ok(),
        "parse errors: {:?}",
        parsed.formatted_errors(source)
    );
    let semantic = analyze(&parsed.unit);
    assert!(semantic.ok(), "semantic errors: {:?}", semantic.errors);
    generate(&parsed.unit, &semantic)
}

/// Render `OPCODE operand` per instruction for structural comparison.
fn listing(program: &Program) -> Vec<String> {
    program
        .instructions
        .iter()
        .map(|i| i.to_string())
        .collect()
}

// ── Pipeline scenarios ─────────────────────────────────────────────────

#[test]
fn single_declaration() {
    let program = lower("int x = 10;");
    assert_eq!(listing(&program), vec!["PUSH 10", "STORE x", "HALT"]);
}

#[test]
fn addition() {
    let program = lower("int r = 10 + 5;");
    assert_eq!(
        listing(&program),
        vec!["PUSH 10", "PUSH 5", "ADD", "STORE r", "HALT"]
    );
}

#[test]
fn multiplicative_binds_tighter() {
    let program = lower("int r = 10 * 5 + 3;");
    assert_eq!(
        listing(&program),
        vec!["PUSH 10", "PUSH 5", "MUL", "PUSH 3", "ADD", "STORE r", "HALT"]
    );
}

#[test]
fn if_else_shape() {
    let program = lower("int x = 5; int y = 0; if (x > 0) y = 1; else y = 2;");
    assert_eq!(
        listing(&program),
        vec![
            "PUSH 5",
            "STORE x",
            "PUSH 0",
            "STORE y",
            "LOAD x",
            "PUSH 0",
            "GT",
            "JUMP_IF_FALSE else_0",
            "PUSH 1",
            "STORE y",
            "JUMP end_if_1",
            "LABEL else_0",
            "PUSH 2",
            "STORE y",
            "LABEL end_if_1",
            "HALT",
        ]
    );
}

#[test]
fn while_shape() {
    let program = lower("int i = 0; while (i < 3) i = i + 1;");
    assert_eq!(
        listing(&program),
        vec![
            "PUSH 0",
            "STORE i",
            "LABEL while_start_0",
            "LOAD i",
            "PUSH 3",
            "LT",
            "JUMP_IF_FALSE while_end_1",
            "LOAD i",
            "PUSH 1",
            "ADD",
            "STORE i",
            "JUMP while_start_0",
            "LABEL while_end_1",
            "HALT",
        ]
    );
}

#[test]
fn print_lowers_to_call() {
    let program = lower("println(\"hi\");");
    assert_eq!(
        listing(&program),
        vec!["PUSH \"hi\"", "CALL println/1", "HALT"]
    );
}

#[test]
fn expression_statement_pops_its_value() {
    let program = lower("int f() { return 1; } f();");
    // The call result is discarded; the method body follows HALT.
    assert_eq!(
        listing(&program),
        vec![
            "CALL f/0",
            "POP",
            "HALT",
            "LABEL method_f",
            "PUSH 1",
            "RETURN",
        ]
    );
}

#[test]
fn void_call_statement_does_not_pop() {
    let program = lower("void f() { } f();");
    assert_eq!(
        listing(&program),
        vec!["CALL f/0", "HALT", "LABEL method_f", "RETURN_VOID"]
    );
}

#[test]
fn new_instance_shape() {
    let program = lower("class P { int x; } P p = new P();");
    assert_eq!(
        listing(&program),
        vec!["NEW P", "DUP", "INVOKESPECIAL <init>/0", "STORE p", "HALT"]
    );
}

// ── Methods ────────────────────────────────────────────────────────────

#[test]
fn method_body_is_labeled_and_deferred() {
    let program = lower("int x = 1; int twice(int n) { return n * 2; }");
    assert_eq!(
        listing(&program),
        vec![
            "PUSH 1",
            "STORE x",
            "HALT",
            "LABEL method_twice",
            "LOAD n",
            "PUSH 2",
            "MUL",
            "RETURN",
        ]
    );
    assert_eq!(program.labels["method_twice"], 3);
}

#[test]
fn void_method_gets_implicit_return() {
    let program = lower("void hello() { println(\"hi\"); }");
    let listing = listing(&program);
    assert_eq!(
        listing,
        vec![
            "HALT",
            "LABEL method_hello",
            "PUSH \"hi\"",
            "CALL println/1",
            "RETURN_VOID",
        ]
    );
}

#[test]
fn void_method_with_explicit_return_gets_no_second_one() {
    let program = lower("void f() { return; }");
    let returns = program
        .opcodes()
        .iter()
        .filter(|op| **op == Opcode::ReturnVoid)
        .count();
    assert_eq!(returns, 1);
}

#[test]
fn class_methods_use_qualified_labels_and_this() {
    let source = "class Counter {
        int count;
        void bump() { count = count + 1; }
    }";
    let program = lower(source);
    assert_eq!(
        listing(&program),
        vec![
            "HALT",
            "LABEL method_Counter_bump",
            "LOAD this",
            "LOAD this",
            "GET_FIELD count",
            "PUSH 1",
            "ADD",
            "SET_FIELD count",
            "RETURN_VOID",
        ]
    );
    // `this` occupies slot 0.
    let load_this = &program.instructions[2];
    assert_eq!(load_this.slot, Some(0));
}

#[test]
fn method_call_lowers_receiver_before_arguments() {
    let source = "class P { void m(int a) { } } P p = new P(); p.m(7);";
    let program = lower(source);
    let listing = listing(&program);
    let call_at = listing
        .iter()
        .position(|l| l == "CALL m/1")
        .expect("member call emitted");
    assert_eq!(listing[call_at - 2], "LOAD p");
    assert_eq!(listing[call_at - 1], "PUSH 7");
}

// ── Slots ──────────────────────────────────────────────────────────────

#[test]
fn parameter_and_local_slots() {
    let source = "int f(int a, double d) { int i = 0; return a; }";
    let program = lower(source);
    // a=0, d=1..2 (wide), i=3 in a static method.
    let slot_of = |name: &str| {
        program
            .instructions
            .iter()
            .find(|i| {
                matches!(&i.operand, Some(Operand::Name(n)) if n == name)
                    && matches!(i.opcode, Opcode::Store | Opcode::Load)
            })
            .and_then(|i| i.slot)
    };
    assert_eq!(slot_of("i"), Some(3));
    assert_eq!(slot_of("a"), Some(0));
}

#[test]
fn sibling_methods_get_fresh_allocators() {
    let source = "int f(int a) { return a; } int g(int b) { return b; }";
    let program = lower(source);
    let slots: Vec<_> = program
        .instructions
        .iter()
        .filter(|i| i.opcode == Opcode::Load)
        .map(|i| i.slot)
        .collect();
    // Both parameters land in slot 0 of their own frame.
    assert_eq!(slots, vec![Some(0), Some(0)]);
}

// ── Invariants ─────────────────────────────────────────────────────────

#[test]
fn every_jump_target_is_a_known_label() {
    let source = "int i = 0;
        while (i < 10) {
            if (i % 2 == 0) print(i); else print(0);
            i = i + 1;
        }";
    let program = lower(source);
    for instruction in &program.instructions {
        if instruction.opcode.is_jump() {
            let target = instruction.label_name().unwrap();
            assert!(
                program.labels.contains_key(target),
                "unresolved jump target {target}"
            );
        }
    }
}

#[test]
fn instructions_follow_structured_walk_order() {
    // Nested while inside if: labels must nest without interleaving.
    let source = "int i = 0; if (i == 0) { while (i < 2) i = i + 1; }";
    let program = lower(source);
    let names: Vec<_> = program
        .instructions
        .iter()
        .filter(|i| i.opcode == Opcode::Label)
        .filter_map(|i| i.label_name().map(str::to_string))
        .collect();
    assert_eq!(names, vec!["while_start_2", "while_end_3", "else_0", "end_if_1"]);
}

#[test]
fn empty_program_is_just_halt() {
    let program = lower("");
    assert_eq!(listing(&program), vec!["HALT"]);
}
