//! AST to RPN lowering.
//!
//! A single pass over the AST in classic postfix order: children in source
//! order, operator last. Control flow becomes labels and conditional
//! jumps, allocated from one monotonic counter salted with a category
//! prefix. Top-level statements lower in source order and end with `HALT`;
//! method and class bodies are deferred after that barrier as labeled
//! regions.
//!
//! Anything that reaches this module after semantic analysis rejected it
//! (a `for..in` loop, a call to a non-callable) is an internal compiler
//! error and panics.

use sigma_analysis::ty::Ty;
use sigma_analysis::SemanticResult;
use sigma_common::span::Span;
use sigma_parser::ast::{BinOp, CompilationUnit, Expr, ExprKind, MethodDecl, Stmt, UnaryOp};

use crate::instruction::{Instruction, Opcode, Operand};
use crate::program::{Program, ProgramBuilder};
use crate::slots::{SlotAllocator, THIS};

/// Lower an analyzed compilation unit into an RPN program.
///
/// The caller is expected to have run semantic analysis and bailed on
/// errors; lowering an erroneous AST may panic.
pub fn generate(unit: &CompilationUnit, semantic: &SemanticResult) -> Program {
    let mut generator = Generator::new(semantic);

    // Top-level statements first; method and class bodies become labeled
    // regions after the HALT barrier.
    let mut deferred: Vec<&Stmt> = Vec::new();
    for stmt in &unit.stmts {
        match stmt {
            Stmt::Method(_) | Stmt::Class { .. } => deferred.push(stmt),
            other => generator.lower_stmt(other),
        }
    }
    generator.emit(Instruction::simple(
        Opcode::Halt,
        Span::point(unit.span.end),
    ));

    for stmt in deferred {
        match stmt {
            Stmt::Method(m) => generator.lower_method(m, false, None),
            Stmt::Class { name, members, .. } => generator.lower_class(name, members),
            _ => unreachable!("only methods and classes are deferred"),
        }
    }

    generator.builder.build(semantic.table.clone())
}

struct Generator<'a> {
    semantic: &'a SemanticResult,
    builder: ProgramBuilder,
    /// Monotonic counter shared by every label category.
    labels: u32,
    /// One allocator per enclosing method, plus the root for top-level
    /// code. Pushed and popped in lockstep with method lowering.
    allocators: Vec<SlotAllocator>,
    /// Class whose methods are currently being lowered.
    current_class: Option<&'a str>,
}

impl<'a> Generator<'a> {
    fn new(semantic: &'a SemanticResult) -> Self {
        Self {
            semantic,
            builder: ProgramBuilder::new(),
            labels: 0,
            allocators: vec![SlotAllocator::new(false)],
            current_class: None,
        }
    }

    fn emit(&mut self, instruction: Instruction) {
        self.builder.push(instruction);
    }

    fn fresh_label(&mut self, prefix: &str) -> String {
        let n = self.labels;
        self.labels += 1;
        format!("{prefix}_{n}")
    }

    fn alloc(&mut self) -> &mut SlotAllocator {
        self.allocators
            .last_mut()
            .expect("allocator stack is never empty")
    }

    fn ty_of(&self, expr: &Expr) -> Ty {
        self.semantic.ty_of(expr.id)
    }

    /// Whether `name`, unresolved as a local, is a field of the class
    /// whose instance method is currently being lowered.
    fn is_instance_field(&self, name: &str) -> bool {
        let Some(class) = self.current_class else {
            return false;
        };
        let in_instance_method = self
            .allocators
            .last()
            .is_some_and(SlotAllocator::is_instance);
        in_instance_method
            && self
                .semantic
                .registry
                .class(class)
                .is_some_and(|info| info.fields.contains_key(name))
    }

    fn load_this(&mut self, span: Span) -> Instruction {
        let class_ty = self
            .current_class
            .map(|c| Ty::Class(c.to_string()))
            .unwrap_or(Ty::Error);
        Instruction::new(
            Opcode::Load,
            Some(Operand::Name(THIS.to_string())),
            Some(class_ty),
            span,
        )
        .with_slot(0)
    }

    // ── Statements ─────────────────────────────────────────────────────

    fn lower_stmt(&mut self, stmt: &'a Stmt) {
        match stmt {
            Stmt::VarDecl {
                ty,
                name,
                init,
                span,
                ..
            } => {
                let var_ty = self.semantic.registry.resolve(&ty.name);
                let slot = self.alloc().allocate(name, &var_ty);
                if let Some(init) = init {
                    self.lower_expr(init);
                    self.emit(
                        Instruction::new(
                            Opcode::Store,
                            Some(Operand::Name(name.clone())),
                            Some(var_ty),
                            *span,
                        )
                        .with_slot(slot),
                    );
                }
            }

            Stmt::Assign { name, value, span } => {
                if self.alloc().slot_of(name).is_none() && self.is_instance_field(name) {
                    // Field assignment: receiver, value, SET_FIELD.
                    let this = self.load_this(*span);
                    self.emit(this);
                    self.lower_expr(value);
                    self.emit(Instruction::new(
                        Opcode::SetField,
                        Some(Operand::Name(name.clone())),
                        Some(self.ty_of(value)),
                        *span,
                    ));
                } else {
                    self.lower_expr(value);
                    let instruction = Instruction::new(
                        Opcode::Store,
                        Some(Operand::Name(name.clone())),
                        Some(self.ty_of(value)),
                        *span,
                    );
                    let instruction = match self.alloc().slot_of(name) {
                        Some(slot) => instruction.with_slot(slot),
                        None => instruction,
                    };
                    self.emit(instruction);
                }
            }

            Stmt::Expr { expr, .. } => {
                self.lower_expr(expr);
                // A void call leaves nothing on the stack to discard.
                if self.ty_of(expr) != Ty::Void {
                    self.emit(Instruction::simple(Opcode::Pop, expr.span));
                }
            }

            Stmt::Print {
                newline,
                expr,
                span,
            } => {
                self.lower_expr(expr);
                let name = if *newline { "println" } else { "print" };
                self.emit(Instruction::new(
                    Opcode::Call,
                    Some(Operand::Call {
                        name: name.to_string(),
                        argc: 1,
                    }),
                    Some(Ty::Void),
                    *span,
                ));
            }

            Stmt::If {
                cond,
                then_branch,
                else_branch,
                span,
            } => {
                let else_label = self.fresh_label("else");
                let end_label = self.fresh_label("end_if");

                self.lower_expr(cond);
                self.emit(self.jump(Opcode::JumpIfFalse, &else_label, *span));
                self.lower_stmt(then_branch);
                self.emit(self.jump(Opcode::Jump, &end_label, *span));
                self.emit(self.label(&else_label, *span));
                if let Some(else_branch) = else_branch {
                    self.lower_stmt(else_branch);
                }
                self.emit(self.label(&end_label, *span));
            }

            Stmt::While { cond, body, span } => {
                let start_label = self.fresh_label("while_start");
                let end_label = self.fresh_label("while_end");

                self.emit(self.label(&start_label, *span));
                self.lower_expr(cond);
                self.emit(self.jump(Opcode::JumpIfFalse, &end_label, *span));
                self.lower_stmt(body);
                self.emit(self.jump(Opcode::Jump, &start_label, *span));
                self.emit(self.label(&end_label, *span));
            }

            Stmt::Return { value, span } => match value {
                Some(value) => {
                    self.lower_expr(value);
                    self.emit(Instruction::simple(Opcode::Return, *span));
                }
                None => {
                    self.emit(Instruction::simple(Opcode::ReturnVoid, *span));
                }
            },

            Stmt::Block { stmts, .. } => {
                for stmt in stmts {
                    self.lower_stmt(stmt);
                }
            }

            Stmt::ForEach { .. } => {
                panic!(
                    "for-in loop reached the IR generator. \
                     This indicates a bug in the semantic analyzer."
                );
            }

            // A method or class nested in statement position: lower it as
            // a labeled region and jump over it so fall-through execution
            // skips the body.
            Stmt::Method(m) => {
                let skip = self.fresh_label("after_method");
                self.emit(self.jump(Opcode::Jump, &skip, m.span));
                self.lower_method(m, false, None);
                self.emit(self.label(&skip, m.span));
            }
            Stmt::Class {
                name,
                members,
                span,
            } => {
                let skip = self.fresh_label("after_class");
                self.emit(self.jump(Opcode::Jump, &skip, *span));
                self.lower_class(name, members);
                self.emit(self.label(&skip, *span));
            }

            // Fields contribute to the class symbol; object layout is the
            // backend's concern.
            Stmt::Field { .. } => {}
        }
    }

    fn jump(&self, opcode: Opcode, target: &str, span: Span) -> Instruction {
        Instruction::new(opcode, Some(Operand::Name(target.to_string())), None, span)
    }

    fn label(&self, name: &str, span: Span) -> Instruction {
        Instruction::new(
            Opcode::Label,
            Some(Operand::Name(name.to_string())),
            None,
            span,
        )
    }

    // ── Methods and classes ────────────────────────────────────────────

    fn lower_method(&mut self, m: &'a MethodDecl, is_instance: bool, class: Option<&'a str>) {
        let label_name = match class {
            Some(class) => format!("method_{class}_{}", m.name),
            None => format!("method_{}", m.name),
        };
        self.emit(self.label(&label_name, m.span));

        self.allocators.push(SlotAllocator::new(is_instance));

        for param in &m.params {
            let ty = self.semantic.registry.resolve(&param.ty.name);
            self.alloc().allocate(&param.name, &ty);
        }
        for stmt in &m.body {
            self.lower_stmt(stmt);
        }

        // Implicit return for void methods that fell off the end.
        if m.return_ty.name == "void"
            && !matches!(
                self.builder.last_opcode(),
                Some(Opcode::Return | Opcode::ReturnVoid)
            )
        {
            self.emit(Instruction::simple(
                Opcode::ReturnVoid,
                Span::point(m.span.end),
            ));
        }

        self.allocators.pop();
    }

    fn lower_class(&mut self, name: &'a str, members: &'a [Stmt]) {
        let saved = self.current_class.replace(name);
        for member in members {
            if let Stmt::Method(m) = member {
                self.lower_method(m, true, Some(name));
            }
        }
        self.current_class = saved;
    }

    // ── Expressions ────────────────────────────────────────────────────

    /// Classic RPN: children in source order, operator last.
    fn lower_expr(&mut self, expr: &'a Expr) {
        match &expr.kind {
            ExprKind::Int(value) => self.push_literal(Operand::Int(*value), Ty::Int, expr.span),
            ExprKind::Double(value) => {
                self.push_literal(Operand::Double(*value), Ty::Double, expr.span)
            }
            ExprKind::Str(value) => {
                self.push_literal(Operand::Str(value.clone()), Ty::Str, expr.span)
            }
            ExprKind::Bool(value) => {
                self.push_literal(Operand::Bool(*value), Ty::Boolean, expr.span)
            }
            ExprKind::Null => self.push_literal(Operand::Null, Ty::Null, expr.span),

            ExprKind::Ident(name) => {
                if let Some(slot) = self.alloc().slot_of(name) {
                    self.emit(
                        Instruction::new(
                            Opcode::Load,
                            Some(Operand::Name(name.clone())),
                            Some(self.ty_of(expr)),
                            expr.span,
                        )
                        .with_slot(slot),
                    );
                } else if self.is_instance_field(name) {
                    let this = self.load_this(expr.span);
                    self.emit(this);
                    self.emit(Instruction::new(
                        Opcode::GetField,
                        Some(Operand::Name(name.clone())),
                        Some(self.ty_of(expr)),
                        expr.span,
                    ));
                } else {
                    // A name without a local slot: the backend resolves it.
                    self.emit(Instruction::new(
                        Opcode::Load,
                        Some(Operand::Name(name.clone())),
                        Some(self.ty_of(expr)),
                        expr.span,
                    ));
                }
            }

            ExprKind::Binary { op, lhs, rhs } => {
                self.lower_expr(lhs);
                self.lower_expr(rhs);
                self.emit(Instruction::new(
                    binary_opcode(*op),
                    None,
                    Some(self.ty_of(expr)),
                    expr.span,
                ));
            }

            ExprKind::Unary { op, operand } => {
                self.lower_expr(operand);
                let opcode = match op {
                    UnaryOp::Neg => Opcode::Neg,
                    UnaryOp::Not => Opcode::Not,
                };
                self.emit(Instruction::new(
                    opcode,
                    None,
                    Some(self.ty_of(expr)),
                    expr.span,
                ));
            }

            ExprKind::Call { callee, args } => match &callee.kind {
                ExprKind::Ident(name) => {
                    for arg in args {
                        self.lower_expr(arg);
                    }
                    self.emit(Instruction::new(
                        Opcode::Call,
                        Some(Operand::Call {
                            name: name.clone(),
                            argc: args.len(),
                        }),
                        Some(self.ty_of(expr)),
                        expr.span,
                    ));
                }
                ExprKind::Member { object, name } => {
                    // Receiver first, then the arguments.
                    self.lower_expr(object);
                    for arg in args {
                        self.lower_expr(arg);
                    }
                    self.emit(Instruction::new(
                        Opcode::Call,
                        Some(Operand::Call {
                            name: name.clone(),
                            argc: args.len(),
                        }),
                        Some(self.ty_of(expr)),
                        expr.span,
                    ));
                }
                _ => panic!(
                    "call target is neither a name nor a member access. \
                     This indicates a bug in the semantic analyzer."
                ),
            },

            ExprKind::Member { object, name } => {
                self.lower_expr(object);
                self.emit(Instruction::new(
                    Opcode::GetField,
                    Some(Operand::Name(name.clone())),
                    Some(self.ty_of(expr)),
                    expr.span,
                ));
            }

            ExprKind::New { class_name, args } => {
                self.emit(Instruction::new(
                    Opcode::New,
                    Some(Operand::Name(class_name.clone())),
                    Some(Ty::Class(class_name.clone())),
                    expr.span,
                ));
                self.emit(Instruction::simple(Opcode::Dup, expr.span));
                for arg in args {
                    self.lower_expr(arg);
                }
                self.emit(Instruction::new(
                    Opcode::InvokeSpecial,
                    Some(Operand::Call {
                        name: "<init>".to_string(),
                        argc: args.len(),
                    }),
                    None,
                    expr.span,
                ));
            }
        }
    }

    fn push_literal(&mut self, operand: Operand, ty: Ty, span: Span) {
        self.emit(Instruction::new(Opcode::Push, Some(operand), Some(ty), span));
    }
}

fn binary_opcode(op: BinOp) -> Opcode {
    match op {
        BinOp::Add => Opcode::Add,
        BinOp::Sub => Opcode::Sub,
        BinOp::Mul => Opcode::Mul,
        BinOp::Div => Opcode::Div,
        BinOp::Mod => Opcode::Mod,
        BinOp::Pow => Opcode::Pow,
        BinOp::Eq => Opcode::Eq,
        BinOp::NotEq => Opcode::Ne,
        BinOp::Lt => Opcode::Lt,
        BinOp::LtEq => Opcode::Le,
        BinOp::Gt => Opcode::Gt,
        BinOp::GtEq => Opcode::Ge,
        BinOp::And => Opcode::And,
        BinOp::Or => Opcode::Or,
    }
}
