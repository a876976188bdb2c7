//! Two-pass semantic analysis.
//!
//! Pass 1 walks only the top-level declarations: every class name lands in
//! the type registry and every top-level class and method gets a global
//! symbol, so forward references between methods and types in the same
//! compilation unit resolve. Pass 2 is the full traversal: it enters and
//! exits scopes around classes, methods, and blocks, defines symbols,
//! types every expression into the expression-type map, and accumulates
//! diagnostics.
//!
//! A sub-expression that fails to type gets exactly one diagnostic and the
//! type `Error`; everything containing it types as `Error` silently.

use rustc_hash::FxHashMap;

use sigma_common::span::Span;
use sigma_parser::ast::{
    BinOp, CompilationUnit, Expr, ExprId, ExprKind, MethodDecl, Stmt, TypeName, UnaryOp,
};

use crate::error::{SemanticError, SemanticWarning};
use crate::registry::{ClassInfo, MethodSig, TypeRegistry};
use crate::symbol::{Symbol, SymbolKind};
use crate::table::{ScopeKind, SymbolTable};
use crate::ty::Ty;

/// Everything semantic analysis produces.
pub struct SemanticResult {
    pub table: SymbolTable,
    pub registry: TypeRegistry,
    /// Resolved type of every expression, keyed by parse-time identity.
    pub expr_types: FxHashMap<ExprId, Ty>,
    pub errors: Vec<SemanticError>,
    pub warnings: Vec<SemanticWarning>,
}

impl SemanticResult {
    /// Whether analysis found no errors (warnings don't count).
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// The resolved type of an expression, `Error` if it was never typed.
    pub fn ty_of(&self, id: ExprId) -> Ty {
        self.expr_types.get(&id).cloned().unwrap_or(Ty::Error)
    }
}

/// Analyze a compilation unit.
pub fn analyze(unit: &CompilationUnit) -> SemanticResult {
    let mut analyzer = Analyzer::new();
    analyzer.declare_top_level(unit);
    for stmt in &unit.stmts {
        analyzer.visit_stmt(stmt, true);
    }
    debug_assert_eq!(
        analyzer.table.depth(),
        1,
        "scope stack must unwind to the global scope"
    );
    SemanticResult {
        table: analyzer.table,
        registry: analyzer.registry,
        expr_types: analyzer.expr_types,
        errors: analyzer.errors,
        warnings: analyzer.warnings,
    }
}

struct Analyzer {
    table: SymbolTable,
    registry: TypeRegistry,
    expr_types: FxHashMap<ExprId, Ty>,
    errors: Vec<SemanticError>,
    warnings: Vec<SemanticWarning>,
    /// Return type of the method currently being analyzed.
    current_ret: Option<Ty>,
    /// Name of the class currently being analyzed.
    current_class: Option<String>,
}

impl Analyzer {
    fn new() -> Self {
        Self {
            table: SymbolTable::new(),
            registry: TypeRegistry::new(),
            expr_types: FxHashMap::default(),
            errors: Vec::new(),
            warnings: Vec::new(),
            current_ret: None,
            current_class: None,
        }
    }

    fn error(&mut self, error: SemanticError) {
        self.errors.push(error);
    }

    // ── Pass 1: declarations ───────────────────────────────────────────

    /// Register all top-level class names, then class member tables and
    /// top-level method signatures, then the matching global symbols.
    fn declare_top_level(&mut self, unit: &CompilationUnit) {
        for stmt in &unit.stmts {
            if let Stmt::Class { name, span, .. } = stmt {
                self.registry.declare_class(name, *span);
            }
        }

        for stmt in &unit.stmts {
            match stmt {
                Stmt::Class {
                    name,
                    members,
                    span,
                } => {
                    let info = self.collect_class_info(members, *span);
                    self.registry.define_class(name, info);
                    self.define_checked(Symbol::class(name.clone(), *span));
                }
                Stmt::Method(m) => {
                    let sym = self.method_symbol(m);
                    self.define_checked(sym);
                }
                _ => {}
            }
        }
    }

    /// Build a class's member table. Types resolve quietly here: the
    /// diagnostics for undefined member types are emitted in pass 2 where
    /// the declarations are visited.
    fn collect_class_info(&self, members: &[Stmt], span: Span) -> ClassInfo {
        let mut info = ClassInfo::new(span);
        for member in members {
            match member {
                Stmt::Field { ty, name, .. } => {
                    info.fields
                        .insert(name.clone(), self.registry.resolve(&ty.name));
                }
                Stmt::Method(m) => {
                    info.methods.insert(
                        m.name.clone(),
                        MethodSig {
                            params: m
                                .params
                                .iter()
                                .map(|p| self.registry.resolve(&p.ty.name))
                                .collect(),
                            ret: self.registry.resolve(&m.return_ty.name),
                        },
                    );
                }
                _ => {}
            }
        }
        info
    }

    fn method_symbol(&self, m: &MethodDecl) -> Symbol {
        Symbol::method(
            m.name.clone(),
            self.registry.resolve(&m.return_ty.name),
            m.params
                .iter()
                .map(|p| self.registry.resolve(&p.ty.name))
                .collect(),
            m.span,
        )
    }

    /// Define a symbol, reporting a duplicate-definition error on clash.
    fn define_checked(&mut self, symbol: Symbol) {
        let span = symbol.span;
        let name = symbol.name.clone();
        if let Err(previous) = self.table.define(symbol) {
            self.error(SemanticError::DuplicateDefinition {
                name,
                span,
                previous: previous.span,
            });
        }
    }

    // ── Pass 2: statements ─────────────────────────────────────────────

    /// Visit one statement. `predeclared` is true for top-level statements
    /// whose symbols were already defined by pass 1.
    fn visit_stmt(&mut self, stmt: &Stmt, predeclared: bool) {
        match stmt {
            Stmt::VarDecl {
                ty,
                name,
                init,
                is_const,
                span,
            } => self.visit_var_decl(ty, name, init.as_ref(), *is_const, *span),

            Stmt::Assign { name, value, span } => self.visit_assign(name, value, *span),

            Stmt::Expr { expr, .. } => {
                self.visit_expr(expr);
            }

            Stmt::Print { expr, .. } => {
                let ty = self.visit_expr(expr);
                if !ty.is_printable() {
                    self.error(SemanticError::NotPrintable {
                        ty,
                        span: expr.span,
                    });
                }
            }

            Stmt::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                self.check_condition(cond);
                self.visit_in_block_scope(then_branch);
                if let Some(else_branch) = else_branch {
                    self.visit_in_block_scope(else_branch);
                }
            }

            Stmt::While { cond, body, .. } => {
                self.check_condition(cond);
                self.visit_in_block_scope(body);
            }

            Stmt::ForEach {
                var,
                iterable,
                body,
                span,
                ..
            } => {
                // Syntax exists; semantics do not. Reject, but keep
                // analyzing the pieces so one diagnostic doesn't hide
                // others.
                self.error(SemanticError::ForInUnsupported { span: *span });
                self.visit_expr(iterable);
                self.table.enter(ScopeKind::Block);
                self.define_checked(Symbol::variable(var.clone(), Ty::Error, *span));
                self.visit_stmt(body, false);
                self.table.exit();
            }

            Stmt::Return { value, span } => self.visit_return(value.as_ref(), *span),

            Stmt::Block { stmts, .. } => {
                self.table.enter(ScopeKind::Block);
                for stmt in stmts {
                    self.visit_stmt(stmt, false);
                }
                self.table.exit();
            }

            Stmt::Method(m) => self.visit_method(m, predeclared),

            Stmt::Class {
                name,
                members,
                span,
            } => self.visit_class(name, members, *span, predeclared),

            Stmt::Field {
                ty,
                name,
                init,
                span,
            } => self.visit_field(ty, name, init.as_ref(), *span),
        }
    }

    fn visit_var_decl(
        &mut self,
        ty: &TypeName,
        name: &str,
        init: Option<&Expr>,
        is_const: bool,
        span: Span,
    ) {
        let declared = self.resolve_type_checked(ty);

        if let Some(init) = init {
            let found = self.visit_expr(init);
            if !found.is_compatible_with(&declared) {
                self.error(SemanticError::TypeMismatch {
                    expected: declared.clone(),
                    found,
                    span: init.span,
                });
            }
        } else if is_const {
            self.error(SemanticError::ConstantWithoutInitializer {
                name: name.to_string(),
                span,
            });
        } else if declared != Ty::Boolean && declared != Ty::Error {
            self.warnings.push(SemanticWarning::UninitializedVariable {
                name: name.to_string(),
                ty: declared.clone(),
                span,
            });
        }

        let symbol = if is_const {
            Symbol::constant(name, declared, span)
        } else {
            Symbol::variable(name, declared, span)
        };
        self.define_checked(symbol);
    }

    fn visit_assign(&mut self, name: &str, value: &Expr, span: Span) {
        // Resolve the target first so diagnostics stay in source order.
        let target = self.table.lookup(name).cloned();
        if target.is_none() {
            self.error(SemanticError::UndefinedIdentifier {
                name: name.to_string(),
                span,
            });
        }

        let found = self.visit_expr(value);

        let Some(target) = target else {
            return;
        };

        if target.kind == SymbolKind::Constant {
            self.error(SemanticError::ConstantReassignment {
                name: name.to_string(),
                span,
                defined: target.span,
            });
            return;
        }
        if !target.is_assignable() {
            self.error(SemanticError::NotAssignable {
                name: name.to_string(),
                span,
            });
            return;
        }
        if !found.is_compatible_with(&target.ty) {
            self.error(SemanticError::TypeMismatch {
                expected: target.ty,
                found,
                span: value.span,
            });
        }
    }

    fn check_condition(&mut self, cond: &Expr) {
        let ty = self.visit_expr(cond);
        if ty != Ty::Boolean && ty != Ty::Error {
            self.error(SemanticError::ConditionType {
                found: ty,
                span: cond.span,
            });
        }
    }

    /// Visit a branch or loop body inside its own block scope.
    fn visit_in_block_scope(&mut self, stmt: &Stmt) {
        self.table.enter(ScopeKind::Block);
        self.visit_stmt(stmt, false);
        self.table.exit();
    }

    fn visit_return(&mut self, value: Option<&Expr>, span: Span) {
        let Some(expected) = self.current_ret.clone() else {
            if let Some(value) = value {
                self.visit_expr(value);
            }
            self.error(SemanticError::ReturnOutsideMethod { span });
            return;
        };

        match value {
            None => {
                if expected != Ty::Void {
                    self.error(SemanticError::ReturnTypeMismatch {
                        expected,
                        found: Ty::Void,
                        span,
                    });
                }
            }
            Some(value) => {
                let found = self.visit_expr(value);
                if expected == Ty::Void || !found.is_compatible_with(&expected) {
                    self.error(SemanticError::ReturnTypeMismatch {
                        expected,
                        found,
                        span: value.span,
                    });
                }
            }
        }
    }

    fn visit_method(&mut self, m: &MethodDecl, predeclared: bool) {
        if !predeclared {
            let mut sym = self.method_symbol(m);
            if let Some(class) = &self.current_class {
                sym.owner = Some(class.clone());
            }
            self.define_checked(sym);
        }
        self.analyze_method_body(m);
    }

    fn visit_class(&mut self, name: &str, members: &[Stmt], span: Span, predeclared: bool) {
        if !predeclared {
            // A class declared in a nested position: register late.
            // Forward references to it from earlier code will not resolve.
            self.registry.declare_class(name, span);
            let info = self.collect_class_info(members, span);
            self.registry.define_class(name, info);
            self.define_checked(Symbol::class(name.to_string(), span));
        }

        let saved_class = self.current_class.replace(name.to_string());
        self.table.enter(ScopeKind::Class);

        // All member symbols first, so a method body can reference a field
        // or method declared after it.
        for member in members {
            match member {
                Stmt::Field {
                    ty,
                    name: field_name,
                    span,
                    ..
                } => {
                    let declared = self.resolve_type_checked(ty);
                    self.define_checked(Symbol::field(
                        field_name,
                        declared,
                        name.to_string(),
                        *span,
                    ));
                }
                Stmt::Method(m) => {
                    let sym = self.method_symbol(m).owned_by(name.to_string());
                    self.define_checked(sym);
                }
                _ => {}
            }
        }

        // Then initializers, method bodies, and any loose statements.
        for member in members {
            match member {
                Stmt::Field { ty, init, .. } => {
                    if let Some(init) = init {
                        let declared = self.registry.resolve(&ty.name);
                        let found = self.visit_expr(init);
                        if !found.is_compatible_with(&declared) {
                            self.error(SemanticError::TypeMismatch {
                                expected: declared,
                                found,
                                span: init.span,
                            });
                        }
                    }
                }
                Stmt::Method(m) => self.analyze_method_body(m),
                other => self.visit_stmt(other, false),
            }
        }

        self.table.exit();
        self.current_class = saved_class;
    }

    /// Analyze a method body: method scope, parameters first, then the
    /// statements, with the return type tracked for `return` checking.
    fn analyze_method_body(&mut self, m: &MethodDecl) {
        let ret = self.resolve_type_checked(&m.return_ty);

        self.table.enter(ScopeKind::Method);
        let saved_ret = self.current_ret.replace(ret);

        for param in &m.params {
            let ty = self.resolve_type_checked(&param.ty);
            self.define_checked(Symbol::parameter(param.name.clone(), ty, param.span));
        }
        for stmt in &m.body {
            self.visit_stmt(stmt, false);
        }

        self.current_ret = saved_ret;
        self.table.exit();
    }

    fn visit_field(&mut self, ty: &TypeName, name: &str, init: Option<&Expr>, span: Span) {
        let declared = self.resolve_type_checked(ty);

        if let Some(init) = init {
            let found = self.visit_expr(init);
            if !found.is_compatible_with(&declared) {
                self.error(SemanticError::TypeMismatch {
                    expected: declared.clone(),
                    found,
                    span: init.span,
                });
            }
        }

        let owner = self.current_class.clone().unwrap_or_default();
        self.define_checked(Symbol::field(name, declared, owner, span));
    }

    /// Resolve a type name, emitting undefined-type when it fails.
    fn resolve_type_checked(&mut self, ty: &TypeName) -> Ty {
        let resolved = self.registry.resolve(&ty.name);
        if resolved == Ty::Error {
            self.error(SemanticError::UndefinedType {
                name: ty.name.clone(),
                span: ty.span,
            });
        }
        resolved
    }

    // ── Pass 2: expressions ────────────────────────────────────────────

    /// Type an expression, record it in the map, and return the type.
    fn visit_expr(&mut self, expr: &Expr) -> Ty {
        let ty = self.type_of(expr);
        self.expr_types.insert(expr.id, ty.clone());
        ty
    }

    fn type_of(&mut self, expr: &Expr) -> Ty {
        match &expr.kind {
            ExprKind::Int(value) => {
                if i32::try_from(*value).is_err() {
                    self.error(SemanticError::IntLiteralOutOfRange {
                        value: *value,
                        span: expr.span,
                    });
                    Ty::Error
                } else {
                    Ty::Int
                }
            }
            ExprKind::Double(_) => Ty::Double,
            ExprKind::Str(_) => Ty::Str,
            ExprKind::Bool(_) => Ty::Boolean,
            ExprKind::Null => Ty::Null,

            ExprKind::Ident(name) => match self.table.lookup(name) {
                Some(symbol) => symbol.ty.clone(),
                None => {
                    self.error(SemanticError::UndefinedIdentifier {
                        name: name.clone(),
                        span: expr.span,
                    });
                    Ty::Error
                }
            },

            ExprKind::Binary { op, lhs, rhs } => self.type_binary(*op, lhs, rhs, expr.span),

            ExprKind::Unary { op, operand } => self.type_unary(*op, operand, expr.span),

            ExprKind::Call { callee, args } => self.type_call(callee, args, expr.span),

            ExprKind::Member { object, name } => {
                let object_ty = self.visit_expr(object);
                self.type_member(&object_ty, name, expr.span)
                    .unwrap_or(Ty::Error)
            }

            ExprKind::New { class_name, args } => {
                for arg in args {
                    self.visit_expr(arg);
                }
                if self.registry.is_class(class_name) {
                    Ty::Class(class_name.clone())
                } else {
                    self.error(SemanticError::UnknownClass {
                        name: class_name.clone(),
                        span: expr.span,
                    });
                    Ty::Error
                }
            }
        }
    }

    fn type_binary(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr, span: Span) -> Ty {
        let lt = self.visit_expr(lhs);
        let rt = self.visit_expr(rhs);

        // One diagnostic per failure: errors below do not re-fire.
        if lt == Ty::Error || rt == Ty::Error {
            return Ty::Error;
        }

        let invalid = |a: &mut Self| {
            a.error(SemanticError::InvalidOperation {
                op: op.to_string(),
                lhs: lt.clone(),
                rhs: Some(rt.clone()),
                span,
            });
            Ty::Error
        };

        match op {
            // `+` with any string operand is concatenation.
            BinOp::Add if lt == Ty::Str || rt == Ty::Str => {
                let other = if lt == Ty::Str { &rt } else { &lt };
                if other.is_printable() || *other == Ty::Str {
                    Ty::Str
                } else {
                    invalid(self)
                }
            }
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => {
                match lt.widen(&rt) {
                    Some(ty) => ty,
                    None => invalid(self),
                }
            }
            BinOp::Mod => {
                if lt == Ty::Int && rt == Ty::Int {
                    Ty::Int
                } else {
                    invalid(self)
                }
            }
            BinOp::Pow => {
                if lt.is_numeric() && rt.is_numeric() {
                    Ty::Double
                } else {
                    invalid(self)
                }
            }
            BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq => {
                if lt.is_numeric() && rt.is_numeric() {
                    Ty::Boolean
                } else {
                    invalid(self)
                }
            }
            BinOp::Eq | BinOp::NotEq => {
                if lt.is_compatible_with(&rt) || rt.is_compatible_with(&lt) {
                    Ty::Boolean
                } else {
                    invalid(self)
                }
            }
            BinOp::And | BinOp::Or => {
                if lt == Ty::Boolean && rt == Ty::Boolean {
                    Ty::Boolean
                } else {
                    invalid(self)
                }
            }
        }
    }

    fn type_unary(&mut self, op: UnaryOp, operand: &Expr, span: Span) -> Ty {
        let ty = self.visit_expr(operand);
        if ty == Ty::Error {
            return Ty::Error;
        }
        match op {
            UnaryOp::Neg if ty.is_numeric() => ty,
            UnaryOp::Not if ty == Ty::Boolean => Ty::Boolean,
            _ => {
                self.error(SemanticError::InvalidOperation {
                    op: op.to_string(),
                    lhs: ty,
                    rhs: None,
                    span,
                });
                Ty::Error
            }
        }
    }

    fn type_call(&mut self, callee: &Expr, args: &[Expr], span: Span) -> Ty {
        match &callee.kind {
            ExprKind::Ident(name) => {
                let Some(symbol) = self.table.lookup(name).cloned() else {
                    self.error(SemanticError::UndefinedIdentifier {
                        name: name.clone(),
                        span: callee.span,
                    });
                    self.visit_args_only(args);
                    self.expr_types.insert(callee.id, Ty::Error);
                    return Ty::Error;
                };
                self.expr_types.insert(callee.id, symbol.ty.clone());
                if symbol.kind != SymbolKind::Method {
                    self.error(SemanticError::NotCallable {
                        what: name.clone(),
                        span: callee.span,
                    });
                    self.visit_args_only(args);
                    return Ty::Error;
                }
                let params = symbol.params.clone().unwrap_or_default();
                self.check_args(name, &params, args, span);
                symbol.ty
            }

            ExprKind::Member { object, name } => {
                let object_ty = self.visit_expr(object);
                self.expr_types.insert(callee.id, Ty::Error);
                match self.type_method_member(&object_ty, name, callee.span) {
                    Some(sig) => {
                        self.expr_types.insert(callee.id, sig.ret.clone());
                        self.check_args(name, &sig.params, args, span);
                        sig.ret
                    }
                    None => {
                        self.visit_args_only(args);
                        Ty::Error
                    }
                }
            }

            _ => {
                self.visit_expr(callee);
                self.visit_args_only(args);
                self.error(SemanticError::NotCallable {
                    what: "expression".to_string(),
                    span: callee.span,
                });
                Ty::Error
            }
        }
    }

    /// Type the arguments without any parameter checking (used on paths
    /// where the callee itself already failed).
    fn visit_args_only(&mut self, args: &[Expr]) {
        for arg in args {
            self.visit_expr(arg);
        }
    }

    fn check_args(&mut self, name: &str, params: &[Ty], args: &[Expr], span: Span) {
        let arg_types: Vec<Ty> = args.iter().map(|a| self.visit_expr(a)).collect();
        if params.len() != args.len() {
            self.error(SemanticError::ArityMismatch {
                name: name.to_string(),
                expected: params.len(),
                found: args.len(),
                span,
            });
            return;
        }
        for (index, (param, (arg, found))) in
            params.iter().zip(args.iter().zip(arg_types)).enumerate()
        {
            if !found.is_compatible_with(param) {
                self.error(SemanticError::ArgumentTypeMismatch {
                    name: name.to_string(),
                    index,
                    expected: param.clone(),
                    found,
                    span: arg.span,
                });
            }
        }
    }

    /// Resolve a field access to the field's type.
    fn type_member(&mut self, object_ty: &Ty, member: &str, span: Span) -> Option<Ty> {
        match object_ty {
            Ty::Error => None,
            Ty::Class(class_name) => {
                let field = self
                    .registry
                    .class(class_name)
                    .and_then(|info| info.fields.get(member))
                    .cloned();
                if field.is_none() {
                    self.error(SemanticError::UnknownMember {
                        class_name: class_name.clone(),
                        member: member.to_string(),
                        span,
                    });
                }
                field
            }
            other => {
                self.error(SemanticError::MemberAccessOnNonClass {
                    ty: other.clone(),
                    member: member.to_string(),
                    span,
                });
                None
            }
        }
    }

    /// Resolve a method member for a call.
    fn type_method_member(
        &mut self,
        object_ty: &Ty,
        member: &str,
        span: Span,
    ) -> Option<MethodSig> {
        match object_ty {
            Ty::Error => None,
            Ty::Class(class_name) => {
                let sig = self
                    .registry
                    .class(class_name)
                    .and_then(|info| info.methods.get(member))
                    .cloned();
                if sig.is_none() {
                    self.error(SemanticError::UnknownMember {
                        class_name: class_name.clone(),
                        member: member.to_string(),
                        span,
                    });
                }
                sig
            }
            other => {
                self.error(SemanticError::MemberAccessOnNonClass {
                    ty: other.clone(),
                    member: member.to_string(),
                    span,
                });
                None
            }
        }
    }
}

