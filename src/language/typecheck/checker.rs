use super::outcome::{bind, bind2, bind3, bind4, fold_siblings, Checked, Diagnostic, Log};
use crate::config::CheckOptions;
use crate::language::{
    ast::*,
    types::{ElementType, Shape, TypeDesc, TypeSymbol},
};
use crate::scope::ScopeChain;
use std::mem;

pub fn check_program(program: &Program) -> Checked<TypeSymbol> {
    check_program_with_options(program, &CheckOptions::default())
}

#[tracing::instrument(skip_all, fields(statements = program.statements.len()))]
pub fn check_program_with_options(
    program: &Program,
    options: &CheckOptions,
) -> Checked<TypeSymbol> {
    let mut checker = Checker::new(options.clone());
    let result = checker.check_program(program);
    tracing::debug!(
        accepted = result.is_ok(),
        errors = result.log().errors().count(),
        "type check finished"
    );
    result
}

/// Infers a type and shape for every node, reporting every problem found.
pub struct Checker {
    symbols: ScopeChain<TypeSymbol>,
    assign_target: bool,
    in_loop: bool,
    options: CheckOptions,
}

impl Default for Checker {
    fn default() -> Self {
        Self::new(CheckOptions::default())
    }
}

impl Checker {
    pub fn new(options: CheckOptions) -> Self {
        Self {
            symbols: ScopeChain::new(),
            assign_target: false,
            in_loop: false,
            options,
        }
    }

    /// The symbol currently visible under `name`.
    pub fn symbol(&self, name: &str) -> Option<&TypeSymbol> {
        self.symbols.lookup(name)
    }

    pub fn check_program(&mut self, program: &Program) -> Checked<TypeSymbol> {
        self.check_sequence(&program.statements)
    }

    fn check_sequence(&mut self, statements: &[Statement]) -> Checked<TypeSymbol> {
        let results = statements
            .iter()
            .map(|statement| self.check_statement(statement))
            .collect();
        fold_siblings(
            results,
            |first, _| Checked::ok(first),
            Checked::ok(TypeSymbol::placeholder(None)),
        )
    }

    fn check_scoped(&mut self, statement: &Statement) -> Checked<TypeSymbol> {
        self.symbols.push();
        let result = self.check_statement(statement);
        self.symbols.pop();
        result
    }

    fn check_loop_body(&mut self, statement: &Statement) -> Checked<TypeSymbol> {
        let outer = mem::replace(&mut self.in_loop, true);
        let result = self.check_statement(statement);
        self.in_loop = outer;
        result
    }

    fn accept(&self, symbol: TypeSymbol, step: impl FnOnce() -> String) -> Checked<TypeSymbol> {
        if self.options.trace {
            let line = symbol.line;
            Checked::ok_with(symbol, Log::single(Diagnostic::info(line, step())))
        } else {
            Checked::ok(symbol)
        }
    }

    pub fn check_statement(&mut self, statement: &Statement) -> Checked<TypeSymbol> {
        match statement {
            Statement::Assign(stmt) => self.check_assign(stmt),
            Statement::If(stmt) => {
                let condition = self.check_condition(&stmt.condition);
                let body = self.check_scoped(&stmt.body);
                bind2(condition, body, |condition, body| {
                    let line = condition.line.or(body.line);
                    self.accept(TypeSymbol::placeholder(line), || "if statement".into())
                })
            }
            Statement::IfElse(stmt) => {
                let condition = self.check_condition(&stmt.condition);
                let then_branch = self.check_scoped(&stmt.then_branch);
                let else_branch = self.check_scoped(&stmt.else_branch);
                bind3(condition, then_branch, else_branch, |condition, then, other| {
                    let line = condition.line.or(then.line).or(other.line);
                    self.accept(TypeSymbol::placeholder(line), || "if-else statement".into())
                })
            }
            Statement::While(stmt) => {
                let condition = self.check_condition(&stmt.condition);
                self.symbols.push();
                let body = self.check_loop_body(&stmt.body);
                self.symbols.pop();
                bind2(condition, body, |condition, body| {
                    let line = condition.line.or(body.line);
                    self.accept(TypeSymbol::placeholder(line), || "while loop".into())
                })
            }
            Statement::For(stmt) => self.check_for(stmt),
            Statement::Break { line } => self.check_loop_signal("break", *line),
            Statement::Continue { line } => self.check_loop_signal("continue", *line),
            Statement::Print(exprs) => self.check_expr_list(exprs),
            Statement::Return(exprs) => self.check_expr_list(exprs),
            Statement::Block(block) => {
                self.symbols.push();
                let result = self.check_sequence(&block.statements);
                self.symbols.pop();
                result
            }
        }
    }

    fn check_assign(&mut self, stmt: &AssignStmt) -> Checked<TypeSymbol> {
        let value = self.check_expr(&stmt.value);
        // A failed right-hand side must not declare anything.
        let target = if value.is_ok() {
            self.check_target(&stmt.target)
        } else {
            Checked::fail_with(Log::new())
        };
        bind2(value, target, |value, target| {
            self.finish_assignment(&stmt.target, value, target)
        })
    }

    fn check_target(&mut self, target: &Expr) -> Checked<TypeSymbol> {
        match target {
            Expr::Identifier(_) => {
                let outer = mem::replace(&mut self.assign_target, true);
                let result = self.check_expr(target);
                self.assign_target = outer;
                result
            }
            Expr::Index { target: base, .. } if matches!(**base, Expr::Identifier(_)) => {
                self.check_expr(target)
            }
            other => Checked::fail(Diagnostic::error(
                other.line(),
                "assignment: target must be a variable or an indexed variable",
            )),
        }
    }

    fn finish_assignment(
        &mut self,
        target_expr: &Expr,
        value: TypeSymbol,
        target: TypeSymbol,
    ) -> Checked<TypeSymbol> {
        let line = value.line.or(target.line);
        let Some(assigned) = value.ty else {
            return Checked::fail(Diagnostic::error(
                line,
                "assignment: right-hand side has no value",
            ));
        };
        if let Some(existing) = &target.ty {
            if *existing != assigned {
                return Checked::fail(Diagnostic::error(
                    line,
                    format!(
                        "assignment: incompatible types: target is {existing}, value is {assigned}"
                    ),
                ));
            }
        }
        if let Expr::Identifier(ident) = target_expr {
            let typed = TypeSymbol::typed(assigned.clone(), line);
            // The target was declared or found by `check_target`.
            let stored = self.symbols.assign(&ident.name, typed);
            debug_assert!(stored.is_ok(), "assignment target `{}` vanished", ident.name);
        }
        self.accept(TypeSymbol::placeholder(line), || {
            format!("assignment of {assigned}")
        })
    }

    fn check_condition(&mut self, condition: &Expr) -> Checked<TypeSymbol> {
        bind(self.check_expr(condition), |symbol| match &symbol.ty {
            Some(ty) if ty.is_scalar_of(ElementType::Bool) => {
                let desc = ty.to_string();
                self.accept(symbol, || format!("condition of {desc}"))
            }
            _ => Checked::fail(Diagnostic::error(
                symbol.line,
                format!(
                    "condition must be a scalar bool, found {}",
                    symbol.describe()
                ),
            )),
        })
    }

    fn check_for(&mut self, stmt: &ForStmt) -> Checked<TypeSymbol> {
        self.symbols.push();
        let start = self.check_range_bound(&stmt.start, "start");
        let end = self.check_range_bound(&stmt.end, "end");
        let line = Some(stmt.binding.line);
        let binding = TypeSymbol::typed(TypeDesc::scalar(ElementType::Int), line);
        self.symbols.declare(&stmt.binding.name, binding.clone());
        let binding = self.accept(binding, || {
            format!("loop variable {}", stmt.binding.name)
        });
        let body = self.check_loop_body(&stmt.body);
        self.symbols.pop();
        bind4(binding, start, end, body, |binding, start, end, body| {
            let line = start.line.or(end.line).or(binding.line).or(body.line);
            self.accept(TypeSymbol::placeholder(line), || "for loop".into())
        })
    }

    fn check_range_bound(&mut self, bound: &Expr, which: &str) -> Checked<TypeSymbol> {
        bind(self.check_expr(bound), |symbol| match &symbol.ty {
            Some(ty) if ty.is_scalar_of(ElementType::Int) => {
                self.accept(symbol, || format!("for loop {which} bound"))
            }
            _ => Checked::fail(Diagnostic::error(
                symbol.line,
                format!(
                    "for loop: {which} of range must be a scalar int, found {}",
                    symbol.describe()
                ),
            )),
        })
    }

    fn check_loop_signal(&self, keyword: &str, line: usize) -> Checked<TypeSymbol> {
        if self.in_loop {
            self.accept(TypeSymbol::placeholder(Some(line)), || keyword.to_string())
        } else {
            Checked::fail(Diagnostic::error(
                Some(line),
                format!("{keyword} outside of a loop"),
            ))
        }
    }

    fn check_expr_list(&mut self, exprs: &[Expr]) -> Checked<TypeSymbol> {
        let results = exprs.iter().map(|expr| self.check_expr(expr)).collect();
        let all = fold_siblings(
            results,
            |first, _| Checked::ok(first),
            Checked::ok(TypeSymbol::placeholder(None)),
        );
        bind(all, |first| Checked::ok(TypeSymbol::placeholder(first.line)))
    }

    pub fn check_expr(&mut self, expr: &Expr) -> Checked<TypeSymbol> {
        match expr {
            Expr::Binary { op, left, right } => {
                let left = self.check_expr(left);
                let right = self.check_expr(right);
                bind2(left, right, |left, right| self.check_binary(*op, left, right))
            }
            Expr::Relation { op, left, right } => {
                let left = self.check_expr(left);
                let right = self.check_expr(right);
                bind2(left, right, |left, right| {
                    self.check_relation(*op, left, right)
                })
            }
            Expr::Unary { op, expr } => {
                bind(self.check_expr(expr), |operand| self.check_unary(*op, operand))
            }
            Expr::MatMul { left, right } => {
                let left = self.check_expr(left);
                let right = self.check_expr(right);
                bind2(left, right, |left, right| self.check_matmul(left, right))
            }
            Expr::Transpose(inner) => {
                bind(self.check_expr(inner), |operand| self.check_transpose(operand))
            }
            Expr::Vector(items) => self.check_vector(items),
            Expr::Zeros(dims) => self.check_filled("zeros", dims),
            Expr::Ones(dims) => self.check_filled("ones", dims),
            Expr::Eye(size) => self.check_eye(size),
            Expr::Index { target, indices } => self.check_index(target, indices),
            Expr::Identifier(ident) => self.check_identifier(ident),
            Expr::Int { line, .. } => self.accept(
                TypeSymbol::typed(TypeDesc::scalar(ElementType::Int), Some(*line)),
                || "int literal".into(),
            ),
            Expr::Float { line, .. } => self.accept(
                TypeSymbol::typed(TypeDesc::scalar(ElementType::Float), Some(*line)),
                || "float literal".into(),
            ),
            Expr::Str { line, .. } => self.accept(
                TypeSymbol::typed(TypeDesc::scalar(ElementType::String), Some(*line)),
                || "string literal".into(),
            ),
        }
    }

    fn check_identifier(&mut self, ident: &Identifier) -> Checked<TypeSymbol> {
        let line = Some(ident.line);
        if let Some(existing) = self.symbols.lookup(&ident.name).cloned() {
            if existing.ty.is_none() && !self.assign_target {
                return Checked::fail(Diagnostic::error(
                    line,
                    format!("symbol {} has no type yet", ident.name),
                ));
            }
            let refreshed = TypeSymbol { line, ..existing };
            let stored = self.symbols.assign(&ident.name, refreshed.clone());
            debug_assert!(stored.is_ok());
            return self.accept(refreshed, || format!("lookup of {}", ident.name));
        }
        if self.assign_target {
            let declared = TypeSymbol::untyped(line);
            self.symbols.declare(&ident.name, declared.clone());
            return self.accept(declared, || format!("declaration of {}", ident.name));
        }
        Checked::fail(Diagnostic::error(
            line,
            format!("no such symbol as {}", ident.name),
        ))
    }

    fn check_binary(
        &self,
        op: BinaryOp,
        left: TypeSymbol,
        right: TypeSymbol,
    ) -> Checked<TypeSymbol> {
        let line = left.line.or(right.line);
        let (Some(l), Some(r)) = (&left.ty, &right.ty) else {
            return Checked::fail(untyped_operand(line, "binary expression"));
        };
        let Some(element) = binary_result(op, l.element, r.element) else {
            return Checked::fail(Diagnostic::error(
                line,
                format!(
                    "binary expression: wrong operator {} for {} and {}",
                    op.symbol(),
                    l.element,
                    r.element
                ),
            ));
        };
        if l.shape != r.shape {
            return Checked::fail(Diagnostic::error(
                line,
                format!(
                    "binary expression: incompatible sizes: {} and {}",
                    l.shape, r.shape
                ),
            ));
        }
        let result = TypeDesc::new(element, l.shape.clone());
        self.accept(TypeSymbol::typed(result, line), || {
            format!("{l} {} {r}", op.symbol())
        })
    }

    fn check_relation(&self, op: RelOp, left: TypeSymbol, right: TypeSymbol) -> Checked<TypeSymbol> {
        let line = left.line.or(right.line);
        let (Some(l), Some(r)) = (&left.ty, &right.ty) else {
            return Checked::fail(untyped_operand(line, "relation"));
        };
        if !relation_accepts(op, l.element, r.element) {
            return Checked::fail(Diagnostic::error(
                line,
                format!(
                    "relation: wrong operator {} for {} and {}",
                    op.symbol(),
                    l.element,
                    r.element
                ),
            ));
        }
        if l.shape != r.shape {
            return Checked::fail(Diagnostic::error(
                line,
                format!("relation: incompatible sizes: {} and {}", l.shape, r.shape),
            ));
        }
        let result = TypeDesc::new(ElementType::Bool, l.shape.clone());
        self.accept(TypeSymbol::typed(result, line), || {
            format!("{l} {} {r}", op.symbol())
        })
    }

    fn check_unary(&self, op: UnaryOp, operand: TypeSymbol) -> Checked<TypeSymbol> {
        match &operand.ty {
            Some(ty) if ty.element.is_numeric() => {
                let desc = ty.to_string();
                self.accept(operand, || format!("{}{desc}", op.symbol()))
            }
            _ => Checked::fail(Diagnostic::error(
                operand.line,
                format!(
                    "unary expression: wrong operator {} for {}",
                    op.symbol(),
                    operand.describe()
                ),
            )),
        }
    }

    fn check_matmul(&self, left: TypeSymbol, right: TypeSymbol) -> Checked<TypeSymbol> {
        let line = left.line.or(right.line);
        let (Some(l), Some(r)) = (&left.ty, &right.ty) else {
            return Checked::fail(untyped_operand(line, "matrix multiplication"));
        };
        let Some(element) = l.element.promote(r.element) else {
            return Checked::fail(Diagnostic::error(
                line,
                format!(
                    "matrix multiplication: operands must be numeric, found {} and {}",
                    l.element, r.element
                ),
            ));
        };
        if l.shape.is_scalar() || r.shape.is_scalar() {
            return Checked::fail(Diagnostic::error(
                line,
                format!(
                    "matrix multiplication: operands must be arrays, found {} and {}",
                    l.shape, r.shape
                ),
            ));
        }
        let Some(shape) = l.shape.contract(&r.shape) else {
            return Checked::fail(Diagnostic::error(
                line,
                format!(
                    "matrix multiplication: incompatible sizes: {} and {}",
                    l.shape, r.shape
                ),
            ));
        };
        self.accept(TypeSymbol::typed(TypeDesc::new(element, shape), line), || {
            format!("{l} @ {r}")
        })
    }

    fn check_transpose(&self, operand: TypeSymbol) -> Checked<TypeSymbol> {
        match &operand.ty {
            Some(ty) if !ty.shape.is_scalar() => {
                let result = TypeDesc::new(ty.element, ty.shape.reversed());
                let desc = ty.to_string();
                self.accept(TypeSymbol::typed(result, operand.line), || {
                    format!("transpose of {desc}")
                })
            }
            _ => Checked::fail(Diagnostic::error(
                operand.line,
                format!(
                    "transpose: operand must be an array, found {}",
                    operand.describe()
                ),
            )),
        }
    }

    fn check_vector(&mut self, items: &[Expr]) -> Checked<TypeSymbol> {
        let results = items.iter().map(|item| self.check_expr(item)).collect();
        let element = fold_siblings(
            results,
            |first, next| same_element(first, next),
            Checked::ok(TypeSymbol::typed(TypeDesc::scalar(ElementType::Int), None)),
        );
        let len = items.len();
        bind(element, |element| match element.ty {
            Some(ty) => {
                let result = TypeDesc::new(ty.element, ty.shape.prepend(len));
                let desc = result.to_string();
                self.accept(TypeSymbol::typed(result, element.line), || {
                    format!("vector literal of {desc}")
                })
            }
            None => Checked::fail(untyped_operand(element.line, "vector")),
        })
    }

    fn check_filled(&mut self, name: &str, dims: &[Expr]) -> Checked<TypeSymbol> {
        let arguments = self.check_vector(dims);
        bind(arguments, |arguments| {
            let line = arguments.line;
            let valid = matches!(
                &arguments.ty,
                Some(ty) if ty.element == ElementType::Int && ty.shape.rank() == 1 && ty.shape.dims()[0] > 0
            );
            if !valid {
                return Checked::fail(Diagnostic::error(
                    line,
                    format!(
                        "{name}: wrong type of shape parameter: {}",
                        arguments.describe()
                    ),
                ));
            }
            let mut extents = Vec::with_capacity(dims.len());
            for dim in dims {
                match literal_extent(dim) {
                    Some(extent) => extents.push(extent),
                    None => {
                        return Checked::fail(Diagnostic::error(
                            dim.line().or(line),
                            format!("{name}: sizes must be non-negative integer literals"),
                        ))
                    }
                }
            }
            let result = TypeDesc::new(ElementType::Int, Shape::new(extents));
            let desc = result.to_string();
            self.accept(TypeSymbol::typed(result, line), || format!("{name} of {desc}"))
        })
    }

    fn check_eye(&mut self, size: &Expr) -> Checked<TypeSymbol> {
        bind(self.check_expr(size), |symbol| {
            let line = symbol.line;
            let is_int = matches!(&symbol.ty, Some(ty) if ty.is_scalar_of(ElementType::Int));
            match literal_extent(size) {
                Some(n) if is_int => {
                    let result = TypeDesc::new(ElementType::Int, Shape::new(vec![n, n]));
                    self.accept(TypeSymbol::typed(result, line), || format!("eye({n})"))
                }
                _ => Checked::fail(Diagnostic::error(
                    line,
                    format!(
                        "eye: size must be a non-negative integer literal, found {}",
                        symbol.describe()
                    ),
                )),
            }
        })
    }

    fn check_index(&mut self, target: &Expr, indices: &[Expr]) -> Checked<TypeSymbol> {
        let results = indices
            .iter()
            .map(|index| bind(self.check_expr(index), |symbol| self.check_index_type(symbol)))
            .collect();
        let checked_indices = fold_siblings(
            results,
            |first, _| Checked::ok(first),
            Checked::ok(TypeSymbol::placeholder(None)),
        );
        let base = self.check_expr(target);
        bind2(checked_indices, base, |_, base| self.check_ref(base, indices))
    }

    fn check_index_type(&self, symbol: TypeSymbol) -> Checked<TypeSymbol> {
        match &symbol.ty {
            Some(ty) if ty.is_scalar_of(ElementType::Int) => {
                self.accept(symbol, || "index".into())
            }
            _ => Checked::fail(Diagnostic::error(
                symbol.line,
                format!(
                    "index: indices must be scalar ints, found {}",
                    symbol.describe()
                ),
            )),
        }
    }

    fn check_ref(&self, base: TypeSymbol, indices: &[Expr]) -> Checked<TypeSymbol> {
        let line = base.line;
        let Some(ty) = &base.ty else {
            return Checked::fail(untyped_operand(line, "index"));
        };
        if indices.is_empty() {
            return Checked::fail(Diagnostic::error(line, "index: no index given"));
        }
        if indices.len() > ty.shape.rank() {
            return Checked::fail(Diagnostic::error(
                line,
                format!(
                    "index: accessing dim {} larger than dim {}",
                    indices.len(),
                    ty.shape.rank()
                ),
            ));
        }
        for (index, &extent) in indices.iter().zip(ty.shape.dims()) {
            match index {
                Expr::Int { value, line } => {
                    if *value < 0 || *value as u64 >= extent as u64 {
                        return Checked::fail(Diagnostic::error(
                            Some(*line),
                            format!(
                                "index: accessing element outside of the vector: {value} not in 0..{extent}"
                            ),
                        ));
                    }
                }
                other if self.options.literal_indices_only => {
                    return Checked::fail(Diagnostic::error(
                        other.line().or(line),
                        "index: indices must be integer literals",
                    ));
                }
                _ => {}
            }
        }
        let result = TypeDesc::new(ty.element, ty.shape.trailing(indices.len()));
        let desc = result.to_string();
        self.accept(TypeSymbol::typed(result, line), || format!("element of {desc}"))
    }
}

fn binary_result(op: BinaryOp, left: ElementType, right: ElementType) -> Option<ElementType> {
    use ElementType::*;
    if let Some(numeric) = left.promote(right) {
        return Some(numeric);
    }
    match (op, left, right) {
        (BinaryOp::Add, String, String) => Some(String),
        (BinaryOp::Mul, String, Int) | (BinaryOp::Mul, Int, String) => Some(String),
        _ => None,
    }
}

fn relation_accepts(op: RelOp, left: ElementType, right: ElementType) -> bool {
    if left.promote(right).is_some() {
        return true;
    }
    op.is_equality()
        && matches!(
            (left, right),
            (ElementType::Bool, ElementType::Bool) | (ElementType::String, ElementType::String)
        )
}

fn same_element(first: TypeSymbol, next: TypeSymbol) -> Checked<TypeSymbol> {
    let line = first.line.or(next.line);
    match (&first.ty, &next.ty) {
        (Some(a), Some(b)) if a.element != b.element => Checked::fail(Diagnostic::error(
            line,
            format!("vector: wrong type of elements: {} and {}", a.element, b.element),
        )),
        (Some(a), Some(b)) if a.shape != b.shape => Checked::fail(Diagnostic::error(
            line,
            format!("vector: wrong size of elements: {} and {}", a.shape, b.shape),
        )),
        (Some(_), Some(_)) => Checked::ok(TypeSymbol { line, ..first }),
        _ => Checked::fail(untyped_operand(line, "vector")),
    }
}

fn literal_extent(expr: &Expr) -> Option<usize> {
    match expr {
        Expr::Int { value, .. } => usize::try_from(*value).ok(),
        _ => None,
    }
}

fn untyped_operand(line: Option<usize>, construct: &str) -> Diagnostic {
    Diagnostic::error(line, format!("{construct}: operand has no type"))
}

#[cfg(test)]
mod tests;
