use crate::language::ast::*;
use crate::runtime::{
    environment::Environment,
    error::{RuntimeError, RuntimeResult},
    ops,
    value::{ArrayValue, Value},
};
use std::io::{self, Write};

/// Tree-walking evaluator for programs the checker accepted.
pub struct Interpreter<W: Write> {
    env: Environment,
    out: W,
}

enum FlowSignal {
    Break,
    Continue,
    Return(Vec<Value>),
}

impl Interpreter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Interpreter<W> {
    pub fn new(out: W) -> Self {
        Self {
            env: Environment::new(),
            out,
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Runs the top-level statements. `return` ends the whole program after
    /// printing its values.
    pub fn run(&mut self, program: &Program) -> RuntimeResult<()> {
        let result = self.run_statements(&program.statements);
        if let Err(error) = &result {
            tracing::error!(%error, "runtime fault");
        }
        result
    }

    fn run_statements(&mut self, statements: &[Statement]) -> RuntimeResult<()> {
        for statement in statements {
            match self.eval_statement(statement)? {
                None => {}
                Some(FlowSignal::Return(values)) => {
                    tracing::debug!(values = values.len(), "program returned");
                    for value in &values {
                        self.write_value(value)?;
                    }
                    break;
                }
                Some(flow) => {
                    return Err(RuntimeError::StrayFlow {
                        keyword: flow_name(&flow),
                    })
                }
            }
        }
        self.out.flush()?;
        Ok(())
    }

    fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> RuntimeResult<T>) -> RuntimeResult<T> {
        self.env.push_scope();
        let result = f(self);
        self.env.pop_scope();
        result
    }

    fn eval_statement(&mut self, statement: &Statement) -> RuntimeResult<Option<FlowSignal>> {
        match statement {
            Statement::Assign(stmt) => {
                self.eval_assign(stmt)?;
                Ok(None)
            }
            Statement::If(stmt) => self.scoped(|this| {
                if this.eval_condition(&stmt.condition)? {
                    this.eval_statement(&stmt.body)
                } else {
                    Ok(None)
                }
            }),
            Statement::IfElse(stmt) => self.scoped(|this| {
                if this.eval_condition(&stmt.condition)? {
                    this.eval_statement(&stmt.then_branch)
                } else {
                    this.eval_statement(&stmt.else_branch)
                }
            }),
            Statement::While(stmt) => self.scoped(|this| {
                while this.eval_condition(&stmt.condition)? {
                    match this.eval_statement(&stmt.body)? {
                        None | Some(FlowSignal::Continue) => {}
                        Some(FlowSignal::Break) => {
                            tracing::trace!("while loop: break");
                            break;
                        }
                        Some(flow @ FlowSignal::Return(_)) => return Ok(Some(flow)),
                    }
                }
                Ok(None)
            }),
            Statement::For(stmt) => self.scoped(|this| this.eval_for(stmt)),
            Statement::Break { .. } => Ok(Some(FlowSignal::Break)),
            Statement::Continue { .. } => Ok(Some(FlowSignal::Continue)),
            Statement::Print(exprs) => {
                for expr in exprs {
                    let value = self.eval_expression(expr)?;
                    self.write_value(&value)?;
                }
                Ok(None)
            }
            Statement::Return(exprs) => {
                let values = exprs
                    .iter()
                    .map(|expr| self.eval_expression(expr))
                    .collect::<RuntimeResult<Vec<_>>>()?;
                Ok(Some(FlowSignal::Return(values)))
            }
            Statement::Block(block) => self.scoped(|this| {
                for statement in &block.statements {
                    if let Some(flow) = this.eval_statement(statement)? {
                        return Ok(Some(flow));
                    }
                }
                Ok(None)
            }),
        }
    }

    fn eval_assign(&mut self, stmt: &AssignStmt) -> RuntimeResult<()> {
        let value = self.eval_expression(&stmt.value)?;
        match &stmt.target {
            Expr::Identifier(ident) => {
                self.env.store(&ident.name, value);
                Ok(())
            }
            Expr::Index { target, indices } => {
                let Expr::Identifier(ident) = target.as_ref() else {
                    return Err(RuntimeError::mismatch(
                        "only variables can be the base of an indexed assignment",
                    ));
                };
                let indices = self.eval_indices(indices)?;
                // Arrays are values: mutate a copy, then rebind it.
                let mut array = match self.env.get(&ident.name)? {
                    Value::Array(array) => array.clone(),
                    other => {
                        return Err(RuntimeError::mismatch(format!(
                            "cannot index into {}",
                            other.type_name()
                        )))
                    }
                };
                array.replace(&indices, value)?;
                self.env.assign(&ident.name, Value::Array(array))
            }
            _ => Err(RuntimeError::mismatch(
                "assignment target must be a variable or an indexed variable",
            )),
        }
    }

    fn eval_for(&mut self, stmt: &ForStmt) -> RuntimeResult<Option<FlowSignal>> {
        let start = self.eval_int(&stmt.start, "for loop start")?;
        let end = self.eval_int(&stmt.end, "for loop end")?;
        let name = stmt.binding.name.as_str();
        self.env.declare(name, Value::Int(start));
        // The counter is re-read on every step, so the body may move it.
        while self.read_counter(name)? < end {
            match self.eval_statement(&stmt.body)? {
                None | Some(FlowSignal::Continue) => {
                    let next = self
                        .read_counter(name)?
                        .checked_add(1)
                        .ok_or(RuntimeError::Overflow { op: "+" })?;
                    self.env.assign(name, Value::Int(next))?;
                }
                Some(FlowSignal::Break) => {
                    tracing::trace!(binding = name, "for loop: break");
                    break;
                }
                Some(flow @ FlowSignal::Return(_)) => return Ok(Some(flow)),
            }
        }
        Ok(None)
    }

    fn read_counter(&self, name: &str) -> RuntimeResult<i64> {
        let value = self.env.get(name)?;
        value.as_int().ok_or_else(|| {
            RuntimeError::mismatch(format!(
                "loop variable `{name}` holds {}",
                value.type_name()
            ))
        })
    }

    fn eval_condition(&mut self, condition: &Expr) -> RuntimeResult<bool> {
        match self.eval_expression(condition)? {
            Value::Bool(value) => Ok(value),
            other => Err(RuntimeError::mismatch(format!(
                "condition must be a scalar bool, found {}",
                other.type_name()
            ))),
        }
    }

    fn eval_int(&mut self, expr: &Expr, what: &str) -> RuntimeResult<i64> {
        let value = self.eval_expression(expr)?;
        value.as_int().ok_or_else(|| {
            RuntimeError::mismatch(format!("{what} must be an int, found {}", value.type_name()))
        })
    }

    fn eval_indices(&mut self, indices: &[Expr]) -> RuntimeResult<Vec<i64>> {
        indices
            .iter()
            .map(|index| self.eval_int(index, "index"))
            .collect()
    }

    fn eval_extents(&mut self, dims: &[Expr]) -> RuntimeResult<Vec<usize>> {
        dims.iter()
            .map(|dim| {
                let value = self.eval_int(dim, "size")?;
                usize::try_from(value).map_err(|_| RuntimeError::InvalidDimension { value })
            })
            .collect()
    }

    fn eval_expression(&mut self, expr: &Expr) -> RuntimeResult<Value> {
        match expr {
            Expr::Binary { op, left, right } => {
                let left = self.eval_expression(left)?;
                let right = self.eval_expression(right)?;
                ops::binary(*op, &left, &right)
            }
            Expr::Relation { op, left, right } => {
                let left = self.eval_expression(left)?;
                let right = self.eval_expression(right)?;
                ops::relation(*op, &left, &right)
            }
            Expr::Unary { op, expr } => {
                let operand = self.eval_expression(expr)?;
                ops::unary(*op, &operand)
            }
            Expr::MatMul { left, right } => {
                let left = self.eval_expression(left)?;
                let right = self.eval_expression(right)?;
                ops::matmul(&left, &right)
            }
            Expr::Transpose(inner) => match self.eval_expression(inner)? {
                Value::Array(array) => Ok(Value::Array(array.transpose())),
                other => Err(RuntimeError::mismatch(format!(
                    "cannot transpose {}",
                    other.type_name()
                ))),
            },
            Expr::Vector(items) => {
                let values = items
                    .iter()
                    .map(|item| self.eval_expression(item))
                    .collect::<RuntimeResult<Vec<_>>>()?;
                Ok(Value::Array(ArrayValue::stack(values)?))
            }
            Expr::Zeros(dims) => {
                let shape = self.eval_extents(dims)?;
                Ok(Value::Array(ArrayValue::filled(shape.into(), Value::Int(0))?))
            }
            Expr::Ones(dims) => {
                let shape = self.eval_extents(dims)?;
                Ok(Value::Array(ArrayValue::filled(shape.into(), Value::Int(1))?))
            }
            Expr::Eye(size) => {
                let n = self.eval_extents(std::slice::from_ref(size.as_ref()))?[0];
                Ok(Value::Array(ArrayValue::identity(n)?))
            }
            Expr::Index { target, indices } => {
                let base = self.eval_expression(target)?;
                let indices = self.eval_indices(indices)?;
                match base {
                    Value::Array(array) => array.select(&indices),
                    other => Err(RuntimeError::mismatch(format!(
                        "cannot index into {}",
                        other.type_name()
                    ))),
                }
            }
            Expr::Identifier(ident) => self.env.get(&ident.name).cloned(),
            Expr::Int { value, .. } => Ok(Value::Int(*value)),
            Expr::Float { value, .. } => Ok(Value::Float(*value)),
            Expr::Str { value, .. } => Ok(Value::Str(value.clone())),
        }
    }

    fn write_value(&mut self, value: &Value) -> RuntimeResult<()> {
        writeln!(self.out, "{value}")?;
        Ok(())
    }
}

fn flow_name(flow: &FlowSignal) -> &'static str {
    match flow {
        FlowSignal::Break => "break",
        FlowSignal::Continue => "continue",
        FlowSignal::Return(_) => "return",
    }
}
