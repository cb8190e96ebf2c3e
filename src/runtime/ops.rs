use crate::language::ast::{BinaryOp, RelOp, UnaryOp};
use crate::language::types::ElementType;
use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::value::{ArrayValue, Value};

pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> RuntimeResult<Value> {
    let element = binary_element(op, left.element_type(), right.element_type())?;
    elementwise(left, right, element, |l, r| scalar_binary(op, l, r))
}

pub fn relation(op: RelOp, left: &Value, right: &Value) -> RuntimeResult<Value> {
    elementwise(left, right, ElementType::Bool, |l, r| {
        compare(op, l, r).map(Value::Bool)
    })
}

pub fn unary(op: UnaryOp, operand: &Value) -> RuntimeResult<Value> {
    match operand {
        Value::Array(array) => {
            let items = array
                .items()
                .iter()
                .map(|item| unary(op, item))
                .collect::<RuntimeResult<Vec<_>>>()?;
            Ok(Value::Array(ArrayValue::from_parts(
                array.element(),
                array.shape().clone(),
                items,
            )))
        }
        Value::Int(v) => match op {
            UnaryOp::Plus => Ok(Value::Int(*v)),
            UnaryOp::Neg => v
                .checked_neg()
                .map(Value::Int)
                .ok_or(RuntimeError::Overflow { op: "-" }),
        },
        Value::Float(v) => match op {
            UnaryOp::Plus => Ok(Value::Float(*v)),
            UnaryOp::Neg => Ok(Value::Float(-v)),
        },
        other => Err(RuntimeError::mismatch(format!(
            "unary `{}` is not defined for {}",
            op.symbol(),
            other.type_name()
        ))),
    }
}

/// One-axis contraction: the last axis of `left` against the first of `right`.
pub fn matmul(left: &Value, right: &Value) -> RuntimeResult<Value> {
    let (Value::Array(l), Value::Array(r)) = (left, right) else {
        return Err(RuntimeError::mismatch(format!(
            "`@` needs array operands, found {} and {}",
            left.type_name(),
            right.type_name()
        )));
    };
    let element = l.element().promote(r.element()).ok_or_else(|| {
        RuntimeError::mismatch(format!(
            "`@` needs numeric operands, found {} and {}",
            l.element(),
            r.element()
        ))
    })?;
    let shape = l
        .shape()
        .contract(r.shape())
        .ok_or_else(|| RuntimeError::ShapeMismatch {
            left: l.shape().to_string(),
            right: r.shape().to_string(),
        })?;
    let dims = l.shape().dims();
    let inner = dims[dims.len() - 1];
    let rows: usize = dims[..dims.len() - 1].iter().product();
    let cols = r.shape().trailing(1).volume();

    let mut items = ArrayValue::buffer(&shape)?;
    for i in 0..rows {
        for j in 0..cols {
            let mut acc = match element {
                ElementType::Int => Value::Int(0),
                _ => Value::Float(0.0),
            };
            for t in 0..inner {
                let product = scalar_binary(
                    BinaryOp::Mul,
                    &l.items()[i * inner + t],
                    &r.items()[t * cols + j],
                )?;
                acc = scalar_binary(BinaryOp::Add, &acc, &product)?;
            }
            items.push(acc);
        }
    }
    Ok(ArrayValue::from_parts(element, shape, items).into_value())
}

fn binary_element(
    op: BinaryOp,
    left: ElementType,
    right: ElementType,
) -> RuntimeResult<ElementType> {
    if let Some(numeric) = left.promote(right) {
        return Ok(numeric);
    }
    match (op, left, right) {
        (BinaryOp::Add, ElementType::String, ElementType::String)
        | (BinaryOp::Mul, ElementType::String, ElementType::Int)
        | (BinaryOp::Mul, ElementType::Int, ElementType::String) => Ok(ElementType::String),
        _ => Err(RuntimeError::mismatch(format!(
            "`{}` is not defined for {} and {}",
            op.symbol(),
            left,
            right
        ))),
    }
}

fn elementwise(
    left: &Value,
    right: &Value,
    element: ElementType,
    f: impl Fn(&Value, &Value) -> RuntimeResult<Value>,
) -> RuntimeResult<Value> {
    match (left, right) {
        (Value::Array(l), Value::Array(r)) => {
            if l.shape() != r.shape() {
                return Err(RuntimeError::ShapeMismatch {
                    left: l.shape().to_string(),
                    right: r.shape().to_string(),
                });
            }
            let items = l
                .items()
                .iter()
                .zip(r.items())
                .map(|(a, b)| f(a, b))
                .collect::<RuntimeResult<Vec<_>>>()?;
            Ok(Value::Array(ArrayValue::from_parts(
                element,
                l.shape().clone(),
                items,
            )))
        }
        (Value::Array(_), _) | (_, Value::Array(_)) => Err(RuntimeError::ShapeMismatch {
            left: left.shape().to_string(),
            right: right.shape().to_string(),
        }),
        _ => f(left, right),
    }
}

fn scalar_binary(op: BinaryOp, left: &Value, right: &Value) -> RuntimeResult<Value> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => int_binary(op, *a, *b).map(Value::Int),
        (Value::Str(a), Value::Str(b)) if op == BinaryOp::Add => Ok(Value::Str(format!("{a}{b}"))),
        (Value::Str(s), Value::Int(n)) | (Value::Int(n), Value::Str(s)) if op == BinaryOp::Mul => {
            repeat(s, *n).map(Value::Str)
        }
        _ => match (as_float(left), as_float(right)) {
            (Some(a), Some(b)) => float_binary(op, a, b).map(Value::Float),
            _ => Err(RuntimeError::mismatch(format!(
                "`{}` is not defined for {} and {}",
                op.symbol(),
                left.type_name(),
                right.type_name()
            ))),
        },
    }
}

/// `s` repeated `count` times; negative counts give an empty string.
fn repeat(s: &str, count: i64) -> RuntimeResult<String> {
    let overflow = || RuntimeError::Overflow { op: "*" };
    let count = usize::try_from(count).unwrap_or(0);
    let len = s.len().checked_mul(count).ok_or_else(overflow)?;
    let mut out = String::new();
    out.try_reserve_exact(len).map_err(|_| overflow())?;
    for _ in 0..count {
        out.push_str(s);
    }
    Ok(out)
}

fn int_binary(op: BinaryOp, a: i64, b: i64) -> RuntimeResult<i64> {
    let overflow = RuntimeError::Overflow { op: op.symbol() };
    match op {
        BinaryOp::Add => a.checked_add(b).ok_or(overflow),
        BinaryOp::Sub => a.checked_sub(b).ok_or(overflow),
        BinaryOp::Mul => a.checked_mul(b).ok_or(overflow),
        BinaryOp::Div => {
            if b == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            floor_div(a, b).ok_or(overflow)
        }
    }
}

fn floor_div(a: i64, b: i64) -> Option<i64> {
    let quotient = a.checked_div(b)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        quotient.checked_sub(1)
    } else {
        Some(quotient)
    }
}

fn float_binary(op: BinaryOp, a: f64, b: f64) -> RuntimeResult<f64> {
    match op {
        BinaryOp::Add => Ok(a + b),
        BinaryOp::Sub => Ok(a - b),
        BinaryOp::Mul => Ok(a * b),
        BinaryOp::Div if b == 0.0 => Err(RuntimeError::DivisionByZero),
        BinaryOp::Div => Ok(a / b),
    }
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Int(v) => Some(*v as f64),
        Value::Float(v) => Some(*v),
        _ => None,
    }
}

fn compare(op: RelOp, left: &Value, right: &Value) -> RuntimeResult<bool> {
    let ordering = match (left, right) {
        (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
        (Value::Bool(a), Value::Bool(b)) if op.is_equality() => a.partial_cmp(b),
        (Value::Str(a), Value::Str(b)) if op.is_equality() => a.partial_cmp(b),
        _ => match (as_float(left), as_float(right)) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => {
                return Err(RuntimeError::mismatch(format!(
                    "`{}` is not defined for {} and {}",
                    op.symbol(),
                    left.type_name(),
                    right.type_name()
                )))
            }
        },
    };
    // NaN compares unequal to everything.
    let Some(ordering) = ordering else {
        return Ok(op == RelOp::Ne);
    };
    Ok(match op {
        RelOp::Lt => ordering.is_lt(),
        RelOp::Gt => ordering.is_gt(),
        RelOp::Le => ordering.is_le(),
        RelOp::Ge => ordering.is_ge(),
        RelOp::Eq => ordering.is_eq(),
        RelOp::Ne => ordering.is_ne(),
    })
}
