use crate::language::types::{ElementType, Shape};
use crate::runtime::error::{RuntimeError, RuntimeResult};
use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Array(ArrayValue),
}

impl Value {
    pub fn element_type(&self) -> ElementType {
        match self {
            Value::Int(_) => ElementType::Int,
            Value::Float(_) => ElementType::Float,
            Value::Str(_) => ElementType::String,
            Value::Bool(_) => ElementType::Bool,
            Value::Array(array) => array.element,
        }
    }

    pub fn shape(&self) -> Shape {
        match self {
            Value::Array(array) => array.shape.clone(),
            _ => Shape::scalar(),
        }
    }

    pub fn type_name(&self) -> String {
        match self {
            Value::Array(array) => format!("{} array {}", array.element, array.shape),
            scalar => scalar.element_type().name().to_string(),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::Array(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{v}.0"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Array(array) => write!(f, "{array}"),
        }
    }
}

/// Dense row-major array of scalar values sharing one element type.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayValue {
    element: ElementType,
    shape: Shape,
    items: Vec<Value>,
}

impl ArrayValue {
    pub fn new(element: ElementType, shape: Shape, items: Vec<Value>) -> RuntimeResult<Self> {
        if shape.checked_volume() != Some(items.len()) {
            return Err(RuntimeError::ShapeMismatch {
                left: shape.to_string(),
                right: format!("{} elements", items.len()),
            });
        }
        if let Some(odd) = items
            .iter()
            .find(|item| !item.is_scalar() || item.element_type() != element)
        {
            return Err(RuntimeError::mismatch(format!(
                "{} array cannot hold a {}",
                element,
                odd.type_name()
            )));
        }
        Ok(Self {
            element,
            shape,
            items,
        })
    }

    /// Empty buffer with room for every element of `shape`.
    pub(crate) fn buffer(shape: &Shape) -> RuntimeResult<Vec<Value>> {
        let too_large = || RuntimeError::TooLarge {
            shape: shape.to_string(),
        };
        let volume = shape.checked_volume().ok_or_else(too_large)?;
        let mut items = Vec::new();
        items.try_reserve_exact(volume).map_err(|_| too_large())?;
        Ok(items)
    }

    pub fn filled(shape: Shape, value: Value) -> RuntimeResult<Self> {
        let element = value.element_type();
        let mut items = Self::buffer(&shape)?;
        items.resize(shape.volume(), value);
        Ok(Self {
            element,
            shape,
            items,
        })
    }

    pub fn identity(n: usize) -> RuntimeResult<Self> {
        let shape = Shape::new(vec![n, n]);
        let mut items = Self::buffer(&shape)?;
        items.resize(shape.volume(), Value::Int(0));
        for i in 0..n {
            items[i * n + i] = Value::Int(1);
        }
        Ok(Self {
            element: ElementType::Int,
            shape,
            items,
        })
    }

    pub fn empty(element: ElementType) -> Self {
        Self {
            element,
            shape: Shape::new(vec![0]),
            items: Vec::new(),
        }
    }

    pub fn element(&self) -> ElementType {
        self.element
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    /// Shape-`()` arrays become the scalar they hold.
    pub fn into_value(mut self) -> Value {
        if self.shape.is_scalar() && self.items.len() == 1 {
            self.items.remove(0)
        } else {
            Value::Array(self)
        }
    }

    fn strides(&self) -> Vec<usize> {
        let dims = self.shape.dims();
        let mut strides = vec![1; dims.len()];
        for axis in (0..dims.len().saturating_sub(1)).rev() {
            strides[axis] = strides[axis + 1] * dims[axis + 1];
        }
        strides
    }

    /// Flat range covered by fixing the leading axes to `indices`.
    fn block(&self, indices: &[i64]) -> RuntimeResult<(usize, usize)> {
        let dims = self.shape.dims();
        if indices.len() > dims.len() {
            return Err(RuntimeError::mismatch(format!(
                "cannot apply {} indices to an array of shape {}",
                indices.len(),
                self.shape
            )));
        }
        let strides = self.strides();
        let mut offset = 0;
        for (axis, &index) in indices.iter().enumerate() {
            let size = dims[axis];
            let position = usize::try_from(index)
                .ok()
                .filter(|&position| position < size)
                .ok_or(RuntimeError::IndexOutOfBounds { index, axis, size })?;
            offset += position * strides[axis];
        }
        let len = self.shape.trailing(indices.len()).volume();
        Ok((offset, len))
    }

    /// Element or sub-array addressed by the leading `indices`.
    pub fn select(&self, indices: &[i64]) -> RuntimeResult<Value> {
        let (offset, len) = self.block(indices)?;
        let selected = Self {
            element: self.element,
            shape: self.shape.trailing(indices.len()),
            items: self.items[offset..offset + len].to_vec(),
        };
        Ok(selected.into_value())
    }

    /// Overwrites the element or sub-array addressed by `indices`.
    pub fn replace(&mut self, indices: &[i64], value: Value) -> RuntimeResult<()> {
        let (offset, len) = self.block(indices)?;
        let target_shape = self.shape.trailing(indices.len());
        if value.element_type() != self.element || value.shape() != target_shape {
            return Err(RuntimeError::ShapeMismatch {
                left: format!("{} {}", self.element, target_shape),
                right: format!("{} {}", value.element_type(), value.shape()),
            });
        }
        match value {
            Value::Array(array) => {
                self.items[offset..offset + len].clone_from_slice(&array.items);
            }
            scalar => self.items[offset] = scalar,
        }
        Ok(())
    }

    pub fn transpose(&self) -> Self {
        let dims = self.shape.dims();
        if dims.len() < 2 {
            return self.clone();
        }
        let shape = self.shape.reversed();
        let strides = self.strides();
        let mut items = Vec::with_capacity(self.items.len());
        let mut index = vec![0usize; dims.len()];
        // Walk the result in row-major order; `index` is its multi-index.
        for _ in 0..self.items.len() {
            let source: usize = index
                .iter()
                .zip(strides.iter().rev())
                .map(|(i, stride)| i * stride)
                .sum();
            items.push(self.items[source].clone());
            for axis in (0..index.len()).rev() {
                index[axis] += 1;
                if index[axis] < shape.dims()[axis] {
                    break;
                }
                index[axis] = 0;
            }
        }
        Self {
            element: self.element,
            shape,
            items,
        }
    }

    /// Stacks equally shaped values along a new leading axis.
    pub fn stack(values: Vec<Value>) -> RuntimeResult<Self> {
        let Some(first) = values.first() else {
            return Ok(Self::empty(ElementType::Int));
        };
        let element = first.element_type();
        let inner = first.shape();
        let mut items = Vec::with_capacity(values.len() * inner.volume());
        let count = values.len();
        for value in values {
            if value.element_type() != element || value.shape() != inner {
                return Err(RuntimeError::ShapeMismatch {
                    left: format!("{element} {inner}"),
                    right: format!("{} {}", value.element_type(), value.shape()),
                });
            }
            match value {
                Value::Array(array) => items.extend(array.items),
                scalar => items.push(scalar),
            }
        }
        Ok(Self {
            element,
            shape: inner.prepend(count),
            items,
        })
    }

    pub(crate) fn from_parts(element: ElementType, shape: Shape, items: Vec<Value>) -> Self {
        debug_assert_eq!(shape.volume(), items.len());
        Self {
            element,
            shape,
            items,
        }
    }
}

impl fmt::Display for ArrayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_axis(f, self.shape.dims(), &self.items)
    }
}

fn write_axis(f: &mut fmt::Formatter<'_>, dims: &[usize], items: &[Value]) -> fmt::Result {
    let Some((&len, rest)) = dims.split_first() else {
        return match items.first() {
            Some(item) => write!(f, "{item}"),
            None => Ok(()),
        };
    };
    let chunk = rest.iter().product::<usize>();
    write!(f, "[")?;
    for idx in 0..len {
        if idx > 0 {
            write!(f, ", ")?;
        }
        let start = idx * chunk;
        write_axis(f, rest, &items[start..start + chunk])?;
    }
    write!(f, "]")
}
