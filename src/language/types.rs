use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    Int,
    Float,
    String,
    Bool,
}

impl ElementType {
    pub fn name(self) -> &'static str {
        match self {
            ElementType::Int => "int",
            ElementType::Float => "float",
            ElementType::String => "string",
            ElementType::Bool => "bool",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, ElementType::Int | ElementType::Float)
    }

    /// Int/Float promotion shared by arithmetic and contraction.
    pub fn promote(self, other: ElementType) -> Option<ElementType> {
        match (self, other) {
            (ElementType::Int, ElementType::Int) => Some(ElementType::Int),
            (a, b) if a.is_numeric() && b.is_numeric() => Some(ElementType::Float),
            _ => None,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Extents of an array, outermost axis first. The empty shape is a scalar.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Shape(Vec<usize>);

impl Shape {
    pub fn scalar() -> Self {
        Shape(Vec::new())
    }

    pub fn new(dims: Vec<usize>) -> Self {
        Shape(dims)
    }

    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    pub fn is_scalar(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of elements an array of this shape holds. Only meaningful for
    /// shapes of arrays that already exist; see [`Shape::checked_volume`].
    pub fn volume(&self) -> usize {
        self.0.iter().product()
    }

    /// Element count, or `None` when it does not fit in `usize`.
    pub fn checked_volume(&self) -> Option<usize> {
        self.0.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
    }

    pub fn prepend(&self, dim: usize) -> Shape {
        let mut dims = Vec::with_capacity(self.0.len() + 1);
        dims.push(dim);
        dims.extend_from_slice(&self.0);
        Shape(dims)
    }

    /// Dimensions left after consuming `count` leading axes.
    pub fn trailing(&self, count: usize) -> Shape {
        Shape(self.0.get(count..).unwrap_or_default().to_vec())
    }

    pub fn reversed(&self) -> Shape {
        Shape(self.0.iter().rev().copied().collect())
    }

    /// Shape of the one-axis contraction of `self` against `rhs`, or `None`
    /// when either side is a scalar or the contracted extents differ.
    pub fn contract(&self, rhs: &Shape) -> Option<Shape> {
        let (&inner, outer_left) = self.0.split_last()?;
        let (&leading, outer_right) = rhs.0.split_first()?;
        if inner != leading {
            return None;
        }
        let mut dims = outer_left.to_vec();
        dims.extend_from_slice(outer_right);
        Some(Shape(dims))
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Shape(dims)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (idx, dim) in self.0.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{dim}")?;
        }
        if self.0.len() == 1 {
            write!(f, ",")?;
        }
        write!(f, ")")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDesc {
    pub element: ElementType,
    pub shape: Shape,
}

impl TypeDesc {
    pub fn new(element: ElementType, shape: Shape) -> Self {
        Self { element, shape }
    }

    pub fn scalar(element: ElementType) -> Self {
        Self::new(element, Shape::scalar())
    }

    pub fn is_scalar_of(&self, element: ElementType) -> bool {
        self.element == element && self.shape.is_scalar()
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.element, self.shape)
    }
}

/// What the checker knows about an expression or a variable.
///
/// Statements produce a placeholder with no type; a variable declared by its
/// first assignment is briefly untyped until the assignment completes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeSymbol {
    pub ty: Option<TypeDesc>,
    pub line: Option<usize>,
}

impl TypeSymbol {
    pub fn typed(ty: TypeDesc, line: Option<usize>) -> Self {
        Self { ty: Some(ty), line }
    }

    pub fn untyped(line: Option<usize>) -> Self {
        Self { ty: None, line }
    }

    pub fn placeholder(line: Option<usize>) -> Self {
        Self::untyped(line)
    }

    pub fn describe(&self) -> String {
        match &self.ty {
            Some(ty) => ty.to_string(),
            None => "untyped".to_string(),
        }
    }
}
