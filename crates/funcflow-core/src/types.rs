use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    Bool,
    Int(u16),
    Float(u16),
    String,
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Bool => write!(f, "i1"),
            ElementType::Int(bits) => write!(f, "i{}", bits),
            ElementType::Float(bits) => write!(f, "f{}", bits),
            ElementType::String => write!(f, "string"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dim {
    Fixed(u64),
    Dynamic,
}

impl Dim {
    fn is_compatible(&self, other: &Dim) -> bool {
        match (self, other) {
            (Dim::Dynamic, _) | (_, Dim::Dynamic) => true,
            (Dim::Fixed(a), Dim::Fixed(b)) => a == b,
        }
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dim::Fixed(n) => write!(f, "{}", n),
            Dim::Dynamic => write!(f, "?"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shape {
    Unranked,
    Ranked(Vec<Dim>),
}

impl Shape {
    pub fn scalar() -> Self {
        Shape::Ranked(Vec::new())
    }

    pub fn rank(&self) -> Option<usize> {
        match self {
            Shape::Unranked => None,
            Shape::Ranked(dims) => Some(dims.len()),
        }
    }

    /// Shapes are compatible when either side is unranked, or both have the
    /// same rank and every dimension pair agrees or is dynamic.
    pub fn is_compatible(&self, other: &Shape) -> bool {
        match (self, other) {
            (Shape::Unranked, _) | (_, Shape::Unranked) => true,
            (Shape::Ranked(a), Shape::Ranked(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.is_compatible(y))
            }
        }
    }
}

/// Value types: plain scalars and tensors of an element type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Scalar(ElementType),
    Tensor { element: ElementType, shape: Shape },
}

impl Type {
    pub fn i1() -> Self {
        Type::Scalar(ElementType::Bool)
    }

    pub fn int(bits: u16) -> Self {
        Type::Scalar(ElementType::Int(bits))
    }

    pub fn tensor(element: ElementType, dims: Vec<Dim>) -> Self {
        Type::Tensor {
            element,
            shape: Shape::Ranked(dims),
        }
    }

    pub fn scalar_tensor(element: ElementType) -> Self {
        Type::tensor(element, Vec::new())
    }

    pub fn unranked_tensor(element: ElementType) -> Self {
        Type::Tensor {
            element,
            shape: Shape::Unranked,
        }
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            Type::Scalar(element) | Type::Tensor { element, .. } => *element,
        }
    }

    pub fn is_tensor(&self) -> bool {
        matches!(self, Type::Tensor { .. })
    }

    /// Rank of the value; scalars are rank 0, unranked tensors have none.
    pub fn rank(&self) -> Option<usize> {
        match self {
            Type::Scalar(_) => Some(0),
            Type::Tensor { shape, .. } => shape.rank(),
        }
    }

    pub fn is_bool_scalar(&self) -> bool {
        matches!(self, Type::Scalar(ElementType::Bool))
    }

    /// Two types are cast-compatible when a `tensor_cast` can convert one to
    /// the other: identical types, or tensors sharing an element type whose
    /// shapes differ only in how specific they are.
    pub fn is_cast_compatible(&self, other: &Type) -> bool {
        if self == other {
            return true;
        }
        match (self, other) {
            (
                Type::Tensor {
                    element: a,
                    shape: sa,
                },
                Type::Tensor {
                    element: b,
                    shape: sb,
                },
            ) => a == b && sa.is_compatible(sb),
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Scalar(element) => write!(f, "{}", element),
            Type::Tensor {
                element,
                shape: Shape::Unranked,
            } => write!(f, "tensor<*x{}>", element),
            Type::Tensor {
                element,
                shape: Shape::Ranked(dims),
            } => {
                write!(f, "tensor<")?;
                for dim in dims {
                    write!(f, "{}x", dim)?;
                }
                write!(f, "{}>", element)
            }
        }
    }
}

pub fn format_type_list(types: &[Type]) -> String {
    types
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Type::i1().to_string(), "i1");
        assert_eq!(Type::int(32).to_string(), "i32");
        assert_eq!(
            Type::scalar_tensor(ElementType::Bool).to_string(),
            "tensor<i1>"
        );
        assert_eq!(
            Type::tensor(ElementType::Int(32), vec![Dim::Fixed(4), Dim::Dynamic]).to_string(),
            "tensor<4x?xi32>"
        );
        assert_eq!(
            Type::unranked_tensor(ElementType::Float(32)).to_string(),
            "tensor<*xf32>"
        );
    }

    #[test]
    fn test_cast_compatibility() {
        let ranked = Type::tensor(ElementType::Int(32), vec![Dim::Fixed(4)]);
        let dynamic = Type::tensor(ElementType::Int(32), vec![Dim::Dynamic]);
        let unranked = Type::unranked_tensor(ElementType::Int(32));
        let other_rank = Type::tensor(ElementType::Int(32), vec![Dim::Fixed(4), Dim::Fixed(1)]);
        let float = Type::tensor(ElementType::Float(32), vec![Dim::Fixed(4)]);

        assert!(ranked.is_cast_compatible(&dynamic));
        assert!(ranked.is_cast_compatible(&unranked));
        assert!(unranked.is_cast_compatible(&other_rank));
        assert!(!ranked.is_cast_compatible(&other_rank));
        assert!(!ranked.is_cast_compatible(&float));
        assert!(!Type::int(32).is_cast_compatible(&Type::int(64)));
        assert!(!Type::int(32).is_cast_compatible(&Type::scalar_tensor(ElementType::Int(32))));
    }

    #[test]
    fn test_rank() {
        assert_eq!(Type::i1().rank(), Some(0));
        assert_eq!(Type::scalar_tensor(ElementType::Bool).rank(), Some(0));
        assert_eq!(Type::unranked_tensor(ElementType::Bool).rank(), None);
    }
}
