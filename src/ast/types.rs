//! The language's type system.
//!
//! Types are produced by the parser for declarations and casts, and attached
//! to every expression by the type checker. The checker and the lowering pass
//! share the equivalence and cast rules defined here.

use std::fmt::Display;

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    /// 32-bit integer whose arithmetic traps on overflow.
    CheckedInt,
    Float,
    Bool,
    Void,
    StringLiteralPointer,
    Reference {
        inner: Box<Type>,
        noalias: bool,
    },
    /// Type of an integer literal before context picks `int` or `cint`.
    UntypedIntLiteral,
}

impl Type {
    pub fn reference(inner: Type, noalias: bool) -> Self {
        Type::Reference {
            inner: Box::new(inner),
            noalias,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Type::Reference { .. })
    }

    /// Removes one reference qualifier, if any.
    pub fn strip_reference(&self) -> &Type {
        match self {
            Type::Reference { inner, .. } => inner,
            other => other,
        }
    }

    /// The concrete type a value of this type is stored as.
    pub fn base(&self) -> Type {
        match self.strip_reference() {
            Type::UntypedIntLiteral => Type::Int,
            other => other.clone(),
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self.strip_reference(),
            Type::Int | Type::CheckedInt | Type::UntypedIntLiteral
        )
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || matches!(self.strip_reference(), Type::Float)
    }

    /// Whether two types may meet in an operator, assignment, argument or return.
    ///
    /// Checked integers only meet checked integers or bare literals; every
    /// other pair must agree once one reference qualifier is stripped.
    pub fn equivalent(&self, other: &Type) -> bool {
        let left = self.strip_reference();
        let right = other.strip_reference();

        match (left, right) {
            (Type::CheckedInt, Type::CheckedInt)
            | (Type::CheckedInt, Type::UntypedIntLiteral)
            | (Type::UntypedIntLiteral, Type::CheckedInt) => true,
            (Type::CheckedInt, _) | (_, Type::CheckedInt) => false,
            _ => left.base() == right.base(),
        }
    }

    /// Whether `[self] value` is legal for a value of type `from`.
    pub fn can_cast_from(&self, from: &Type) -> bool {
        let from = from.base();
        let numeric = |ty: &Type| matches!(ty, Type::Int | Type::CheckedInt | Type::Float);

        *self == from || (numeric(self) && numeric(&from)) || (*self == Type::Bool && from == Type::Bool)
    }

    /// Whether a variable or parameter may be declared with this type.
    pub fn is_valid_declaration(&self) -> bool {
        match self {
            Type::Void => false,
            Type::Reference { inner, .. } => {
                !matches!(inner.as_ref(), Type::Reference { .. } | Type::Void)
            }
            _ => true,
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::CheckedInt => write!(f, "cint"),
            Type::Float => write!(f, "float"),
            Type::Bool => write!(f, "bool"),
            Type::Void => write!(f, "void"),
            Type::StringLiteralPointer => write!(f, "slit"),
            Type::Reference { inner, noalias } => {
                if *noalias {
                    write!(f, "noalias ref {}", inner)
                } else {
                    write!(f, "ref {}", inner)
                }
            }
            Type::UntypedIntLiteral => write!(f, "lit int"),
        }
    }
}

impl Serialize for Type {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::Type;

    #[test]
    fn test_equivalence_of_checked_integers() {
        assert!(Type::CheckedInt.equivalent(&Type::CheckedInt));
        assert!(Type::CheckedInt.equivalent(&Type::UntypedIntLiteral));
        assert!(Type::UntypedIntLiteral.equivalent(&Type::CheckedInt));
        assert!(!Type::CheckedInt.equivalent(&Type::Int));
        assert!(!Type::Int.equivalent(&Type::CheckedInt));
        assert!(Type::reference(Type::CheckedInt, false).equivalent(&Type::CheckedInt));
    }

    #[test]
    fn test_equivalence_strips_one_reference() {
        assert!(Type::reference(Type::Int, true).equivalent(&Type::Int));
        assert!(Type::Int.equivalent(&Type::UntypedIntLiteral));
        assert!(!Type::Float.equivalent(&Type::UntypedIntLiteral));
        assert!(!Type::Bool.equivalent(&Type::Int));
    }

    #[test]
    fn test_casts() {
        assert!(Type::Int.can_cast_from(&Type::Float));
        assert!(Type::Float.can_cast_from(&Type::UntypedIntLiteral));
        assert!(Type::CheckedInt.can_cast_from(&Type::reference(Type::Int, false)));
        assert!(Type::Bool.can_cast_from(&Type::Bool));
        assert!(!Type::Bool.can_cast_from(&Type::Int));
        assert!(!Type::Int.can_cast_from(&Type::Bool));
        assert!(!Type::Void.can_cast_from(&Type::Int));
    }

    #[test]
    fn test_declaration_validity() {
        assert!(Type::Int.is_valid_declaration());
        assert!(Type::reference(Type::Float, true).is_valid_declaration());
        assert!(!Type::Void.is_valid_declaration());
        assert!(!Type::reference(Type::Void, false).is_valid_declaration());
        assert!(!Type::reference(Type::reference(Type::Int, false), false).is_valid_declaration());
    }

    #[test]
    fn test_display() {
        assert_eq!(Type::CheckedInt.to_string(), "cint");
        assert_eq!(Type::reference(Type::Int, false).to_string(), "ref int");
        assert_eq!(Type::reference(Type::Float, true).to_string(), "noalias ref float");
        assert_eq!(Type::UntypedIntLiteral.to_string(), "lit int");
    }
}
