// Copyright 2025 Cowboy AI, LLC.

//! Declared types of mapped values
//!
//! [`TypeRef`] is the vocabulary shared by the catalog, the rules and the
//! converter resolver. Class and enum types are referenced by name; their
//! structure lives in the [`TypeCatalog`](crate::TypeCatalog).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of an integer type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IntWidth {
    /// 8-bit signed
    I8,
    /// 16-bit signed
    I16,
    /// 32-bit signed
    I32,
    /// 64-bit signed
    I64,
}

impl IntWidth {
    /// Inclusive value range of this width
    pub fn bounds(&self) -> (i64, i64) {
        match self {
            IntWidth::I8 => (i8::MIN as i64, i8::MAX as i64),
            IntWidth::I16 => (i16::MIN as i64, i16::MAX as i64),
            IntWidth::I32 => (i32::MIN as i64, i32::MAX as i64),
            IntWidth::I64 => (i64::MIN, i64::MAX),
        }
    }

    /// Check whether a value fits this width
    pub fn contains(&self, value: i64) -> bool {
        let (min, max) = self.bounds();
        value >= min && value <= max
    }
}

/// Width of a floating point type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FloatWidth {
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
}

/// A declared type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeRef {
    /// Matches any value; supertype of every type
    Any,
    /// Boolean
    Bool,
    /// Signed integer
    Int(IntWidth),
    /// Floating point number
    Float(FloatWidth),
    /// Single character
    Char,
    /// Text
    String,
    /// Calendar date
    Date,
    /// UTC timestamp
    DateTime,
    /// Catalogued or free enum, by name
    Enum(String),
    /// Catalogued class, by name
    Class(String),
    /// Ordered collection
    List(Box<TypeRef>),
    /// Collection without duplicates
    Set(Box<TypeRef>),
    /// Fixed element-type sequence
    Array(Box<TypeRef>),
    /// Key/value container
    Map(Box<TypeRef>, Box<TypeRef>),
}

impl TypeRef {
    /// `Int(I32)`
    pub fn i32() -> Self {
        TypeRef::Int(IntWidth::I32)
    }

    /// `Int(I64)`
    pub fn i64() -> Self {
        TypeRef::Int(IntWidth::I64)
    }

    /// `Float(F64)`
    pub fn f64() -> Self {
        TypeRef::Float(FloatWidth::F64)
    }

    /// Class type by name
    pub fn class(name: impl Into<String>) -> Self {
        TypeRef::Class(name.into())
    }

    /// Enum type by name
    pub fn enumeration(name: impl Into<String>) -> Self {
        TypeRef::Enum(name.into())
    }

    /// List of the given element type
    pub fn list(element: TypeRef) -> Self {
        TypeRef::List(Box::new(element))
    }

    /// Set of the given element type
    pub fn set(element: TypeRef) -> Self {
        TypeRef::Set(Box::new(element))
    }

    /// Array of the given element type
    pub fn array(element: TypeRef) -> Self {
        TypeRef::Array(Box::new(element))
    }

    /// Map with the given key and value types
    pub fn map(key: TypeRef, value: TypeRef) -> Self {
        TypeRef::Map(Box::new(key), Box::new(value))
    }

    /// Primitive-like types handled by the built-in conversion table
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            TypeRef::Bool
                | TypeRef::Int(_)
                | TypeRef::Float(_)
                | TypeRef::Char
                | TypeRef::String
                | TypeRef::Date
                | TypeRef::DateTime
                | TypeRef::Enum(_)
        )
    }

    /// List, set or array
    pub fn is_sequence(&self) -> bool {
        matches!(self, TypeRef::List(_) | TypeRef::Set(_) | TypeRef::Array(_))
    }

    /// Any container type
    pub fn is_container(&self) -> bool {
        self.is_sequence() || matches!(self, TypeRef::Map(_, _))
    }

    /// Class name, when this is a class type
    pub fn class_name(&self) -> Option<&str> {
        match self {
            TypeRef::Class(name) => Some(name),
            _ => None,
        }
    }

    /// Element type of a sequence
    pub fn element_type(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::List(e) | TypeRef::Set(e) | TypeRef::Array(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Any => write!(f, "Any"),
            TypeRef::Bool => write!(f, "bool"),
            TypeRef::Int(IntWidth::I8) => write!(f, "i8"),
            TypeRef::Int(IntWidth::I16) => write!(f, "i16"),
            TypeRef::Int(IntWidth::I32) => write!(f, "i32"),
            TypeRef::Int(IntWidth::I64) => write!(f, "i64"),
            TypeRef::Float(FloatWidth::F32) => write!(f, "f32"),
            TypeRef::Float(FloatWidth::F64) => write!(f, "f64"),
            TypeRef::Char => write!(f, "char"),
            TypeRef::String => write!(f, "String"),
            TypeRef::Date => write!(f, "Date"),
            TypeRef::DateTime => write!(f, "DateTime"),
            TypeRef::Enum(name) | TypeRef::Class(name) => write!(f, "{}", name),
            TypeRef::List(e) => write!(f, "List<{}>", e),
            TypeRef::Set(e) => write!(f, "Set<{}>", e),
            TypeRef::Array(e) => write!(f, "[{}]", e),
            TypeRef::Map(k, v) => write!(f, "Map<{}, {}>", k, v),
        }
    }
}
