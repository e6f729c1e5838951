//! C++ type expressions.
//!
//! Types are plain owned trees. The only links back into the declaration
//! arena are [`DeclId`] handles carried by tag, typedef and template
//! specialization types.

use serde::Deserialize;

use crate::model::DeclId;

/// Builtin C++ type kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum Primitive {
    #[serde(rename = "void")]
    Void,
    #[serde(rename = "bool")]
    Bool,
    /// Narrow `char`, the element type of C strings.
    #[serde(rename = "char")]
    Char,
    #[serde(rename = "wchar")]
    WideChar,
    #[serde(rename = "int8")]
    Int8,
    #[serde(rename = "uint8")]
    UInt8,
    #[serde(rename = "int16")]
    Int16,
    #[serde(rename = "uint16")]
    UInt16,
    #[serde(rename = "int32")]
    Int32,
    #[serde(rename = "uint32")]
    UInt32,
    #[serde(rename = "int64")]
    Int64,
    #[serde(rename = "uint64")]
    UInt64,
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "double")]
    Double,
}

impl Primitive {
    /// Spelling of the primitive in C++ source.
    pub fn native_name(self) -> &'static str {
        match self {
            Primitive::Void => "void",
            Primitive::Bool => "bool",
            Primitive::Char => "char",
            Primitive::WideChar => "wchar_t",
            Primitive::Int8 => "signed char",
            Primitive::UInt8 => "unsigned char",
            Primitive::Int16 => "short",
            Primitive::UInt16 => "unsigned short",
            Primitive::Int32 => "int",
            Primitive::UInt32 => "unsigned int",
            Primitive::Int64 => "long long",
            Primitive::UInt64 => "unsigned long long",
            Primitive::Float => "float",
            Primitive::Double => "double",
        }
    }

    /// Integer kinds usable as an enumeration's underlying type.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Primitive::Char
                | Primitive::Int8
                | Primitive::UInt8
                | Primitive::Int16
                | Primitive::UInt16
                | Primitive::Int32
                | Primitive::UInt32
                | Primitive::Int64
                | Primitive::UInt64
        )
    }
}

/// cv-qualifiers attached to a type use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TypeQualifiers {
    pub is_const: bool,
    pub is_volatile: bool,
}

/// A [`Type`] plus its qualifiers. This is what fields, parameters and
/// return slots carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedType {
    pub ty: Type,
    pub qualifiers: TypeQualifiers,
}

impl QualifiedType {
    pub fn new(ty: Type) -> Self {
        Self {
            ty,
            qualifiers: TypeQualifiers::default(),
        }
    }

    pub fn constant(ty: Type) -> Self {
        Self {
            ty,
            qualifiers: TypeQualifiers {
                is_const: true,
                is_volatile: false,
            },
        }
    }
}

impl From<Type> for QualifiedType {
    fn from(ty: Type) -> Self {
        QualifiedType::new(ty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerModifier {
    Pointer,
    LValueReference,
    RValueReference,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerType {
    pub pointee: Box<QualifiedType>,
    pub modifier: PointerModifier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArraySize {
    Constant(usize),
    Variable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayType {
    pub element: Box<QualifiedType>,
    pub size: ArraySize,
}

/// A function signature: `ret(args...)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionType {
    pub return_type: Box<QualifiedType>,
    pub arguments: Vec<QualifiedType>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberPointerType {
    pub pointee: Box<QualifiedType>,
}

/// Reference to a class or enumeration declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagType {
    pub decl: DeclId,
}

/// Reference to a typedef declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypedefType {
    pub decl: DeclId,
}

/// `Template<Args...>`; `template` is the class template declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSpecializationType {
    pub template: DeclId,
    pub arguments: Vec<QualifiedType>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateParameterType {
    pub name: String,
}

/// A C++ type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Builtin(Primitive),
    Pointer(PointerType),
    Array(ArrayType),
    Function(FunctionType),
    MemberPointer(MemberPointerType),
    Tag(TagType),
    Typedef(TypedefType),
    TemplateSpecialization(TemplateSpecializationType),
    TemplateParameter(TemplateParameterType),
}

impl Type {
    pub fn pointer_to(pointee: impl Into<QualifiedType>) -> Type {
        Type::Pointer(PointerType {
            pointee: Box::new(pointee.into()),
            modifier: PointerModifier::Pointer,
        })
    }

    pub fn reference_to(pointee: impl Into<QualifiedType>) -> Type {
        Type::Pointer(PointerType {
            pointee: Box::new(pointee.into()),
            modifier: PointerModifier::LValueReference,
        })
    }

    pub fn tag(decl: DeclId) -> Type {
        Type::Tag(TagType { decl })
    }

    pub fn typedef(decl: DeclId) -> Type {
        Type::Typedef(TypedefType { decl })
    }

    /// True for `T*` (not references).
    pub fn is_pointer(&self) -> bool {
        matches!(
            self,
            Type::Pointer(PointerType {
                modifier: PointerModifier::Pointer,
                ..
            })
        )
    }

    /// True for `T&` and `T&&`.
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Type::Pointer(PointerType {
                modifier: PointerModifier::LValueReference | PointerModifier::RValueReference,
                ..
            })
        )
    }

    pub fn pointee(&self) -> Option<&QualifiedType> {
        match self {
            Type::Pointer(p) => Some(&p.pointee),
            _ => None,
        }
    }

    pub fn as_primitive(&self) -> Option<Primitive> {
        match self {
            Type::Builtin(p) => Some(*p),
            _ => None,
        }
    }
}
