use lucent_common::Span;

/// A type written in source (e.g. `int`, `vec3`, `float[]`).
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAnnotation {
    pub kind: TypeKind,
    pub span: Span,
}

/// The kinds of type annotations. Lucent has a fixed, finite type vocabulary;
/// the only composite form is the array of another annotated type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Void,
    Bool,
    Int,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
    /// `T[]` — element type annotation.
    Array(Box<TypeAnnotation>),
}

impl TypeAnnotation {
    pub fn new(kind: TypeKind, span: Span) -> Self {
        Self { kind, span }
    }
}
