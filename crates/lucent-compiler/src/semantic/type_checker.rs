use crate::ast::nodes::{AssignOp, BinaryOp, PostfixOp, UnaryOp};

use super::diagnostics::SemanticError;
use super::types::Type;

/// Operand classes the arithmetic-style operators accept.
fn operable(ty: &Type) -> bool {
    ty.is_numeric() || ty.is_vector() || ty.is_matrix()
}

/// Check a binary operation and return the result type.
///
/// An `error` operand short-circuits to `error` without a diagnostic. All
/// groups share the precondition that the operand types are convertible in
/// at least one direction; the group then refines what it accepts:
/// logical wants two bools, relational wants two numerics, equality takes
/// any mutually convertible pair, and arithmetic wants a numeric, vector,
/// or matrix left operand (whose type is also the result).
pub fn check_binary_op(left: &Type, op: BinaryOp, right: &Type) -> Result<Type, SemanticError> {
    if left.is_error() || right.is_error() {
        return Ok(Type::Error);
    }

    let incompatible = || SemanticError::IncompatibleOperands {
        op: op.symbol(),
        left: left.clone(),
        right: right.clone(),
    };

    if !left.is_convertible_to(right) && !right.is_convertible_to(left) {
        return Err(incompatible());
    }

    if op.is_logical() {
        if left.is_bool() && right.is_bool() {
            Ok(Type::Bool)
        } else {
            Err(incompatible())
        }
    } else if op.is_relational() {
        if left.is_numeric() && right.is_numeric() {
            Ok(Type::Bool)
        } else {
            Err(incompatible())
        }
    } else if op.is_equality() {
        Ok(Type::Bool)
    } else {
        // Arithmetic: result is the left operand's type.
        if operable(left) {
            Ok(left.clone())
        } else {
            Err(incompatible())
        }
    }
}

/// Check a prefix operation (`-x`, `++i`, `--i`) and return the result type.
pub fn check_unary_op(op: UnaryOp, operand: &Type) -> Result<Type, SemanticError> {
    if operand.is_error() {
        return Ok(Type::Error);
    }
    if operable(operand) {
        Ok(operand.clone())
    } else {
        Err(SemanticError::IncompatibleOperand {
            op: op.symbol(),
            operand: operand.clone(),
        })
    }
}

/// Check a postfix operation (`i++`, `i--`) and return the result type.
pub fn check_postfix_op(operand: &Type, op: PostfixOp) -> Result<Type, SemanticError> {
    if operand.is_error() {
        return Ok(Type::Error);
    }
    if operable(operand) {
        Ok(operand.clone())
    } else {
        Err(SemanticError::IncompatibleOperand {
            op: op.symbol(),
            operand: operand.clone(),
        })
    }
}

/// Check an assignment and return the result type (the left operand's).
/// Booleans, voids, and arrays are not assignable under this rule set.
pub fn check_assignment(left: &Type, op: AssignOp, right: &Type) -> Result<Type, SemanticError> {
    if left.is_error() || right.is_error() {
        return Ok(Type::Error);
    }
    let incompatible = || SemanticError::IncompatibleOperands {
        op: op.symbol(),
        left: left.clone(),
        right: right.clone(),
    };
    if !left.is_convertible_to(right) && !right.is_convertible_to(left) {
        return Err(incompatible());
    }
    if operable(left) {
        Ok(left.clone())
    } else {
        Err(incompatible())
    }
}

/// Check a vector field access and return the result type.
///
/// Order matters and is deliberate: the selector length is bounded first
/// (an oversized selector reports regardless of which characters it holds),
/// then each character must be one of `x y z w`, then each selected
/// component must exist on the base vector (`z`/`w` are out of range on a
/// `vec2`, `w` on a `vec3`).
pub fn check_swizzle(base: &Type, field: &str) -> Result<Type, SemanticError> {
    if base.is_error() {
        return Ok(Type::Error);
    }
    if !base.is_vector() {
        return Err(SemanticError::InaccessibleSwizzle {
            field: field.to_string(),
            base: base.clone(),
        });
    }
    if field.len() > 4 {
        return Err(SemanticError::OversizedVector {
            field: field.to_string(),
        });
    }

    let limit = base.component_count();
    for ch in field.chars() {
        let component = match ch {
            'x' => 0,
            'y' => 1,
            'z' => 2,
            'w' => 3,
            _ => {
                return Err(SemanticError::InvalidSwizzle {
                    field: field.to_string(),
                })
            }
        };
        if component >= limit {
            return Err(SemanticError::SwizzleOutOfBound {
                field: field.to_string(),
                base: base.clone(),
            });
        }
    }

    match field.len() {
        1 => Ok(Type::Float),
        2 => Ok(Type::Vec2),
        3 => Ok(Type::Vec3),
        _ => Ok(Type::Vec4),
    }
}
