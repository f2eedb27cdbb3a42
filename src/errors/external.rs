//! Foreign validation errors that can be folded into [`AppError::Validation`].
//!
//! [`AppError::Validation`]: super::AppError::Validation

use validator::{ValidationErrors, ValidationErrorsKind};

/// A third-party validation error exposing a field to reason mapping
pub trait ExternalValidation {
    /// Every failing field path with its reason code
    fn field_reasons(&self) -> Vec<(String, String)>;
}

/// Nested struct and list errors are reported under dotted paths
/// (`address.ln1`, `items.0.sku`). The reason is the code of the first
/// error recorded for the field.
impl ExternalValidation for ValidationErrors {
    fn field_reasons(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        collect_reasons(self, None, &mut out);
        out
    }
}

fn collect_reasons(errors: &ValidationErrors, prefix: Option<&str>, out: &mut Vec<(String, String)>) {
    for (field, kind) in errors.errors() {
        let path = match prefix {
            Some(prefix) => format!("{}.{}", prefix, field),
            None => field.to_string(),
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                if let Some(first) = field_errors.first() {
                    out.push((path, first.code.to_string()));
                }
            }
            ValidationErrorsKind::Struct(inner) => collect_reasons(inner, Some(&path), out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_reasons(inner, Some(&format!("{}.{}", path, index)), out);
                }
            }
        }
    }
}
