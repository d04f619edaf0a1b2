//! Error types of the pack calculator.

use thiserror::Error;

/// Whether a failure was caused by the caller or by a defect in the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input; report it back to the caller verbatim.
    UserInput,
    /// Broken solver invariant; should never happen with valid input.
    Internal,
}

/// Failure of a single solver call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PackError {
    #[error("quantity must be > 0, got {0}")]
    InvalidQuantity(i64),

    #[error("at least one pack size is required")]
    NoPackSizes,

    #[error("pack size must be > 0, got {0}")]
    InvalidPackSize(i64),

    #[error("search window of {required} totals exceeds the limit of {limit}")]
    SearchSpaceTooLarge { required: u64, limit: u64 },

    #[error("no feasible combination found for quantity {quantity}")]
    Infeasible { quantity: u64 },

    #[error("internal reconstruction error at scaled total {total}")]
    Reconstruction { total: u64 },
}

impl PackError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PackError::InvalidQuantity(_)
            | PackError::NoPackSizes
            | PackError::InvalidPackSize(_)
            | PackError::SearchSpaceTooLarge { .. } => ErrorKind::UserInput,
            PackError::Infeasible { .. } | PackError::Reconstruction { .. } => {
                ErrorKind::Internal
            }
        }
    }

    /// Stable machine-readable code, used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            PackError::InvalidQuantity(_) => "invalid_quantity",
            PackError::NoPackSizes => "no_pack_sizes",
            PackError::InvalidPackSize(_) => "invalid_pack",
            PackError::SearchSpaceTooLarge { .. } => "quantity_too_large",
            PackError::Infeasible { .. } | PackError::Reconstruction { .. } => "internal_error",
        }
    }

    pub fn is_internal(&self) -> bool {
        self.kind() == ErrorKind::Internal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_errors_are_not_internal() {
        for err in [
            PackError::InvalidQuantity(0),
            PackError::NoPackSizes,
            PackError::InvalidPackSize(-1),
            PackError::SearchSpaceTooLarge {
                required: 10,
                limit: 5,
            },
        ] {
            assert_eq!(err.kind(), ErrorKind::UserInput, "{err}");
            assert!(!err.is_internal());
        }
    }

    #[test]
    fn invariant_violations_are_internal() {
        assert!(PackError::Infeasible { quantity: 5 }.is_internal());
        assert!(PackError::Reconstruction { total: 3 }.is_internal());
        assert_eq!(
            PackError::Reconstruction { total: 3 }.code(),
            "internal_error"
        );
    }

    #[test]
    fn messages_carry_the_offending_value() {
        assert_eq!(
            PackError::InvalidPackSize(-1).to_string(),
            "pack size must be > 0, got -1"
        );
        assert_eq!(
            PackError::InvalidQuantity(0).to_string(),
            "quantity must be > 0, got 0"
        );
    }
}
