//! Typed failures of the generators.
//!
//! Only constructs the generators cannot express are errors. A pass or
//! checker that does not apply to a node, or a registry miss, is not.

use thiserror::Error;

/// Why a signature or marshaling fragment could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenError {
    /// A visitor reached a variant it does not implement.
    #[error("unsupported {construct} in {generator}")]
    Unsupported {
        construct: &'static str,
        generator: &'static str,
    },

    /// A registered type map left one of its callbacks unimplemented.
    #[error("type map `{name}` does not implement {operation}")]
    TypeMapUnimplemented {
        name: String,
        operation: &'static str,
    },

    /// A marshaling context was missing the parameter or return slot the
    /// generator needed.
    #[error("marshal context has no {0}")]
    MissingContext(&'static str),
}

impl GenError {
    pub fn unsupported(construct: &'static str, generator: &'static str) -> Self {
        GenError::Unsupported {
            construct,
            generator,
        }
    }

    /// True for failures that mean "this site cannot be generated", as
    /// opposed to a broken context.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            GenError::Unsupported { .. } | GenError::TypeMapUnimplemented { .. }
        )
    }
}

pub type GenResult<T> = std::result::Result<T, GenError>;
