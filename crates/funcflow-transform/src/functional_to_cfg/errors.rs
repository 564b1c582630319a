use funcflow_core::{InstId, IrError, SourceLocation, Type};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoweringError {
    #[error("{op}: condition of type {ty} is not supported, only rank-0 tensors of i1 are")]
    UnsupportedConditionType {
        op: InstId,
        ty: Type,
        location: Option<SourceLocation>,
    },

    #[error("{op}: callee @{callee} is not defined in the module")]
    UnresolvedCallee {
        op: InstId,
        callee: String,
        location: Option<SourceLocation>,
    },

    #[error("{op}: {site} expects {expected}, got incompatible {found}")]
    TypeMismatch {
        op: InstId,
        site: String,
        expected: Type,
        found: Type,
        location: Option<SourceLocation>,
    },

    #[error("{op}: {site} expects {expected} values, got {found}")]
    ArityMismatch {
        op: InstId,
        site: String,
        expected: usize,
        found: usize,
        location: Option<SourceLocation>,
    },

    #[error("IR invariant violated: {0}")]
    Internal(#[from] IrError),
}

impl LoweringError {
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            LoweringError::UnsupportedConditionType { location, .. }
            | LoweringError::UnresolvedCallee { location, .. }
            | LoweringError::TypeMismatch { location, .. }
            | LoweringError::ArityMismatch { location, .. } => location.as_ref(),
            LoweringError::Internal(_) => None,
        }
    }
}

/// The instruction being lowered, used to attribute errors.
#[derive(Debug, Clone)]
pub struct OpContext {
    pub op: InstId,
    pub location: Option<SourceLocation>,
}

impl OpContext {
    pub fn new(op: InstId, location: Option<SourceLocation>) -> Self {
        Self { op, location }
    }

    pub fn unsupported_condition(&self, ty: &Type) -> LoweringError {
        LoweringError::UnsupportedConditionType {
            op: self.op,
            ty: ty.clone(),
            location: self.location.clone(),
        }
    }

    pub fn unresolved(&self, callee: &str) -> LoweringError {
        LoweringError::UnresolvedCallee {
            op: self.op,
            callee: callee.to_string(),
            location: self.location.clone(),
        }
    }

    pub fn type_mismatch(
        &self,
        site: impl Into<String>,
        expected: &Type,
        found: &Type,
    ) -> LoweringError {
        LoweringError::TypeMismatch {
            op: self.op,
            site: site.into(),
            expected: expected.clone(),
            found: found.clone(),
            location: self.location.clone(),
        }
    }

    pub fn arity_mismatch(
        &self,
        site: impl Into<String>,
        expected: usize,
        found: usize,
    ) -> LoweringError {
        LoweringError::ArityMismatch {
            op: self.op,
            site: site.into(),
            expected,
            found,
            location: self.location.clone(),
        }
    }

    /// Checks that `found` can be coerced to `expected` position by position.
    pub fn check_coercible(
        &self,
        site: &str,
        expected: &[Type],
        found: &[Type],
    ) -> Result<(), LoweringError> {
        if expected.len() != found.len() {
            return Err(self.arity_mismatch(site, expected.len(), found.len()));
        }
        for (exp, got) in expected.iter().zip(found) {
            if !got.is_cast_compatible(exp) {
                return Err(self.type_mismatch(site, exp, got));
            }
        }
        Ok(())
    }
}
