use thiserror::Error as ThisError;

///
/// PhormError
///
/// Typed failures of the binding engine. They travel inside [`crate::Error`] and can be
/// recovered with `error.downcast_ref::<PhormError>()`.
///
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum PhormError {
    #[error("Invalid contract `{contract}`, member `{member}`: {reason}")]
    ContractDefinition {
        contract: String,
        member: String,
        reason: String,
    },

    #[error("Contract `{contract}` requires a value for member `{member}`")]
    RequiredValueMissing { contract: String, member: String },

    #[error("No secure value handler available for classification `{classification}` (member `{member}`)")]
    EncryptionUnavailable {
        classification: String,
        member: String,
    },

    #[error("Type `{entity}` has no accessible default constructor nor a usable record constructor")]
    MissingConstructor { entity: String },

    #[error("Unsupported predicate over `{entity}`: {reason}")]
    UnsupportedPredicate { entity: String, reason: String },

    #[error("Member `{member}` of `{entity}` is singular but {matches} records matched")]
    MultipleMatchesForSingularAssociation {
        entity: String,
        member: String,
        matches: usize,
    },

    #[error("Expected a single row for `{entity}` but the result set has more than one")]
    UnexpectedMultipleRows { entity: String },

    #[error("Matcher `{matcher}` expects `{expected}` but was invoked with `{actual}`")]
    MatcherTypeMismatch {
        matcher: String,
        expected: String,
        actual: String,
    },
}

impl PhormError {
    pub fn contract_definition(
        contract: impl Into<String>,
        member: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::ContractDefinition {
            contract: contract.into(),
            member: member.into(),
            reason: reason.into(),
        }
    }

    /// The typed error carried by `error`, if any.
    pub fn of(error: &crate::Error) -> Option<&PhormError> {
        error.downcast_ref::<PhormError>()
    }
}
