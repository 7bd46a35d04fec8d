use crate::types::EntityId;

/// Precondition and configuration failures raised synchronously to the caller.
///
/// These are programming errors, not runtime conditions: per-tick failures
/// inside behaviors are logged at the world or engine boundary instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("entity {0} is not attached to a world")]
    NotAttached(EntityId),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_problem() {
        let err = EngineError::InvalidArgument("width must be positive".into());
        assert_eq!(err.to_string(), "invalid argument: width must be positive");

        let err = EngineError::NotAttached(EntityId::new(3, 1));
        assert!(err.to_string().contains("3v1"));

        let err = EngineError::InvalidConfiguration("tps".into());
        assert!(err.to_string().starts_with("invalid configuration"));
    }
}
