/// Result of a generative service call after recovery.
///
/// Services never fail outright: a call that errors or returns unusable text
/// yields `Fallback` carrying the documented default and why it was used.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceOutcome<T> {
    Success(T),
    Fallback { value: T, reason: String },
}

impl<T> ServiceOutcome<T> {
    pub fn fallback(value: T, reason: impl Into<String>) -> Self {
        ServiceOutcome::Fallback {
            value,
            reason: reason.into(),
        }
    }

    pub fn value(&self) -> &T {
        match self {
            ServiceOutcome::Success(value) | ServiceOutcome::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            ServiceOutcome::Success(value) | ServiceOutcome::Fallback { value, .. } => value,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ServiceOutcome::Fallback { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            ServiceOutcome::Success(_) => None,
            ServiceOutcome::Fallback { reason, .. } => Some(reason),
        }
    }
}
