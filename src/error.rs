use thiserror::Error;

/// Error type for generator evaluation, costing, and optimization.
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// A derived geometric or electrical quantity left its physical range.
    #[error("Non-physical design: {quantity} = {value}")]
    Domain { quantity: &'static str, value: f64 },

    #[error("Negative {component} mass: {value} kg")]
    NegativeMass { component: &'static str, value: f64 },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type GeneratorResult<T> = Result<T, GeneratorError>;

impl GeneratorError {
    pub(crate) fn config<S: Into<String>>(message: S) -> Self {
        Self::Configuration(message.into())
    }

    /// Returns `true` if the error marks an infeasible candidate rather than a fault.
    pub fn is_infeasible_candidate(&self) -> bool {
        matches!(self, Self::Domain { .. } | Self::NegativeMass { .. })
    }
}

/// Fails with [GeneratorError::Domain] unless `value` is finite and strictly positive.
pub(crate) fn positive(quantity: &'static str, value: f64) -> GeneratorResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(GeneratorError::Domain { quantity, value })
    }
}

/// Fails with [GeneratorError::Domain] unless `value` is finite.
pub(crate) fn finite(quantity: &'static str, value: f64) -> GeneratorResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(GeneratorError::Domain { quantity, value })
    }
}
