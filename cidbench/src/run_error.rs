use crate::exit_codes::ExitCode;

#[derive(Debug)]
pub enum RunError {
    InvalidInput(anyhow::Error),
    RuntimeError(anyhow::Error),
}

impl RunError {
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::InvalidInput(_) => ExitCode::InvalidInput,
            Self::RuntimeError(_) => ExitCode::RuntimeError,
        }
    }

    #[must_use]
    pub fn anyhow(&self) -> &anyhow::Error {
        match self {
            Self::InvalidInput(e) | Self::RuntimeError(e) => e,
        }
    }
}

impl From<cidbench_core::Error> for RunError {
    fn from(err: cidbench_core::Error) -> Self {
        if err.is_config() {
            Self::InvalidInput(err.into())
        } else {
            Self::RuntimeError(err.into())
        }
    }
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(e) | Self::RuntimeError(e) => write!(f, "{e:#}"),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.anyhow().as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_map_to_invalid_input() {
        let err = RunError::from(cidbench_core::Error::InvalidRate);
        assert_eq!(err.exit_code(), ExitCode::InvalidInput);
    }

    #[test]
    fn engine_faults_map_to_runtime_error() {
        let err = RunError::from(cidbench_core::Error::TrackerUnderflow);
        assert_eq!(err.exit_code(), ExitCode::RuntimeError);
        assert_eq!(err.to_string(), "completion received with no operation in flight");
    }
}
