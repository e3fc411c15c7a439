//! Exit codes for the rc-core CLI.
//!
//! Exit codes communicate the run outcome without requiring output parsing.
//! They are stable across releases.

use rc_common::Error;

/// Exit codes for rc-core operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Threshold selected / command succeeded
    Ok = 0,

    /// Configuration error
    ConfigError = 10,

    /// Input unsuitable for the procedure (parse, missing data, stratification)
    DataError = 11,

    /// Every fold failed; no threshold could be costed
    NoValidThreshold = 12,

    /// I/O error
    IoError = 13,

    /// Internal/unknown error
    InternalError = 99,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == ExitCode::Ok
    }

    /// Map a pipeline error onto its exit code.
    pub fn from_error(err: &Error) -> Self {
        match err {
            Error::Config(_) | Error::InvalidGrid(_) => ExitCode::ConfigError,
            Error::NoValidThreshold { .. } => ExitCode::NoValidThreshold,
            Error::Io(_) => ExitCode::IoError,
            Error::Json(_) => ExitCode::InternalError,
            e if e.is_data_error() => ExitCode::DataError,
            _ => ExitCode::InternalError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_to_stable_codes() {
        assert_eq!(ExitCode::from_error(&Error::Config("x".into())).as_i32(), 10);
        let data = Error::Resampling {
            minority_count: 1,
            reason: "too few".into(),
        };
        assert_eq!(ExitCode::from_error(&data), ExitCode::DataError);
        assert_eq!(
            ExitCode::from_error(&Error::NoValidThreshold { folds: 10 }).as_i32(),
            12
        );
        let io = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(i32::from(ExitCode::from_error(&io)), 13);
        assert!(ExitCode::Ok.is_success());
    }
}
