//! Boundary error type.
//!
//! The estimation core never fails; errors only arise where user input enters
//! the crate (stack files, solver settings, CLI flags) or where results leave
//! it (exports). Each error carries the process exit code used by `t1rho`.

/// Exit code for invalid user input, settings, or malformed files.
pub const EXIT_INVALID_INPUT: u8 = 2;
/// Exit code for acquisitions whose slices do not line up.
pub const EXIT_INVALID_SHAPE: u8 = 3;
/// Exit code for internal failures.
pub const EXIT_INTERNAL: u8 = 4;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(EXIT_INVALID_INPUT, message)
    }

    pub fn invalid_shape(message: impl Into<String>) -> Self {
        Self::new(EXIT_INVALID_SHAPE, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(EXIT_INTERNAL, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
