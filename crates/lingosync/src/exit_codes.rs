//! Exit codes for the CLI

/// Success, including runs stopped by a user interrupt
pub const SUCCESS: i32 = 0;

/// General error, including missing credentials
pub const ERROR: i32 = 1;
