//! Shared constants for the StrataML CLI.
//!
//! Centralizes magic numbers to make them discoverable and maintainable.

/// How many runs `strataml status` lists.
pub const RECENT_RUNS_LIMIT: usize = 5;

/// Widest an artifact name gets in list tables before truncation.
pub const NAME_COLUMN_WIDTH: usize = 40;

/// Widest a free-text cell (experiment, source) gets before truncation.
pub const TEXT_COLUMN_WIDTH: usize = 30;
