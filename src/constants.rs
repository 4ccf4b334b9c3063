//! Test constants and canonical scoring parameters.
//!
//! Maps the standard WCST administration to concrete values:
//! - |reference deck| = [`NUM_REFERENCE_CARDS`] = 4
//! - |values per dimension| = [`VALUES_PER_DIMENSION`] = 4 (colors, shapes, numbers)
//! - category completion at [`CATEGORY_THRESHOLD`] = 10 consecutive correct sorts
//!
//! Thresholds here are defaults only. Every session carries its own
//! [`crate::config::SessionConfig`], so alternate administrations (e.g. a
//! 64-card short form) never touch these values.

/// Number of fixed reference cards the subject sorts against.
pub const NUM_REFERENCE_CARDS: usize = 4;

/// Number of distinct values each dimension takes (4 colors, 4 shapes, 1..=4).
pub const VALUES_PER_DIMENSION: usize = 4;

/// Number of sorting dimensions (color, shape, number).
pub const NUM_DIMENSIONS: usize = 3;

/// Consecutive correct responses under one rule that complete a category.
pub const CATEGORY_THRESHOLD: u32 = 10;

/// A correct response is conceptual from this position in a correct run onward.
pub const CONCEPTUAL_RUN: u32 = 3;

/// An error breaking a correct run at least this long is a failure to maintain set.
pub const SET_MAINTENANCE_RUN: u32 = 5;

/// Default trial cap (two 64-card decks, the classic administration).
pub const DEFAULT_MAX_TRIALS: u32 = 128;

/// Default category cap.
pub const DEFAULT_MAX_CATEGORIES: u32 = 6;

/// PRNG stream id for stimulus draws.
pub const DECK_STREAM: u64 = 0x4445_434B; // "DECK"

/// PRNG stream id for random rule switching.
pub const RULE_STREAM: u64 = 0x5255_4C45; // "RULE"

/// Version stamped on every trial record unless the host overrides it.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Field delimiter of the exported trial table.
pub const CSV_DELIMITER: char = ';';

/// Byte-order mark prefixed to the header line so spreadsheet tools detect UTF-8.
pub const UTF8_BOM: char = '\u{FEFF}';

/// Number of columns in the exported trial table.
pub const CSV_COLUMN_COUNT: usize = 19;

/// Exported trial table columns, in order.
pub const CSV_HEADERS: [&str; CSV_COLUMN_COUNT] = [
    "participant_id",
    "session_id",
    "trial_index",
    "deck_color",
    "deck_shape",
    "deck_number",
    "selected_key_index",
    "correct",
    "error_type",
    "set_maintenance_error",
    "rule_in_force",
    "prev_rule",
    "categories_completed",
    "consecutive_correct",
    "response_time_ms",
    "timestamp_utc",
    "seed",
    "device_info",
    "app_version",
];
