//! License catalog and text classification.
//!
//! - [`catalog`] — the reference table of known licenses (built in, or loaded
//!   from a directory with `--catalog`).
//! - [`matcher`] — normalizes license text and picks the best catalog entry,
//!   or reports that nothing matched.

pub mod catalog;
pub mod matcher;
