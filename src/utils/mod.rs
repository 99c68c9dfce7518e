pub mod fingerprint;
pub mod format;
pub mod fs;

pub use format::{format_created, truncate_string};
