//! Command implementations.

pub mod predict;
pub mod prompts;
pub mod report;

pub use self::predict::execute_predict;
pub use self::prompts::execute_prompts;
pub use self::report::execute_report;

use std::fs;
use std::path::Path;

/// Create the parent directory of an output file if needed.
fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}
