//! Logging bootstrap.

use tracing::Level;

/// Initialize a formatted tracing subscriber at the given level.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging(level: &str) {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);
    let _ = tracing_subscriber::fmt().with_max_level(level).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_logging("debug");
        init_logging("not-a-level");
    }
}
