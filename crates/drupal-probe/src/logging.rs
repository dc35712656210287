//! Tracing subscriber setup for binaries.
//!
//! The library only emits `tracing` events; installing a subscriber is up to
//! the binary. `RUST_LOG` overrides the level derived from the verbosity.

use tracing_subscriber::{fmt, EnvFilter};

/// Default filter directive for a verbosity (`-q` = -1, `-v` = 1, ...)
#[must_use]
pub fn default_directive(verbosity: i8) -> &'static str {
    match verbosity {
        i8::MIN..=-1 => "error",
        0 => "warn",
        1 => "info,drupal_probe=debug",
        _ => "trace",
    }
}

/// Install a global fmt subscriber writing to stderr.
///
/// Does nothing if a subscriber is already installed, so tests and
/// embedding applications can call it freely.
pub fn init_tracing(verbosity: i8, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(-1), "error");
        assert_eq!(default_directive(0), "warn");
        assert!(default_directive(1).contains("drupal_probe=debug"));
        assert_eq!(default_directive(3), "trace");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_tracing(0, false);
        init_tracing(2, true);
    }
}
