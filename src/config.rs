//! Runtime configuration.
//!
//! Configuration travels with the [`Scheduler`](crate::reactive::Scheduler):
//! every scope mounted under a scheduler sees the same settings.
//!
//! | Variable | Meaning |
//! |---|---|
//! | `SPARK_FLUSH_LIMIT` | Maximum tasks delivered by one flush (unset: unbounded) |
//! | `SPARK_STRICT_LIFECYCLE` | `1`/`true`: dropping a mounted component panics |

/// Environment variable holding the per-flush task limit.
pub const FLUSH_LIMIT_VAR: &str = "SPARK_FLUSH_LIMIT";

/// Environment variable enabling strict lifecycle checks.
pub const STRICT_LIFECYCLE_VAR: &str = "SPARK_STRICT_LIFECYCLE";

/// Settings shared by a scheduler and the tree mounted under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Config {
    /// Maximum number of tasks one flush may deliver before it gives up.
    ///
    /// `None` drains without a bound. An observer that keeps re-marking its
    /// own input then never terminates, which is a bug in the caller.
    pub flush_limit: Option<usize>,

    /// Panic when a mounted component is dropped instead of unmounting it.
    pub strict_lifecycle: bool,
}

impl Config {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    ///
    /// Unparseable values fall back to the default for that field.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let flush_limit = lookup(FLUSH_LIMIT_VAR).and_then(|raw| {
            let parsed = raw.trim().parse::<usize>();
            if parsed.is_err() {
                tracing::warn!(value = %raw, "ignoring invalid {FLUSH_LIMIT_VAR}");
            }
            parsed.ok().filter(|limit| *limit > 0)
        });

        let strict_lifecycle = lookup(STRICT_LIFECYCLE_VAR)
            .map(|raw| matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);

        Self {
            flush_limit,
            strict_lifecycle,
        }
    }

    /// Set the per-flush task limit.
    pub fn with_flush_limit(mut self, limit: usize) -> Self {
        self.flush_limit = Some(limit);
        self
    }

    /// Enable or disable strict lifecycle checks.
    pub fn with_strict_lifecycle(mut self, strict: bool) -> Self {
        self.strict_lifecycle = strict;
        self
    }
}
