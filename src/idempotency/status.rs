use std::fmt;
use std::str::FromStr;

/// How the response to an idempotent request was produced.
///
/// Starts at `None` and moves at most once, to one of the other three. It is
/// written to the `x-idempotency-status` response header and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CacheStatus {
    #[default]
    None,
    /// The handler ran and answered within the bounded wait.
    Original,
    /// A cached response was replayed without running the handler.
    FromCache,
    /// The bounded wait elapsed; the handler keeps running in the background.
    TimedOut,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Original => "Original",
            Self::FromCache => "FromCache",
            Self::TimedOut => "TimedOut",
        }
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "None" => Ok(Self::None),
            "Original" => Ok(Self::Original),
            "FromCache" => Ok(Self::FromCache),
            "TimedOut" => Ok(Self::TimedOut),
            other => Err(format!("unknown cache status '{other}'")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_none() {
        assert_eq!(CacheStatus::default(), CacheStatus::None);
    }

    #[test]
    fn test_parse_header_values() {
        for status in [
            CacheStatus::None,
            CacheStatus::Original,
            CacheStatus::FromCache,
            CacheStatus::TimedOut,
        ] {
            assert_eq!(status.as_str().parse::<CacheStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert!("fromcache".parse::<CacheStatus>().is_err());
    }
}
