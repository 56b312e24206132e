use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Oldest interpreter the scientific stack is known to work with.
pub const MINIMUM_RUNTIME: RuntimeVersion = RuntimeVersion::new(3, 9);

/// Version of the language runtime hosting the scientific packages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuntimeVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: Option<u32>,
}

impl RuntimeVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor,
            patch: None,
        }
    }

    /// Whether both `major` and `minor` reach the corresponding field of `minimum`.
    ///
    /// The fields are checked independently, so 4.0 does not satisfy 3.9.
    pub fn satisfies(&self, minimum: &RuntimeVersion) -> bool {
        self.major >= minimum.major && self.minor >= minimum.minor
    }
}

impl fmt::Display for RuntimeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.patch {
            Some(patch) => write!(f, "{}.{}.{}", self.major, self.minor, patch),
            None => write!(f, "{}.{}", self.major, self.minor),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Could not parse a runtime version from '{0}'")]
pub struct VersionParseError(pub String);

impl FromStr for RuntimeVersion {
    type Err = VersionParseError;

    /// Accepts bare versions (`3.11`, `3.11.4`) as well as interpreter banners
    /// such as `Python 3.12.0rc1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || VersionParseError(s.trim().to_string());

        let token = s
            .split_whitespace()
            .find(|t| t.starts_with(|c: char| c.is_ascii_digit()))
            .ok_or_else(err)?;

        let mut parts = token.split('.');
        let major = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(err)?;
        let minor = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(err)?;
        let patch = parts.next().and_then(|p| {
            let digits: String = p.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().ok()
        });

        Ok(Self {
            major,
            minor,
            patch,
        })
    }
}
