//! Semantic version arithmetic for release tags

use semver::{BuildMetadata, Prerelease, Version};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ReleaseError, Result};

/// How the version is incremented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseType {
    Major,
    Minor,
    Patch,
}

impl ReleaseType {
    /// Lowercase name as written in a release trigger
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseType::Major => "major",
            ReleaseType::Minor => "minor",
            ReleaseType::Patch => "patch",
        }
    }
}

impl fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReleaseType {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "major" => Ok(ReleaseType::Major),
            "minor" => Ok(ReleaseType::Minor),
            "patch" => Ok(ReleaseType::Patch),
            other => Err(ReleaseError::Configuration(format!(
                "Unknown release type '{}' (expected major, minor or patch)",
                other
            ))),
        }
    }
}

/// Compute the tag that follows `last_tag`
///
/// Without a previous tag the bump is applied to `0.0.0`. A leading `v` or
/// `=` on the previous tag is accepted but not carried over, so `v1.2.3`
/// is followed by `1.2.4`.
///
/// # Errors
///
/// * `release_type` is `None` (configuration error)
/// * `last_tag` is not a semantic version (version error)
/// * the bumped component is already at its maximum (version error)
///
/// # Example
///
/// ```
/// use commit_release::version::{bump_version, ReleaseType};
///
/// assert_eq!(bump_version(None, Some(ReleaseType::Minor)).unwrap(), "0.1.0");
/// assert_eq!(bump_version(Some("v1.2.3"), Some(ReleaseType::Patch)).unwrap(), "1.2.4");
/// ```
pub fn bump_version(last_tag: Option<&str>, release_type: Option<ReleaseType>) -> Result<String> {
    let release_type = release_type
        .ok_or_else(|| ReleaseError::Configuration("No release type supplied".to_string()))?;

    let Some(last_tag) = last_tag else {
        return Ok(increment(Version::new(0, 0, 0), release_type)?.to_string());
    };

    let number = last_tag
        .trim()
        .trim_start_matches(['=', 'v', 'V'])
        .trim_start();
    let version = Version::parse(number).map_err(|e| {
        ReleaseError::Version(format!("'{}' is not a semantic version: {}", last_tag, e))
    })?;

    Ok(increment(version, release_type)?.to_string())
}

/// Standard semver increment
///
/// A prerelease version is first promoted to its release when the
/// bump would not change any number beyond it (`1.2.0-rc.1` + minor
/// gives `1.2.0`). Build metadata is always dropped.
fn increment(mut version: Version, release_type: ReleaseType) -> Result<Version> {
    let was_prerelease = !version.pre.is_empty();
    version.pre = Prerelease::EMPTY;
    version.build = BuildMetadata::EMPTY;

    match release_type {
        ReleaseType::Major => {
            if !(was_prerelease && version.minor == 0 && version.patch == 0) {
                version.major = next(version.major, &version)?;
            }
            version.minor = 0;
            version.patch = 0;
        }
        ReleaseType::Minor => {
            if !(was_prerelease && version.patch == 0) {
                version.minor = next(version.minor, &version)?;
            }
            version.patch = 0;
        }
        ReleaseType::Patch => {
            if !was_prerelease {
                version.patch = next(version.patch, &version)?;
            }
        }
    }

    Ok(version)
}

fn next(component: u64, version: &Version) -> Result<u64> {
    component
        .checked_add(1)
        .ok_or_else(|| ReleaseError::Version(format!("'{}' cannot be incremented", version)))
}
