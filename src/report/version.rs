//! Tool version banner (`cdo -V`)

use semver::{Version, VersionReq};
use serde::Serialize;

use super::scan::lines;
use super::{ParseError, Parser};

const VERSION_SHAPE: &str = "version banner (Climate Data Operators version X.Y.Z)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolVersion {
    pub version: Version,
    /// The banner line the version was read from
    pub banner: String,
}

impl ToolVersion {
    pub fn satisfies(&self, requirement: &VersionReq) -> bool {
        requirement.matches(&self.version)
    }

    pub fn at_least(&self, major: u64, minor: u64) -> bool {
        (self.version.major, self.version.minor) >= (major, minor)
    }
}

/// `2.0.5`, `1.9.10rc1` or `2.1` as a semantic version
fn lenient_version(token: &str) -> Option<Version> {
    let numeric: String = token
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let mut parts = numeric.split('.').filter(|p| !p.is_empty()).map(str::parse::<u64>);
    let major = parts.next()?.ok()?;
    let minor = parts.next().transpose().ok()?.unwrap_or(0);
    let patch = parts.next().transpose().ok()?.unwrap_or(0);
    Some(Version::new(major, minor, patch))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VersionParser;

impl Parser for VersionParser {
    type Output = ToolVersion;

    fn shape(&self) -> &'static str {
        VERSION_SHAPE
    }

    fn parse(&self, text: &str) -> Result<ToolVersion, ParseError> {
        for line in lines(text) {
            let mut words = line.text.split_whitespace();
            if words.by_ref().any(|w| w.eq_ignore_ascii_case("version")) {
                let token = words.next().unwrap_or_default();
                let version = lenient_version(token)
                    .ok_or_else(|| ParseError::invalid("version", token, VERSION_SHAPE, &line))?;
                return Ok(ToolVersion {
                    version,
                    banner: line.text.to_string(),
                });
            }
        }
        Err(ParseError::missing("version", VERSION_SHAPE, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BANNER: &str = "Climate Data Operators version 2.0.5 (https://mpimet.mpg.de/cdo)\n\
                          System: x86_64-pc-linux-gnu\n";

    #[test]
    fn parse_banner() {
        let v = VersionParser.parse(BANNER).unwrap();
        assert_eq!(v.version, Version::new(2, 0, 5));
        assert!(v.at_least(2, 0));
        assert!(!v.at_least(2, 1));
        assert!(v.satisfies(&VersionReq::parse(">=1.9").unwrap()));
    }

    #[test]
    fn parse_release_candidate() {
        let v = VersionParser.parse("Climate Data Operators version 1.9.10rc1").unwrap();
        assert_eq!(v.version, Version::new(1, 9, 10));
    }

    #[test]
    fn missing_banner() {
        let err = VersionParser.parse("cdo: command not found").unwrap_err();
        assert_eq!(err.missing_field(), Some("version"));
    }
}
