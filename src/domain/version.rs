//! Protocol version numbers

use serde::Serialize;
use std::fmt;

/// Negotiated `major.minor` version of an extension or library
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ProtocolVersion {
    pub major: u32,
    pub minor: u32,
}

impl ProtocolVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Strictly newer than `major.minor`
    pub fn newer_than(self, major: u32, minor: u32) -> bool {
        self > Self::new(major, minor)
    }

    /// At least `minimum`
    pub fn at_least(self, minimum: ProtocolVersion) -> bool {
        self >= minimum
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_ordering() {
        let v = ProtocolVersion::new(1, 25);
        assert!(v.newer_than(1, 20));
        assert!(!ProtocolVersion::new(1, 20).newer_than(1, 20));
        assert!(ProtocolVersion::new(2, 0).newer_than(1, 99));
        assert!(v.at_least(ProtocolVersion::new(1, 11)));
        assert!(!ProtocolVersion::new(1, 9).at_least(ProtocolVersion::new(1, 11)));
    }

    #[test]
    fn test_version_display() {
        assert_eq!(ProtocolVersion::new(1, 29).to_string(), "1.29");
    }
}
