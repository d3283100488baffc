//! Client/server version gate

use std::fmt;

/// `(major, minor)` pair compared against the server at startup.
///
/// Patch levels never gate: only a change in major or minor means the
/// stored procedures changed shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClientVersion {
    pub major: u32,
    pub minor: u32,
}

impl ClientVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Parse `major.minor[.patch...]`
    pub fn parse(version: &str) -> Option<Self> {
        let mut parts = version.trim().split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        Some(Self { major, minor })
    }

    /// Whether a server reporting `server` can be used by this client
    pub fn is_compatible_with(&self, server: Option<ClientVersion>) -> bool {
        server == Some(*self)
    }
}

impl fmt::Display for ClientVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(ClientVersion::parse("1.4.2"), Some(ClientVersion::new(1, 4)));
        assert_eq!(ClientVersion::parse("0.1"), Some(ClientVersion::new(0, 1)));
        assert_eq!(ClientVersion::parse("1"), None);
        assert_eq!(ClientVersion::parse("a.b"), None);
    }

    #[test]
    fn test_compatibility_ignores_patch() {
        let client = ClientVersion::parse("1.4.9").unwrap();
        assert!(client.is_compatible_with(Some(ClientVersion::new(1, 4))));
        assert!(!client.is_compatible_with(Some(ClientVersion::new(1, 5))));
        assert!(!client.is_compatible_with(None));
    }

    #[test]
    fn test_display() {
        assert_eq!(ClientVersion::new(2, 10).to_string(), "2.10");
    }
}
