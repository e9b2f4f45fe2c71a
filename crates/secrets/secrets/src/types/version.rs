use derive_more::Display;

/// Applet version (major.minor.patch)
///
/// Versions are ordered by major, then minor, then patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Display)]
#[display("{major}.{minor}.{patch}")]
pub struct Version {
    /// Major version
    pub major: u8,
    /// Minor version
    pub minor: u8,
    /// Patch version
    pub patch: u8,
}

impl Version {
    /// Create a new version
    pub const fn new(major: u8, minor: u8, patch: u8) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Whether this version is at least `other`
    pub fn at_least(&self, other: Self) -> bool {
        *self >= other
    }
}

impl TryFrom<&[u8]> for Version {
    type Error = crate::Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        match bytes {
            [major, minor, patch, ..] => Ok(Self::new(*major, *minor, *patch)),
            _ => Err(crate::Error::WrongLength),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        let v = Version::new(4, 10, 3);

        assert!(v.at_least(Version::new(4, 10, 0)));
        assert!(!v.at_least(Version::new(4, 11, 0)));
        assert!(Version::new(5, 0, 0) > Version::new(4, 255, 255));
        assert_eq!(v.to_string(), "4.10.3");
    }

    #[test]
    fn test_try_from_bytes() {
        assert_eq!(Version::try_from(&[4u8, 11, 0, 9][..]).unwrap(), Version::new(4, 11, 0));
        assert!(matches!(Version::try_from(&[4u8, 11][..]), Err(crate::Error::WrongLength)));
    }
}
