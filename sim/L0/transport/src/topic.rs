//! Topic names.

use crate::error::{Result, TransportError};

/// A validated, fully qualified topic name such as `/flap_frequency`.
///
/// Relative names are rooted at `/`. Each `/`-separated segment must be
/// non-empty, start with a letter or underscore and contain only ASCII
/// letters, digits and underscores.
///
/// # Example
///
/// ```
/// use sim_transport::TopicName;
///
/// let topic = TopicName::new("flap_frequency").unwrap();
/// assert_eq!(topic.as_str(), "/flap_frequency");
///
/// let scoped = TopicName::new("/uav1/z_amplitude").unwrap();
/// assert_eq!(scoped.as_str(), "/uav1/z_amplitude");
///
/// assert!(TopicName::new("bad name").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TopicName(String);

impl TopicName {
    /// Validate and normalize a topic name.
    pub fn new(name: &str) -> Result<Self> {
        let trimmed = name.strip_prefix('/').unwrap_or(name);
        if trimmed.is_empty() {
            return Err(TransportError::invalid_topic(name, "empty name"));
        }
        for segment in trimmed.split('/') {
            validate_segment(name, segment)?;
        }
        Ok(Self(format!("/{trimmed}")))
    }

    /// Resolve `name` under `namespace` unless `name` is already absolute.
    pub fn resolve(namespace: &str, name: &str) -> Result<Self> {
        if name.starts_with('/') || namespace.trim_matches('/').is_empty() {
            return Self::new(name);
        }
        Self::new(&format!("{}/{name}", namespace.trim_end_matches('/')))
    }

    /// The normalized name, always starting with `/`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn validate_segment(full: &str, segment: &str) -> Result<()> {
    let mut chars = segment.chars();
    match chars.next() {
        None => return Err(TransportError::invalid_topic(full, "empty segment")),
        Some(c) if !(c.is_ascii_alphabetic() || c == '_') => {
            return Err(TransportError::invalid_topic(
                full,
                "segment must start with a letter or underscore",
            ));
        }
        Some(_) => {}
    }
    if chars.any(|c| !(c.is_ascii_alphanumeric() || c == '_')) {
        return Err(TransportError::invalid_topic(
            full,
            "only letters, digits and underscores are allowed",
        ));
    }
    Ok(())
}

impl std::fmt::Display for TopicName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TopicName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_relative_names() {
        assert_eq!(TopicName::new("z_frequency").unwrap().as_str(), "/z_frequency");
        assert_eq!(
            TopicName::new("/z_frequency").unwrap(),
            TopicName::new("z_frequency").unwrap()
        );
    }

    #[test]
    fn test_rejects_invalid_names() {
        assert!(TopicName::new("").is_err());
        assert!(TopicName::new("/").is_err());
        assert!(TopicName::new("//double").is_err());
        assert!(TopicName::new("/trailing/").is_err());
        assert!(TopicName::new("9lives").is_err());
        assert!(TopicName::new("has-dash").is_err());
    }

    #[test]
    fn test_resolve() {
        let t = TopicName::resolve("/uav1", "flap_amplitude").unwrap();
        assert_eq!(t.as_str(), "/uav1/flap_amplitude");

        let t = TopicName::resolve("uav1/", "flap_amplitude").unwrap();
        assert_eq!(t.as_str(), "/uav1/flap_amplitude");

        // Absolute names ignore the namespace
        let t = TopicName::resolve("/uav1", "/flap_amplitude").unwrap();
        assert_eq!(t.as_str(), "/flap_amplitude");

        let t = TopicName::resolve("", "flap_amplitude").unwrap();
        assert_eq!(t.as_str(), "/flap_amplitude");
    }
}
