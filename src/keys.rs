//! Key layout under the store's root prefix.
//!
//! ```text
//! <root>/unsequenced/<base64url(content hash)>   one key per distinct pending entry
//! <root>/sequenced/<sequence number>              one key per log position
//! ```

use crate::entry::LogEntry;

const UNSEQUENCED_DIR: &str = "unsequenced";
const SEQUENCED_DIR: &str = "sequenced";

/// Maps entries and sequence numbers to coordination keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLayout {
    root: String,
}

impl KeyLayout {
    /// Trailing `/`s on `root` are ignored, so a root of `/` places both
    /// namespaces at the top level.
    pub fn new(root: impl Into<String>) -> Self {
        let mut root = root.into();
        while root.ends_with('/') {
            root.pop();
        }
        Self { root }
    }

    pub fn root(&self) -> &str {
        if self.root.is_empty() {
            "/"
        } else {
            &self.root
        }
    }

    /// Prefix shared by every pending entry, with trailing `/`.
    pub fn unsequenced_prefix(&self) -> String {
        format!("{}/{}/", self.root, UNSEQUENCED_DIR)
    }

    /// Prefix shared by every sequenced entry, with trailing `/`.
    pub fn sequenced_prefix(&self) -> String {
        format!("{}/{}/", self.root, SEQUENCED_DIR)
    }

    pub fn unsequenced_key<T: LogEntry>(&self, entry: &T) -> String {
        format!("{}{}", self.unsequenced_prefix(), entry.content_hash().to_base64())
    }

    pub fn sequenced_key(&self, sequence_number: u64) -> String {
        format!("{}{}", self.sequenced_prefix(), sequence_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificate::LoggedCertificate;

    #[test]
    fn test_unsequenced_key_is_derived_from_content() {
        let keys = KeyLayout::new("/root");
        let cert = LoggedCertificate::x509(9000, "leaf");

        let key = keys.unsequenced_key(&cert);
        assert_eq!(
            key,
            format!("/root/unsequenced/{}", cert.content_hash().to_base64())
        );
        // Same content, different SCT: same key.
        assert_eq!(key, keys.unsequenced_key(&LoggedCertificate::x509(1, "leaf")));
        assert_ne!(key, keys.unsequenced_key(&LoggedCertificate::x509(9000, "other")));
    }

    #[test]
    fn test_sequenced_key() {
        let keys = KeyLayout::new("/root");
        assert_eq!(keys.sequenced_key(0), "/root/sequenced/0");
        assert_eq!(keys.sequenced_key(1234), "/root/sequenced/1234");
    }

    #[test]
    fn test_prefixes_are_disjoint() {
        let keys = KeyLayout::new("/root/");
        assert_eq!(keys.root(), "/root");
        assert_eq!(keys.unsequenced_prefix(), "/root/unsequenced/");
        assert_eq!(keys.sequenced_prefix(), "/root/sequenced/");
        assert!(!keys.sequenced_key(5).starts_with(&keys.unsequenced_prefix()));
    }

    #[test]
    fn test_top_level_root() {
        let keys = KeyLayout::new("/");
        assert_eq!(keys.root(), "/");
        assert_eq!(keys.unsequenced_prefix(), "/unsequenced/");
        assert_eq!(keys.sequenced_prefix(), "/sequenced/");
        assert_eq!(keys.sequenced_key(1), "/sequenced/1");
        assert_eq!(KeyLayout::new("//"), keys);
    }
}
