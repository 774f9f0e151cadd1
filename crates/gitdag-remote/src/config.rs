use serde::{Deserialize, Serialize};

/// Tunable policy for one remote.
///
/// The defaults are the values production remotes run with; they are
/// settings, not invariants, so deployments can move them without a code
/// change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Objects strictly larger than this many bytes are stored out-of-band.
    pub large_object_threshold: usize,

    /// Name of the reserved root subtree holding externalized objects.
    /// Never advertised as a ref.
    pub large_object_dir: String,

    /// Reserved state-store prefix for large-object mappings.
    pub lobj_prefix: String,

    /// Write an `error: <msg>` line before aborting a failed list.
    pub announce_list_failures: bool,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            large_object_threshold: 2 * 1024 * 1024,
            large_object_dir: "objects".to_string(),
            lobj_prefix: "//lobj".to_string(),
            announce_list_failures: false,
        }
    }
}

impl RemoteConfig {
    /// The state key a large object's mapping is recorded under.
    pub fn lobj_key(&self, name: &str) -> String {
        format!("{}/{}", self.lobj_prefix, name)
    }

    /// The root-relative link path of an externalized object.
    pub fn lobj_link(&self, name: &str) -> String {
        format!("{}/{}", self.large_object_dir, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_values() {
        let config = RemoteConfig::default();
        assert_eq!(config.large_object_threshold, 2 * 1024 * 1024);
        assert_eq!(config.large_object_dir, "objects");
        assert_eq!(config.lobj_prefix, "//lobj");
        assert!(!config.announce_list_failures);
    }

    #[test]
    fn key_and_link_shapes() {
        let config = RemoteConfig::default();
        assert_eq!(config.lobj_key("f0178"), "//lobj/f0178");
        assert_eq!(config.lobj_link("f0178"), "objects/f0178");
    }

    #[test]
    fn serde_roundtrip() {
        let config = RemoteConfig {
            large_object_threshold: 64,
            ..RemoteConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: RemoteConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, parsed);
    }
}
