//! Association edges between published objects

/// Host inventory association, forward name (on the activation)
pub const ACTIVATION_FWD: &str = "inventory";
/// Host inventory association, reverse name
pub const ACTIVATION_REV: &str = "activation";
/// Image selected to run
pub const ACTIVE_FWD: &str = "active";
/// Image the host is running
pub const FUNCTIONAL_FWD: &str = "functional";
/// Image can be updated
pub const UPDATEABLE_FWD: &str = "updateable";
/// Reverse name shared by the software-root associations
pub const SOFTWARE_VERSION_REV: &str = "software_version";

/// A `(forward, reverse, endpoint)` association triple
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    /// Forward name
    pub forward: String,
    /// Reverse name
    pub reverse: String,
    /// Object path on the other end
    pub endpoint: String,
}

impl Association {
    /// Create an association
    pub fn new(forward: &str, reverse: &str, endpoint: impl Into<String>) -> Self {
        Self {
            forward: forward.to_string(),
            reverse: reverse.to_string(),
            endpoint: endpoint.into(),
        }
    }

    /// Software-root association of kind `forward` pointing at `path`
    pub fn software(forward: &str, path: impl Into<String>) -> Self {
        Self::new(forward, SOFTWARE_VERSION_REV, path)
    }
}

/// Associations published on the software root object
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Associations {
    entries: Vec<Association>,
}

impl Associations {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an association, ignoring exact duplicates
    pub fn add(&mut self, assoc: Association) {
        if !self.entries.contains(&assoc) {
            self.entries.push(assoc);
        }
    }

    /// Remove every association of the given forward kind
    pub fn remove_forward(&mut self, forward: &str) {
        self.entries.retain(|a| a.forward != forward);
    }

    /// Remove every association pointing at `endpoint`
    pub fn remove_endpoint(&mut self, endpoint: &str) {
        self.entries.retain(|a| a.endpoint != endpoint);
    }

    /// Whether an association of kind `forward` points at `endpoint`
    pub fn contains(&self, forward: &str, endpoint: &str) -> bool {
        self.entries
            .iter()
            .any(|a| a.forward == forward && a.endpoint == endpoint)
    }

    /// Endpoints of every association of kind `forward`
    pub fn endpoints<'a>(&'a self, forward: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |a| a.forward == forward)
            .map(|a| a.endpoint.as_str())
    }

    /// All associations
    pub fn as_slice(&self) -> &[Association] {
        &self.entries
    }

    /// Number of associations
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no associations
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_deduplicates() {
        let mut set = Associations::new();
        set.add(Association::software(ACTIVE_FWD, "/sw/a"));
        set.add(Association::software(ACTIVE_FWD, "/sw/a"));
        set.add(Association::software(UPDATEABLE_FWD, "/sw/a"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_remove_forward_and_endpoint() {
        let mut set = Associations::new();
        set.add(Association::software(FUNCTIONAL_FWD, "/sw/a"));
        set.add(Association::software(FUNCTIONAL_FWD, "/sw/b"));
        set.add(Association::software(UPDATEABLE_FWD, "/sw/a"));

        set.remove_forward(FUNCTIONAL_FWD);
        assert_eq!(set.endpoints(FUNCTIONAL_FWD).count(), 0);
        assert!(set.contains(UPDATEABLE_FWD, "/sw/a"));

        set.remove_endpoint("/sw/a");
        assert!(set.is_empty());
    }
}
