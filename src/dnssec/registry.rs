use std::collections::HashMap;

use tracing::trace;

use super::record::Dnskey;

/// The signing keys known for one zone, indexed by key tag.
///
/// Key tags are not unique; when two keys share a tag the most recently
/// added one is kept.
#[derive(Debug, Clone, Default)]
pub struct KeyRegistry {
    keys: HashMap<u16, Dnskey>,
}

impl KeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a zone's DNSKEY records
    pub fn from_keys<'a, I>(keys: I) -> Self
    where
        I: IntoIterator<Item = &'a Dnskey>,
    {
        let mut registry = Self::new();
        for key in keys {
            registry.add_signing_key(key.clone());
        }
        registry
    }

    /// Insert a key under its computed key tag
    pub fn add_signing_key(&mut self, key: Dnskey) {
        let tag = key.key_tag();
        if let Some(previous) = self.keys.insert(tag, key) {
            trace!(
                "key tag {} collision, replacing algorithm {} key",
                tag,
                previous.algorithm()
            );
        }
    }

    pub fn get_key_by_tag(&self, tag: u16) -> Option<&Dnskey> {
        self.keys.get(&tag)
    }

    pub fn contains_tag(&self, tag: u16) -> bool {
        self.keys.contains_key(&tag)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, &Dnskey)> {
        self.keys.iter().map(|(tag, key)| (*tag, key))
    }
}
