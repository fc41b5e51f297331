//! Identity types and the sequential id generator.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

define_id!(
    /// Identity of an element, unique within its owning project
    ElementId
);
define_id!(
    /// Identity of a page, unique within its owning project
    PageId
);
define_id!(
    /// Identity of a pattern in a project's library
    PatternId
);
define_id!(
    /// Identity of a project
    ProjectId
);

/// Derive a stable seed from an arbitrary string using CRC32
pub fn seed_for(source: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(source.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sequential ID generator for elements and pages within a project
///
/// The counter only ever moves forward and is persisted with project
/// snapshots, so a restored project never hands out an id twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdGenerator {
    seed: String,
    count: u32,
}

impl IdGenerator {
    pub fn new(source: &str) -> Self {
        Self {
            seed: seed_for(source),
            count: 0,
        }
    }

    pub fn from_parts(seed: String, count: u32) -> Self {
        Self { seed, count }
    }

    /// Once the counter is exhausted the seed is re-derived from itself and
    /// counting restarts, so ids stay fresh without wrapping.
    fn next_raw(&mut self) -> String {
        match self.count.checked_add(1) {
            Some(count) => self.count = count,
            None => {
                self.seed = seed_for(&self.seed);
                self.count = 1;
            }
        }
        format!("{}-{}", self.seed, self.count)
    }

    /// Generate the next element id
    pub fn next_element_id(&mut self) -> ElementId {
        ElementId(self.next_raw())
    }

    /// Generate the next page id
    pub fn next_page_id(&mut self) -> PageId {
        PageId(self.next_raw())
    }

    /// Move the counter past an id this generator may have issued earlier
    pub fn observe(&mut self, id: &str) {
        let issued = id
            .strip_prefix(self.seed.as_str())
            .and_then(|rest| rest.strip_prefix('-'))
            .and_then(|n| n.parse::<u32>().ok());

        if let Some(n) = issued {
            self.count = self.count.max(n);
        }
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_is_stable() {
        assert_eq!(seed_for("Landing Page"), seed_for("Landing Page"));
        assert_ne!(seed_for("Landing Page"), seed_for("Checkout"));
    }

    #[test]
    fn test_sequential_ids() {
        let mut gen = IdGenerator::new("project");

        let e1 = gen.next_element_id();
        let p2 = gen.next_page_id();
        let e3 = gen.next_element_id();

        assert!(e1.as_str().ends_with("-1"));
        assert!(p2.as_str().ends_with("-2"));
        assert!(e3.as_str().ends_with("-3"));
        assert!(e1.as_str().starts_with(gen.seed()));
        assert_eq!(gen.count(), 3);
    }

    #[test]
    fn test_restored_generator_continues() {
        let mut gen = IdGenerator::new("project");
        gen.next_element_id();
        gen.next_element_id();

        let mut restored = IdGenerator::from_parts(gen.seed().to_string(), gen.count());
        assert_eq!(restored.next_element_id(), gen.next_element_id());
    }

    #[test]
    fn test_observe_skips_issued_ids() {
        let mut gen = IdGenerator::new("project");
        let seed = gen.seed().to_string();

        gen.observe(&format!("{}-7", seed));
        gen.observe("foreign-99");
        gen.observe(&format!("{}-3", seed));

        assert_eq!(gen.next_element_id().as_str(), format!("{}-8", seed));
    }

    #[test]
    fn test_exhausted_counter_moves_to_new_seed() {
        let mut gen = IdGenerator::new("project");
        let seed = gen.seed().to_string();
        gen.observe(&format!("{}-{}", seed, u32::MAX));

        let next = gen.next_element_id();
        assert_ne!(gen.seed(), seed);
        assert_eq!(next.as_str(), format!("{}-1", gen.seed()));
        assert_ne!(next.as_str(), format!("{}-{}", seed, u32::MAX));
        assert_eq!(gen.next_page_id().as_str(), format!("{}-2", gen.seed()));
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let id = ElementId::new("abc-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc-1\"");
    }
}
