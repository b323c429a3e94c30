// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Nearest-neighbour lookup result

use std::fmt;

/// Distance reported when nothing could be compared
pub const NO_MATCH_DISTANCE: f64 = f64::INFINITY;

/// Owner of the globally closest sample
#[derive(Debug, Clone, PartialEq)]
pub struct NearestMatch {
    /// Identity name, `None` when the store held no comparable sample
    pub name: Option<String>,
    /// Squared Euclidean distance to the closest sample
    pub distance: f64,
}

impl NearestMatch {
    /// Sentinel for an empty store
    pub fn none() -> Self {
        Self {
            name: None,
            distance: NO_MATCH_DISTANCE,
        }
    }

    /// True when an identity was found
    pub fn is_match(&self) -> bool {
        self.name.is_some()
    }

    /// True when an identity was found within `max_distance`
    pub fn is_within(&self, max_distance: f64) -> bool {
        self.is_match() && self.distance <= max_distance
    }
}

impl Default for NearestMatch {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Display for NearestMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} (distance {})", name, self.distance),
            None => write!(f, "no match"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel() {
        let none = NearestMatch::none();
        assert!(!none.is_match());
        assert!(none.distance.is_infinite());
        assert!(!none.is_within(f64::MAX));
        assert_eq!(none.to_string(), "no match");
    }

    #[test]
    fn test_threshold() {
        let found = NearestMatch {
            name: Some("Alice".to_string()),
            distance: 4.0,
        };
        assert!(found.is_within(4.0));
        assert!(!found.is_within(3.5));
        assert_eq!(found.to_string(), "Alice (distance 4)");
    }
}
