// Category classification - keyword rules over lower-cased text

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of spending categories. Extending the set means extending the
/// classifier's rule table, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Food,
    Travel,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Travel => "Travel",
            Category::Other => "Other",
        }
    }

    /// Total mapping from stored labels; anything outside the set is `Other`.
    pub fn from_label(label: &str) -> Category {
        match label {
            "Food" => Category::Food,
            "Travel" => Category::Travel,
            _ => Category::Other,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Assigns a coarse category by substring containment, first rule wins.
/// Deterministic and total; never fails.
pub struct CategoryClassifier;

impl CategoryClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, text: &str) -> Category {
        let text = text.to_lowercase();
        if text.contains("food") || text.contains("restaurant") {
            Category::Food
        } else if text.contains("taxi") || text.contains("uber") {
            Category::Travel
        } else {
            Category::Other
        }
    }
}

impl Default for CategoryClassifier {
    fn default() -> Self {
        Self::new()
    }
}
