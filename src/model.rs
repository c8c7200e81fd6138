use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Reddit username.
pub type UserId = String;

/// Which community a record was collected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[serde(rename = "misinformation", alias = "misinfo")]
    Misinfo,
    Factual,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Misinfo => "misinformation",
            Category::Factual => "factual",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "misinformation" | "misinfo" => Ok(Category::Misinfo),
            "factual" => Ok(Category::Factual),
            other => Err(AnalysisError::Data(format!("unknown category '{other}'"))),
        }
    }
}

/// A directed "replied-to" interaction: `source` answered `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionEdge {
    pub source: UserId,
    pub target: UserId,
    pub subreddit: String,
    pub category: Category,
    pub created_utc: String,
}

impl InteractionEdge {
    pub fn new(
        source: impl Into<UserId>,
        target: impl Into<UserId>,
        subreddit: impl Into<String>,
        category: Category,
        created_utc: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            subreddit: subreddit.into(),
            category,
            created_utc: created_utc.into(),
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// A post or comment. Only used to attribute users to subreddits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    pub id: String,
    pub author: UserId,
    pub subreddit: String,
    pub category: Category,
    pub created_utc: String,
}

impl ContentItem {
    pub fn new(
        author: impl Into<UserId>,
        subreddit: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            id: String::new(),
            author: author.into(),
            subreddit: subreddit.into(),
            category,
            created_utc: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_accepts_short_and_long_names() {
        assert_eq!("misinfo".parse::<Category>().unwrap(), Category::Misinfo);
        assert_eq!("Misinformation".parse::<Category>().unwrap(), Category::Misinfo);
        assert_eq!("factual".parse::<Category>().unwrap(), Category::Factual);
        assert!("satire".parse::<Category>().is_err());
    }
}
