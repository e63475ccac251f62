//! Customer story Model

use serde::{Deserialize, Serialize};

/// A story submitted from the website
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub content: String,
    pub created_at: i64,
}

/// Validated story input
#[derive(Debug, Clone)]
pub struct NewStory {
    pub name: String,
    pub email: Option<String>,
    pub content: String,
}

impl NewStory {
    pub fn into_story(self, id: i64, now: i64) -> Story {
        Story {
            id,
            name: self.name,
            email: self.email,
            content: self.content,
            created_at: now,
        }
    }
}
