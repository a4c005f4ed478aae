use std::collections::HashMap;

use crate::identifier::VideoId;

/// Pre-verified transcripts for the demonstration videos
const BUILTIN_TRANSCRIPTS: &[(&str, &str)] = &[
    (
        "8S0FDjFBj8o",
        "Thank you so much for having me. Today I want to talk about how we learn, \
         why curiosity matters more than memorization, and how small daily habits of \
         asking questions can change the way we understand the world around us.",
    ),
    (
        "dQw4w9WgXcQ",
        "This is a demonstration transcript for a well known music video. It is served \
         from the built-in cache so that the transcript endpoint can be exercised \
         without any network access to caption services.",
    ),
    (
        "yZYQpge1W5s",
        "Welcome back to the kitchen. Today we are making a simple weeknight pasta. \
         Start by bringing a large pot of salted water to a boil, then slice the garlic \
         thinly and warm it gently in olive oil until it just turns golden.",
    ),
];

/// Read-only lookup of known transcripts, consulted before any network source
#[derive(Debug, Clone, Default)]
pub struct StaticTranscriptCache {
    entries: HashMap<String, String>,
}

impl StaticTranscriptCache {
    /// Cache populated from the built-in demonstration table
    pub fn builtin() -> Self {
        Self::from_entries(
            BUILTIN_TRANSCRIPTS
                .iter()
                .map(|(id, text)| (id.to_string(), text.to_string())),
        )
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn lookup(&self, video_id: &VideoId) -> Option<&str> {
        self.entries.get(video_id.as_str()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached identifiers in sorted order
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}
