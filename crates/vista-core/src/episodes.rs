//! Series episode queue

use crate::types::EpisodeCursor;

/// Ordered episode URLs with a cursor on the playing one
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpisodeQueue {
    episodes: Vec<String>,
    index: usize,
}

impl EpisodeQueue {
    /// Build a queue positioned at `start`, an index into `episodes` as
    /// given. Blank URLs are dropped; returns `None` when `start` is out of
    /// range or names a blank entry.
    pub fn new(episodes: Vec<String>, start: usize) -> Option<Self> {
        let episodes: Vec<String> = episodes.into_iter().map(|e| e.trim().to_string()).collect();
        if episodes.get(start)?.is_empty() {
            return None;
        }
        let index = episodes[..start].iter().filter(|e| !e.is_empty()).count();
        let episodes = episodes.into_iter().filter(|e| !e.is_empty()).collect();
        Some(Self { episodes, index })
    }

    pub fn current(&self) -> &str {
        &self.episodes[self.index]
    }

    pub fn cursor(&self) -> EpisodeCursor {
        EpisodeCursor {
            index: self.index,
            count: self.episodes.len(),
        }
    }

    /// Move to the next episode
    pub fn advance(&mut self) -> Option<&str> {
        if self.index + 1 >= self.episodes.len() {
            return None;
        }
        self.index += 1;
        Some(self.current())
    }

    /// Move to the previous episode
    pub fn retreat(&mut self) -> Option<&str> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(self.current())
    }

    /// Whether `url` is the episode under the cursor
    pub fn is_current(&self, url: &str) -> bool {
        self.current() == url
    }
}
