//! In-memory stack of produced video versions with a movable cursor.
//!
//! Entry 0 is always the original input video. Entries are appended when
//! an edit is accepted and only the most recently accepted one can be
//! popped again. The stack is never reordered.

use serde::Serialize;

pub const LABEL_ORIGINAL: &str = "Original";
pub const LABEL_CURRENT: &str = "Current";
pub const LABEL_PROCESSING: &str = "Processing…";

/// One produced video and its position in the stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionEntry {
    pub index: usize,
    pub video_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionTimeline {
    urls: Vec<String>,
    cursor: usize,
}

impl VersionTimeline {
    /// A timeline holding only the original video, cursor on it.
    pub fn new(original_url: impl Into<String>) -> Self {
        Self {
            urls: vec![original_url.into()],
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Always false: the original entry can never be removed.
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current_url(&self) -> &str {
        &self.urls[self.cursor]
    }

    pub fn latest_url(&self) -> &str {
        &self.urls[self.urls.len() - 1]
    }

    pub fn entries(&self) -> Vec<VersionEntry> {
        self.urls
            .iter()
            .enumerate()
            .map(|(index, url)| VersionEntry {
                index,
                video_url: url.clone(),
            })
            .collect()
    }

    /// Push a new version and move the cursor onto it.
    pub fn append(&mut self, url: impl Into<String>) {
        self.urls.push(url.into());
        self.cursor = self.urls.len() - 1;
    }

    /// Move one version back; no-op on the original.
    pub fn step_back(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    /// Move one version forward; no-op on the latest.
    pub fn step_forward(&mut self) -> bool {
        if self.cursor + 1 >= self.urls.len() {
            return false;
        }
        self.cursor += 1;
        true
    }

    /// Remove the entry produced by the most recently accepted edit.
    ///
    /// Searches from the tail for `url`, never touching the original.
    /// Returns `false` (and leaves the cursor alone) when nothing matches.
    pub fn pop_latest_accepted(&mut self, url: &str) -> bool {
        let Some(position) = self.urls.iter().skip(1).rposition(|u| u == url) else {
            return false;
        };
        self.urls.remove(position + 1);
        self.cursor = self.cursor.saturating_sub(1).min(self.urls.len() - 1);
        true
    }

    /// Display label for the entry at `index`.
    pub fn label(&self, index: usize, applying: bool) -> String {
        if index == 0 {
            LABEL_ORIGINAL.to_string()
        } else if index + 1 == self.urls.len() {
            if applying {
                LABEL_PROCESSING.to_string()
            } else {
                LABEL_CURRENT.to_string()
            }
        } else {
            format!("Version {index}")
        }
    }
}
