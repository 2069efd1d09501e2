//! Daily story reader; finishing a story is worth a flat 15 XP, once

use super::{SessionError, LIBRARY_FINISH_XP};
use crate::content::Story;
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct LibrarySession {
    story: Story,
    finished: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryView {
    pub title: String,
    pub paragraphs: Vec<String>,
    pub finished: bool,
}

impl LibrarySession {
    pub fn new(story: Story) -> Self {
        Self {
            story,
            finished: false,
        }
    }

    /// Mark the story as read. Returns the XP earned.
    pub fn finish(&mut self) -> Result<u32, SessionError> {
        if self.finished {
            return Err(SessionError::Finished);
        }
        self.finished = true;
        Ok(LIBRARY_FINISH_XP)
    }

    pub fn view(&self) -> StoryView {
        StoryView {
            title: self.story.title.clone(),
            paragraphs: self.story.paragraphs().into_iter().map(String::from).collect(),
            finished: self.finished,
        }
    }
}
