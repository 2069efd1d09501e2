//! Voxel world vocabulary hunt
//!
//! The screen shows a native-language word; the learner clicks the block
//! holding its target-language counterpart. Found words leave the pool.

use super::{SessionError, VOCABULARY_MATCH_XP};
use crate::content::VocabularyItem;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct VocabularySession {
    items: Vec<VocabularyItem>,
    found: HashSet<String>,
    target: Option<usize>,
    rng: StdRng,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyPick {
    pub matched: bool,
    pub xp_awarded: u32,
    pub found_count: usize,
    pub explored: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyView {
    pub items: Vec<VocabularyItem>,
    /// Native-language word to look for
    pub target_word: Option<String>,
    pub found_ids: Vec<String>,
    pub found_count: usize,
    pub explored: bool,
}

impl VocabularySession {
    pub fn new(items: Vec<VocabularyItem>) -> Self {
        Self::with_rng(items, StdRng::from_entropy())
    }

    pub fn with_seed(items: Vec<VocabularyItem>, seed: u64) -> Self {
        Self::with_rng(items, StdRng::seed_from_u64(seed))
    }

    fn with_rng(items: Vec<VocabularyItem>, rng: StdRng) -> Self {
        let mut session = Self {
            items,
            found: HashSet::new(),
            target: None,
            rng,
        };
        session.choose_target();
        session
    }

    fn choose_target(&mut self) {
        let remaining: Vec<usize> = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| !self.found.contains(&item.id))
            .map(|(i, _)| i)
            .collect();
        self.target = remaining.choose(&mut self.rng).copied();
    }

    pub fn target(&self) -> Option<&VocabularyItem> {
        self.target.and_then(|i| self.items.get(i))
    }

    pub fn found_count(&self) -> usize {
        self.found.len()
    }

    /// Every word has been found
    pub fn is_explored(&self) -> bool {
        self.target.is_none()
    }

    /// Click on the block holding `item_id`
    pub fn pick(&mut self, item_id: &str) -> Result<VocabularyPick, SessionError> {
        let target_id = self.target().map(|t| t.id.clone()).ok_or(SessionError::Finished)?;

        let matched = target_id == item_id;
        if matched {
            self.found.insert(target_id);
            self.choose_target();
        }

        Ok(VocabularyPick {
            matched,
            xp_awarded: if matched { VOCABULARY_MATCH_XP } else { 0 },
            found_count: self.found_count(),
            explored: self.is_explored(),
        })
    }

    pub fn restart(&mut self) {
        self.found.clear();
        self.choose_target();
    }

    pub fn view(&self) -> VocabularyView {
        VocabularyView {
            items: self.items.clone(),
            target_word: self.target().map(|t| t.native_word.clone()),
            found_ids: self
                .items
                .iter()
                .filter(|i| self.found.contains(&i.id))
                .map(|i| i.id.clone())
                .collect(),
            found_count: self.found_count(),
            explored: self.is_explored(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, target: &str, native: &str) -> VocabularyItem {
        VocabularyItem {
            id: id.to_string(),
            target_word: target.to_string(),
            native_word: native.to_string(),
            emoji: String::new(),
        }
    }

    fn kitchen() -> Vec<VocabularyItem> {
        vec![
            item("1", "spoon", "cuchara"),
            item("2", "fork", "tenedor"),
            item("3", "knife", "cuchillo"),
        ]
    }

    #[test]
    fn finding_every_word_explores_the_world() {
        let mut session = VocabularySession::with_seed(kitchen(), 11);
        let mut xp = 0;

        while let Some(target) = session.target().map(|t| t.id.clone()) {
            let pick = session.pick(&target).unwrap();
            assert!(pick.matched);
            xp += pick.xp_awarded;
        }

        assert!(session.is_explored());
        assert_eq!(session.found_count(), 3);
        assert_eq!(xp, 60);
        assert!(matches!(session.pick("1"), Err(SessionError::Finished)));
    }

    #[test]
    fn wrong_block_changes_nothing() {
        let mut session = VocabularySession::with_seed(kitchen(), 3);
        let target = session.target().unwrap().id.clone();
        let other = if target == "1" { "2" } else { "1" };

        let pick = session.pick(other).unwrap();
        assert!(!pick.matched);
        assert_eq!(pick.xp_awarded, 0);
        assert_eq!(session.target().unwrap().id, target);
    }

    #[test]
    fn found_words_are_never_targeted_again() {
        let mut session = VocabularySession::with_seed(kitchen(), 99);
        let first = session.target().unwrap().id.clone();
        session.pick(&first).unwrap();

        while let Some(target) = session.target().map(|t| t.id.clone()) {
            assert_ne!(target, first);
            session.pick(&target).unwrap();
        }
    }

    #[test]
    fn view_shows_native_word_as_target() {
        let session = VocabularySession::with_seed(kitchen(), 5);
        let view = session.view();
        let target = session.target().unwrap();
        assert_eq!(view.target_word.as_deref(), Some(target.native_word.as_str()));
        assert!(view.found_ids.is_empty());
    }

    #[test]
    fn empty_item_list_has_no_target() {
        let session = VocabularySession::new(Vec::new());
        assert!(session.target().is_none());
        assert!(session.is_explored());
    }
}
