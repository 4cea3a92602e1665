use rand::Rng;
use rand::seq::SliceRandom;

use crate::engine::study::StudyStore;
use crate::model::{StudyState, VocabularyEntry};
use crate::storage::kv::KeyValueStore;

/// Optional deck ordering. Neither option touches the canonical vocabulary
/// order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeckView {
    pub shuffle: bool,
    pub bookmarked_only: bool,
}

/// Walks the vocabulary one card at a time. Without a view it follows the
/// persisted card index; with one it walks a materialized list of indices and
/// keeps the persisted index pointed at the card on screen.
#[derive(Debug, Clone)]
pub struct FlashcardNavigator<'v> {
    vocabulary: &'v [VocabularyEntry],
    order: Option<Vec<usize>>,
    position: usize,
    flipped: bool,
}

impl<'v> FlashcardNavigator<'v> {
    pub fn new(vocabulary: &'v [VocabularyEntry]) -> Self {
        Self {
            vocabulary,
            order: None,
            position: 0,
            flipped: false,
        }
    }

    pub fn with_view<R: Rng + ?Sized>(
        vocabulary: &'v [VocabularyEntry],
        view: DeckView,
        state: &StudyState,
        rng: &mut R,
    ) -> Self {
        if view == DeckView::default() {
            return Self::new(vocabulary);
        }

        let mut order: Vec<usize> = (0..vocabulary.len())
            .filter(|&i| !view.bookmarked_only || state.is_bookmarked(&vocabulary[i].word))
            .collect();
        if view.shuffle {
            order.shuffle(rng);
        }
        let position = order
            .iter()
            .position(|&i| i == state.current_card_index)
            .unwrap_or(0);

        Self {
            vocabulary,
            order: Some(order),
            position,
            flipped: false,
        }
    }

    /// Cards reachable in this deck.
    pub fn len(&self) -> usize {
        match &self.order {
            Some(order) => order.len(),
            None => self.vocabulary.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Zero-based position of the current card within the deck.
    pub fn position<S: KeyValueStore>(&self, study: &StudyStore<S>) -> usize {
        match &self.order {
            Some(_) => self.position,
            None => study.state().current_card_index,
        }
    }

    pub fn current<S: KeyValueStore>(&self, study: &StudyStore<S>) -> Option<&'v VocabularyEntry> {
        let vocabulary = self.vocabulary;
        match &self.order {
            Some(order) => order.get(self.position).and_then(|&i| vocabulary.get(i)),
            None => vocabulary.get(study.state().current_card_index),
        }
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    /// Turn the card over. Revealing the back counts as a flip and marks the
    /// word as studied. Returns whether the back is now showing.
    pub fn flip<S: KeyValueStore>(&mut self, study: &mut StudyStore<S>) -> bool {
        let Some(card) = self.current(study) else {
            return false;
        };
        self.flipped = !self.flipped;
        if self.flipped {
            study.record_flip();
            study.record_card_studied(&card.word);
        }
        self.flipped
    }

    pub fn next<S: KeyValueStore>(
        &mut self,
        study: &mut StudyStore<S>,
    ) -> Option<&'v VocabularyEntry> {
        self.step(study, true)
    }

    pub fn prev<S: KeyValueStore>(
        &mut self,
        study: &mut StudyStore<S>,
    ) -> Option<&'v VocabularyEntry> {
        self.step(study, false)
    }

    fn step<S: KeyValueStore>(
        &mut self,
        study: &mut StudyStore<S>,
        forward: bool,
    ) -> Option<&'v VocabularyEntry> {
        self.flipped = false;
        match &self.order {
            None => {
                if forward {
                    study.next_card();
                } else {
                    study.prev_card();
                }
            }
            Some(order) if !order.is_empty() => {
                let len = order.len();
                self.position = if forward {
                    (self.position + 1) % len
                } else {
                    (self.position + len - 1) % len
                };
                study.go_to_card(order[self.position] as i64);
            }
            Some(_) => {}
        }
        self.current(study)
    }

    /// Jump to a vocabulary index (clamped). In a filtered deck the position
    /// follows only if that card is part of it.
    pub fn go_to<S: KeyValueStore>(
        &mut self,
        study: &mut StudyStore<S>,
        index: i64,
    ) -> Option<&'v VocabularyEntry> {
        self.flipped = false;
        let index = study.go_to_card(index);
        if let Some(order) = &self.order
            && let Some(position) = order.iter().position(|&i| i == index)
        {
            self.position = position;
        }
        self.current(study)
    }

    pub fn toggle_bookmark<S: KeyValueStore>(&self, study: &mut StudyStore<S>) -> Option<bool> {
        let card = self.current(study)?;
        Some(study.toggle_bookmark(&card.word))
    }

    pub fn increase_mastery<S: KeyValueStore>(&self, study: &mut StudyStore<S>) -> Option<u8> {
        let card = self.current(study)?;
        Some(study.increase_mastery(&card.word))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Difficulty;
    use crate::storage::kv::MemoryStore;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn vocab(words: &[&str]) -> Vec<VocabularyEntry> {
        words
            .iter()
            .map(|w| VocabularyEntry {
                word: w.to_string(),
                part_of_speech: "noun".into(),
                difficulty: Difficulty::College,
                definition: format!("meaning of {w}"),
                example: String::new(),
                synonyms: Vec::new(),
                antonyms: Vec::new(),
            })
            .collect()
    }

    #[test]
    fn canonical_deck_wraps_through_the_store() {
        let words = vocab(&["abate", "candid", "laconic"]);
        let mut study = StudyStore::open(MemoryStore::new(), words.len());
        let mut deck = FlashcardNavigator::new(&words);

        assert_eq!(deck.current(&study).unwrap().word, "abate");
        assert_eq!(deck.prev(&mut study).unwrap().word, "laconic");
        assert_eq!(deck.next(&mut study).unwrap().word, "abate");
        assert_eq!(study.state().current_card_index, 0);
        assert_eq!(deck.go_to(&mut study, 99).unwrap().word, "laconic");
    }

    #[test]
    fn revealing_counts_a_flip_and_marks_the_word_studied() {
        let words = vocab(&["abate", "candid"]);
        let mut study = StudyStore::open(MemoryStore::new(), words.len());
        let mut deck = FlashcardNavigator::new(&words);

        assert!(deck.flip(&mut study));
        assert!(!deck.flip(&mut study));
        assert!(deck.flip(&mut study));
        assert_eq!(study.state().study_stats.total_flips, 2);
        assert_eq!(study.state().study_stats.cards_studied.len(), 1);

        deck.next(&mut study);
        assert!(!deck.is_flipped());
    }

    #[test]
    fn bookmarked_view_leaves_the_vocabulary_order_alone() {
        let words = vocab(&["abate", "candid", "laconic", "zeal"]);
        let mut study = StudyStore::open(MemoryStore::new(), words.len());
        study.toggle_bookmark("candid");
        study.toggle_bookmark("zeal");

        let mut rng = StdRng::seed_from_u64(3);
        let view = DeckView {
            bookmarked_only: true,
            shuffle: false,
        };
        let mut deck = FlashcardNavigator::with_view(&words, view, study.state(), &mut rng);
        assert_eq!(deck.len(), 2);

        assert_eq!(deck.current(&study).unwrap().word, "candid");
        assert_eq!(deck.next(&mut study).unwrap().word, "zeal");
        assert_eq!(study.state().current_card_index, 3);
        assert_eq!(deck.next(&mut study).unwrap().word, "candid");
        assert_eq!(study.state().current_card_index, 1);
        assert_eq!(deck.prev(&mut study).unwrap().word, "zeal");
        assert_eq!(words[0].word, "abate");
    }

    #[test]
    fn shuffled_view_visits_every_card_once_per_cycle() {
        let words = vocab(&["a", "b", "c", "d", "e", "f"]);
        let mut study = StudyStore::open(MemoryStore::new(), words.len());
        let mut rng = StdRng::seed_from_u64(4);
        let view = DeckView {
            shuffle: true,
            bookmarked_only: false,
        };
        let mut deck = FlashcardNavigator::with_view(&words, view, study.state(), &mut rng);

        let mut seen: Vec<String> = (0..words.len())
            .map(|_| deck.next(&mut study).unwrap().word.clone())
            .collect();
        seen.sort();
        assert_eq!(seen, vec!["a", "b", "c", "d", "e", "f"]);
    }

    #[test]
    fn empty_deck_is_inert() {
        let words = vocab(&["abate"]);
        let mut study = StudyStore::open(MemoryStore::new(), words.len());
        let mut rng = StdRng::seed_from_u64(5);
        let view = DeckView {
            bookmarked_only: true,
            shuffle: true,
        };
        let mut deck = FlashcardNavigator::with_view(&words, view, study.state(), &mut rng);

        assert!(deck.is_empty());
        assert!(deck.next(&mut study).is_none());
        assert!(!deck.flip(&mut study));
        assert_eq!(deck.toggle_bookmark(&mut study), None);
        assert_eq!(study.state().study_stats.total_flips, 0);
    }

    #[test]
    fn card_actions_delegate_to_the_store() {
        let words = vocab(&["abate", "candid"]);
        let mut study = StudyStore::open(MemoryStore::new(), words.len());
        let deck = FlashcardNavigator::new(&words);

        assert_eq!(deck.toggle_bookmark(&mut study), Some(true));
        assert_eq!(deck.increase_mastery(&mut study), Some(1));
        assert!(study.state().is_bookmarked("abate"));
    }
}
