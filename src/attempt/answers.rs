// src/attempt/answers.rs

use std::collections::HashMap;

use crate::{error::AppError, models::test::Choice};

/// Draft and committed choice of one question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Slot {
    /// Selected locally, not yet acknowledged.
    pub draft: Option<Choice>,
    /// Acknowledged by the server.
    pub committed: Option<Choice>,
}

/// One sidebar entry: its 1-based number and whether it shows as answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub number: usize,
    pub question_id: String,
    pub answered: bool,
}

/// Per-question answer state of an attempt, in sidebar order.
///
/// Each question is updated independently; nothing here ever touches a
/// slot other than the one named by the caller.
#[derive(Debug, Clone, Default)]
pub struct AnswerSheet {
    order: Vec<String>,
    slots: HashMap<String, Slot>,
}

impl AnswerSheet {
    /// Builds the sheet from `(question_id, resumed_choice)` pairs.
    /// A resumed choice counts as both draft and committed.
    pub fn new<I>(questions: I) -> Self
    where
        I: IntoIterator<Item = (String, Option<Choice>)>,
    {
        let mut sheet = Self::default();
        for (id, resumed) in questions {
            sheet.slots.insert(
                id.clone(),
                Slot {
                    draft: resumed,
                    committed: resumed,
                },
            );
            sheet.order.push(id);
        }
        sheet
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Question id shown under sidebar number `number` (1-based).
    pub fn id_at(&self, number: usize) -> Option<&str> {
        number.checked_sub(1).and_then(|i| self.order.get(i)).map(String::as_str)
    }

    pub fn number_of(&self, question_id: &str) -> Option<usize> {
        self.order.iter().position(|id| id == question_id).map(|i| i + 1)
    }

    pub fn slot(&self, question_id: &str) -> Option<&Slot> {
        self.slots.get(question_id)
    }

    pub fn draft(&self, question_id: &str) -> Option<Choice> {
        self.slots.get(question_id).and_then(|s| s.draft)
    }

    pub fn committed(&self, question_id: &str) -> Option<Choice> {
        self.slots.get(question_id).and_then(|s| s.committed)
    }

    pub fn is_answered(&self, question_id: &str) -> bool {
        self.committed(question_id).is_some()
    }

    /// True when the draft differs from what the server has.
    pub fn is_dirty(&self, question_id: &str) -> bool {
        self.slots
            .get(question_id)
            .is_some_and(|s| s.draft.is_some() && s.draft != s.committed)
    }

    pub fn stage(&mut self, question_id: &str, choice: Choice) -> Result<(), AppError> {
        let slot = self.slot_mut(question_id)?;
        slot.draft = Some(choice);
        Ok(())
    }

    /// Records a server acknowledgement for `choice`.
    ///
    /// The draft is left alone: the user may have moved on to another
    /// choice while the request was in flight.
    pub fn commit(&mut self, question_id: &str, choice: Choice) -> Result<(), AppError> {
        let slot = self.slot_mut(question_id)?;
        slot.committed = Some(choice);
        Ok(())
    }

    pub fn answered_count(&self) -> usize {
        self.slots.values().filter(|s| s.committed.is_some()).count()
    }

    pub fn markers(&self) -> Vec<Marker> {
        self.order
            .iter()
            .enumerate()
            .map(|(i, id)| Marker {
                number: i + 1,
                question_id: id.clone(),
                answered: self.is_answered(id),
            })
            .collect()
    }

    fn slot_mut(&mut self, question_id: &str) -> Result<&mut Slot, AppError> {
        self.slots
            .get_mut(question_id)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown question '{}'", question_id)))
    }
}
