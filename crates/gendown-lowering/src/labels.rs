//! Label Table
//!
//! Labels are opaque branch targets handed out while the driver describes a
//! function body. Each label is later bound ("marked") to the index of the
//! next operation to be recorded; branches may reference a label before it is
//! marked. Once the operation stream is complete the builder maps every marked
//! label to the case number of the dispatch table that starts at its position.

use crate::error::LoweringError;
use std::fmt;

/// Opaque branch target. Handles are 1-based; `Label::NONE` (0) means "no label".
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(pub u32);

impl Label {
    pub const NONE: Self = Self(0);

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_some(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, Default)]
struct LabelEntry {
    /// Operation index the label is bound to
    position: Option<u32>,
    referenced: bool,
}

/// Allocates labels and records where each one resolves.
#[derive(Debug, Default)]
pub struct LabelTable {
    /// Indexed by `Label::0 - 1`
    entries: Vec<LabelEntry>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no label has been defined yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of labels defined so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Allocate the next label. It starts out unresolved.
    pub fn define(&mut self) -> Label {
        self.entries.push(LabelEntry::default());
        Label(self.entries.len() as u32)
    }

    fn entry_mut(&mut self, label: Label) -> Result<&mut LabelEntry, LoweringError> {
        if label.is_none() {
            return Err(LoweringError::UndefinedLabel(label));
        }
        self.entries
            .get_mut(label.0 as usize - 1)
            .ok_or(LoweringError::UndefinedLabel(label))
    }

    /// Bind `label` to operation index `position`.
    pub fn mark(&mut self, label: Label, position: u32) -> Result<(), LoweringError> {
        let entry = self.entry_mut(label)?;
        if let Some(existing) = entry.position {
            return Err(LoweringError::LabelAlreadyMarked(label, existing));
        }
        entry.position = Some(position);
        Ok(())
    }

    /// Record that something branches to `label`.
    pub fn note_reference(&mut self, label: Label) -> Result<(), LoweringError> {
        self.entry_mut(label)?.referenced = true;
        Ok(())
    }

    /// Operation index `label` is bound to, if it has been marked.
    pub fn position(&self, label: Label) -> Option<u32> {
        if label.is_none() {
            return None;
        }
        self.entries
            .get(label.0 as usize - 1)
            .and_then(|entry| entry.position)
    }

    pub fn is_referenced(&self, label: Label) -> bool {
        label.is_some()
            && self
                .entries
                .get(label.0 as usize - 1)
                .is_some_and(|entry| entry.referenced)
    }

    /// All defined labels in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = Label> + '_ {
        (1..=self.entries.len() as u32).map(Label)
    }

    /// Labels that were defined but never marked.
    pub fn unmarked(&self) -> Vec<Label> {
        self.iter()
            .filter(|label| self.position(*label).is_none())
            .collect()
    }

    /// First defined label that was never marked.
    pub fn first_unmarked(&self) -> Option<Label> {
        self.iter().find(|label| self.position(*label).is_none())
    }
}

#[cfg(test)]
#[path = "../tests/labels.rs"]
mod tests;
