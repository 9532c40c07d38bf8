//! Decisions that need a human.
//!
//! Batch operations never talk to a terminal themselves. Whenever the old
//! workflow stopped to ask "overwrite?", "skip?" or "continue?", the question
//! goes through an [`Operator`] instead, so the same code runs interactively
//! from the CLI and unattended in tests.

use crate::sip::Stage;
use std::path::Path;

/// A yes/no question raised during a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    /// The item is already a bag. `true` skips it.
    SkipBag { item: String },
    /// At least one `metadata.csv` exists. `true` overwrites every one of
    /// them for the rest of the run.
    OverwriteAllMetadata,
    /// The item is already a bag. `true` bags it again.
    BagAnyway { item: String },
    /// A pipeline stage finished. `true` runs the next one.
    Continue { finished: Stage, summary: String },
}

impl Prompt {
    /// Answer used when nobody is asked: leave existing work alone and keep
    /// the batch moving.
    #[must_use]
    pub fn default_answer(&self) -> bool {
        match self {
            Self::SkipBag { .. } => true,
            Self::OverwriteAllMetadata => false,
            Self::BagAnyway { .. } => false,
            Self::Continue { .. } => true,
        }
    }

    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::SkipBag { item } => format!("'{item}' appears to be a bag. Skip it?"),
            Self::OverwriteAllMetadata => "At least one 'metadata.csv' already exists. Overwrite ALL of them?".into(),
            Self::BagAnyway { item } => format!("'{item}' appears to be a bag already. Bag it anyway?"),
            Self::Continue { finished, summary } => format!("{finished}: {summary}. Continue with the next stage?"),
        }
    }
}

/// What to do with an output folder that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    /// Remove it and start again.
    Overwrite,
    /// Keep it and leave this item out.
    Skip,
    /// Stop the whole batch.
    Quit,
}

pub trait Operator {
    fn confirm(&mut self, prompt: &Prompt) -> bool;
    fn conflict(&mut self, existing: &Path) -> Conflict;
}

/// Answers every question with its default and skips every conflict.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unattended;

impl Operator for Unattended {
    fn confirm(&mut self, prompt: &Prompt) -> bool {
        let answer = prompt.default_answer();
        tracing::debug!(prompt = %prompt.message(), answer, "answered unattended");
        answer
    }

    fn conflict(&mut self, existing: &Path) -> Conflict {
        tracing::warn!(path = %existing.display(), "already exists, skipping");
        Conflict::Skip
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Replays canned answers in order, falling back to defaults, and
    /// records every prompt it saw.
    #[derive(Debug, Default)]
    pub(crate) struct Scripted {
        pub answers: VecDeque<bool>,
        pub conflicts: VecDeque<Conflict>,
        pub asked: Vec<Prompt>,
    }

    impl Scripted {
        pub(crate) fn answering(answers: &[bool]) -> Self {
            Self { answers: answers.iter().copied().collect(), ..Self::default() }
        }

        pub(crate) fn resolving(conflicts: &[Conflict]) -> Self {
            Self { conflicts: conflicts.iter().copied().collect(), ..Self::default() }
        }
    }

    impl Operator for Scripted {
        fn confirm(&mut self, prompt: &Prompt) -> bool {
            self.asked.push(prompt.clone());
            self.answers.pop_front().unwrap_or_else(|| prompt.default_answer())
        }

        fn conflict(&mut self, _existing: &Path) -> Conflict {
            self.conflicts.pop_front().unwrap_or(Conflict::Skip)
        }
    }

    #[test]
    fn defaults_keep_existing_work() {
        assert!(Prompt::SkipBag { item: "X".into() }.default_answer());
        assert!(!Prompt::OverwriteAllMetadata.default_answer());
        assert!(!Prompt::BagAnyway { item: "X".into() }.default_answer());
        assert_eq!(Unattended.conflict(Path::new("/x")), Conflict::Skip);
    }

    #[test]
    fn continue_message_names_stage() {
        let prompt = Prompt::Continue { finished: Stage::Tar, summary: "created 3 archives".into() };
        assert_eq!(prompt.message(), "tar: created 3 archives. Continue with the next stage?");
        assert!(Unattended.confirm(&prompt));
    }
}
