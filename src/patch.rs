//! Structured edits and patch application
//!
//! A [`PatchSet`] is what one model round produces: edit operations plus
//! free-text explanations, stamped with the id of the snapshot the model was
//! shown. Line numbers are 1-based and relative to that snapshot, never to
//! earlier edits in the same batch.
//!
//! Application sorts edits by line descending. Delete and InsertAfter change
//! the length of the sequence, so applying the highest line first keeps every
//! lower, not-yet-applied index valid. Ascending order would corrupt them.

use crate::source::Snapshot;
use anyhow::{bail, Result};

/// One line-level edit against a specific snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOperation {
    /// Overwrite the line at `line`.
    Replace { line: usize, content: String },
    /// Remove the line at `line`.
    Delete { line: usize },
    /// Insert a new line immediately after `line`.
    InsertAfter { line: usize, content: String },
}

impl EditOperation {
    pub fn line(&self) -> usize {
        match self {
            EditOperation::Replace { line, .. } => *line,
            EditOperation::Delete { line } => *line,
            EditOperation::InsertAfter { line, .. } => *line,
        }
    }
}

/// One element of a model response: an edit or a prose explanation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchItem {
    Edit(EditOperation),
    Explanation(String),
}

/// The validated result of one model round. Consumed exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchSet {
    /// Id of the snapshot the edits' line numbers refer to.
    pub snapshot_id: u64,
    pub items: Vec<PatchItem>,
}

impl PatchSet {
    pub fn edits(&self) -> Vec<&EditOperation> {
        self.items
            .iter()
            .filter_map(|item| match item {
                PatchItem::Edit(op) => Some(op),
                PatchItem::Explanation(_) => None,
            })
            .collect()
    }

    pub fn explanations(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter_map(|item| match item {
                PatchItem::Explanation(text) => Some(text.as_str()),
                PatchItem::Edit(_) => None,
            })
            .collect()
    }
}

/// Apply a patch set to a snapshot, returning the new line sequence.
///
/// A patch stamped with a different snapshot id, or an edit referencing a
/// line outside the sequence, is fatal and aborts the session.
pub fn apply(snapshot: &Snapshot, patch: &PatchSet) -> Result<Vec<String>> {
    if patch.snapshot_id != snapshot.id {
        bail!(
            "patch was computed against snapshot {} but the file is at snapshot {}",
            patch.snapshot_id,
            snapshot.id
        );
    }

    // Highest line first, so earlier inserts/deletes never shift the
    // indices of edits still to come.
    let mut edits = patch.edits();
    edits.sort_by(|a, b| b.line().cmp(&a.line()));

    let mut lines = snapshot.lines.clone();
    for edit in edits {
        match edit {
            EditOperation::Replace { line, content } => {
                check_bounds(*line, lines.len())?;
                lines[line - 1] = format!("{content}\n");
            }
            EditOperation::Delete { line } => {
                check_bounds(*line, lines.len())?;
                lines.remove(line - 1);
            }
            EditOperation::InsertAfter { line, content } => {
                if *line > lines.len() {
                    bail!(
                        "edit references line {} but the file has {} lines",
                        line,
                        lines.len()
                    );
                }
                lines.insert(*line, format!("{content}\n"));
            }
        }
    }
    Ok(lines)
}

fn check_bounds(line: usize, len: usize) -> Result<()> {
    if line < 1 || line > len {
        bail!("edit references line {line} but the file has {len} lines");
    }
    Ok(())
}
