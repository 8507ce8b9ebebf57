//! The repair loop
//!
//! One session owns one script. Backup once, then: run the tests; on
//! failure show the model a numbered snapshot plus the failure output, ask
//! for line edits, validate, apply, and go around again. The loop ends when
//! the tests pass or the attempt budget runs out. Revert is a separate,
//! explicit path that restores the backup and stops.

use crate::diff;
use crate::llm::prompts;
use crate::llm::validate::{self, Validation};
use crate::llm::{Conversation, ModelBackend};
use crate::output;
use crate::patch;
use crate::source::{self, SourceFile};
use crate::testrun::TestExecutor;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Everything one repair invocation needs to know.
#[derive(Debug, Clone)]
pub struct RepairSession {
    pub script: PathBuf,
    pub test_id: String,
    pub retry_limit: u32,
}

/// How a session ended, short of a fatal error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Passed { attempts: u32 },
    /// Tests still failing. The file is left in its last-patched state;
    /// the `.bak` stays untouched for an explicit revert.
    BudgetExhausted { attempts: u32 },
}

pub struct RepairOrchestrator<M, T> {
    model: M,
    runner: T,
    session: RepairSession,
}

impl<M: ModelBackend, T: TestExecutor> RepairOrchestrator<M, T> {
    pub fn new(model: M, runner: T, session: RepairSession) -> Self {
        Self {
            model,
            runner,
            session,
        }
    }

    /// Drive the attempt loop to one of its terminal outcomes.
    ///
    /// Recoverable conditions (failing tests, unparsable model replies)
    /// consume attempts. Everything else - a patch referencing lines the
    /// file does not have, I/O failures, a dead model service - propagates
    /// and aborts the session without rollback.
    pub async fn run(&mut self) -> Result<SessionOutcome> {
        let mut source = SourceFile::open(&self.session.script)?;
        // Unconditional, even for a run that never patches.
        source.create_backup()?;

        let mut attempts = 0;
        while attempts < self.session.retry_limit {
            attempts += 1;
            output::print_attempt_banner(attempts, self.session.retry_limit);

            let outcome = self.runner.run(&self.session.test_id);
            if outcome.passed() {
                output::print_tests_passed(&outcome.output);
                return Ok(SessionOutcome::Passed { attempts });
            }
            output::print_tests_failed(&outcome.output);

            let snapshot = source.snapshot()?;
            let mut conversation = Conversation::new();
            conversation.push_system(prompts::REPAIR_SYSTEM);
            conversation.push_user(prompts::build_repair_prompt(
                &snapshot.numbered(),
                &outcome.output,
            ));

            let reply = self.model.complete(&mut conversation).await?;
            match validate::validate(&reply, snapshot.id) {
                Validation::Valid(patch_set) => {
                    let after = patch::apply(&snapshot, &patch_set)?;
                    source.write_lines(&after)?;
                    output::print_explanations(&patch_set.explanations());
                    output::print_diff(&diff::render(&snapshot.lines, &after));
                    output::print_patch_applied();
                }
                Validation::Invalid { reason } => {
                    output::print_invalid_response(&reason);
                    output::print_raw_response(&reply);
                    // Kept on this exchange for a future correction turn;
                    // the next attempt builds a fresh prompt.
                    conversation.push_user(prompts::CORRECTION_PROMPT);
                }
            }
        }

        Ok(SessionOutcome::BudgetExhausted { attempts })
    }
}

/// Restore `<script>.bak` over the working file. Returns `false` when no
/// backup exists.
pub fn revert(script: &Path) -> Result<bool> {
    source::restore_backup(script)
}
