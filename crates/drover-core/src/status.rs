// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Job status transition table.
//!
//! This module is pure: it answers "is `(from, to)` a legal edge" without
//! touching the store. The transactional entry point that enforces it lives
//! in [`crate::lifecycle`].
//!
//! ```text
//!  PENDING -> PROCESSING_INPUTS -> STAGING_INPUTS -> STAGED
//!      -> SUBMITTING -> QUEUED -> RUNNING -> ARCHIVING -> FINISHED
//! ```
//!
//! Forward skips along the active chain are legal (workers may collapse
//! phases). Every non-terminal state can reach BLOCKED, PAUSED, CANCELLED,
//! and FAILED. BLOCKED and PAUSED can resume to any active state. FINISHED
//! is reachable only from RUNNING and ARCHIVING. Terminal states have no
//! outgoing edges.

use crate::model::JobStatus;

/// Position of a status in the active forward chain, if it is on it.
fn chain_index(status: JobStatus) -> Option<usize> {
    match status {
        JobStatus::Pending => Some(0),
        JobStatus::ProcessingInputs => Some(1),
        JobStatus::StagingInputs => Some(2),
        JobStatus::Staged => Some(3),
        JobStatus::Submitting => Some(4),
        JobStatus::Queued => Some(5),
        JobStatus::Running => Some(6),
        JobStatus::Archiving => Some(7),
        _ => None,
    }
}

/// Whether `(from, to)` is a legal edge in the job lifecycle graph.
pub fn is_legal_transition(from: JobStatus, to: JobStatus) -> bool {
    if from.is_terminal() {
        return false;
    }

    match to {
        // FINISHED only after the job actually executed.
        JobStatus::Finished => matches!(from, JobStatus::Running | JobStatus::Archiving),

        // Failure, cancellation, and the holding states are reachable from
        // every non-terminal state. BLOCKED -> BLOCKED is a legal re-entry.
        JobStatus::Cancelled | JobStatus::Failed | JobStatus::Blocked | JobStatus::Paused => {
            // No self-loop on PAUSED.
            !(from == JobStatus::Paused && to == JobStatus::Paused)
        }

        // Active targets: forward moves (skips allowed) from the chain, or
        // resumption from a holding state.
        _ => match chain_index(from) {
            Some(from_idx) => match chain_index(to) {
                Some(to_idx) => to_idx > from_idx,
                None => false,
            },
            // BLOCKED and PAUSED resume to any active state.
            None => chain_index(to).is_some(),
        },
    }
}

/// All legal target statuses from `from`, in lifecycle order.
pub fn legal_next(from: JobStatus) -> Vec<JobStatus> {
    JobStatus::ALL
        .into_iter()
        .filter(|&to| is_legal_transition(from, to))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states_have_no_edges() {
        for from in [JobStatus::Finished, JobStatus::Cancelled, JobStatus::Failed] {
            for to in JobStatus::ALL {
                assert!(
                    !is_legal_transition(from, to),
                    "{} -> {} must be illegal",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_forward_chain() {
        assert!(is_legal_transition(
            JobStatus::Pending,
            JobStatus::ProcessingInputs
        ));
        assert!(is_legal_transition(
            JobStatus::ProcessingInputs,
            JobStatus::StagingInputs
        ));
        assert!(is_legal_transition(
            JobStatus::StagingInputs,
            JobStatus::Staged
        ));
        assert!(is_legal_transition(
            JobStatus::Staged,
            JobStatus::Submitting
        ));
        assert!(is_legal_transition(JobStatus::Submitting, JobStatus::Queued));
        assert!(is_legal_transition(JobStatus::Queued, JobStatus::Running));
        assert!(is_legal_transition(JobStatus::Running, JobStatus::Archiving));
        assert!(is_legal_transition(JobStatus::Archiving, JobStatus::Finished));
    }

    #[test]
    fn test_forward_skips_allowed() {
        assert!(is_legal_transition(
            JobStatus::ProcessingInputs,
            JobStatus::Staged
        ));
        assert!(is_legal_transition(JobStatus::Staged, JobStatus::Running));
        assert!(is_legal_transition(JobStatus::Pending, JobStatus::Archiving));
    }

    #[test]
    fn test_backward_moves_rejected() {
        assert!(!is_legal_transition(JobStatus::Running, JobStatus::Queued));
        assert!(!is_legal_transition(
            JobStatus::Staged,
            JobStatus::ProcessingInputs
        ));
        assert!(!is_legal_transition(JobStatus::Archiving, JobStatus::Running));
        assert!(!is_legal_transition(JobStatus::Running, JobStatus::Running));
    }

    #[test]
    fn test_finished_requires_execution() {
        assert!(is_legal_transition(JobStatus::Running, JobStatus::Finished));
        assert!(is_legal_transition(JobStatus::Archiving, JobStatus::Finished));
        assert!(!is_legal_transition(JobStatus::Pending, JobStatus::Finished));
        assert!(!is_legal_transition(JobStatus::Queued, JobStatus::Finished));
        assert!(!is_legal_transition(JobStatus::Blocked, JobStatus::Finished));
        assert!(!is_legal_transition(JobStatus::Paused, JobStatus::Finished));
    }

    #[test]
    fn test_guard_states_reachable_from_active() {
        for from in JobStatus::ALL.into_iter().filter(|s| s.is_active()) {
            assert!(is_legal_transition(from, JobStatus::Blocked));
            assert!(is_legal_transition(from, JobStatus::Paused));
            assert!(is_legal_transition(from, JobStatus::Cancelled));
            assert!(is_legal_transition(from, JobStatus::Failed));
        }
    }

    #[test]
    fn test_blocked_reentry_and_resume() {
        // Re-entry is legal (counter semantics handled by the lifecycle).
        assert!(is_legal_transition(JobStatus::Blocked, JobStatus::Blocked));
        // Resume to any active state.
        assert!(is_legal_transition(JobStatus::Blocked, JobStatus::Pending));
        assert!(is_legal_transition(JobStatus::Blocked, JobStatus::Staged));
        assert!(is_legal_transition(JobStatus::Blocked, JobStatus::Running));
        // And can still be cancelled or failed.
        assert!(is_legal_transition(JobStatus::Blocked, JobStatus::Cancelled));
        assert!(is_legal_transition(JobStatus::Blocked, JobStatus::Failed));
    }

    #[test]
    fn test_paused_resume_no_self_loop() {
        assert!(is_legal_transition(JobStatus::Paused, JobStatus::Running));
        assert!(is_legal_transition(JobStatus::Paused, JobStatus::Blocked));
        assert!(!is_legal_transition(JobStatus::Paused, JobStatus::Paused));
    }

    #[test]
    fn test_legal_next_matches_predicate() {
        for from in JobStatus::ALL {
            let next = legal_next(from);
            for to in JobStatus::ALL {
                assert_eq!(next.contains(&to), is_legal_transition(from, to));
            }
        }
    }

    // Full sweep: every pair is either in the table or rejected; there are
    // no pairs where the predicate panics or is asymmetric with legal_next.
    #[test]
    fn test_full_pair_sweep() {
        let mut legal = 0;
        for from in JobStatus::ALL {
            for to in JobStatus::ALL {
                if is_legal_transition(from, to) {
                    legal += 1;
                    assert!(!from.is_terminal());
                }
            }
        }
        // The graph is stable; a change here means the table changed shape.
        assert!(legal > 0);
        assert!(legal < 13 * 13);
    }
}
