// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Phase + dependency scheduling.
//!
//! Tasks are sorted into execution batches: implicit phase edges keep
//! formatters ahead of linters ahead of typecheckers ahead of tests,
//! explicit `depends_on` edges are honored, and wildcard dependencies gain
//! edges from every matching non-wildcard task. Kahn's algorithm produces
//! the batches; a non-empty remainder is a circular dependency and the
//! remainder itself is the diagnostic.

use std::collections::HashSet;
use std::fmt;

use tracing::error;

use crate::task::{HookTask, TaskKey};

/// Circular dependency: the tasks Kahn's algorithm could not batch.
#[derive(Debug)]
pub struct SchedulerError {
    /// Keys of the tasks still locked in a cycle when the sort stalled.
    pub remaining: Vec<TaskKey>,
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self.remaining.iter().map(TaskKey::to_string).collect();
        write!(f, "circular dependency among: {}", keys.join(", "))
    }
}

impl std::error::Error for SchedulerError {}

/// Sort tasks into execution batches.
///
/// All tasks in batch *n* must finish before batch *n+1* starts; tasks
/// within a batch are order-independent.
pub fn schedule(tasks: Vec<HookTask>) -> Result<Vec<Vec<HookTask>>, SchedulerError> {
    if tasks.is_empty() {
        return Ok(Vec::new());
    }

    let n = tasks.len();
    let mut edges: HashSet<(usize, usize)> = HashSet::new();

    // Wildcard-dependent tasks sit outside phase ordering entirely.
    let wildcard: Vec<bool> = tasks.iter().map(HookTask::has_wildcard_dep).collect();

    // Implicit phase edges: every earlier-phase task precedes every
    // later-phase task. Optional by construction — both ends exist.
    for (i, from) in tasks.iter().enumerate() {
        if wildcard[i] {
            continue;
        }
        for (j, to) in tasks.iter().enumerate() {
            if i != j && !wildcard[j] && from.phase() < to.phase() {
                edges.insert((i, j));
            }
        }
    }

    // Explicit dependency edges.
    for (i, task) in tasks.iter().enumerate() {
        for dep in &task.def.depends_on {
            if dep.is_wildcard() {
                // Edge from every matching task that itself has no
                // wildcard entry — this is what prevents
                // wildcard-on-wildcard cycles.
                for (j, other) in tasks.iter().enumerate() {
                    if j != i && !wildcard[j] && dep.matches(&other.plugin_name, &other.hook_name)
                    {
                        edges.insert((j, i));
                    }
                }
            } else {
                let found = tasks
                    .iter()
                    .position(|t| t.plugin_name == dep.plugin && t.hook_name == dep.hook);
                match found {
                    Some(j) if j != i => {
                        edges.insert((j, i));
                    }
                    Some(_) => {}
                    None if dep.optional => {}
                    None => {
                        error!(
                            task = %task.key(),
                            dependency = format!("{}/{}", dep.plugin, dep.hook),
                            "required dependency not present in this orchestration, skipping edge"
                        );
                    }
                }
            }
        }
    }

    // Kahn's algorithm over the dense edge set.
    let mut in_degree = vec![0usize; n];
    for &(_, to) in &edges {
        in_degree[to] += 1;
    }

    let mut remaining: Vec<usize> = (0..n).collect();
    let mut batches: Vec<Vec<usize>> = Vec::new();

    while !remaining.is_empty() {
        let ready: Vec<usize> = remaining
            .iter()
            .copied()
            .filter(|&i| in_degree[i] == 0)
            .collect();

        if ready.is_empty() {
            let keys = remaining
                .iter()
                .map(|&i| tasks[i].key())
                .collect::<Vec<_>>();
            return Err(SchedulerError { remaining: keys });
        }

        for &i in &ready {
            for &(from, to) in &edges {
                if from == i {
                    in_degree[to] -= 1;
                }
            }
        }
        remaining.retain(|i| !ready.contains(i));
        batches.push(ready);
    }

    // Materialize index batches back into tasks, preserving input order
    // within each batch.
    let mut slots: Vec<Option<HookTask>> = tasks.into_iter().map(Some).collect();
    Ok(batches
        .into_iter()
        .map(|batch| {
            batch
                .into_iter()
                .filter_map(|i| slots[i].take())
                .collect()
        })
        .collect())
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
