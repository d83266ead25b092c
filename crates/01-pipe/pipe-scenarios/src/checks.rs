use pipe::CloseOutcome;

use crate::config::{ScenarioConfig, ScenarioKind};
use crate::engine::ScenarioRun;
use crate::stats::ScenarioStats;
use crate::Item;

/// Borrowed view over what the consumer drained, for verification helpers.
pub struct DrainReport<'a> {
    pub items: &'a [Item],
    pub producers: u32,
    pub close_outcome: CloseOutcome,
}

impl ScenarioRun {
    pub fn report(&self, producers: u32) -> DrainReport<'_> {
        DrainReport {
            items: &self.drained,
            producers,
            close_outcome: self.close_outcome,
        }
    }
}

pub type CheckResult = Result<(), String>;

fn verify_order(drain: &DrainReport<'_>, expected_per_producer: u32) -> CheckResult {
    let mut next = vec![0u32; drain.producers as usize];
    for item in drain.items {
        let slot = next
            .get_mut(item.producer as usize)
            .ok_or_else(|| format!("item from unknown producer {}", item.producer))?;
        if item.seq != *slot {
            return Err(format!(
                "producer {} item {} arrived out of order (expected {})",
                item.producer, item.seq, *slot
            ));
        }
        *slot += 1;
    }
    if let Some((producer, count)) = next
        .iter()
        .enumerate()
        .find(|(_, count)| **count != expected_per_producer)
    {
        return Err(format!(
            "producer {producer} delivered {count} items (expected {expected_per_producer})"
        ));
    }
    Ok(())
}

pub fn verify_flood(
    drain: &DrainReport<'_>,
    stats: &ScenarioStats,
    expected_per_producer: u32,
) -> CheckResult {
    let expected_total = expected_per_producer.saturating_mul(drain.producers);
    if drain.items.len() != expected_total as usize {
        return Err(format!(
            "drained {} items (expected {})",
            drain.items.len(),
            expected_total
        ));
    }
    verify_order(drain, expected_per_producer)?;
    if stats.produced != expected_total {
        return Err(format!(
            "stats produced {} items (expected {})",
            stats.produced, expected_total
        ));
    }
    if stats.consumed != expected_total {
        return Err(format!(
            "stats consumed {} items (expected {})",
            stats.consumed, expected_total
        ));
    }
    if stats.rejected != 0 {
        return Err(format!(
            "{} produces were rejected (expected 0)",
            stats.rejected
        ));
    }
    if drain.close_outcome != CloseOutcome::Drained {
        return Err(format!(
            "pipe closed with {:?} (expected a clean drain)",
            drain.close_outcome
        ));
    }
    Ok(())
}

pub fn verify_burst(
    drain: &DrainReport<'_>,
    stats: &ScenarioStats,
    expected_per_producer: u32,
    capacity: usize,
) -> CheckResult {
    verify_flood(drain, stats, expected_per_producer)?;
    if stats.max_depth > capacity {
        return Err(format!(
            "buffer depth {} exceeded capacity {}",
            stats.max_depth, capacity
        ));
    }
    Ok(())
}

pub fn verify_backpressure(
    drain: &DrainReport<'_>,
    stats: &ScenarioStats,
    expected_per_producer: u32,
) -> CheckResult {
    verify_flood(drain, stats, expected_per_producer)?;
    if stats.full_waits == 0 && stats.produce_timeouts == 0 {
        return Err(
            "backpressure scenario expected producers to block on a full pipe, observed none"
                .into(),
        );
    }
    Ok(())
}

pub fn verify_immediate_close(
    drain: &DrainReport<'_>,
    stats: &ScenarioStats,
    expected_total: u32,
) -> CheckResult {
    if !drain.items.is_empty() {
        return Err(format!(
            "closed pipe still served {} items",
            drain.items.len()
        ));
    }
    if stats.produced != expected_total {
        return Err(format!(
            "stats produced {} items (expected {})",
            stats.produced, expected_total
        ));
    }
    let expected_outcome = CloseOutcome::Immediate {
        discarded: expected_total as usize,
    };
    if drain.close_outcome != expected_outcome {
        return Err(format!(
            "pipe closed with {:?} (expected {:?})",
            drain.close_outcome, expected_outcome
        ));
    }
    if stats.rejected != 1 {
        return Err(format!(
            "late produce rejected {} times (expected 1)",
            stats.rejected
        ));
    }
    Ok(())
}

/// Runs the check matching the scenario kind.
pub fn verify_run(
    config: &ScenarioConfig,
    run: &ScenarioRun,
    stats: &ScenarioStats,
) -> CheckResult {
    let drain = run.report(config.producers);
    let per_producer = config.kind.items_per_producer();
    match config.kind {
        ScenarioKind::Flood { .. } | ScenarioKind::GracefulDrain { .. } => {
            verify_flood(&drain, stats, per_producer)
        }
        ScenarioKind::Burst { .. } => verify_burst(&drain, stats, per_producer, config.capacity),
        ScenarioKind::Backpressure { .. } => verify_backpressure(&drain, stats, per_producer),
        ScenarioKind::ImmediateClose { .. } => {
            verify_immediate_close(&drain, stats, config.expected_items())
        }
    }
}
