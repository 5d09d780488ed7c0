use std::collections::HashSet;

use tracing::debug;

use crate::body::BodySet;
use crate::host::ContactSink;
use crate::types::WorldHandle;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Phase {
    Enter,
    Leave,
}

/// Begin/end tracking over touching body pairs. A pair is keyed by slot
/// indices `(a, b)` with `a < b`.
#[derive(Default)]
pub(crate) struct ContactTracker {
    touching: HashSet<(usize, usize)>,
}

impl ContactTracker {
    /// Diff `current` (sorted, unique) against the previous step and notify
    /// `sink`. Returns `(enter, leave)` counts that were delivered.
    pub fn update(
        &mut self,
        current: &[(usize, usize)],
        bodies: &BodySet,
        world: WorldHandle,
        sink: Option<&dyn ContactSink>,
    ) -> (usize, usize) {
        let next: HashSet<(usize, usize)> = current.iter().copied().collect();
        let mut ended: Vec<(usize, usize)> = self.touching.difference(&next).copied().collect();
        ended.sort_unstable();

        let mut delivered = (0, 0);
        for &pair in current {
            if !self.touching.contains(&pair) && dispatch(pair, Phase::Enter, bodies, world, sink) {
                delivered.0 += 1;
            }
        }
        for pair in ended {
            if dispatch(pair, Phase::Leave, bodies, world, sink) {
                delivered.1 += 1;
            }
        }
        self.touching = next;
        delivered
    }

    /// End every pair involving `slot` without notifying anyone.
    pub fn forget(&mut self, slot: usize) {
        self.touching.retain(|&(a, b)| a != slot && b != slot);
    }

    pub fn clear(&mut self) {
        self.touching.clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.touching.len()
    }
}

/// Deliver one notification. Pairs whose owner record is gone on either side
/// are dropped.
fn dispatch(
    (a, b): (usize, usize),
    phase: Phase,
    bodies: &BodySet,
    world: WorldHandle,
    sink: Option<&dyn ContactSink>,
) -> bool {
    let Some(sink) = sink else { return false };
    let (Some((owner_a, _)), Some((owner_b, _))) = (bodies.record(a), bodies.record(b)) else {
        debug!(?world, a, b, ?phase, "dropping contact notification: owner record missing");
        return false;
    };
    match phase {
        Phase::Enter => sink.on_collision_enter(world, owner_a, owner_b),
        Phase::Leave => sink.on_collision_leave(world, owner_a, owner_b),
    }
    true
}
