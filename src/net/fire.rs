use std::collections::HashMap;

use super::PetriNet;

/// Outcome of a firing attempt. `inhibited` distinguishes a guard block from
/// ordinary disablement (insufficient tokens or a capacity overflow); neither
/// is a fault.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FireResult {
    pub ok: bool,
    pub inhibited: bool,
    pub out: Option<Vec<i64>>,
}

impl FireResult {
    fn disabled() -> Self {
        FireResult::default()
    }

    fn inhibited() -> Self {
        FireResult { ok: false, inhibited: true, out: None }
    }

    fn enabled(out: Vec<i64>) -> Self {
        FireResult { ok: true, inhibited: false, out: Some(out) }
    }
}

impl PetriNet {
    /// Evaluate enablement of `action` against `state` and, if enabled,
    /// return the marking after firing `multiple` times at once.
    ///
    /// Pure: a function of `(state, transition definition, multiple)` only;
    /// `state` and the net are never mutated. An unknown label reports plain
    /// disablement, lookups against the structural model are the callers'
    /// concern.
    pub fn fire(&self, state: &[i64], action: &str, multiple: i64) -> FireResult {
        let Some(transition) = self.transitions().get(action) else {
            return FireResult::disabled();
        };
        let capacity = self.capacity_vector();
        // A guard blocks when its delta applies cleanly, i.e. the watched
        // place holds at least the threshold.
        for guard in transition.guards.values() {
            if vector_add(state, &guard.delta, multiple, &capacity).is_some() {
                return FireResult::inhibited();
            }
        }
        match vector_add(state, &transition.delta, multiple, &capacity) {
            Some(out) => FireResult::enabled(out),
            None => FireResult::disabled(),
        }
    }
}

/// Apply a sparse delta to a dense marking. None when any entry would go
/// negative, exceed a nonzero capacity, or reference an offset outside the
/// vector.
fn vector_add(
    state: &[i64],
    delta: &HashMap<usize, i64>,
    multiple: i64,
    capacity: &[i64],
) -> Option<Vec<i64>> {
    let mut out = state.to_vec();
    for (&offset, &value) in delta {
        let entry = out.get_mut(offset)?;
        *entry += value * multiple;
        if *entry < 0 {
            return None;
        }
        if capacity[offset] > 0 && *entry > capacity[offset] {
            return None;
        }
    }
    Some(out)
}
