use super::PetriNet;

impl PetriNet {
    /// Project the net onto the safe subclass required by the restricted
    /// model kinds: at most one initial token in the whole net, unit
    /// capacities, unit arc weights, deltas clamped to sign. Lossy and
    /// idempotent.
    pub fn re_level(&mut self) {
        let mut found_initial = false;
        for place in self.places.values_mut() {
            if place.initial > 0 {
                place.initial = if found_initial { 0 } else { 1 };
                found_initial = true;
            }
            if place.capacity > 0 {
                place.capacity = 1;
            }
        }
        for arc in &mut self.arcs {
            arc.weight = 1;
        }
        for transition in self.transitions.values_mut() {
            for value in transition.delta.values_mut() {
                *value = value.signum();
            }
            for guard in transition.guards.values_mut() {
                for value in guard.delta.values_mut() {
                    *value = value.signum();
                }
            }
        }
    }
}
