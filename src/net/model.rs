use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{PetriError, Result};

use super::{Arc, Guard, ModelType, Node, Place, Position, Transition};

/// The structural model: places, transitions and arcs plus the indexing
/// invariants (dense place offsets, dense arc offsets, bipartite arcs,
/// deltas/guards referencing live places only).
///
/// Replaced wholesale on load/clear/revert, never mutated in place across
/// those boundaries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PetriNet {
    pub model_type: ModelType,
    pub(super) places: IndexMap<String, Place>,
    pub(super) transitions: IndexMap<String, Transition>,
    pub(super) arcs: Vec<Arc>,
}

impl PetriNet {
    pub fn new(model_type: ModelType) -> Self {
        PetriNet { model_type, ..Default::default() }
    }

    pub fn places(&self) -> &IndexMap<String, Place> {
        &self.places
    }

    pub fn transitions(&self) -> &IndexMap<String, Transition> {
        &self.transitions
    }

    pub fn arcs(&self) -> &[Arc] {
        &self.arcs
    }

    pub fn place(&self, label: &str) -> Result<&Place> {
        self.places
            .get(label)
            .ok_or_else(|| PetriError::NotFound(format!("place '{label}'")))
    }

    pub fn place_mut(&mut self, label: &str) -> Result<&mut Place> {
        self.places
            .get_mut(label)
            .ok_or_else(|| PetriError::NotFound(format!("place '{label}'")))
    }

    pub fn transition(&self, label: &str) -> Result<&Transition> {
        self.transitions
            .get(label)
            .ok_or_else(|| PetriError::NotFound(format!("transition '{label}'")))
    }

    pub fn transition_mut(&mut self, label: &str) -> Result<&mut Transition> {
        self.transitions
            .get_mut(label)
            .ok_or_else(|| PetriError::NotFound(format!("transition '{label}'")))
    }

    pub fn arc(&self, offset: usize) -> Result<&Arc> {
        self.arcs
            .get(offset)
            .ok_or_else(|| PetriError::NotFound(format!("arc {offset}")))
    }

    /// Classify a label as a place or transition endpoint.
    pub fn node(&self, label: &str) -> Result<Node> {
        if self.places.contains_key(label) {
            Ok(Node::Place(label.to_string()))
        } else if self.transitions.contains_key(label) {
            Ok(Node::Transition(label.to_string()))
        } else {
            Err(PetriError::NotFound(format!("node '{label}'")))
        }
    }

    /// Append a new place at the next free offset. Returns whether the model
    /// changed (false only on a label collision).
    pub fn add_place(&mut self, position: Position) -> bool {
        let offset = self.places.len();
        let label = format!("place{offset}");
        if self.places.contains_key(&label) {
            return false;
        }
        self.places.insert(label.clone(), Place::new(label, offset, position));
        true
    }

    /// Append a new transition with a fresh label. Returns whether the model
    /// changed.
    pub fn add_transition(&mut self, position: Position) -> bool {
        let label = format!("txn{}", self.transitions.len());
        if self.transitions.contains_key(&label) {
            return false;
        }
        self.transitions.insert(label.clone(), Transition::new(label, position));
        true
    }

    /// Remove a place, shift every offset above it down by one (places,
    /// deltas and guard deltas alike) and drop every arc touching it.
    /// Silent no-op for an unknown label; callers validate via [`Self::place`].
    pub fn delete_place(&mut self, label: &str) {
        let Some(removed) = self.places.shift_remove(label) else {
            return;
        };
        for place in self.places.values_mut() {
            if place.offset > removed.offset {
                place.offset -= 1;
            }
        }
        for transition in self.transitions.values_mut() {
            transition.delta = reindex(&transition.delta, removed.offset);
            transition.guards.shift_remove(label);
            for guard in transition.guards.values_mut() {
                guard.delta = reindex(&guard.delta, removed.offset);
            }
        }
        self.arcs.retain(|a| a.place() != label);
        self.renumber_arcs();
        debug!(label, offset = removed.offset, "deleted place");
    }

    /// Remove a transition and every arc touching it. No offset re-indexing
    /// is needed, transitions are not vector-indexed.
    pub fn delete_transition(&mut self, label: &str) {
        if self.transitions.shift_remove(label).is_none() {
            return;
        }
        self.arcs.retain(|a| a.transition() != label);
        self.renumber_arcs();
        debug!(label, "deleted transition");
    }

    /// Create an arc between a place and a transition (either direction) and
    /// record its effect on the owning transition: `delta[offset]` for flow
    /// arcs, a guard entry for inhibitors.
    pub fn add_arc(&mut self, source: &str, target: &str, weight: i64, inhibit: bool) -> Result<()> {
        if weight < 1 {
            return Err(PetriError::InvalidOperation(format!(
                "arc weight must be positive, got {weight}"
            )));
        }
        let src = self.node(source)?;
        let tgt = self.node(target)?;
        if src.is_place() == tgt.is_place() {
            return Err(PetriError::InvalidOperation(format!(
                "arc endpoints must pair a place with a transition, got {src} -> {tgt}"
            )));
        }
        let arc = Arc { offset: self.arcs.len(), source: src, target: tgt, weight, inhibit };
        self.apply_arc_effect(&arc)?;
        self.arcs.push(arc);
        Ok(())
    }

    /// Remove an arc, clear its delta/guard entry and renumber the remaining
    /// arcs to keep offsets dense.
    pub fn delete_arc(&mut self, offset: usize) -> Result<()> {
        let arc = self.arc(offset)?.clone();
        self.clear_arc_effect(&arc)?;
        self.arcs.remove(offset);
        self.renumber_arcs();
        Ok(())
    }

    /// Flip an arc between flow and guard semantics.
    pub fn toggle_inhibitor(&mut self, offset: usize) -> Result<()> {
        let mut arc = self.arc(offset)?.clone();
        self.clear_arc_effect(&arc)?;
        arc.inhibit = !arc.inhibit;
        self.apply_arc_effect(&arc)?;
        self.arcs[offset] = arc;
        Ok(())
    }

    /// Change an arc's weight. Returns false without mutating anything when
    /// the new weight is below 1 or the offset is unknown.
    pub fn set_arc_weight(&mut self, offset: usize, weight: i64) -> bool {
        if weight < 1 || offset >= self.arcs.len() {
            return false;
        }
        let mut arc = self.arcs[offset].clone();
        if self.clear_arc_effect(&arc).is_err() {
            return false;
        }
        arc.weight = weight;
        if self.apply_arc_effect(&arc).is_err() {
            return false;
        }
        self.arcs[offset] = arc;
        true
    }

    /// Exchange an arc's source and target, re-deriving the delta sign.
    pub fn swap_arc(&mut self, offset: usize) -> Result<()> {
        let mut arc = self.arc(offset)?.clone();
        self.clear_arc_effect(&arc)?;
        std::mem::swap(&mut arc.source, &mut arc.target);
        self.apply_arc_effect(&arc)?;
        self.arcs[offset] = arc;
        Ok(())
    }

    /// The token vector at net reset, ordered by place offset.
    pub fn initial_vector(&self) -> Vec<i64> {
        let mut vector = vec![0; self.places.len()];
        for place in self.places.values() {
            vector[place.offset] = place.initial;
        }
        vector
    }

    /// Per-offset capacities, 0 meaning unbounded.
    pub fn capacity_vector(&self) -> Vec<i64> {
        let mut vector = vec![0; self.places.len()];
        for place in self.places.values() {
            vector[place.offset] = place.capacity;
        }
        vector
    }

    /// The node whose position is within `tolerance` of `(x, y)` on both
    /// axes, if any. Transitions take precedence over places.
    pub fn find_nearby(&self, x: f64, y: f64, tolerance: f64) -> Option<Node> {
        let close = |position: &Position| {
            (position.x - x).abs() < tolerance && (position.y - y).abs() < tolerance
        };
        let mut node = None;
        for place in self.places.values() {
            if close(&place.position) {
                node = Some(Node::Place(place.label().to_string()));
            }
        }
        for transition in self.transitions.values() {
            if close(&transition.position) {
                node = Some(Node::Transition(transition.label().to_string()));
            }
        }
        node
    }

    fn renumber_arcs(&mut self) {
        for (offset, arc) in self.arcs.iter_mut().enumerate() {
            arc.offset = offset;
        }
    }

    fn apply_arc_effect(&mut self, arc: &Arc) -> Result<()> {
        let offset = self.place(arc.place())?.offset;
        let place_label = arc.place().to_string();
        let signed = if arc.is_consuming() { -arc.weight } else { arc.weight };
        let weight = arc.weight;
        let transition = self.transition_mut(arc.transition())?;
        if arc.inhibit {
            // Guard condition regardless of direction: blocks while the
            // place holds at least `weight` tokens.
            transition
                .guards
                .insert(place_label, Guard { delta: HashMap::from([(offset, -weight)]) });
        } else {
            transition.delta.insert(offset, signed);
        }
        Ok(())
    }

    fn clear_arc_effect(&mut self, arc: &Arc) -> Result<()> {
        let offset = self.place(arc.place())?.offset;
        let place_label = arc.place().to_string();
        let transition = self.transition_mut(arc.transition())?;
        if arc.inhibit {
            transition.guards.shift_remove(&place_label);
        } else {
            transition.delta.remove(&offset);
        }
        Ok(())
    }
}

/// Drop the entry at `removed` and shift every key above it down by one.
fn reindex(delta: &HashMap<usize, i64>, removed: usize) -> HashMap<usize, i64> {
    delta
        .iter()
        .filter(|(&offset, _)| offset != removed)
        .map(|(&offset, &value)| (if offset > removed { offset - 1 } else { offset }, value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f64, y: f64) -> Position {
        Position::new(x, y)
    }

    fn assert_dense_place_offsets(net: &PetriNet) {
        let mut offsets: Vec<usize> = net.places().values().map(|p| p.offset).collect();
        offsets.sort_unstable();
        assert_eq!(offsets, (0..net.places().len()).collect::<Vec<_>>());
    }

    fn assert_dense_arc_offsets(net: &PetriNet) {
        let offsets: Vec<usize> = net.arcs().iter().map(|a| a.offset).collect();
        assert_eq!(offsets, (0..net.arcs().len()).collect::<Vec<_>>());
    }

    #[test]
    fn place_offsets_stay_dense() {
        let mut net = PetriNet::default();
        for i in 0..5 {
            assert!(net.add_place(at(i as f64 * 100.0, 0.0)));
            assert_dense_place_offsets(&net);
        }
        net.delete_place("place2");
        assert_dense_place_offsets(&net);
        net.delete_place("place0");
        assert_dense_place_offsets(&net);
        net.delete_place("place4");
        assert_dense_place_offsets(&net);
        assert_eq!(net.places().len(), 2);
    }

    #[test]
    fn delete_place_reindexes_deltas() {
        let mut net = PetriNet::default();
        net.add_place(at(0.0, 0.0)); // place0, offset 0
        net.add_place(at(100.0, 0.0)); // place1, offset 1
        net.add_place(at(200.0, 0.0)); // place2, offset 2
        net.add_transition(at(50.0, 100.0)); // txn0
        net.add_arc("place1", "txn0", 1, false).unwrap();
        net.add_arc("txn0", "place2", 1, false).unwrap();
        assert_eq!(net.transition("txn0").unwrap().delta, HashMap::from([(1, -1), (2, 1)]));

        net.delete_place("place0");
        assert_eq!(net.places().len(), 2);
        assert_dense_place_offsets(&net);
        assert_eq!(net.transition("txn0").unwrap().delta, HashMap::from([(0, -1), (1, 1)]));
    }

    #[test]
    fn delete_place_drops_touching_arcs_and_guards() {
        let mut net = PetriNet::default();
        net.add_place(at(0.0, 0.0));
        net.add_place(at(100.0, 0.0));
        net.add_transition(at(50.0, 100.0));
        net.add_arc("place0", "txn0", 1, true).unwrap();
        net.add_arc("place1", "txn0", 1, false).unwrap();
        assert!(net.transition("txn0").unwrap().guards.contains_key("place0"));

        net.delete_place("place0");
        assert!(net.transition("txn0").unwrap().guards.is_empty());
        assert_eq!(net.arcs().len(), 1);
        assert_dense_arc_offsets(&net);
        assert_eq!(net.arcs()[0].place(), "place1");
    }

    #[test]
    fn delete_unknown_place_is_a_noop() {
        let mut net = PetriNet::default();
        net.add_place(at(0.0, 0.0));
        net.delete_place("nope");
        assert_eq!(net.places().len(), 1);
        assert!(matches!(net.place("nope"), Err(crate::PetriError::NotFound(_))));
    }

    #[test]
    fn delete_transition_drops_arcs() {
        let mut net = PetriNet::default();
        net.add_place(at(0.0, 0.0));
        net.add_transition(at(100.0, 0.0));
        net.add_transition(at(200.0, 0.0));
        net.add_arc("place0", "txn0", 1, false).unwrap();
        net.add_arc("txn1", "place0", 1, false).unwrap();

        net.delete_transition("txn0");
        assert_eq!(net.transitions().len(), 1);
        assert_eq!(net.arcs().len(), 1);
        assert_dense_arc_offsets(&net);
        assert_eq!(net.arcs()[0].transition(), "txn1");
    }

    #[test]
    fn arc_offsets_stay_dense() {
        let mut net = PetriNet::default();
        net.add_place(at(0.0, 0.0));
        net.add_place(at(100.0, 0.0));
        net.add_transition(at(50.0, 100.0));
        net.add_arc("place0", "txn0", 1, false).unwrap();
        net.add_arc("txn0", "place1", 2, false).unwrap();
        net.add_arc("place1", "txn0", 1, true).unwrap();
        assert_dense_arc_offsets(&net);

        net.delete_arc(1).unwrap();
        assert_dense_arc_offsets(&net);
        assert_eq!(net.arcs().len(), 2);
        net.delete_arc(0).unwrap();
        assert_dense_arc_offsets(&net);
        assert_eq!(net.arcs().len(), 1);
    }

    #[test]
    fn bipartite_constraint_rejects_same_kind_endpoints() {
        let mut net = PetriNet::default();
        net.add_place(at(0.0, 0.0));
        net.add_place(at(100.0, 0.0));
        net.add_transition(at(50.0, 100.0));
        net.add_transition(at(150.0, 100.0));

        assert!(matches!(
            net.add_arc("place0", "place1", 1, false),
            Err(crate::PetriError::InvalidOperation(_))
        ));
        assert!(matches!(
            net.add_arc("txn0", "txn1", 1, false),
            Err(crate::PetriError::InvalidOperation(_))
        ));
        assert!(matches!(
            net.add_arc("place0", "missing", 1, false),
            Err(crate::PetriError::NotFound(_))
        ));
        assert!(net.arcs().is_empty());
    }

    #[test]
    fn arc_direction_derives_delta_sign() {
        let mut net = PetriNet::default();
        net.add_place(at(0.0, 0.0));
        net.add_transition(at(100.0, 0.0));
        net.add_arc("place0", "txn0", 3, false).unwrap();
        assert_eq!(net.transition("txn0").unwrap().delta[&0], -3);

        net.swap_arc(0).unwrap();
        assert_eq!(net.transition("txn0").unwrap().delta[&0], 3);
        assert!(!net.arcs()[0].is_consuming());
    }

    #[test]
    fn toggle_inhibitor_moves_effect_between_delta_and_guards() {
        let mut net = PetriNet::default();
        net.add_place(at(0.0, 0.0));
        net.add_transition(at(100.0, 0.0));
        net.add_arc("place0", "txn0", 2, false).unwrap();
        assert_eq!(net.transition("txn0").unwrap().delta[&0], -2);

        net.toggle_inhibitor(0).unwrap();
        let transition = net.transition("txn0").unwrap();
        assert!(transition.delta.is_empty());
        assert_eq!(transition.guards["place0"].delta[&0], -2);

        net.toggle_inhibitor(0).unwrap();
        let transition = net.transition("txn0").unwrap();
        assert!(transition.guards.is_empty());
        assert_eq!(transition.delta[&0], -2);
    }

    #[test]
    fn set_arc_weight_rejects_below_one() {
        let mut net = PetriNet::default();
        net.add_place(at(0.0, 0.0));
        net.add_transition(at(100.0, 0.0));
        net.add_arc("place0", "txn0", 2, false).unwrap();

        assert!(!net.set_arc_weight(0, 0));
        assert_eq!(net.arcs()[0].weight, 2);
        assert!(net.set_arc_weight(0, 5));
        assert_eq!(net.arcs()[0].weight, 5);
        assert_eq!(net.transition("txn0").unwrap().delta[&0], -5);
        assert!(!net.set_arc_weight(7, 1));
    }

    #[test]
    fn initial_vector_follows_offsets() {
        let mut net = PetriNet::default();
        net.add_place(at(0.0, 0.0));
        net.add_place(at(100.0, 0.0));
        net.place_mut("place1").unwrap().initial = 3;
        assert_eq!(net.initial_vector(), vec![0, 3]);
    }

    #[test]
    fn find_nearby_uses_tolerance_on_both_axes() {
        let mut net = PetriNet::default();
        net.add_place(at(100.0, 100.0));
        assert_eq!(net.find_nearby(110.0, 90.0, 24.0), Some(Node::Place("place0".into())));
        assert_eq!(net.find_nearby(130.0, 100.0, 24.0), None);
        assert_eq!(net.find_nearby(100.0, 80.0, 24.0), Some(Node::Place("place0".into())));
        assert_eq!(net.find_nearby(110.0, 130.0, 24.0), None);
    }
}
