use std::collections::HashMap;
use std::fmt::Display;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Canvas coordinates of a node. Layout only, never part of the firing
/// semantics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum ModelType {
    #[default]
    #[serde(rename = "petriNet")]
    PetriNet,
    #[serde(rename = "workflow")]
    Workflow,
    #[serde(rename = "elementary")]
    Elementary,
}

impl ModelType {
    /// True for the "safe" subclasses: at most one token in the whole net,
    /// unit weights, unit capacities.
    pub fn is_restricted(&self) -> bool {
        matches!(self, ModelType::Workflow | ModelType::Elementary)
    }
}

impl Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelType::PetriNet => write!(f, "petriNet"),
            ModelType::Workflow => write!(f, "workflow"),
            ModelType::Elementary => write!(f, "elementary"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Place {
    label: String,
    /// Index into every token vector. Dense across all places at all times.
    pub offset: usize,
    pub initial: i64,
    /// 0 means unbounded, otherwise an inclusive upper bound on tokens held.
    pub capacity: i64,
    pub position: Position,
}

impl Place {
    pub fn new(label: impl Into<String>, offset: usize, position: Position) -> Self {
        Place { label: label.into(), offset, initial: 0, capacity: 0, position }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// A read/inhibitor condition attached to a transition. The delta is applied
/// to the marking only as a test: if it applies cleanly the guard blocks the
/// firing. The canonical entry is `offset -> -weight`, i.e. the guard blocks
/// while the place holds at least `weight` tokens.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Guard {
    pub delta: HashMap<usize, i64>,
}

pub const DEFAULT_ROLE: &str = "default";

#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    label: String,
    pub role: String,
    pub position: Position,
    /// Sparse net effect of firing once: `place offset -> signed weight`.
    pub delta: HashMap<usize, i64>,
    /// Guards keyed by the label of the place they watch.
    pub guards: IndexMap<String, Guard>,
}

impl Transition {
    pub fn new(label: impl Into<String>, position: Position) -> Self {
        Transition {
            label: label.into(),
            role: DEFAULT_ROLE.to_string(),
            position,
            delta: Default::default(),
            guards: Default::default(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Arc endpoint and click-target discriminant. Handlers match on this
/// exhaustively instead of dispatching through a trait.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Node {
    Place(String),
    Transition(String),
}

impl Node {
    pub fn label(&self) -> &str {
        match self {
            Node::Place(label) => label,
            Node::Transition(label) => label,
        }
    }

    pub fn is_place(&self) -> bool {
        matches!(self, Node::Place(_))
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Node::Place(label) => write!(f, "place '{label}'"),
            Node::Transition(label) => write!(f, "transition '{label}'"),
        }
    }
}

/// A directed edge between one place and one transition. Arcs are a derived
/// view: the owning transition's `delta`/`guards` always agree with them.
#[derive(Clone, Debug, PartialEq)]
pub struct Arc {
    /// Position in the ordered arc list, renumbered after every deletion.
    pub offset: usize,
    pub source: Node,
    pub target: Node,
    pub weight: i64,
    /// True when the arc encodes a guard condition rather than a flow effect.
    pub inhibit: bool,
}

impl Arc {
    /// Label of the place endpoint.
    pub fn place(&self) -> &str {
        if self.source.is_place() {
            self.source.label()
        } else {
            self.target.label()
        }
    }

    /// Label of the transition endpoint.
    pub fn transition(&self) -> &str {
        if self.source.is_place() {
            self.target.label()
        } else {
            self.source.label()
        }
    }

    /// True for place -> transition arcs (tokens consumed when firing).
    pub fn is_consuming(&self) -> bool {
        self.source.is_place()
    }
}
