use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{PetriError, Result};

use super::{ModelType, PetriNet, Place, Position, Transition, DEFAULT_ROLE};

/// Format tag of the textual model format. A mismatched version is coerced
/// with a warning rather than rejected; see DESIGN.md.
pub const DECLARATION_VERSION: &str = "v0";

// Coordinate rescale applied to imported on-chain declarations. Layout only.
const IMPORT_SCALE_X: f64 = 80.0;
const IMPORT_SCALE_Y: f64 = 80.0;
const IMPORT_OFFSET_X: f64 = -25.0;
const IMPORT_OFFSET_Y: f64 = 42.0;

fn is_zero(value: &i64) -> bool {
    *value == 0
}

fn is_unit(value: &i64) -> bool {
    *value == 1
}

fn unit() -> i64 {
    1
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn default_role() -> String {
    DEFAULT_ROLE.to_string()
}

fn is_default_role(role: &str) -> bool {
    role == DEFAULT_ROLE
}

fn default_version() -> String {
    DECLARATION_VERSION.to_string()
}

/// The textual model format used for commit snapshots, clipboard/file
/// export-import and permalink encoding. Fields equal to their defaults are
/// omitted on output.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ModelDeclaration {
    #[serde(rename = "modelType")]
    pub model_type: ModelType,
    #[serde(default = "default_version")]
    pub version: String,
    pub places: IndexMap<String, PlaceDeclaration>,
    pub transitions: IndexMap<String, TransitionDeclaration>,
    pub arcs: Vec<ArcDeclaration>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlaceDeclaration {
    pub offset: usize,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub initial: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub capacity: i64,
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TransitionDeclaration {
    #[serde(default = "default_role", skip_serializing_if = "is_default_role")]
    pub role: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ArcDeclaration {
    pub source: String,
    pub target: String,
    #[serde(default = "unit", skip_serializing_if = "is_unit")]
    pub weight: i64,
    #[serde(default, skip_serializing_if = "is_false")]
    pub inhibit: bool,
}

impl ModelDeclaration {
    /// Parse the textual format. A mismatched `version` logs a warning and is
    /// coerced to the current tag.
    pub fn parse(json: &str) -> Result<Self> {
        let mut declaration: ModelDeclaration = serde_json::from_str(json)?;
        if declaration.version != DECLARATION_VERSION {
            warn!(
                expected = DECLARATION_VERSION,
                got = %declaration.version,
                "model version mismatch"
            );
            declaration.version = DECLARATION_VERSION.to_string();
        }
        Ok(declaration)
    }

    pub fn from_net(net: &PetriNet) -> Self {
        let restricted = net.model_type.is_restricted();
        let places = net
            .places()
            .values()
            .map(|p| {
                (
                    p.label().to_string(),
                    PlaceDeclaration {
                        offset: p.offset,
                        initial: p.initial,
                        // restricted kinds export the default capacity
                        capacity: if restricted { 0 } else { p.capacity },
                        x: p.position.x,
                        y: p.position.y,
                    },
                )
            })
            .collect();
        let transitions = net
            .transitions()
            .values()
            .map(|t| {
                (
                    t.label().to_string(),
                    TransitionDeclaration { role: t.role.clone(), x: t.position.x, y: t.position.y },
                )
            })
            .collect();
        let arcs = net
            .arcs()
            .iter()
            .map(|a| ArcDeclaration {
                source: a.source.label().to_string(),
                target: a.target.label().to_string(),
                weight: a.weight,
                inhibit: a.inhibit,
            })
            .collect();
        ModelDeclaration {
            model_type: net.model_type,
            version: DECLARATION_VERSION.to_string(),
            places,
            transitions,
            arcs,
        }
    }

    /// Rebuild a structural model. Place offsets must be exactly
    /// `[0, placeCount)`; arcs are re-derived through the normal arc
    /// operation so transition deltas/guards agree with them. Any
    /// malformation fails the whole load.
    pub fn into_net(self) -> Result<PetriNet> {
        let mut net = PetriNet::new(self.model_type);

        let mut ordered: Vec<(String, PlaceDeclaration)> = self.places.into_iter().collect();
        ordered.sort_by_key(|(_, p)| p.offset);
        for (expected, (label, decl)) in ordered.into_iter().enumerate() {
            if decl.offset != expected {
                return Err(PetriError::InvalidOperation(format!(
                    "place offsets must be dense, '{label}' has offset {} but {expected} was expected",
                    decl.offset
                )));
            }
            if decl.initial < 0 || decl.capacity < 0 {
                return Err(PetriError::InvalidOperation(format!(
                    "place '{label}' has a negative initial marking or capacity"
                )));
            }
            let mut place = Place::new(label.clone(), decl.offset, Position::new(decl.x, decl.y));
            place.initial = decl.initial;
            place.capacity = decl.capacity;
            net.places.insert(label, place);
        }

        for (label, decl) in self.transitions {
            let mut transition =
                Transition::new(label.clone(), Position::new(decl.x, decl.y));
            transition.role = decl.role;
            net.transitions.insert(label, transition);
        }

        for arc in self.arcs {
            net.add_arc(&arc.source, &arc.target, arc.weight, arc.inhibit)?;
        }
        Ok(net)
    }
}

/// A declaration read from a deployed contract. The `consume`/`produce`/
/// `read` flags describe the arc kind for external tooling and are carried
/// through on import without affecting firing semantics.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContractDeclaration {
    pub places: Vec<ContractPlace>,
    pub transitions: Vec<ContractTransition>,
    pub arcs: Vec<ContractArc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContractPlace {
    pub label: String,
    pub x: i64,
    pub y: i64,
    pub initial: i64,
    pub capacity: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContractTransition {
    pub label: String,
    pub x: i64,
    pub y: i64,
    pub role: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContractArc {
    pub source: String,
    pub target: String,
    pub weight: i64,
    pub consume: bool,
    pub produce: bool,
    pub inhibit: bool,
    pub read: bool,
}

impl From<ContractDeclaration> for ModelDeclaration {
    fn from(contract: ContractDeclaration) -> Self {
        let rescale = |x: i64, y: i64| {
            (
                x as f64 * IMPORT_SCALE_X + IMPORT_OFFSET_X,
                y as f64 * IMPORT_SCALE_Y + IMPORT_OFFSET_Y,
            )
        };
        let places = contract
            .places
            .into_iter()
            .enumerate()
            .map(|(offset, p)| {
                let (x, y) = rescale(p.x, p.y);
                (
                    p.label,
                    PlaceDeclaration { offset, initial: p.initial, capacity: p.capacity, x, y },
                )
            })
            .collect();
        let transitions = contract
            .transitions
            .into_iter()
            .map(|t| {
                let (x, y) = rescale(t.x, t.y);
                let role =
                    if t.role == 0 { default_role() } else { format!("role{}", t.role) };
                (t.label, TransitionDeclaration { role, x, y })
            })
            .collect();
        let arcs = contract
            .arcs
            .into_iter()
            .map(|a| ArcDeclaration {
                source: a.source,
                target: a.target,
                weight: a.weight,
                inhibit: a.inhibit,
            })
            .collect();
        ModelDeclaration {
            model_type: ModelType::PetriNet,
            version: DECLARATION_VERSION.to_string(),
            places,
            transitions,
            arcs,
        }
    }
}
