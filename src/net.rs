mod common;
mod declaration;
mod fire;
mod model;
mod normalize;

pub use common::{Arc, Guard, ModelType, Node, Place, Position, Transition, DEFAULT_ROLE};
pub use declaration::{
    ArcDeclaration, ContractArc, ContractDeclaration, ContractPlace, ContractTransition,
    ModelDeclaration, PlaceDeclaration, TransitionDeclaration, DECLARATION_VERSION,
};
pub use fire::FireResult;
pub use model::PetriNet;
