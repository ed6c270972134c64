//! Interactive Petri-net editor and runtime.
//!
//! The structural model ([`net::PetriNet`]) owns places, transitions and arcs
//! and keeps the dense offset numbering intact across every mutation. Firing
//! is a pure function over a token vector. A [`session::Session`] wraps the
//! model with an interaction-mode state machine, a revisioned commit history
//! and an execution [`stream::Stream`] that owns its own snapshot while a run
//! is active.

pub mod error;
pub mod net;
pub mod session;
pub mod stream;

pub use error::{PetriError, Result};
pub use net::{
    Arc, ArcDeclaration, ContractDeclaration, FireResult, Guard, ModelDeclaration, ModelType, Node,
    PetriNet, Place, PlaceDeclaration, Position, Transition, TransitionDeclaration,
};
pub use session::{
    Action, CommitEntry, KeyEvent, Selected, Session, SessionConfig, SessionConfigBuilder,
    SessionConfigBuilderError,
};
pub use stream::{Event, Stream, StreamEntry};
