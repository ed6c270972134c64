use std::fmt::Display;

use tracing::{debug, error};

use crate::error::{PetriError, Result};
use crate::net::{
    ContractDeclaration, FireResult, ModelDeclaration, ModelType, PetriNet, Position,
};
use crate::stream::{Event, Stream};

use super::history::History;
use super::keys::key_to_action;
use super::SessionConfig;

/// Discrete user intents. All but `Resize` are also interaction modes;
/// `Resize` is a transient action that never becomes the current mode.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Action {
    Select,
    Snapshot,
    Execute,
    Place,
    Transition,
    Arc,
    Token,
    Delete,
    Resize,
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Action::Select => "select",
            Action::Snapshot => "snapshot",
            Action::Execute => "execute",
            Action::Place => "place",
            Action::Transition => "transition",
            Action::Arc => "arc",
            Action::Token => "token",
            Action::Delete => "delete",
            Action::Resize => "resize",
        };
        write!(f, "{name}")
    }
}

/// The current selection, also the pending source of the two-click arc
/// protocol.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Selected {
    Place(String),
    Transition(String),
    Arc(usize),
}

/// A key press as delivered by the presentation layer.
#[derive(Clone, Debug)]
pub struct KeyEvent {
    pub key: String,
    /// Ctrl or the platform meta key.
    pub ctrl: bool,
}

impl KeyEvent {
    pub fn plain(key: impl Into<String>) -> Self {
        KeyEvent { key: key.into(), ctrl: false }
    }

    pub fn ctrl(key: impl Into<String>) -> Self {
        KeyEvent { key: key.into(), ctrl: true }
    }
}

type UpdateHook = Box<dyn FnMut()>;

fn new_stream(net: &PetriNet) -> Stream {
    let mut stream = Stream::new(net.clone());
    // the editor does not let the user issue invalid dispatches, so this
    // hook firing signals a UI invariant violation or an out-of-band attempt
    stream.on_fail(|state, event| error!(?state, %event, "dispatch failed"));
    stream
}

/// Top-level orchestrator: holds the structural model, the execution stream,
/// the interaction mode, the selection and the commit history, and turns
/// discrete user intents into model mutations or stream dispatches.
pub struct Session {
    config: SessionConfig,
    model: PetriNet,
    stream: Stream,
    mode: Action,
    selected: Option<Selected>,
    running: bool,
    height: f64,
    history: History,
    update_hook: Option<UpdateHook>,
}

impl Session {
    pub fn new() -> Result<Self> {
        Self::with_config(SessionConfig::default())
    }

    pub fn with_config(config: SessionConfig) -> Result<Self> {
        let model = PetriNet::default();
        let mut session = Session {
            stream: new_stream(&model),
            height: config.editor_height,
            config,
            model,
            mode: Action::Select,
            selected: None,
            running: false,
            history: History::default(),
            update_hook: None,
        };
        session.commit("load initial model")?;
        Ok(session)
    }

    pub fn model(&self) -> &PetriNet {
        &self.model
    }

    pub fn stream(&self) -> &Stream {
        &self.stream
    }

    pub fn mode(&self) -> Action {
        self.mode
    }

    pub fn selected(&self) -> Option<&Selected> {
        self.selected.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn revision(&self) -> u64 {
        self.history.revision()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Register a re-render hook, chained after any previously registered
    /// one. The only data flowing back to the presentation layer.
    pub fn on_update(&mut self, callback: impl FnMut() + 'static) {
        match self.update_hook.take() {
            Some(mut previous) => {
                let mut callback = callback;
                self.update_hook = Some(Box::new(move || {
                    previous();
                    callback();
                }));
            }
            None => self.update_hook = Some(Box::new(callback)),
        }
    }

    fn update(&mut self) {
        if let Some(hook) = self.update_hook.as_mut() {
            hook();
        }
    }

    // ------------------------------------------------------------------
    // history

    /// Serialize the current model as a new revision. Forbidden while the
    /// execution stream is running.
    pub fn commit(&mut self, action: &str) -> Result<()> {
        if self.running {
            return Err(PetriError::IllegalState("cannot commit while running".into()));
        }
        let snapshot = self.to_json()?;
        self.history.commit(snapshot, action);
        self.update();
        Ok(())
    }

    /// Load the snapshot stored at `revision` as the new structural model.
    /// No-op when the target is current or absent; higher revisions stay
    /// available for redo until the next commit.
    pub fn revert(&mut self, revision: u64) -> Result<()> {
        let Some(snapshot) = self.history.revert(revision) else {
            return Ok(());
        };
        self.load_json(&snapshot)?;
        self.update();
        Ok(())
    }

    // ------------------------------------------------------------------
    // (de)serialization boundary

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&ModelDeclaration::from_net(&self.model))?)
    }

    /// Replace the model wholesale from the textual format. A parse or
    /// validation failure rejects the load and leaves the prior model
    /// untouched.
    pub fn load_json(&mut self, json: &str) -> Result<()> {
        let net = ModelDeclaration::parse(json)?.into_net()?;
        self.model = net;
        self.restart_stream(false);
        Ok(())
    }

    pub fn clear_all(&mut self) -> Result<()> {
        self.model = PetriNet::default();
        self.restart_stream(false);
        self.commit("clear all")
    }

    /// Parse an uploaded file and, on success, commit labelled with its name.
    pub fn upload_file(&mut self, name: &str, content: &str) -> Result<()> {
        self.load_json(content)?;
        self.commit(&format!("upload {name}"))
    }

    /// Import a declaration read from a deployed contract.
    pub fn import_declaration(&mut self, declaration: ContractDeclaration) -> Result<()> {
        self.model = ModelDeclaration::from(declaration).into_net()?;
        self.restart_stream(false);
        self.commit("import contract declaration")
    }

    pub fn set_model_type(&mut self, model_type: ModelType) -> Result<()> {
        if self.model.model_type == model_type {
            return Ok(());
        }
        self.model.model_type = model_type;
        if model_type.is_restricted() {
            self.model.re_level();
        }
        self.commit(&format!("set model type to {model_type}"))
    }

    // ------------------------------------------------------------------
    // execution

    fn restart_stream(&mut self, running: bool) {
        self.running = running;
        self.stream = new_stream(&self.model);
        self.stream.restart();
        debug!(running, "stream restarted");
    }

    /// The marking to display: the live vector while running, the initial
    /// vector otherwise.
    pub fn get_state(&self) -> Vec<i64> {
        if self.running {
            self.stream.state().to_vec()
        } else {
            self.model.initial_vector()
        }
    }

    pub fn get_token_count(&self, label: &str) -> Result<i64> {
        let offset = self.model.place(label)?.offset;
        Ok(self.get_state()[offset])
    }

    /// Dry-run enablement feedback against the current display state.
    pub fn test_fire(&self, action: &str) -> FireResult {
        self.model.fire(&self.get_state(), action, 1)
    }

    // ------------------------------------------------------------------
    // mode state machine

    pub fn menu_action(&mut self, action: Action) {
        if action == Action::Resize {
            if self.mode == Action::Snapshot {
                if self.running {
                    self.restart_stream(false);
                }
                self.mode = Action::Select;
            }
            self.resize();
            return;
        }
        let current = self.mode;
        if current == action {
            // re-clicking the active mode
            match current {
                Action::Delete => self.mode = Action::Select,
                Action::Snapshot => {
                    self.mode = if self.running { Action::Execute } else { Action::Select };
                }
                Action::Execute => {
                    self.mode = Action::Select;
                    self.restart_stream(false);
                }
                _ => {}
            }
            return;
        }
        self.mode = action;
        if action == Action::Snapshot {
            self.selected = None;
        }
        if current == Action::Snapshot && action != Action::Execute {
            self.restart_stream(false);
        }
        if action == Action::Execute {
            self.selected = None;
            self.restart_stream(true);
        }
        if current == Action::Execute && action != Action::Snapshot {
            self.restart_stream(false);
        }
    }

    /// Toggle the presentation height between the default and the expanded
    /// value.
    fn resize(&mut self) {
        if self.height != self.config.editor_height {
            self.height = self.config.editor_height;
        } else {
            self.height = self.config.expanded_height;
        }
        self.update();
    }

    // ------------------------------------------------------------------
    // pointer intents

    /// A click on empty canvas (or near an existing node) at `(x, y)`.
    pub fn editor_click(&mut self, x: f64, y: f64) -> Result<()> {
        let nearby = self.model.find_nearby(x, y, self.config.proximity);
        let mut updated = false;
        match self.mode {
            Action::Select => {
                if nearby.is_none() {
                    self.selected = None;
                    self.update();
                }
                return Ok(());
            }
            Action::Place => {
                if nearby.is_none() {
                    updated = self.model.add_place(Position::new(x, y));
                }
            }
            Action::Transition => {
                if nearby.is_none() {
                    updated = self.model.add_transition(Position::new(x, y));
                }
            }
            _ => {}
        }
        if updated {
            return self.commit(&format!("add {}", self.mode));
        }
        Ok(())
    }

    pub fn place_click(&mut self, label: &str) -> Result<()> {
        self.model.place(label)?;
        match self.mode {
            Action::Execute => Ok(()),
            Action::Delete => {
                self.model.delete_place(label);
                self.selected = None;
                self.commit(&format!("delete {label}"))
            }
            Action::Arc => match self.selected.take() {
                Some(Selected::Transition(source)) => {
                    self.model.add_arc(&source, label, 1, false)?;
                    self.commit(&format!("add arc {source} -> {label}"))
                }
                Some(_) => {
                    // same-kind second click cancels the pending source
                    self.update();
                    Ok(())
                }
                None => {
                    self.selected = Some(Selected::Place(label.to_string()));
                    self.update();
                    Ok(())
                }
            },
            Action::Token => {
                if self.model.model_type.is_restricted() {
                    self.toggle_token(label)
                } else {
                    self.model.place_mut(label)?.initial += 1;
                    self.commit(&format!("add token {label}"))
                }
            }
            _ => {
                self.selected = Some(Selected::Place(label.to_string()));
                self.update();
                Ok(())
            }
        }
    }

    /// Secondary-button click on a place: the opposite token adjustment.
    pub fn place_alt_click(&mut self, label: &str) -> Result<()> {
        if self.mode != Action::Token {
            return Ok(());
        }
        if self.model.model_type.is_restricted() {
            return self.toggle_token(label);
        }
        let place = self.model.place_mut(label)?;
        if place.initial > 0 {
            place.initial -= 1;
            return self.commit(&format!("remove token {label}"));
        }
        Ok(())
    }

    fn toggle_token(&mut self, label: &str) -> Result<()> {
        {
            let place = self.model.place_mut(label)?;
            place.initial = if place.initial == 0 { 1 } else { 0 };
        }
        self.model.re_level();
        self.commit(&format!("toggle token {label}"))
    }

    pub fn transition_click(&mut self, label: &str) -> Result<()> {
        if self.running {
            let result = self.stream.dispatch(Event::new(label, 1));
            if result.ok {
                self.update();
            }
            return Ok(());
        }
        self.model.transition(label)?;
        match self.mode {
            Action::Delete => {
                self.model.delete_transition(label);
                self.selected = None;
                self.commit(&format!("delete {label}"))
            }
            Action::Arc => match self.selected.take() {
                Some(Selected::Place(source)) => {
                    self.model.add_arc(&source, label, 1, false)?;
                    self.commit(&format!("add arc {source} -> {label}"))
                }
                Some(_) => {
                    self.update();
                    Ok(())
                }
                None => {
                    self.selected = Some(Selected::Transition(label.to_string()));
                    self.update();
                    Ok(())
                }
            },
            _ => {
                if !self.is_selected(label) {
                    self.selected = Some(Selected::Transition(label.to_string()));
                    self.update();
                }
                Ok(())
            }
        }
    }

    pub fn arc_click(&mut self, offset: usize) -> Result<()> {
        let weight = self.model.arc(offset)?.weight;
        match self.mode {
            Action::Select => {
                self.selected = Some(Selected::Arc(offset));
                self.update();
                return Ok(());
            }
            Action::Delete => self.model.delete_arc(offset)?,
            Action::Arc => self.model.toggle_inhibitor(offset)?,
            Action::Token => {
                self.model.set_arc_weight(offset, weight + 1);
            }
            _ => return Ok(()),
        }
        self.selected = None;
        self.commit(&format!("update arc {}", self.mode))
    }

    pub fn arc_alt_click(&mut self, offset: usize) -> Result<()> {
        let weight = self.model.arc(offset)?.weight;
        match self.mode {
            Action::Token => {
                // a decrement below 1 is rejected, leaving the arc unchanged
                if !self.model.set_arc_weight(offset, weight - 1) {
                    return Ok(());
                }
                self.commit(&format!("update weight arc: {offset}"))
            }
            Action::Arc => {
                self.model.swap_arc(offset)?;
                self.commit(&format!("swap direction arc: {offset}"))
            }
            _ => Ok(()),
        }
    }

    pub fn is_selected(&self, label: &str) -> bool {
        match &self.selected {
            Some(Selected::Place(selected)) | Some(Selected::Transition(selected)) => {
                selected == label
            }
            _ => false,
        }
    }

    // ------------------------------------------------------------------
    // keyboard intents

    pub fn on_key(&mut self, evt: &KeyEvent) -> Result<()> {
        if evt.ctrl {
            match evt.key.as_str() {
                "z" | "Z" => {
                    self.selected = None;
                    self.revert(self.history.revision().saturating_sub(1))?;
                    self.menu_action(Action::Select);
                }
                "y" | "Y" => {
                    self.selected = None;
                    self.revert(self.history.revision() + 1)?;
                    self.menu_action(Action::Select);
                }
                _ => {}
            }
            return Ok(());
        }
        match evt.key.as_str() {
            "ArrowRight" => self.nudge(10.0, 0.0, &evt.key),
            "ArrowLeft" => self.nudge(-10.0, 0.0, &evt.key),
            "ArrowUp" => self.nudge(0.0, -10.0, &evt.key),
            "ArrowDown" => self.nudge(0.0, 10.0, &evt.key),
            key => {
                if let Some(action) = key_to_action(key) {
                    self.menu_action(action);
                    self.update();
                }
                Ok(())
            }
        }
    }

    /// Move the selected node by a fixed increment and commit.
    fn nudge(&mut self, dx: f64, dy: f64, action: &str) -> Result<()> {
        let Some(selected) = self.selected.clone() else {
            return Ok(());
        };
        match selected {
            Selected::Place(label) => {
                let place = self.model.place_mut(&label)?;
                place.position.x += dx;
                place.position.y += dy;
            }
            Selected::Transition(label) => {
                let transition = self.model.transition_mut(&label)?;
                transition.position.x += dx;
                transition.position.y += dy;
            }
            Selected::Arc(_) => return Ok(()),
        }
        self.commit(action)
    }
}
