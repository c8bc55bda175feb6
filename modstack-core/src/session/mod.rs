//! # Session
//!
//! A [`Session`] is one user's view of the modifier stacks in a scene: which stack and layer are
//! active, and which display state the inactive layers of each stack share. It is split by concern:
//!
//! * [`stack`] finds and creates stacks,
//! * [`layer`] creates, lists and removes layers,
//! * [`display`] keeps the active layer pinned visible while the rest follow the shared state,
//! * [`cursor`] moves the active layer and stack around.
//!
//! Every operation runs to completion against the scene before returning. Scene mutations are not
//! rolled back when a later step fails, so a failed layer creation can leave a partial layer behind.

pub mod cursor;
pub mod display;
pub mod layer;
pub mod stack;

pub use display::DisplayState;
pub use stack::StackStatus;

use hashbrown::HashMap;

use crate::{
    config::Config,
    naming::{Kind, Naming, Role, SelectionKindError},
    scene::{SceneError, SceneGraph},
};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("expected exactly one selected object, found {0}")]
    SelectionArity(usize),
    #[error(transparent)]
    InvalidSelectionKind(#[from] SelectionKindError),
    #[error("lookup of stack {0:?} is ambiguous")]
    StackLookupAmbiguous(String),
    #[error("duplicating {object:?} failed")]
    DuplicationFailure {
        object: String,
        #[source]
        source: SceneError,
    },
    #[error("nothing at offset {offset} from {from:?}")]
    OutOfRange { from: String, offset: isize },
    #[error("{0:?} is not a layer of the active stack")]
    UnknownLayer(String),
    #[error("{0:?} is not a stack")]
    UnknownStack(String),
    #[error("stack {0:?} has no layers")]
    EmptyStack(String),
    #[error("layer 0 holds the base object and can't be removed")]
    BaseLayerRemoval,
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// A failed [`Session::new`], carrying the scene back to the caller.
pub struct OpenError<S> {
    pub error: Error,
    scene: S,
}
impl<S> OpenError<S> {
    #[must_use]
    pub fn into_scene(self) -> S {
        self.scene
    }
    #[must_use]
    pub fn into_error(self) -> Error {
        self.error
    }
    #[must_use]
    pub fn into_parts(self) -> (Error, S) {
        (self.error, self.scene)
    }
}
impl<S> std::fmt::Debug for OpenError<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenError")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}
impl<S> std::fmt::Display for OpenError<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.error.fmt(f)
    }
}
impl<S> std::error::Error for OpenError<S> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Check that a selection holds exactly one mesh or modifier, returning it and its base object.
fn opening_base<'s>(naming: &Naming, selection: &[&'s str]) -> Result<(&'s str, String), Error> {
    let [selected] = selection else {
        return Err(Error::SelectionArity(selection.len()));
    };
    let identity = naming.classify(selected);
    let found = match identity.role {
        Role::Stack => Some(Kind::Stack),
        Role::Layer(_) => Some(Kind::Layer),
        Role::BaseObject | Role::Modifier(_) => None,
    };
    if let Some(found) = found {
        return Err(SelectionKindError::InvalidSelectionKind {
            id: (*selected).to_owned(),
            found,
        }
        .into());
    }
    Ok((selected, identity.base))
}

pub struct Session<S> {
    scene: S,
    config: Config,
    active_stack: String,
    active_layer: String,
    /// Shared display state of each stack's inactive layers.
    display: HashMap<String, DisplayState>,
    /// Shader each base object had when first seen, keyed by base object.
    shaders: HashMap<String, Option<String>>,
}

impl<S: SceneGraph> Session<S> {
    /// Open a session on the one selected object, which must be a mesh or a modifier.
    ///
    /// The object's stack is created if it doesn't exist yet, and its layer 0 becomes active. On
    /// failure the scene is handed back inside the error, possibly with a partial stack in it.
    pub fn new(scene: S, config: Config, selection: &[&str]) -> Result<Self, OpenError<S>> {
        let (selected, base) = match opening_base(&config.naming, selection) {
            Ok(found) => found,
            Err(error) => return Err(OpenError { error, scene }),
        };
        let active_stack = config.naming.stack_name(&base);
        let active_layer = config.naming.layer_name(&base, 0);
        log::debug!("selection {selected:?}, base object {base:?}, stack {active_stack:?}");

        let mut session = Self {
            scene,
            config,
            active_stack,
            active_layer,
            display: HashMap::new(),
            shaders: HashMap::new(),
        };
        match session.open(selected, &base) {
            Ok(()) => Ok(session),
            Err(error) => Err(OpenError {
                error,
                scene: session.scene,
            }),
        }
    }
    fn open(&mut self, selected: &str, base: &str) -> Result<(), Error> {
        self.record_shader(base)?;
        self.ensure_stack(selected)?;
        self.display.entry(self.active_stack.clone()).or_default();
        self.sync_all(None)
    }
    /// Move the session to another object's stack, creating it if needed, with its layer 0
    /// active. Takes the same selections as [`Session::new`]. Returns the stack.
    pub fn retarget(&mut self, selection: &str) -> Result<String, Error> {
        let (selected, base) = opening_base(self.naming(), &[selection])?;
        self.record_shader(&base)?;
        let stack = self.ensure_stack(selected)?;
        let layer = self.naming().layer_name(&base, 0);
        self.focus(stack.clone(), layer)?;
        Ok(stack)
    }
    #[must_use]
    pub fn scene(&self) -> &S {
        &self.scene
    }
    /// Direct access to the scene. Edits made here bypass the session's bookkeeping.
    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }
    #[must_use]
    pub fn into_scene(self) -> S {
        self.scene
    }
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
    #[must_use]
    pub fn naming(&self) -> &Naming {
        &self.config.naming
    }
    #[must_use]
    pub fn active_stack(&self) -> &str {
        &self.active_stack
    }
    #[must_use]
    pub fn active_layer(&self) -> &str {
        &self.active_layer
    }
    /// Resolve an optional explicit selection against the scene's current selection, which must
    /// then hold exactly one object.
    fn single_selection(&self, selection: Option<&str>) -> Result<String, Error> {
        if let Some(selection) = selection {
            return Ok(selection.to_owned());
        }
        match self.scene.selection().as_slice() {
            [one] => Ok(one.clone()),
            other => Err(Error::SelectionArity(other.len())),
        }
    }
    /// Remember the base object's shader the first time it is seen, so later copies can have it
    /// restored.
    fn record_shader(&mut self, base: &str) -> Result<(), Error> {
        if !self.shaders.contains_key(base) {
            let shader = self.scene.shader_of(base)?;
            log::debug!("{base:?} shader: {shader:?}");
            self.shaders.insert(base.to_owned(), shader);
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::scene::MemoryScene;

    /// A scene holding one mesh, `Cube1`, with a shader and the default duplication procedure.
    pub fn cube_scene() -> MemoryScene {
        let mut scene = MemoryScene::default();
        scene.register_procedure(Config::default().duplication.procedure);
        scene.add_mesh("Cube1", Some("blinn1"));
        scene
    }
    pub fn cube_session() -> Session<MemoryScene> {
        Session::new(cube_scene(), Config::default(), &["Cube1"]).unwrap()
    }

    #[test]
    fn selection_arity() {
        let scene = cube_scene();
        let Err(error) = Session::new(scene, Config::default(), &[]) else {
            panic!("opened with nothing selected");
        };
        assert!(matches!(error.error, Error::SelectionArity(0)));
        // The scene survives a failed open.
        assert!(error.into_scene().exists("Cube1"));
        let mut scene = cube_scene();
        scene.add_mesh("Cube2", None);
        assert!(matches!(
            Session::new(scene, Config::default(), &["Cube1", "Cube2"])
                .map_err(OpenError::into_error),
            Err(Error::SelectionArity(2))
        ));
    }
    #[test]
    fn rejects_stacks_and_layers() {
        let scene = cube_session().into_scene();
        assert!(matches!(
            Session::new(scene, Config::default(), &["Cube1_ModStack"])
                .map_err(OpenError::into_error),
            Err(Error::InvalidSelectionKind(
                SelectionKindError::InvalidSelectionKind {
                    found: Kind::Stack,
                    ..
                }
            ))
        ));
        let scene = cube_session().into_scene();
        assert!(matches!(
            Session::new(scene, Config::default(), &["Cube1_ModLayer00"])
                .map_err(OpenError::into_error),
            Err(Error::InvalidSelectionKind(
                SelectionKindError::InvalidSelectionKind {
                    found: Kind::Layer,
                    ..
                }
            ))
        ));
    }
    #[test]
    fn reopening_keeps_the_stack() {
        let mut session = cube_session();
        session.add_layer(Some("Cube1")).unwrap();
        let scene = session.into_scene();

        // Opening from a modifier finds the same stack.
        let session = Session::new(scene, Config::default(), &["Cube1_ModObject01"]).unwrap();
        assert_eq!(session.active_stack(), "Cube1_ModStack");
        assert_eq!(session.active_layer(), "Cube1_ModLayer00");
        assert_eq!(session.scene().ls("*_ModStack").unwrap().len(), 1);
        assert_eq!(session.layers().unwrap().len(), 2);
    }
    #[test]
    fn retarget() {
        let mut session = cube_session();
        session.scene_mut().add_mesh("Sphere", Some("lambert2"));
        assert_eq!(session.retarget("Sphere").unwrap(), "Sphere_ModStack");
        assert_eq!(session.active_layer(), "Sphere_ModLayer00");
        assert_eq!(
            session.scene().shader_of("Sphere_ModLayer00").unwrap().as_deref(),
            Some("lambert2")
        );
        // Back to an existing stack, through one of its modifiers.
        session.retarget("Cube1").unwrap();
        session.add_layer(Some("Cube1")).unwrap();
        session.retarget("Cube1_ModObject01").unwrap();
        assert_eq!(session.active_stack(), "Cube1_ModStack");
        assert_eq!(session.active_layer(), "Cube1_ModLayer00");
        assert!(matches!(
            session.retarget("Sphere_ModLayer00"),
            Err(Error::InvalidSelectionKind(_))
        ));
        assert_eq!(session.active_stack(), "Cube1_ModStack");
    }
}
