//! Display state of a stack's layers.
//!
//! Every layer but the active one follows its stack's shared [`DisplayState`]. The active layer is
//! pinned to [`DisplayState::SHOWN`] whenever state is reapplied, so there's always something on
//! screen to look at.

use super::{Error, Session};
use crate::scene::{DisplayOverride, DisplayType, SceneGraph};

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct DisplayState {
    pub visible: bool,
    /// Selectable and drawn shaded. When false the layer is locked to a wireframe template.
    pub interactive: bool,
}
impl DisplayState {
    pub const SHOWN: Self = Self {
        visible: true,
        interactive: true,
    };
    #[must_use]
    pub fn inverted(self) -> Self {
        Self {
            visible: !self.visible,
            interactive: !self.interactive,
        }
    }
    #[must_use]
    pub fn display_override(self) -> DisplayOverride {
        if self.interactive {
            DisplayOverride::OFF
        } else {
            DisplayOverride::LOCKED
        }
    }
}
impl Default for DisplayState {
    fn default() -> Self {
        Self::SHOWN
    }
}

impl<S: SceneGraph> Session<S> {
    /// The state shared by the active stack's inactive layers.
    #[must_use]
    pub fn shared_state(&self) -> DisplayState {
        self.display
            .get(&self.active_stack)
            .copied()
            .unwrap_or_default()
    }
    fn shared_mut(&mut self) -> &mut DisplayState {
        self.display.entry(self.active_stack.clone()).or_default()
    }
    /// Write both attributes of `state` onto a layer.
    pub fn apply_state(&mut self, layer: &str, state: DisplayState) -> Result<(), Error> {
        log::debug!("[apply_state] {layer:?} -> {state:?}");
        self.scene.set_visibility(layer, state.visible)?;
        self.scene
            .set_display_override(layer, state.display_override())?;
        Ok(())
    }
    /// Read back the state a layer is currently drawn with.
    pub fn applied_state(&self, layer: &str) -> Result<DisplayState, Error> {
        let display = self.scene.display_override(layer)?;
        Ok(DisplayState {
            visible: self.scene.visibility(layer)?,
            interactive: !(display.enabled && display.display_type != DisplayType::Normal),
        })
    }
    fn inactive_layers(&self) -> Result<Vec<String>, Error> {
        let mut layers = self.layers()?;
        layers.retain(|layer| *layer != self.active_layer);
        Ok(layers)
    }
    /// Flip the shared visibility and apply it to every inactive layer. Returns the new value.
    pub fn toggle_visibility(&mut self) -> Result<bool, Error> {
        let visible = {
            let shared = self.shared_mut();
            shared.visible = !shared.visible;
            shared.visible
        };
        for layer in self.inactive_layers()? {
            self.scene.set_visibility(&layer, visible)?;
        }
        log::debug!("[toggle_visibility] inactive layers visible: {visible}");
        Ok(visible)
    }
    /// Flip the shared interactivity and apply it to every inactive layer. Returns the new value.
    pub fn toggle_interactivity(&mut self) -> Result<bool, Error> {
        let interactive = {
            let shared = self.shared_mut();
            shared.interactive = !shared.interactive;
            shared.interactive
        };
        let display = DisplayState {
            visible: true,
            interactive,
        }
        .display_override();
        for layer in self.inactive_layers()? {
            self.scene.set_display_override(&layer, display)?;
        }
        log::debug!("[toggle_interactivity] inactive layers interactive: {interactive}");
        Ok(interactive)
    }
    /// Replace the shared state outright and reapply it.
    pub fn set_shared_state(&mut self, state: DisplayState) -> Result<(), Error> {
        *self.shared_mut() = state;
        self.sync_all(None)
    }
    /// Apply the shared state to every layer except `exclude` (the active layer if `None`), then
    /// pin the active layer.
    pub fn sync_all(&mut self, exclude: Option<&str>) -> Result<(), Error> {
        let shared = self.shared_state();
        let exclude = exclude.unwrap_or(&self.active_layer).to_owned();
        for layer in self.layers()? {
            if layer != exclude {
                self.apply_state(&layer, shared)?;
            }
        }
        let active = self.active_layer.clone();
        self.apply_state(&active, DisplayState::SHOWN)
    }
    /// Pin `layer` if it's active, otherwise give it the shared state.
    pub fn sync_layer(&mut self, layer: &str) -> Result<(), Error> {
        let state = if layer == self.active_layer {
            DisplayState::SHOWN
        } else {
            self.shared_state()
        };
        self.apply_state(layer, state)
    }
    /// With no layer, apply the shared state to the inactive layers and invert whatever the active
    /// layer currently shows. With a layer, invert it if it's active, otherwise give it the shared
    /// state. The layer must belong to the active stack.
    pub fn toggle_modes(&mut self, layer: Option<&str>) -> Result<(), Error> {
        let shared = self.shared_state();
        let layers = self.layers()?;
        let targets = match layer {
            Some(layer) if layers.iter().any(|found| found == layer) => vec![layer.to_owned()],
            Some(layer) => return Err(Error::UnknownLayer(layer.to_owned())),
            None => layers,
        };
        for layer in targets {
            let state = if layer == self.active_layer {
                self.applied_state(&layer)?.inverted()
            } else {
                shared
            };
            self.apply_state(&layer, state)?;
        }
        Ok(())
    }
    /// Show every layer of the active stack, the active one included, and reset the shared state.
    pub fn reset_modes(&mut self) -> Result<(), Error> {
        *self.shared_mut() = DisplayState::SHOWN;
        for layer in self.layers()? {
            self.apply_state(&layer, DisplayState::SHOWN)?;
        }
        log::info!("[reset_modes] {:?} reset", self.active_stack);
        Ok(())
    }
}
