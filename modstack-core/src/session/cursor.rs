//! The active stack and layer, and moving between them.
//!
//! The cursor only ever names layers that exist: moves that would land outside the stack (or the
//! list of stacks) fail with [`Error::OutOfRange`] and leave it where it was.

use super::{Error, Session};
use crate::scene::SceneGraph;

impl<S: SceneGraph> Session<S> {
    /// Make `target`, a layer of the active stack, the active layer.
    ///
    /// Every other layer of the stack, the outgoing one included, falls back to the shared state
    /// and `target` is pinned shown.
    pub fn activate_layer(&mut self, target: &str) -> Result<(), Error> {
        if !self.layers()?.iter().any(|layer| layer == target) {
            return Err(Error::UnknownLayer(target.to_owned()));
        }
        let outgoing = std::mem::replace(&mut self.active_layer, target.to_owned());
        self.sync_all(None)?;
        log::debug!("[activate_layer] {outgoing:?} -> {target:?}");
        Ok(())
    }
    /// Activate the layer `offset` places away from the active one. Returns the new active layer.
    pub fn move_relative(&mut self, offset: isize) -> Result<String, Error> {
        let layers = self.layers()?;
        let out_of_range = || Error::OutOfRange {
            from: self.active_layer.clone(),
            offset,
        };
        let target = layers
            .iter()
            .position(|layer| *layer == self.active_layer)
            .and_then(|current| current.checked_add_signed(offset))
            .and_then(|index| layers.get(index))
            .filter(|layer| self.scene.exists(layer))
            .ok_or_else(out_of_range)?
            .clone();
        self.activate_layer(&target)?;
        Ok(target)
    }
    /// Switch to another stack, activating its first layer.
    pub fn activate_stack(&mut self, stack: &str) -> Result<(), Error> {
        if !self.stacks()?.iter().any(|found| found == stack) {
            return Err(Error::UnknownStack(stack.to_owned()));
        }
        let first = self
            .scene
            .children(stack)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::EmptyStack(stack.to_owned()))?;
        self.focus(stack.to_owned(), first)
    }
    /// Activate the stack `offset` places away from the active one, in namespace order. Returns
    /// the new active stack.
    pub fn move_stack_relative(&mut self, offset: isize) -> Result<String, Error> {
        let stacks = self.stacks()?;
        let target = stacks
            .iter()
            .position(|stack| *stack == self.active_stack)
            .and_then(|current| current.checked_add_signed(offset))
            .and_then(|index| stacks.get(index))
            .ok_or_else(|| Error::OutOfRange {
                from: self.active_stack.clone(),
                offset,
            })?
            .clone();
        self.activate_stack(&target)?;
        Ok(target)
    }
    /// Point the cursor at a layer of another stack and reapply that stack's display state.
    pub(super) fn focus(&mut self, stack: String, layer: String) -> Result<(), Error> {
        log::info!("[focus] {stack:?}, layer {layer:?}");
        self.display.entry(stack.clone()).or_default();
        self.active_stack = stack;
        self.active_layer = layer;
        self.sync_all(None)
    }
}
