//! Stack lookup and creation. There is at most one stack per base object, and a stack never exists
//! without its layer 0.

use super::{Error, Session};
use crate::scene::SceneGraph;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum StackStatus {
    /// Exactly one object carries the stack's name.
    Present,
    Missing,
    /// Several objects carry the name, or the query itself was rejected.
    Ambiguous,
}

impl<S: SceneGraph> Session<S> {
    /// Look up the stack belonging to `base` in the scene's flat namespace.
    pub fn validate_stack(&self, base: &str) -> StackStatus {
        let stack = self.naming().stack_name(base);
        match self.scene.ls(&stack) {
            Err(e) => {
                log::warn!("[validate_stack] query for {stack:?} failed: {e}");
                StackStatus::Ambiguous
            }
            Ok(found) => match found.as_slice() {
                [] => StackStatus::Missing,
                [one] if *one == stack => StackStatus::Present,
                _ => StackStatus::Ambiguous,
            },
        }
    }
    /// Make sure the stack of the selection's base object exists, returning its name.
    ///
    /// A missing stack is created as an empty group, and its layer 0 is built right away around the
    /// base object itself.
    ///
    /// Layer 0's modifier is the base object under its own name: `Cube1_ModLayer00` holds `Cube1`,
    /// there is no `Cube1_ModObject00`.
    pub fn ensure_stack(&mut self, selection: &str) -> Result<String, Error> {
        let base = self.naming().base_object(selection);
        let stack = self.naming().stack_name(&base);
        match self.validate_stack(&base) {
            StackStatus::Present => {
                log::info!("[ensure_stack] {stack:?} already exists");
                Ok(stack)
            }
            StackStatus::Ambiguous => Err(Error::StackLookupAmbiguous(stack)),
            StackStatus::Missing => {
                self.record_shader(&base)?;
                self.scene.create_group(&stack, &[])?;
                log::info!("[ensure_stack] {stack:?} initialized, adding layer 0");
                self.create_layer(&base, 0, Some(&base), selection)?;
                self.display.entry(stack.clone()).or_default();
                Ok(stack)
            }
        }
    }
    /// Every stack in the scene, in namespace order.
    pub fn stacks(&self) -> Result<Vec<String>, Error> {
        let pattern = format!("*{}", self.naming().stack_suffix);
        Ok(self.scene.ls(&pattern)?)
    }
}
