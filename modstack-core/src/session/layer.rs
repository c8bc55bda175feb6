//! Layer creation, listing and removal.
//!
//! A layer is a group named `<base><layer suffix><index>` under the stack, holding exactly one
//! modifier object. Indices count up from 0 in creation order with no gaps.

use super::{Error, Session, StackStatus};
use crate::scene::{SceneError, SceneGraph};

impl<S: SceneGraph> Session<S> {
    /// Layers of the active stack, in stack order.
    pub fn layers(&self) -> Result<Vec<String>, Error> {
        Ok(self.scene.children(&self.active_stack)?)
    }
    /// Append a layer to the stack of the selection's base object and make it active.
    ///
    /// `selection` picks what the new modifier is copied from (see
    /// [`Naming::modifier_payload`](crate::naming::Naming::modifier_payload)). If `None`, the
    /// scene's current selection is used and must hold exactly one object.
    ///
    /// If the stack doesn't exist yet, creating it builds layer 0, which is returned without adding
    /// anything else.
    pub fn add_layer(&mut self, selection: Option<&str>) -> Result<String, Error> {
        let selection = self.single_selection(selection)?;
        // Rejects stacks before anything is touched.
        self.naming().modifier_payload(&selection)?;

        let base = self.naming().base_object(&selection);
        let stack = self.naming().stack_name(&base);
        log::debug!("[add_layer] selection {selection:?}, stack {stack:?}");

        let layer = match self.validate_stack(&base) {
            StackStatus::Ambiguous => return Err(Error::StackLookupAmbiguous(stack)),
            StackStatus::Missing => {
                log::info!("[add_layer] {stack:?} missing");
                self.ensure_stack(&selection)?;
                self.naming().layer_name(&base, 0)
            }
            StackStatus::Present => {
                self.record_shader(&base)?;
                let count = self.scene.children(&stack)?.len();
                let index = u32::try_from(count).unwrap_or(u32::MAX);
                self.create_layer(&base, index, None, &selection)?
            }
        };

        if stack == self.active_stack {
            self.activate_layer(&layer)?;
        } else {
            self.focus(stack, layer.clone())?;
        }
        Ok(layer)
    }
    /// Build layer `index` of `base`'s stack.
    ///
    /// With no `explicit` modifier, one is copied from `selection` by the duplication procedure and
    /// renamed into the scheme. Nothing is rolled back if a step fails.
    pub(super) fn create_layer(
        &mut self,
        base: &str,
        index: u32,
        explicit: Option<&str>,
        selection: &str,
    ) -> Result<String, Error> {
        let naming = self.naming();
        let stack = naming.stack_name(base);
        let layer = naming.layer_name(base, index);
        let modifier = naming.modifier_name(base, index);

        let modifier = if let Some(explicit) = explicit {
            log::info!("[create_layer] using provided object {explicit:?}");
            explicit.to_owned()
        } else {
            let payload = naming.modifier_payload(selection)?;
            let reference = naming.reference_of(selection)?;
            log::info!("[create_layer] creating new modifier object from {payload:?}");
            let procedure = self.config.duplication.procedure.clone();
            self.scene
                .run_procedure(&procedure, &payload)
                .map_err(|source| Error::DuplicationFailure {
                    object: payload,
                    source,
                })?;
            let modifier = self.scene.rename(&reference, &modifier)?;
            self.disambiguate_shape(&modifier, selection);
            modifier
        };

        self.scene.create_group(&layer, &[&modifier])?;
        self.scene.reparent(&layer, &stack)?;
        self.restore_shader(base, &layer)?;
        log::info!("[create_layer] {layer:?} holding {modifier:?}");
        Ok(layer)
    }
    /// Copies share their source's default shape name. Give the modifier's shape its own, falling
    /// back to the selection's shape when the modifier has none.
    fn disambiguate_shape(&mut self, modifier: &str, selection: &str) {
        let shape_name = self.naming().shape_name(modifier);
        for owner in [modifier, selection] {
            match self.rename_shape(owner, &shape_name) {
                Ok(true) => return,
                Ok(false) => log::debug!("[create_layer] {owner:?} has no shape"),
                Err(e) => log::debug!("[create_layer] can't rename shape of {owner:?}: {e}"),
            }
        }
        log::warn!("[create_layer] no shape renamed to {shape_name:?}");
    }
    fn rename_shape(&mut self, owner: &str, new_name: &str) -> Result<bool, SceneError> {
        let Some(shape) = self.scene.shape_of(owner)? else {
            return Ok(false);
        };
        self.scene.rename(&shape, new_name)?;
        Ok(true)
    }
    /// Give a layer the shader its base object had when first seen.
    fn restore_shader(&mut self, base: &str, layer: &str) -> Result<(), Error> {
        match self.shaders.get(base).cloned().flatten() {
            Some(shader) => self.scene.assign_shader(layer, &shader)?,
            None => log::debug!("[create_layer] {base:?} had no shader"),
        }
        Ok(())
    }
    /// Delete the active layer and renumber the ones above it to close the gap. The layer below
    /// becomes active. Layer 0 can't be removed.
    pub fn remove_active_layer(&mut self) -> Result<String, Error> {
        let layers = self.layers()?;
        let position = layers
            .iter()
            .position(|layer| *layer == self.active_layer)
            .ok_or_else(|| Error::UnknownLayer(self.active_layer.clone()))?;
        if position == 0 {
            return Err(Error::BaseLayerRemoval);
        }

        let removed = std::mem::replace(&mut self.active_layer, layers[position - 1].clone());
        self.scene.delete(&removed)?;
        log::info!("[remove_layer] removed {removed:?}");

        let base = self.naming().base_object(&self.active_stack);
        for (new_index, layer) in (position..).zip(&layers[position + 1..]) {
            let new_index = u32::try_from(new_index).unwrap_or(u32::MAX);
            self.renumber(&base, layer, new_index)?;
        }

        self.sync_all(None)?;
        Ok(self.active_layer.clone())
    }
    /// Rename a layer, its modifier and the modifier's shape to `index`.
    fn renumber(&mut self, base: &str, layer: &str, index: u32) -> Result<(), Error> {
        let naming = self.naming().clone();
        let new_layer = naming.layer_name(base, index);
        let new_modifier = naming.modifier_name(base, index);
        let new_shape = naming.shape_name(&new_modifier);

        for modifier in self.scene.children(layer)? {
            let old_shape = naming.shape_name(&modifier);
            let renamed_shape = self
                .scene
                .shape_of(&modifier)?
                .filter(|shape| shape.rsplit('|').next() == Some(old_shape.as_str()));
            let new_modifier = self.scene.rename(&modifier, &new_modifier)?;
            if renamed_shape.is_some() {
                let shape = format!("{new_modifier}|{old_shape}");
                self.scene.rename(&shape, &new_shape)?;
            }
        }
        self.scene.rename(layer, &new_layer)?;
        log::debug!("[remove_layer] {layer:?} -> {new_layer:?}");
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::super::test::{cube_scene, cube_session};
    use super::*;
    use crate::{config::Config, scene::MemoryScene};

    #[test]
    fn cube_scenario() {
        let mut scene = cube_scene();
        scene.add_mesh("Sphere", None);
        let mut session = Session::new(scene, Config::default(), &["Sphere"]).unwrap();
        session.scene_mut().select(&["Cube1"]).unwrap();
        assert_eq!(session.validate_stack("Cube1"), StackStatus::Missing);

        assert_eq!(session.add_layer(None).unwrap(), "Cube1_ModLayer00");
        let scene = session.scene();
        assert!(scene.exists("Cube1_ModStack"));
        assert_eq!(
            scene.parent_of("Cube1").unwrap().as_deref(),
            Some("Cube1_ModLayer00")
        );
        assert_eq!(session.active_stack(), "Cube1_ModStack");
        assert_eq!(session.active_layer(), "Cube1_ModLayer00");
        // The bootstrap's layer 0 is the only one.
        assert_eq!(session.layers().unwrap(), ["Cube1_ModLayer00"]);
    }
    #[test]
    fn appends_from_scene_selection() {
        let mut scene = cube_scene();
        scene.select(&["Cube1"]).unwrap();
        let mut session = Session::new(scene, Config::default(), &["Cube1"]).unwrap();
        assert_eq!(session.add_layer(None).unwrap(), "Cube1_ModLayer01");

        let scene = session.scene();
        assert_eq!(
            scene.parent_of("Cube1_ModObject01").unwrap().as_deref(),
            Some("Cube1_ModLayer01")
        );
        assert_eq!(
            scene.parent_of("Cube1_ModLayer01").unwrap().as_deref(),
            Some("Cube1_ModStack")
        );
        assert_eq!(session.active_layer(), "Cube1_ModLayer01");
    }
    #[test]
    fn indices_are_sequential() {
        let mut session = cube_session();
        for _ in 0..11 {
            session.add_layer(Some("Cube1")).unwrap();
        }
        let expected: Vec<String> = (0..12).map(|i| format!("Cube1_ModLayer{i:02}")).collect();
        assert_eq!(session.layers().unwrap(), expected);
        assert_eq!(session.active_layer(), "Cube1_ModLayer11");
        for i in 1..12 {
            let modifier = format!("Cube1_ModObject{i:02}");
            assert_eq!(
                session.scene().parent_of(&modifier).unwrap(),
                Some(format!("Cube1_ModLayer{i:02}"))
            );
        }
    }
    #[test]
    fn copies_from_layer_selection() {
        let mut session = cube_session();
        session.add_layer(Some("Cube1")).unwrap();
        // Layer 1 wraps modifier 1, so that is what gets copied.
        session.add_layer(Some("Cube1_ModLayer01")).unwrap();
        // Layer 0 wraps the base object.
        session.add_layer(Some("Cube1_ModLayer00")).unwrap();
        assert_eq!(session.layers().unwrap().len(), 4);
        assert!(!session.scene().exists("Cube1_ModObject01_ref"));
        assert!(!session.scene().exists("Cube1_ref"));
    }
    #[test]
    fn shapes_are_disambiguated() {
        let mut session = cube_session();
        session.add_layer(Some("Cube1")).unwrap();
        session.add_layer(Some("Cube1_ModObject01")).unwrap();
        let scene = session.scene();
        assert!(scene.exists("Cube1Shape"));
        assert!(scene.exists("Cube1_ModObject01_refShape"));
        assert!(scene.exists("Cube1_ModObject02_refShape"));
        assert_eq!(
            scene.shape_of("Cube1_ModObject02").unwrap().as_deref(),
            Some("Cube1_ModObject02|Cube1_ModObject02_refShape")
        );
    }
    #[test]
    fn shape_rename_gives_up_quietly() {
        let mut scene = cube_scene();
        // A shapeless object, so its copy has no shape either.
        scene.add_transform("Locator", None).unwrap();
        let mut session = Session::new(scene, Config::default(), &["Locator"]).unwrap();
        session.add_layer(Some("Locator")).unwrap();
        assert_eq!(
            session.layers().unwrap(),
            ["Locator_ModLayer00", "Locator_ModLayer01"]
        );
        assert!(session.scene().shape_of("Locator_ModObject01").unwrap().is_none());
    }
    #[test]
    fn shader_is_restored() {
        let mut session = cube_session();
        let layer = session.add_layer(Some("Cube1")).unwrap();
        let scene = session.scene();
        assert_eq!(scene.shader_of(&layer).unwrap().as_deref(), Some("blinn1"));
        assert_eq!(
            scene.shader_of("Cube1_ModObject01").unwrap().as_deref(),
            Some("blinn1")
        );
    }
    #[test]
    fn duplication_failure_propagates() {
        let mut scene = cube_scene();
        scene.fail_procedure(Config::default().duplication.procedure, "no mesh selected");
        let mut session = Session::new(scene, Config::default(), &["Cube1"]).unwrap();
        assert!(matches!(
            session.add_layer(Some("Cube1")),
            Err(Error::DuplicationFailure { object, .. }) if object == "Cube1"
        ));
        assert_eq!(session.active_layer(), "Cube1_ModLayer00");
    }
    #[test]
    fn stack_selection_is_rejected() {
        let mut session = cube_session();
        assert!(matches!(
            session.add_layer(Some("Cube1_ModStack")),
            Err(Error::InvalidSelectionKind(_))
        ));
        session.scene_mut().select(&[]).unwrap();
        assert!(matches!(
            session.add_layer(None),
            Err(Error::SelectionArity(0))
        ));
    }
    #[test]
    fn remove_renumbers() {
        let mut session = cube_session();
        for _ in 0..3 {
            session.add_layer(Some("Cube1")).unwrap();
        }
        session.activate_layer("Cube1_ModLayer01").unwrap();
        assert_eq!(session.remove_active_layer().unwrap(), "Cube1_ModLayer00");
        assert_eq!(
            session.layers().unwrap(),
            ["Cube1_ModLayer00", "Cube1_ModLayer01", "Cube1_ModLayer02"]
        );
        let scene: &MemoryScene = session.scene();
        assert!(!scene.exists("Cube1_ModObject03"));
        assert_eq!(
            scene.shape_of("Cube1_ModObject02").unwrap().as_deref(),
            Some("Cube1_ModObject02|Cube1_ModObject02_refShape")
        );
        // Appending continues from the closed-up indices.
        assert_eq!(
            session.add_layer(Some("Cube1")).unwrap(),
            "Cube1_ModLayer03"
        );
    }
    #[test]
    fn layer_zero_stays() {
        let mut session = cube_session();
        session.add_layer(Some("Cube1")).unwrap();
        session.activate_layer("Cube1_ModLayer00").unwrap();
        assert!(matches!(
            session.remove_active_layer(),
            Err(Error::BaseLayerRemoval)
        ));
        assert_eq!(session.layers().unwrap().len(), 2);
    }
}
