//! # Scene
//!
//! The stack engine never owns geometry. Everything it does is expressed as calls against a host
//! scene graph (grouping, renaming, display attributes, materials, duplication) through the
//! [`SceneGraph`] trait. Objects are addressed by their short name, which the host need not keep
//! unique; lookups that hit more than one object report [`SceneError::AmbiguousName`].
//!
//! [`memory::MemoryScene`] is a self-contained implementation for tests and headless use.

pub mod memory;

pub use memory::MemoryScene;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    #[error("no object matches {0:?}")]
    NotFound(String),
    #[error("more than one object is named {0:?}")]
    AmbiguousName(String),
    #[error("malformed namespace query {0:?}")]
    MalformedQuery(String),
    #[error("can't parent {0:?} to itself or one of its descendants")]
    WouldCycle(String),
    #[error("no procedure named {0:?}")]
    UnknownProcedure(String),
    #[error("procedure {procedure:?} failed: {reason}")]
    ProcedureFailed { procedure: String, reason: String },
}

/// How a node is drawn when its display override is enabled.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, strum::Display)]
#[repr(u8)]
pub enum DisplayType {
    #[default]
    Normal = 0,
    /// Wireframe, not selectable.
    Template = 1,
    /// Shaded, not selectable.
    Reference = 2,
}

/// A node's display override attribute pair.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct DisplayOverride {
    pub enabled: bool,
    pub display_type: DisplayType,
}
impl DisplayOverride {
    pub const OFF: Self = Self {
        enabled: false,
        display_type: DisplayType::Normal,
    };
    /// Drawn as wireframe and excluded from selection.
    pub const LOCKED: Self = Self {
        enabled: true,
        display_type: DisplayType::Template,
    };
}

/// The capabilities the stack engine needs from a host scene graph.
///
/// Calls are synchronous and run to completion. Implementations are expected to have exclusive
/// access to the objects the engine names; nothing here guards against concurrent edits.
pub trait SceneGraph {
    /// Find objects by exact name, or by a pattern where `*` matches any run of characters and `?`
    /// any single character. Results are in namespace order. An empty pattern is malformed.
    fn ls(&self, pattern: &str) -> Result<Vec<String>, SceneError>;
    /// True if exactly one object has this name.
    fn exists(&self, name: &str) -> bool {
        matches!(self.ls(name).as_deref(), Ok([_]))
    }
    /// Direct children of a node, in order. Shapes are not included.
    fn children(&self, node: &str) -> Result<Vec<String>, SceneError>;
    /// The first shape under a node, if any.
    fn shape_of(&self, node: &str) -> Result<Option<String>, SceneError>;

    /// Create a new group at the top of the hierarchy, moving `members` under it. With no members
    /// the group is empty. Returns the new group's name.
    fn create_group(&mut self, name: &str, members: &[&str]) -> Result<String, SceneError>;
    fn reparent(&mut self, node: &str, parent: &str) -> Result<(), SceneError>;
    /// Rename a node, returning its new name.
    fn rename(&mut self, node: &str, new_name: &str) -> Result<String, SceneError>;
    /// Delete a node along with everything under it.
    fn delete(&mut self, node: &str) -> Result<(), SceneError>;

    fn selection(&self) -> Vec<String>;
    fn select(&mut self, names: &[&str]) -> Result<(), SceneError>;

    fn set_visibility(&mut self, node: &str, visible: bool) -> Result<(), SceneError>;
    fn visibility(&self, node: &str) -> Result<bool, SceneError>;
    fn set_display_override(
        &mut self,
        node: &str,
        display: DisplayOverride,
    ) -> Result<(), SceneError>;
    fn display_override(&self, node: &str) -> Result<DisplayOverride, SceneError>;

    /// The shader bound to a node's surface, if any.
    fn shader_of(&self, node: &str) -> Result<Option<String>, SceneError>;
    fn assign_shader(&mut self, node: &str, shader: &str) -> Result<(), SceneError>;

    /// Run a named host procedure that duplicates `source`. The copy is left at the top of the
    /// hierarchy, named after `source` with the host's reference suffix.
    fn run_procedure(&mut self, procedure: &str, source: &str) -> Result<(), SceneError>;
}

/// Match `name` against a pattern of literal characters, `*` and `?`.
#[must_use]
pub fn wildcard_match(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();
    let (mut p, mut n) = (0, 0);
    // Position of the last `*` seen, and where in `name` it started matching.
    let mut backtrack: Option<(usize, usize)> = None;
    while n < name.len() {
        match pattern.get(p).copied() {
            Some('*') => {
                backtrack = Some((p, n));
                p += 1;
            }
            Some(c) if c == '?' || c == name[n] => {
                p += 1;
                n += 1;
            }
            _ => match backtrack {
                Some((star, start)) => {
                    p = star + 1;
                    n = start + 1;
                    backtrack = Some((star, start + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod test {
    use super::wildcard_match;
    #[test]
    fn wildcards() {
        assert!(wildcard_match("Cube1_ModStack", "Cube1_ModStack"));
        assert!(!wildcard_match("Cube1_ModStack", "Cube1_ModStack1"));
        assert!(wildcard_match("*_ModStack", "Cube1_ModStack"));
        assert!(wildcard_match("*_ModStack", "_ModStack"));
        assert!(!wildcard_match("*_ModStack", "Cube1_ModStack_old"));
        assert!(wildcard_match("Cube?_Mod*", "Cube1_ModLayer00"));
        assert!(wildcard_match("*Layer*0", "Cube1_ModLayer10"));
        assert!(!wildcard_match("?", ""));
        assert!(wildcard_match("*", ""));
    }
}
