//! # Naming
//!
//! Every object the stack engine touches is addressed by name alone. Stacks, layers and modifiers
//! are told apart by a suffix appended to the base object's name, layers and modifiers additionally
//! carry a zero-padded index:
//!
//! ```text
//! Cube1                 base object
//! Cube1_ModStack        stack
//! Cube1_ModLayer01      layer 1
//! Cube1_ModObject01     modifier of layer 1
//! ```
//!
//! The suffixes are configuration, not constants, so several schemes can live side by side.

use serde::{Deserialize, Serialize};

/// The three structural components that get a canonical name.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Kind {
    Stack,
    Layer,
    Modifier,
}

/// The role an identifier plays, as determined by [`Naming::classify`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Role {
    /// No suffix matched, the identifier is an object in its own right.
    BaseObject,
    Stack,
    /// A layer group. The index is `None` if no digits follow the suffix.
    Layer(Option<u32>),
    /// A layer's payload. The index is `None` if no digits follow the suffix.
    Modifier(Option<u32>),
}
impl Role {
    #[must_use]
    pub fn kind(&self) -> Option<Kind> {
        match self {
            Self::BaseObject => None,
            Self::Stack => Some(Kind::Stack),
            Self::Layer(_) => Some(Kind::Layer),
            Self::Modifier(_) => Some(Kind::Modifier),
        }
    }
    #[must_use]
    pub fn index(&self) -> Option<u32> {
        match self {
            Self::Layer(idx) | Self::Modifier(idx) => *idx,
            Self::BaseObject | Self::Stack => None,
        }
    }
}

/// An identifier split into the base object it belongs to and its role.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Identity {
    pub base: String,
    pub role: Role,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SelectionKindError {
    #[error("{id:?} is a {found}, expected a mesh object, modifier object or layer")]
    InvalidSelectionKind { id: String, found: Kind },
    #[error("layer {0:?} has no index")]
    MissingIndex(String),
}

/// Suffix labels and index formatting for one naming scheme.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Naming {
    pub stack_suffix: String,
    pub layer_suffix: String,
    pub modifier_suffix: String,
    /// Appended by the duplication procedure to the name of the object it copied.
    pub reference_suffix: String,
    /// Appended to a modifier's name to give its shape a unique name.
    pub shape_suffix: String,
    /// Zero-pad width of layer and modifier indices.
    pub index_width: usize,
}
impl Default for Naming {
    fn default() -> Self {
        Self {
            stack_suffix: "_ModStack".to_owned(),
            layer_suffix: "_ModLayer".to_owned(),
            modifier_suffix: "_ModObject".to_owned(),
            reference_suffix: "_ref".to_owned(),
            shape_suffix: "_refShape".to_owned(),
            index_width: 2,
        }
    }
}
impl Naming {
    #[must_use]
    pub fn suffix(&self, kind: Kind) -> &str {
        match kind {
            Kind::Stack => &self.stack_suffix,
            Kind::Layer => &self.layer_suffix,
            Kind::Modifier => &self.modifier_suffix,
        }
    }
    /// Determine the role of `id` and the base object it belongs to.
    ///
    /// Suffixes are probed modifier first, then layer, then stack. Some schemes use suffixes that
    /// are prefixes of one another, and this order must not change.
    #[must_use]
    pub fn classify(&self, id: &str) -> Identity {
        for kind in [Kind::Modifier, Kind::Layer, Kind::Stack] {
            let suffix = self.suffix(kind);
            // An empty suffix would match everything.
            if suffix.is_empty() {
                continue;
            }
            let Some(at) = id.find(suffix) else {
                continue;
            };
            let base = id[..at].to_owned();
            let rest = &id[at + suffix.len()..];
            let role = match kind {
                Kind::Stack => Role::Stack,
                Kind::Layer => Role::Layer(leading_index(rest)),
                Kind::Modifier => Role::Modifier(leading_index(rest)),
            };
            return Identity { base, role };
        }
        Identity {
            base: id.to_owned(),
            role: Role::BaseObject,
        }
    }
    /// The base object any stack, layer or modifier belongs to. A bare object is its own base.
    #[must_use]
    pub fn base_object(&self, id: &str) -> String {
        self.classify(id).base
    }
    /// Canonical name of a component. `index` is ignored for stacks.
    #[must_use]
    pub fn name_for(&self, kind: Kind, base: &str, index: u32) -> String {
        match kind {
            Kind::Stack => format!("{base}{}", self.stack_suffix),
            Kind::Layer | Kind::Modifier => format!(
                "{base}{}{index:0width$}",
                self.suffix(kind),
                width = self.index_width
            ),
        }
    }
    #[must_use]
    pub fn stack_name(&self, base: &str) -> String {
        self.name_for(Kind::Stack, base, 0)
    }
    #[must_use]
    pub fn layer_name(&self, base: &str, index: u32) -> String {
        self.name_for(Kind::Layer, base, index)
    }
    #[must_use]
    pub fn modifier_name(&self, base: &str, index: u32) -> String {
        self.name_for(Kind::Modifier, base, index)
    }
    /// The object a new modifier should be copied from, given what the user had selected.
    ///
    /// Layer 0 wraps the base object itself, any other layer wraps the modifier of the same index.
    /// Modifiers and bare objects are used directly.
    pub fn modifier_payload(&self, selected: &str) -> Result<String, SelectionKindError> {
        let Identity { base, role } = self.classify(selected);
        match role {
            Role::BaseObject | Role::Modifier(_) => Ok(selected.to_owned()),
            Role::Layer(Some(0)) => Ok(base),
            Role::Layer(Some(idx)) => Ok(self.modifier_name(&base, idx)),
            Role::Layer(None) => Err(SelectionKindError::MissingIndex(selected.to_owned())),
            Role::Stack => Err(SelectionKindError::InvalidSelectionKind {
                id: selected.to_owned(),
                found: Kind::Stack,
            }),
        }
    }
    /// Name of the object the duplication procedure leaves behind for this selection.
    pub fn reference_of(&self, selected: &str) -> Result<String, SelectionKindError> {
        Ok(self.modifier_payload(selected)? + &self.reference_suffix)
    }
    /// Name given to a modifier's shape so duplicates never share one.
    #[must_use]
    pub fn shape_name(&self, modifier: &str) -> String {
        format!("{modifier}{}", self.shape_suffix)
    }
}

/// Parse the run of ascii digits at the start of `rest`.
fn leading_index(rest: &str) -> Option<u32> {
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn classify_roles() {
        let naming = Naming::default();
        assert_eq!(
            naming.classify("Cube1"),
            Identity {
                base: "Cube1".to_owned(),
                role: Role::BaseObject
            }
        );
        assert_eq!(naming.classify("Cube1_ModStack").role, Role::Stack);
        assert_eq!(naming.classify("Cube1_ModLayer03").role, Role::Layer(Some(3)));
        assert_eq!(
            naming.classify("Cube1_ModObject12").role,
            Role::Modifier(Some(12))
        );
        assert_eq!(naming.classify("Cube1_ModLayer").role, Role::Layer(None));
        // Trailing junk after the digits is not part of the index.
        assert_eq!(
            naming.classify("Cube1_ModObject04_ref").role,
            Role::Modifier(Some(4))
        );
        assert_eq!(naming.base_object("Cube1_ModObject04_ref"), "Cube1");
    }
    #[test]
    fn precedence_with_prefix_suffixes() {
        // Every suffix is a prefix of the one probed before it.
        let naming = Naming {
            stack_suffix: "_S".to_owned(),
            layer_suffix: "_SL".to_owned(),
            modifier_suffix: "_SLM".to_owned(),
            ..Naming::default()
        };
        assert_eq!(naming.classify("Box_SLM01").role, Role::Modifier(Some(1)));
        assert_eq!(naming.classify("Box_SL01").role, Role::Layer(Some(1)));
        assert_eq!(naming.classify("Box_S").role, Role::Stack);
        assert_eq!(naming.base_object("Box_SLM01"), "Box");
    }
    #[test]
    fn canonical_names() {
        let naming = Naming::default();
        assert_eq!(naming.stack_name("Cube1"), "Cube1_ModStack");
        assert_eq!(naming.layer_name("Cube1", 2), "Cube1_ModLayer02");
        assert_eq!(naming.modifier_name("Cube1", 10), "Cube1_ModObject10");
        assert_eq!(naming.layer_name("Cube1", 123), "Cube1_ModLayer123");

        let wide = Naming {
            index_width: 3,
            ..Naming::default()
        };
        assert_eq!(wide.layer_name("Cube1", 7), "Cube1_ModLayer007");
    }
    #[test]
    fn payload_resolution() {
        let naming = Naming::default();
        assert_eq!(naming.modifier_payload("Cube1_ModLayer00").unwrap(), "Cube1");
        assert_eq!(
            naming.modifier_payload("Cube1_ModLayer02").unwrap(),
            "Cube1_ModObject02"
        );
        assert_eq!(naming.modifier_payload("Cube1").unwrap(), "Cube1");
        assert_eq!(
            naming.modifier_payload("Cube1_ModObject01").unwrap(),
            "Cube1_ModObject01"
        );
        assert_eq!(
            naming.reference_of("Cube1_ModLayer01").unwrap(),
            "Cube1_ModObject01_ref"
        );
        assert_eq!(
            naming.modifier_payload("Cube1_ModStack"),
            Err(SelectionKindError::InvalidSelectionKind {
                id: "Cube1_ModStack".to_owned(),
                found: Kind::Stack,
            })
        );
        assert!(naming.modifier_payload("Cube1_ModLayer").is_err());
    }
}
