//! Session configuration: the naming scheme and the host procedure used to copy modifiers.

use serde::{Deserialize, Serialize};

use crate::naming::Naming;

#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub naming: Naming,
    pub duplication: Duplication,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Duplication {
    /// Host procedure that copies the selected mesh to `<mesh><reference suffix>`.
    pub procedure: String,
}
impl Default for Duplication {
    fn default() -> Self {
        Self {
            procedure: "bt_duplicateMeshReference".to_owned(),
        }
    }
}
