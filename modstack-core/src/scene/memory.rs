//! An in-memory [`SceneGraph`], kept as an `id_tree` hierarchy under an unnamed world root.
//!
//! Like a DCC namespace, short names need not be unique. Lookups accept either a short name or a
//! `|`-separated path (`Cube1_ModObject01|Cube1Shape`) to pick one of several same-named nodes.

use hashbrown::HashMap;
use id_tree::{InsertBehavior, MoveBehavior, Node, NodeId, RemoveBehavior, Tree};
use smallvec::SmallVec;

use super::{wildcard_match, DisplayOverride, SceneError, SceneGraph};

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum NodeKind {
    /// Groups and mesh transforms.
    Transform,
    /// Geometry. Never listed by [`SceneGraph::children`].
    Shape,
}

#[derive(Clone, Debug)]
pub struct SceneNode {
    pub name: String,
    pub kind: NodeKind,
    pub visible: bool,
    pub display: DisplayOverride,
    pub shader: Option<String>,
}
impl SceneNode {
    fn new(name: String, kind: NodeKind) -> Self {
        Self {
            name,
            kind,
            visible: true,
            display: DisplayOverride::OFF,
            shader: None,
        }
    }
}

#[derive(Clone, Debug)]
enum Procedure {
    /// Copy the source and its shapes to `<source><reference suffix>` at the top level.
    Duplicate,
    /// Always fails with the given reason.
    Fail(String),
}

pub struct MemoryScene {
    tree: Tree<SceneNode>,
    root: NodeId,
    // Short name -> every node carrying it. Almost always exactly one.
    names: HashMap<String, SmallVec<[NodeId; 1]>>,
    selection: Vec<String>,
    procedures: HashMap<String, Procedure>,
    reference_suffix: String,
}
impl Default for MemoryScene {
    fn default() -> Self {
        Self::new("_ref")
    }
}
impl MemoryScene {
    /// An empty scene whose duplication procedures name their copies `<source><reference_suffix>`.
    #[must_use]
    pub fn new(reference_suffix: impl Into<String>) -> Self {
        let mut tree = Tree::new();
        // unwrap ok - inserting a root into an empty tree can't fail.
        let root = tree
            .insert(
                Node::new(SceneNode::new(String::new(), NodeKind::Transform)),
                InsertBehavior::AsRoot,
            )
            .unwrap();
        Self {
            tree,
            root,
            names: HashMap::new(),
            selection: Vec::new(),
            procedures: HashMap::new(),
            reference_suffix: reference_suffix.into(),
        }
    }
    /// Make a duplication procedure available under this name.
    pub fn register_procedure(&mut self, name: impl Into<String>) {
        self.procedures.insert(name.into(), Procedure::Duplicate);
    }
    /// Make the named procedure fail every time it is run.
    pub fn fail_procedure(&mut self, name: impl Into<String>, reason: impl Into<String>) {
        self.procedures
            .insert(name.into(), Procedure::Fail(reason.into()));
    }
    /// Add a mesh at the top level: a transform called `name` with a shape called `<name>Shape`.
    pub fn add_mesh(&mut self, name: &str, shader: Option<&str>) -> String {
        let root = self.root.clone();
        let mut transform = SceneNode::new(name.to_owned(), NodeKind::Transform);
        transform.shader = shader.map(ToOwned::to_owned);
        let mut shape = SceneNode::new(format!("{name}Shape"), NodeKind::Shape);
        shape.shader = transform.shader.clone();

        let transform = self.insert(&root, transform);
        self.insert(&transform, shape);
        name.to_owned()
    }
    /// Add an empty transform, at the top level or under `parent`.
    pub fn add_transform(&mut self, name: &str, parent: Option<&str>) -> Result<String, SceneError> {
        let parent = match parent {
            Some(parent) => self.resolve(parent)?,
            None => self.root.clone(),
        };
        self.insert(
            &parent,
            SceneNode::new(name.to_owned(), NodeKind::Transform),
        );
        Ok(name.to_owned())
    }
    /// Name of the node's parent, or None at the top level.
    pub fn parent_of(&self, node: &str) -> Result<Option<String>, SceneError> {
        let id = self.resolve(node)?;
        let parent = self
            .tree
            .get(&id)
            .map_err(|_| SceneError::NotFound(node.to_owned()))?
            .parent()
            .filter(|parent| **parent != self.root);
        Ok(parent.map(|parent| self.name_of(parent)))
    }
    /// Read access to a node's attributes.
    pub fn node(&self, node: &str) -> Result<&SceneNode, SceneError> {
        let id = self.resolve(node)?;
        self.tree
            .get(&id)
            .map(Node::data)
            .map_err(|_| SceneError::NotFound(node.to_owned()))
    }
    fn node_mut(&mut self, node: &str) -> Result<&mut SceneNode, SceneError> {
        let id = self.resolve(node)?;
        self.tree
            .get_mut(&id)
            .map(Node::data_mut)
            .map_err(|_| SceneError::NotFound(node.to_owned()))
    }
    fn insert(&mut self, parent: &NodeId, data: SceneNode) -> NodeId {
        let name = data.name.clone();
        // unwrap ok - ids handed to this fn are always live.
        let id = self
            .tree
            .insert(Node::new(data), InsertBehavior::UnderNode(parent))
            .unwrap();
        self.names.entry(name).or_default().push(id.clone());
        id
    }
    fn unindex(&mut self, name: &str, id: &NodeId) {
        if let Some(ids) = self.names.get_mut(name) {
            ids.retain(|other| *other != *id);
            if ids.is_empty() {
                self.names.remove(name);
            }
        }
    }
    fn name_of(&self, id: &NodeId) -> String {
        self.tree
            .get(id)
            .map(|node| node.data().name.clone())
            .unwrap_or_default()
    }
    /// Find the single node a short name or path refers to.
    fn resolve(&self, path: &str) -> Result<NodeId, SceneError> {
        let mut components = path.rsplit('|');
        let leaf = components.next().unwrap_or_default();
        // Nearest ancestor first, matching `ancestor_ids` order.
        let ancestors: Vec<&str> = components.collect();

        let candidates = self
            .names
            .get(leaf)
            .map(SmallVec::as_slice)
            .unwrap_or_default();
        let mut matching = candidates
            .iter()
            .filter(|id| self.has_ancestors(id, &ancestors));
        match (matching.next(), matching.next()) {
            (None, _) => Err(SceneError::NotFound(path.to_owned())),
            (Some(id), None) => Ok(id.clone()),
            (Some(_), Some(_)) => Err(SceneError::AmbiguousName(path.to_owned())),
        }
    }
    fn has_ancestors(&self, id: &NodeId, expected: &[&str]) -> bool {
        let Ok(mut ancestors) = self.tree.ancestor_ids(id) else {
            return false;
        };
        expected.iter().all(|expected| {
            ancestors
                .next()
                .and_then(|ancestor| self.tree.get(ancestor).ok())
                .is_some_and(|ancestor| ancestor.data().name == *expected)
        })
    }
    fn duplicate(&mut self, source: &str) -> Result<(), SceneError> {
        let source_id = self.resolve(source)?;
        let source_node = self
            .tree
            .get(&source_id)
            .map_err(|_| SceneError::NotFound(source.to_owned()))?;

        let mut copy = source_node.data().clone();
        copy.name = format!("{}{}", copy.name, self.reference_suffix);
        // Shapes keep their names, the copy's shape collides with the original's.
        let shapes: Vec<SceneNode> = source_node
            .children()
            .iter()
            .filter_map(|child| self.tree.get(child).ok())
            .map(|child| child.data().clone())
            .filter(|child| child.kind == NodeKind::Shape)
            .collect();

        let root = self.root.clone();
        let copy = self.insert(&root, copy);
        for shape in shapes {
            self.insert(&copy, shape);
        }
        Ok(())
    }
}

impl SceneGraph for MemoryScene {
    fn ls(&self, pattern: &str) -> Result<Vec<String>, SceneError> {
        if pattern.is_empty() {
            return Err(SceneError::MalformedQuery(pattern.to_owned()));
        }
        let wild = pattern.contains(['*', '?']);
        // unwrap ok - root is never removed.
        let found = self
            .tree
            .traverse_pre_order_ids(&self.root)
            .unwrap()
            .filter(|id| *id != self.root)
            .map(|id| self.name_of(&id))
            .filter(|name| {
                if wild {
                    wildcard_match(pattern, name)
                } else {
                    name == pattern
                }
            })
            .collect();
        Ok(found)
    }
    fn children(&self, node: &str) -> Result<Vec<String>, SceneError> {
        let id = self.resolve(node)?;
        let children = self
            .tree
            .children(&id)
            .map_err(|_| SceneError::NotFound(node.to_owned()))?
            .map(Node::data)
            .filter(|child| child.kind != NodeKind::Shape)
            .map(|child| child.name.clone())
            .collect();
        Ok(children)
    }
    fn shape_of(&self, node: &str) -> Result<Option<String>, SceneError> {
        let id = self.resolve(node)?;
        let shape = self
            .tree
            .children(&id)
            .map_err(|_| SceneError::NotFound(node.to_owned()))?
            .map(Node::data)
            .find(|child| child.kind == NodeKind::Shape)
            .map(|shape| format!("{node}|{}", shape.name));
        Ok(shape)
    }
    fn create_group(&mut self, name: &str, members: &[&str]) -> Result<String, SceneError> {
        if name.is_empty() {
            return Err(SceneError::MalformedQuery(name.to_owned()));
        }
        // Resolve everything up front so a bad member leaves the scene untouched.
        let members = members
            .iter()
            .map(|member| self.resolve(member))
            .collect::<Result<Vec<_>, _>>()?;

        let root = self.root.clone();
        let group = self.insert(
            &root,
            SceneNode::new(name.to_owned(), NodeKind::Transform),
        );
        for member in &members {
            self.tree
                .move_node(member, MoveBehavior::ToParent(&group))
                .map_err(|_| SceneError::NotFound(self.name_of(member)))?;
        }
        Ok(name.to_owned())
    }
    fn reparent(&mut self, node: &str, parent: &str) -> Result<(), SceneError> {
        let node_id = self.resolve(node)?;
        let parent_id = self.resolve(parent)?;
        let would_cycle = std::iter::once(&parent_id)
            .chain(
                self.tree
                    .ancestor_ids(&parent_id)
                    .map_err(|_| SceneError::NotFound(parent.to_owned()))?,
            )
            .any(|ancestor| *ancestor == node_id);
        if would_cycle {
            return Err(SceneError::WouldCycle(node.to_owned()));
        }
        self.tree
            .move_node(&node_id, MoveBehavior::ToParent(&parent_id))
            .map_err(|_| SceneError::NotFound(node.to_owned()))
    }
    fn rename(&mut self, node: &str, new_name: &str) -> Result<String, SceneError> {
        if new_name.is_empty() || new_name.contains('|') {
            return Err(SceneError::MalformedQuery(new_name.to_owned()));
        }
        let id = self.resolve(node)?;
        let old_name = self.name_of(&id);
        self.unindex(&old_name, &id);
        self.tree
            .get_mut(&id)
            .map_err(|_| SceneError::NotFound(node.to_owned()))?
            .data_mut()
            .name = new_name.to_owned();
        self.names
            .entry(new_name.to_owned())
            .or_default()
            .push(id);
        for selected in &mut self.selection {
            if *selected == old_name {
                new_name.clone_into(selected);
            }
        }
        Ok(new_name.to_owned())
    }
    fn delete(&mut self, node: &str) -> Result<(), SceneError> {
        let id = self.resolve(node)?;
        let removed: Vec<(NodeId, String)> = self
            .tree
            .traverse_pre_order_ids(&id)
            .map_err(|_| SceneError::NotFound(node.to_owned()))?
            .map(|id| {
                let name = self.name_of(&id);
                (id, name)
            })
            .collect();
        self.tree
            .remove_node(id, RemoveBehavior::DropChildren)
            .map_err(|_| SceneError::NotFound(node.to_owned()))?;
        for (id, name) in &removed {
            self.unindex(name, id);
        }
        let names = &self.names;
        self.selection.retain(|selected| names.contains_key(selected));
        Ok(())
    }
    fn selection(&self) -> Vec<String> {
        self.selection.clone()
    }
    fn select(&mut self, names: &[&str]) -> Result<(), SceneError> {
        for name in names {
            self.resolve(name)?;
        }
        self.selection = names.iter().map(|name| (*name).to_owned()).collect();
        Ok(())
    }
    fn set_visibility(&mut self, node: &str, visible: bool) -> Result<(), SceneError> {
        self.node_mut(node)?.visible = visible;
        Ok(())
    }
    fn visibility(&self, node: &str) -> Result<bool, SceneError> {
        Ok(self.node(node)?.visible)
    }
    fn set_display_override(
        &mut self,
        node: &str,
        display: DisplayOverride,
    ) -> Result<(), SceneError> {
        self.node_mut(node)?.display = display;
        Ok(())
    }
    fn display_override(&self, node: &str) -> Result<DisplayOverride, SceneError> {
        Ok(self.node(node)?.display)
    }
    fn shader_of(&self, node: &str) -> Result<Option<String>, SceneError> {
        Ok(self.node(node)?.shader.clone())
    }
    fn assign_shader(&mut self, node: &str, shader: &str) -> Result<(), SceneError> {
        let id = self.resolve(node)?;
        // Binding a group binds everything under it.
        let subtree: Vec<NodeId> = self
            .tree
            .traverse_pre_order_ids(&id)
            .map_err(|_| SceneError::NotFound(node.to_owned()))?
            .collect();
        for id in &subtree {
            if let Ok(node) = self.tree.get_mut(id) {
                node.data_mut().shader = Some(shader.to_owned());
            }
        }
        Ok(())
    }
    fn run_procedure(&mut self, procedure: &str, source: &str) -> Result<(), SceneError> {
        log::trace!("running {procedure:?} on {source:?}");
        match self.procedures.get(procedure).cloned() {
            None => Err(SceneError::UnknownProcedure(procedure.to_owned())),
            Some(Procedure::Fail(reason)) => Err(SceneError::ProcedureFailed {
                procedure: procedure.to_owned(),
                reason,
            }),
            Some(Procedure::Duplicate) => self.duplicate(source),
        }
    }
}
