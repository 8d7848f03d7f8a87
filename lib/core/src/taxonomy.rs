//! Taxonomy trees for categorical similarity
//!
//! A taxonomy is a curated hierarchy of category names. Every node carries a
//! relatedness value, and two categories are as similar as the value stored
//! on their nearest common ancestor. Leaves sharing a close parent therefore
//! score higher than leaves that only share the root.

use serde::{Deserialize, Serialize};

/// A node in a taxonomy tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyNode {
    pub name: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TaxonomyNode>,
}

impl TaxonomyNode {
    pub fn leaf(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            children: Vec::new(),
        }
    }

    pub fn branch(name: impl Into<String>, value: f64, children: Vec<TaxonomyNode>) -> Self {
        Self {
            name: name.into(),
            value,
            children,
        }
    }
}

/// Immutable taxonomy built once from a nested specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Taxonomy {
    root: TaxonomyNode,
}

impl Taxonomy {
    pub fn new(root: TaxonomyNode) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &TaxonomyNode {
        &self.root
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find_path(name).is_some()
    }

    /// Depth-first search for `name`, returning the nodes from the root down
    /// to the named node.
    pub fn find_path(&self, name: &str) -> Option<Vec<&TaxonomyNode>> {
        let mut path = Vec::new();
        if Self::descend(&self.root, name, &mut path) {
            Some(path)
        } else {
            None
        }
    }

    fn descend<'a>(node: &'a TaxonomyNode, name: &str, path: &mut Vec<&'a TaxonomyNode>) -> bool {
        path.push(node);
        if node.name == name {
            return true;
        }
        for child in &node.children {
            if Self::descend(child, name, path) {
                return true;
            }
        }
        path.pop();
        false
    }

    /// Longest common prefix of the root paths of all `names`.
    ///
    /// Nodes are compared by identity, not by name. Returns `None` when any
    /// name is missing from the tree or when `names` is empty.
    pub fn find_common_path(&self, names: &[&str]) -> Option<Vec<&TaxonomyNode>> {
        if names.is_empty() {
            return None;
        }

        let paths = names
            .iter()
            .map(|name| self.find_path(name))
            .collect::<Option<Vec<_>>>()?;

        let shortest = paths.iter().map(Vec::len).min().unwrap_or(0);
        let mut common = Vec::with_capacity(shortest);
        for depth in 0..shortest {
            let step = paths[0][depth];
            if paths.iter().any(|p| !std::ptr::eq(p[depth], step)) {
                break;
            }
            common.push(step);
        }
        Some(common)
    }

    /// Value configured on the named node itself
    pub fn find_value(&self, name: &str) -> Option<f64> {
        self.find_path(name)
            .and_then(|path| path.last().map(|node| node.value))
    }

    /// Value configured on the nearest common ancestor of `names`
    pub fn find_common_value(&self, names: &[&str]) -> Option<f64> {
        self.find_common_path(names)
            .and_then(|path| path.last().map(|node| node.value))
    }

    /// Names of all nodes in depth-first order
    pub fn names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            names.push(node.name.as_str());
            stack.extend(node.children.iter().rev());
        }
        names
    }
}
