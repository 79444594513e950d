use std::collections::HashMap;

use thiserror::Error;

use super::model::Collection;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("malformed collection hierarchy: {0}")]
    MalformedHierarchy(String),
}

fn malformed(reason: impl Into<String>) -> TreeError {
    TreeError::MalformedHierarchy(reason.into())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeSource {
    Collection(Collection),
    /// Fabricated parent for libraries with several top-level collections.
    /// It has no items of its own.
    SyntheticRoot { name: String },
}

impl NodeSource {
    pub fn name(&self) -> &str {
        match self {
            NodeSource::Collection(collection) => &collection.name,
            NodeSource::SyntheticRoot { name } => name,
        }
    }

    pub fn collection(&self) -> Option<&Collection> {
        match self {
            NodeSource::Collection(collection) => Some(collection),
            NodeSource::SyntheticRoot { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub source: NodeSource,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn name(&self) -> &str {
        self.source.name()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionTree {
    root: TreeNode,
}

impl CollectionTree {
    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Node count, synthetic root included. Never zero.
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// Pre-order walk, children in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &TreeNode> {
        let mut stack = vec![&self.root];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }
}

/// Builds the collection hierarchy from a flat list of collections.
///
/// A single parentless collection becomes the root. Several (or none) are only
/// accepted when `synthetic_root` names a node to hang them under. Duplicate
/// keys, parent keys missing from `collections` and cycles are rejected.
pub fn build_tree(
    collections: Vec<Collection>,
    synthetic_root: Option<&str>,
) -> Result<CollectionTree, TreeError> {
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(collections.len());
    for (pos, collection) in collections.iter().enumerate() {
        if index.insert(collection.key.as_str(), pos).is_some() {
            return Err(malformed(format!(
                "duplicate collection key {}",
                collection.key
            )));
        }
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); collections.len()];
    let mut roots = Vec::new();
    for (pos, collection) in collections.iter().enumerate() {
        let Some(parent_key) = collection.parent_key.as_deref() else {
            roots.push(pos);
            continue;
        };
        let Some(&parent) = index.get(parent_key) else {
            return Err(malformed(format!(
                "collection {} refers to unknown parent {parent_key}",
                collection.key
            )));
        };
        children[parent].push(pos);
    }

    let mut slots: Vec<Option<Collection>> = collections.into_iter().map(Some).collect();
    let root = match (roots.as_slice(), synthetic_root) {
        ([only], _) => assemble(*only, &mut slots, &children)?,
        (_, Some(name)) => TreeNode {
            source: NodeSource::SyntheticRoot {
                name: name.to_string(),
            },
            children: roots
                .iter()
                .map(|pos| assemble(*pos, &mut slots, &children))
                .collect::<Result<_, _>>()?,
        },
        ([], None) => return Err(malformed("no top-level collection")),
        (many, None) => {
            return Err(malformed(format!(
                "{} top-level collections and no synthetic root",
                many.len()
            )));
        }
    };

    let unreachable: Vec<&str> = slots
        .iter()
        .flatten()
        .map(|collection| collection.key.as_str())
        .collect();
    if !unreachable.is_empty() {
        return Err(malformed(format!(
            "parent cycle through {}",
            unreachable.join(", ")
        )));
    }

    Ok(CollectionTree { root })
}

fn assemble(
    pos: usize,
    slots: &mut [Option<Collection>],
    children: &[Vec<usize>],
) -> Result<TreeNode, TreeError> {
    let collection = slots[pos]
        .take()
        .ok_or_else(|| malformed("collection reached twice"))?;
    let nested = children[pos]
        .iter()
        .map(|child| assemble(*child, slots, children))
        .collect::<Result<_, _>>()?;
    Ok(TreeNode {
        source: NodeSource::Collection(collection),
        children: nested,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(node: &TreeNode) -> Vec<&str> {
        node.children.iter().map(TreeNode::name).collect()
    }

    #[test]
    fn single_natural_root_becomes_tree_root() {
        let tree = build_tree(
            vec![
                Collection::new("B", "Papers", Some("A")),
                Collection::new("A", "Root", None),
                Collection::new("C", "Talks", Some("A")),
                Collection::new("D", "2024", Some("B")),
            ],
            None,
        )
        .unwrap();

        let root = tree.root();
        assert_eq!(root.name(), "Root");
        assert_eq!(names(root), ["Papers", "Talks"]);
        assert_eq!(names(&root.children[0]), ["2024"]);
        assert!(root.children[1].is_leaf());
        assert_eq!(tree.node_count(), 4);
    }

    #[test]
    fn every_collection_appears_once() {
        let tree = build_tree(
            vec![
                Collection::new("A", "Root", None),
                Collection::new("B", "One", Some("A")),
                Collection::new("C", "Two", Some("B")),
                Collection::new("D", "Three", Some("C")),
                Collection::new("E", "Four", Some("A")),
            ],
            None,
        )
        .unwrap();

        let mut keys: Vec<&str> = tree
            .iter()
            .filter_map(|node| node.source.collection())
            .map(|c| c.key.as_str())
            .collect();
        keys.sort();
        assert_eq!(keys, ["A", "B", "C", "D", "E"]);
    }

    #[test]
    fn pre_order_iteration_visits_parents_first() {
        let tree = build_tree(
            vec![
                Collection::new("A", "Root", None),
                Collection::new("B", "B", Some("A")),
                Collection::new("C", "C", Some("B")),
                Collection::new("D", "D", Some("A")),
            ],
            None,
        )
        .unwrap();

        let order: Vec<&str> = tree.iter().map(TreeNode::name).collect();
        assert_eq!(order, ["Root", "B", "C", "D"]);
    }

    #[test]
    fn synthetic_root_adopts_all_top_level_collections() {
        let tree = build_tree(
            vec![
                Collection::new("A", "Reading", None),
                Collection::new("B", "Writing", None),
                Collection::new("C", "Drafts", Some("B")),
            ],
            Some("Lab Library"),
        )
        .unwrap();

        let root = tree.root();
        assert_eq!(
            root.source,
            NodeSource::SyntheticRoot {
                name: "Lab Library".to_string()
            }
        );
        assert!(root.source.collection().is_none());
        assert_eq!(names(root), ["Reading", "Writing"]);
        assert_eq!(names(&root.children[1]), ["Drafts"]);
        assert_eq!(tree.node_count(), 4);
    }

    #[test]
    fn empty_library_with_synthetic_root_is_a_lone_node() {
        let tree = build_tree(Vec::new(), Some("Empty")).unwrap();
        assert_eq!(tree.root().name(), "Empty");
        assert!(tree.root().is_leaf());
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn two_roots_without_synthetic_root_fail() {
        let err = build_tree(
            vec![
                Collection::new("A", "One", None),
                Collection::new("B", "Two", None),
            ],
            None,
        )
        .unwrap_err();
        assert!(matches!(err, TreeError::MalformedHierarchy(_)));
    }

    #[test]
    fn unknown_parent_fails_even_with_synthetic_root() {
        let err = build_tree(
            vec![
                Collection::new("A", "Root", None),
                Collection::new("B", "Orphan", Some("Z")),
            ],
            Some("Library"),
        )
        .unwrap_err();
        assert_eq!(
            err,
            TreeError::MalformedHierarchy("collection B refers to unknown parent Z".to_string())
        );
    }

    #[test]
    fn duplicate_keys_fail() {
        let err = build_tree(
            vec![
                Collection::new("A", "Root", None),
                Collection::new("A", "Again", None),
            ],
            Some("Library"),
        )
        .unwrap_err();
        assert!(matches!(err, TreeError::MalformedHierarchy(_)));
    }

    #[test]
    fn cycle_detached_from_root_fails() {
        let err = build_tree(
            vec![
                Collection::new("A", "Root", None),
                Collection::new("B", "Loop1", Some("C")),
                Collection::new("C", "Loop2", Some("B")),
            ],
            None,
        )
        .unwrap_err();
        assert_eq!(
            err,
            TreeError::MalformedHierarchy("parent cycle through B, C".to_string())
        );
    }

    #[test]
    fn self_parent_fails() {
        let err = build_tree(vec![Collection::new("A", "Me", Some("A"))], None).unwrap_err();
        assert_eq!(
            err,
            TreeError::MalformedHierarchy("no top-level collection".to_string())
        );
    }
}
