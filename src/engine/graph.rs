use std::collections::{HashMap, HashSet, VecDeque};

use crate::engine::error::GraphError;
use crate::schema::field_model::Field;

/// Dependency edges between fields, derived from `dependsOn`.
///
/// Built once per schema load or edit. Parents are kept in declared order,
/// children in schema order. Every edge points forward in the field order,
/// so the graph is acyclic by construction.
#[derive(Debug, Clone, Default)]
pub struct FieldGraph {
    order: Vec<String>,
    position: HashMap<String, usize>,
    parents: HashMap<String, Vec<String>>,
    children: HashMap<String, Vec<String>>,
}

impl FieldGraph {
    pub fn build(fields: &[Field]) -> Result<Self, GraphError> {
        let mut graph = FieldGraph::default();

        for (i, field) in fields.iter().enumerate() {
            if graph.position.insert(field.id.clone(), i).is_some() {
                return Err(GraphError::DuplicateFieldId(field.id.clone()));
            }
            graph.order.push(field.id.clone());
        }

        for (i, field) in fields.iter().enumerate() {
            let Some(dep) = field.dependency() else {
                continue;
            };

            let mut parents: Vec<String> = Vec::new();
            for parent in dep.depends_on.ids() {
                if parent == field.id {
                    return Err(GraphError::SelfDependency(field.id.clone()));
                }
                let Some(&parent_pos) = graph.position.get(parent) else {
                    return Err(GraphError::UnknownParent {
                        field: field.id.clone(),
                        parent: parent.to_string(),
                    });
                };
                if parent_pos > i {
                    return Err(GraphError::ParentAfterChild {
                        field: field.id.clone(),
                        parent: parent.to_string(),
                    });
                }
                if !parents.iter().any(|p| p == parent) {
                    parents.push(parent.to_string());
                }
            }

            for parent in &parents {
                graph
                    .children
                    .entry(parent.clone())
                    .or_default()
                    .push(field.id.clone());
            }
            if !parents.is_empty() {
                graph.parents.insert(field.id.clone(), parents);
            }
        }

        Ok(graph)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position.contains_key(id)
    }

    /// Field ids in schema order.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn children(&self, id: &str) -> &[String] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn parents(&self, id: &str) -> &[String] {
        self.parents.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_parents(&self, id: &str) -> bool {
        self.parents.contains_key(id)
    }

    /// Every field reachable through child edges from `id`, excluding `id`,
    /// breadth first. Fields reachable along several paths appear once.
    pub fn descendants(&self, id: &str) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut out = Vec::new();
        let mut queue: VecDeque<&str> = self.children(id).iter().map(String::as_str).collect();

        while let Some(next) = queue.pop_front() {
            if !seen.insert(next) {
                continue;
            }
            out.push(next.to_string());
            queue.extend(self.children(next).iter().map(String::as_str));
        }

        out
    }

    /// `id` followed by its descendants.
    pub fn subtree(&self, id: &str) -> Vec<String> {
        let mut ids = vec![id.to_string()];
        ids.extend(self.descendants(id));
        ids
    }

    /// Maximal chains starting at fields without parents, for reporting.
    pub fn chains(&self) -> Vec<Vec<String>> {
        let mut chains = Vec::new();
        for root in &self.order {
            if self.has_parents(root) || self.children(root).is_empty() {
                continue;
            }
            let mut path = vec![root.clone()];
            self.walk_chains(root, &mut path, &mut chains);
        }
        chains
    }

    fn walk_chains(&self, id: &str, path: &mut Vec<String>, out: &mut Vec<Vec<String>>) {
        let children = self.children(id);
        if children.is_empty() {
            out.push(path.clone());
            return;
        }
        for child in children {
            path.push(child.clone());
            self.walk_chains(child, path, out);
            path.pop();
        }
    }
}
