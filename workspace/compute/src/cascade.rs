use model::CategoryId;
use std::collections::HashSet;
use tracing::{debug, instrument};

use crate::error::{ComputeError, Result};
use crate::forest::{CategoryNode, find_node};

/// The set of categories removed when one category is deleted.
///
/// Ids are kept in deletion order: every child precedes its parent and the target
/// comes last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadePlan {
    pub target: CategoryId,
    pub target_title: String,
    deletion_order: Vec<CategoryId>,
}

impl CascadePlan {
    pub fn deletion_order(&self) -> &[CategoryId] {
        &self.deletion_order
    }

    /// Descendants of the target, without the target itself.
    pub fn descendants(&self) -> &[CategoryId] {
        &self.deletion_order[..self.deletion_order.len() - 1]
    }

    pub fn contains(&self, id: CategoryId) -> bool {
        self.deletion_order.contains(&id)
    }

    /// Total number of categories the plan removes.
    pub fn len(&self) -> usize {
        self.deletion_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deletion_order.is_empty()
    }
}

/// Computes which categories a deletion of `target` removes.
#[instrument(skip(forest), fields(target = %target))]
pub fn plan_cascade(forest: &[CategoryNode], target: CategoryId) -> Result<CascadePlan> {
    let root = find_node(forest, target).ok_or(ComputeError::UnknownCategory(target))?;

    let mut deletion_order = Vec::new();
    let mut visited: HashSet<CategoryId> = HashSet::new();
    // (node, children already pushed)
    let mut stack: Vec<(&CategoryNode, bool)> = vec![(root, false)];

    while let Some((node, expanded)) = stack.pop() {
        if expanded {
            deletion_order.push(node.id());
            continue;
        }
        if !visited.insert(node.id()) {
            continue;
        }
        stack.push((node, true));
        for child in node.children.iter().rev() {
            if !visited.contains(&child.id()) {
                stack.push((child, false));
            }
        }
    }

    debug!(count = deletion_order.len(), "Cascade planned");
    Ok(CascadePlan {
        target,
        target_title: root.title().to_string(),
        deletion_order,
    })
}
