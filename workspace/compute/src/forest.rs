use model::{Category, CategoryId};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

/// A category together with the categories that name it as parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryNode {
    pub category: Category,
    /// Children in the order they appeared in the source collection.
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    pub fn id(&self) -> CategoryId {
        self.category.id
    }

    pub fn title(&self) -> &str {
        &self.category.title
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Number of nodes in this subtree, the node itself included.
    pub fn size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }
}

/// Builds the category forest from a flat collection.
///
/// A category whose parent is absent or does not resolve to a category in the
/// collection becomes a root. Roots are sorted by title; children keep insertion
/// order. Malformed links never fail the build:
///
/// - a duplicate id keeps its first occurrence,
/// - a self-parent is treated as a root,
/// - a parent cycle is broken at its member listed first, which is promoted to
///   root; categories hanging below the cycle keep their parents, so each
///   category appears exactly once.
#[instrument(skip(categories), fields(count = categories.len()))]
pub fn build_forest(categories: &[Category]) -> Vec<CategoryNode> {
    let mut index: HashMap<CategoryId, usize> = HashMap::with_capacity(categories.len());
    let mut unique: Vec<&Category> = Vec::with_capacity(categories.len());
    for category in categories {
        if index.contains_key(&category.id) {
            warn!(id = %category.id, "Duplicate category id, keeping first occurrence");
            continue;
        }
        index.insert(category.id, unique.len());
        unique.push(category);
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); unique.len()];
    let mut parent_of: Vec<Option<usize>> = vec![None; unique.len()];
    let mut roots: Vec<usize> = Vec::new();
    for (position, category) in unique.iter().enumerate() {
        match category.parent.and_then(|parent| index.get(&parent).copied()) {
            Some(parent) if parent != position => {
                children[parent].push(position);
                parent_of[position] = Some(parent);
            }
            Some(_) => {
                warn!(id = %category.id, "Category is its own parent, treating as root");
                roots.push(position);
            }
            None => {
                if let Some(parent) = category.parent {
                    debug!(id = %category.id, %parent, "Parent not found, treating as root");
                }
                roots.push(position);
            }
        }
    }

    let mut visited = vec![false; unique.len()];
    let mut forest: Vec<CategoryNode> = roots
        .iter()
        .filter_map(|&root| assemble(root, &unique, &children, &mut visited))
        .collect();

    // Anything still unvisited hangs below a parent cycle that no root reaches.
    for position in 0..unique.len() {
        if visited[position] {
            continue;
        }
        let root = cycle_entry(position, &parent_of);
        warn!(id = %unique[root].id, "Parent cycle detected, promoting category to root");
        forest.extend(assemble(root, &unique, &children, &mut visited));
    }

    forest.sort_by(|a, b| compare_titles(a.title(), b.title()));
    debug!(roots = forest.len(), "Category forest built");
    forest
}

/// Follows parent links from `start` until they loop and returns the loop member
/// listed first.
fn cycle_entry(start: usize, parent_of: &[Option<usize>]) -> usize {
    let mut path: Vec<usize> = Vec::new();
    let mut on_path = vec![false; parent_of.len()];
    let mut position = start;
    loop {
        if on_path[position] {
            let from = path.iter().position(|&p| p == position).unwrap_or(0);
            return path[from..].iter().copied().min().unwrap_or(position);
        }
        on_path[position] = true;
        path.push(position);
        match parent_of[position] {
            Some(parent) => position = parent,
            // Unreachable for unvisited nodes: a chain ending in a root is assembled.
            None => return position,
        }
    }
}

/// Builds the subtree under `root`, skipping links back into placed nodes.
fn assemble(
    root: usize,
    categories: &[&Category],
    children: &[Vec<usize>],
    visited: &mut [bool],
) -> Option<CategoryNode> {
    // Pre-order walk deciding which nodes this subtree takes.
    let mut order = Vec::new();
    let mut stack = vec![root];
    while let Some(position) = stack.pop() {
        if visited[position] {
            continue;
        }
        visited[position] = true;
        order.push(position);
        stack.extend(children[position].iter().rev().filter(|&&child| !visited[child]));
    }

    // Reverse pre-order reaches every child before its parent.
    let mut built: HashMap<usize, CategoryNode> = HashMap::with_capacity(order.len());
    for &position in order.iter().rev() {
        let node = CategoryNode {
            category: categories[position].clone(),
            children: children[position]
                .iter()
                .filter_map(|child| built.remove(child))
                .collect(),
        };
        built.insert(position, node);
    }
    built.remove(&root)
}

/// Case-insensitive title ordering, falling back to the raw titles on ties.
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Flattens a forest back into categories, pre-order, roots first in forest order.
pub fn flatten(forest: &[CategoryNode]) -> Vec<Category> {
    let mut out = Vec::new();
    let mut stack: Vec<&CategoryNode> = forest.iter().rev().collect();
    while let Some(node) = stack.pop() {
        out.push(node.category.clone());
        stack.extend(node.children.iter().rev());
    }
    out
}

/// Finds a node anywhere in the forest.
pub fn find_node(forest: &[CategoryNode], id: CategoryId) -> Option<&CategoryNode> {
    let mut stack: Vec<&CategoryNode> = forest.iter().collect();
    while let Some(node) = stack.pop() {
        if node.id() == id {
            return Some(node);
        }
        stack.extend(node.children.iter());
    }
    None
}

/// Categories without a parent reference, sorted by title.
///
/// Used for the parent selector of the category form.
pub fn root_categories(categories: &[Category]) -> Vec<&Category> {
    let mut roots: Vec<&Category> = categories.iter().filter(|c| c.is_root()).collect();
    roots.sort_by(|a, b| compare_titles(&a.title, &b.title));
    roots
}
