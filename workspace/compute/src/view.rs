use model::CategoryId;
use std::collections::HashSet;
use tracing::warn;

use crate::forest::CategoryNode;

/// One visible line of the category tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub id: CategoryId,
    pub title: String,
    pub description: Option<String>,
    /// 0 for roots.
    pub depth: usize,
    pub has_children: bool,
    pub expanded: bool,
}

/// Lists the rows to display, descending only into nodes whose id is in `expanded`.
///
/// The walk is iterative and remembers every id it emitted, so a node met twice is
/// shown once and the repeated edge is ignored.
pub fn visible_rows(forest: &[CategoryNode], expanded: &HashSet<CategoryId>) -> Vec<TreeRow> {
    let mut rows = Vec::new();
    let mut seen: HashSet<CategoryId> = HashSet::new();
    let mut stack: Vec<(&CategoryNode, usize)> = forest.iter().rev().map(|n| (n, 0)).collect();

    while let Some((node, depth)) = stack.pop() {
        if !seen.insert(node.id()) {
            warn!(id = %node.id(), "Category reached twice while rendering, skipping");
            continue;
        }
        let is_expanded = expanded.contains(&node.id());
        rows.push(TreeRow {
            id: node.id(),
            title: node.category.title.clone(),
            description: node.category.description.clone(),
            depth,
            has_children: node.has_children(),
            expanded: is_expanded,
        });
        if is_expanded {
            stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::build_forest;
    use model::Category;

    fn sample() -> (Vec<CategoryNode>, Category, Category, Category) {
        let food = Category::new(CategoryId::new_random(), "Food");
        let groceries = Category::new(CategoryId::new_random(), "Groceries").with_parent(food.id);
        let bills = Category::new(CategoryId::new_random(), "Bills");
        let forest = build_forest(&[food.clone(), groceries.clone(), bills.clone()]);
        (forest, food, groceries, bills)
    }

    #[test]
    fn test_collapsed_shows_roots_only() {
        let (forest, food, _, bills) = sample();
        let rows = visible_rows(&forest, &HashSet::new());

        let ids: Vec<CategoryId> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![bills.id, food.id]);
        assert!(rows[1].has_children);
        assert!(!rows[1].expanded);
    }

    #[test]
    fn test_expanded_node_shows_children_indented() {
        let (forest, food, groceries, _) = sample();
        let expanded: HashSet<CategoryId> = [food.id].into_iter().collect();

        let rows = visible_rows(&forest, &expanded);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].id, groceries.id);
        assert_eq!(rows[2].depth, 1);
        assert!(rows[1].expanded);
    }

    #[test]
    fn test_shared_node_is_shown_once() {
        // Hand-built forest where the same node hangs under two parents.
        let shared = CategoryNode {
            category: Category::new(CategoryId::new_random(), "Shared"),
            children: Vec::new(),
        };
        let a = CategoryNode {
            category: Category::new(CategoryId::new_random(), "A"),
            children: vec![shared.clone()],
        };
        let b = CategoryNode {
            category: Category::new(CategoryId::new_random(), "B"),
            children: vec![shared.clone()],
        };
        let expanded: HashSet<CategoryId> = [a.id(), b.id()].into_iter().collect();

        let rows = visible_rows(&[a, b], &expanded);

        assert_eq!(rows.iter().filter(|r| r.id == shared.id()).count(), 1);
        assert_eq!(rows.len(), 3);
    }
}
