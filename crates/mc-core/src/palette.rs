use crate::docs::{self, DocTreeNode};
use serde::Serialize;

/// One openable document in the command palette.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaletteItem {
    pub name: String,
    pub path: String,
}

impl From<&DocTreeNode> for PaletteItem {
    fn from(node: &DocTreeNode) -> Self {
        Self {
            name: node.name.clone(),
            path: node.path.clone(),
        }
    }
}

pub fn items(tree: &[DocTreeNode]) -> Vec<PaletteItem> {
    docs::flatten(tree).iter().map(PaletteItem::from).collect()
}

/// Case-insensitive substring match on name or path, order preserved.
pub fn filter<'a>(items: &'a [PaletteItem], query: &str) -> Vec<&'a PaletteItem> {
    let needle = query.to_lowercase();
    items
        .iter()
        .filter(|item| {
            needle.is_empty()
                || item.name.to_lowercase().contains(&needle)
                || item.path.to_lowercase().contains(&needle)
        })
        .collect()
}

/// The entry opened when the query is submitted.
pub fn first_match<'a>(items: &'a [PaletteItem], query: &str) -> Option<&'a PaletteItem> {
    filter(items, query).into_iter().next()
}
