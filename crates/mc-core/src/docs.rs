use crate::error::{McError, Result};
use crate::frontmatter::{self, DocFrontmatter};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::{Component, Path, PathBuf};

const MARKDOWN_EXTS: &[&str] = &["md", "mdx"];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Dir,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocTreeNode {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<DocTreeNode>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Doc {
    pub path: String,
    pub frontmatter: DocFrontmatter,
    pub content: String,
}

// ---------------------------------------------------------------------------
// Vault
// ---------------------------------------------------------------------------

/// A folder of markdown documents addressed by root-relative paths.
#[derive(Debug, Clone)]
pub struct Vault {
    root: PathBuf,
}

impl Vault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ensure_root(&self) -> Result<&Path> {
        crate::io::ensure_dir(&self.root)?;
        Ok(&self.root)
    }

    /// Map a user-supplied relative path to an absolute path inside the vault.
    pub fn resolve(&self, relative: &str) -> Result<(PathBuf, String)> {
        let normalized = normalize_relative_path(relative)?;
        let mut full = self.root.clone();
        let mut depth = 0usize;
        for component in Path::new(&normalized).components() {
            match component {
                Component::Normal(part) => {
                    full.push(part);
                    depth += 1;
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    if depth == 0 {
                        return Err(McError::InvalidDocPath(relative.to_string()));
                    }
                    full.pop();
                    depth -= 1;
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(McError::InvalidDocPath(relative.to_string()));
                }
            }
        }
        if depth == 0 {
            return Err(McError::InvalidDocPath(relative.to_string()));
        }
        Ok((full, normalized))
    }

    pub fn tree(&self) -> Result<Vec<DocTreeNode>> {
        self.ensure_root()?;
        build_tree(&self.root, "")
    }

    pub fn read(&self, relative: &str) -> Result<Doc> {
        self.ensure_root()?;
        let (full, normalized) = self.resolve(relative)?;
        let raw = match std::fs::read_to_string(&full) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(McError::DocNotFound(normalized));
            }
            Err(e) if full.is_dir() => {
                tracing::debug!(path = %full.display(), error = %e, "document path is a directory");
                return Err(McError::DocNotFound(normalized));
            }
            Err(e) => return Err(e.into()),
        };
        let (frontmatter, content) =
            frontmatter::parse(&raw).map_err(|e| McError::InvalidFrontmatter {
                path: normalized.clone(),
                reason: e.0,
            })?;
        Ok(Doc {
            path: normalized,
            frontmatter,
            content,
        })
    }

    /// Write `header + body` to the document, creating parent folders.
    /// Returns the normalized relative path.
    pub fn write(
        &self,
        relative: &str,
        content: Option<&str>,
        frontmatter: Option<&DocFrontmatter>,
    ) -> Result<String> {
        self.ensure_root()?;
        let (full, normalized) = self.resolve(relative)?;
        let header = frontmatter.map(frontmatter::serialize).unwrap_or_default();
        let body = content.unwrap_or_default();
        crate::io::atomic_write(&full, format!("{header}{body}").as_bytes())?;
        tracing::debug!(path = %normalized, bytes = header.len() + body.len(), "document written");
        Ok(normalized)
    }
}

/// Clean a relative document path: forward slashes, no leading slash, and a
/// `.md` extension when the final segment has none.
pub fn normalize_relative_path(input: &str) -> Result<String> {
    let cleaned = input.replace('\\', "/");
    let cleaned = cleaned.trim_start_matches('/');
    if cleaned.is_empty() {
        return Err(McError::InvalidDocPath(input.to_string()));
    }
    if has_extension(cleaned) {
        Ok(cleaned.to_string())
    } else {
        Ok(format!("{cleaned}.md"))
    }
}

/// Extension of the last segment, ignoring a leading dot (`.notes` has none).
fn has_extension(path: &str) -> bool {
    let last = path.rsplit('/').next().unwrap_or(path);
    match last.rfind('.') {
        Some(0) | None => false,
        Some(i) => i + 1 < last.len(),
    }
}

fn is_markdown_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| MARKDOWN_EXTS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn strip_markdown_ext(name: &str) -> String {
    match name.rfind('.') {
        Some(i) if is_markdown_file(name) => name[..i].to_string(),
        _ => name.to_string(),
    }
}

fn name_order(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

fn build_tree(directory: &Path, relative_base: &str) -> Result<Vec<DocTreeNode>> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();

    for entry in std::fs::read_dir(directory)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let relative = if relative_base.is_empty() {
            name.clone()
        } else {
            format!("{relative_base}/{name}")
        };
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            let children = build_tree(&entry.path(), &relative)?;
            dirs.push(DocTreeNode {
                name,
                path: relative,
                kind: NodeKind::Dir,
                children: Some(children),
            });
        } else if file_type.is_file() && is_markdown_file(&name) {
            files.push(DocTreeNode {
                name: strip_markdown_ext(&name),
                path: relative,
                kind: NodeKind::File,
                children: None,
            });
        }
    }

    dirs.sort_by(|a, b| name_order(&a.name, &b.name));
    files.sort_by(|a, b| name_order(&a.name, &b.name));
    dirs.extend(files);
    Ok(dirs)
}

/// Depth-first list of every file node in the tree.
pub fn flatten(tree: &[DocTreeNode]) -> Vec<DocTreeNode> {
    let mut files = Vec::new();
    visit(tree, &mut files);
    files
}

fn visit(nodes: &[DocTreeNode], out: &mut Vec<DocTreeNode>) {
    for node in nodes {
        match node.kind {
            NodeKind::File => out.push(node.clone()),
            NodeKind::Dir => {
                if let Some(children) = &node.children {
                    visit(children, out);
                }
            }
        }
    }
}

/// Render GitHub-flavoured markdown to HTML for the document viewer.
pub fn render_html(markdown: &str) -> String {
    use pulldown_cmark::{html, Options, Parser};

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn vault(dir: &TempDir) -> Vault {
        Vault::new(dir.path().join("documents"))
    }

    #[test]
    fn normalize_appends_md_and_strips_slashes() {
        assert_eq!(normalize_relative_path("/notes/today").unwrap(), "notes/today.md");
        assert_eq!(normalize_relative_path("a\\b\\c.mdx").unwrap(), "a/b/c.mdx");
        assert_eq!(normalize_relative_path("plan.txt").unwrap(), "plan.txt");
        assert_eq!(normalize_relative_path("v1.2/readme").unwrap(), "v1.2/readme.md");
        assert_eq!(normalize_relative_path(".hidden").unwrap(), ".hidden.md");
        assert!(normalize_relative_path("///").is_err());
    }

    #[test]
    fn resolve_rejects_escape() {
        let dir = TempDir::new().unwrap();
        let v = vault(&dir);
        assert!(matches!(
            v.resolve("../secrets"),
            Err(McError::InvalidDocPath(_))
        ));
        assert!(matches!(
            v.resolve("a/../../b"),
            Err(McError::InvalidDocPath(_))
        ));
        let (full, normalized) = v.resolve("a/./b/../c").unwrap();
        assert_eq!(normalized, "a/./b/../c.md");
        assert_eq!(full, dir.path().join("documents/a/c.md"));
    }

    #[test]
    fn tree_orders_dirs_before_files() {
        let dir = TempDir::new().unwrap();
        let v = vault(&dir);
        let root = v.ensure_root().unwrap().to_path_buf();
        std::fs::create_dir_all(root.join("zeta")).unwrap();
        std::fs::create_dir_all(root.join("Alpha/inner")).unwrap();
        std::fs::create_dir_all(root.join(".git")).unwrap();
        std::fs::write(root.join("b.md"), "b").unwrap();
        std::fs::write(root.join("A.MDX"), "a").unwrap();
        std::fs::write(root.join("image.png"), "x").unwrap();
        std::fs::write(root.join(".draft.md"), "x").unwrap();
        std::fs::write(root.join("Alpha/inner/deep.md"), "d").unwrap();

        let tree = v.tree().unwrap();
        let names: Vec<&str> = tree.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "zeta", "A", "b"]);
        assert_eq!(tree[0].kind, NodeKind::Dir);
        assert_eq!(tree[2].path, "A.MDX");

        let inner = &tree[0].children.as_ref().unwrap()[0];
        assert_eq!(inner.path, "Alpha/inner");
        assert_eq!(inner.children.as_ref().unwrap()[0].path, "Alpha/inner/deep.md");
        assert_eq!(tree[1].children.as_deref(), Some(&[][..]));
    }

    #[test]
    fn flatten_collects_files_depth_first() {
        let dir = TempDir::new().unwrap();
        let v = vault(&dir);
        v.write("projects/alpha", Some("a"), None).unwrap();
        v.write("inbox", Some("i"), None).unwrap();
        let files = flatten(&v.tree().unwrap());
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["projects/alpha.md", "inbox.md"]);
    }

    #[test]
    fn write_then_read_roundtrips() {
        let dir = TempDir::new().unwrap();
        let v = vault(&dir);
        let fm = DocFrontmatter {
            title: Some("Launch".into()),
            date: Some("2026-02-01".into()),
            tags: Some(vec!["ship".into()]),
            ..Default::default()
        };
        let path = v.write("plans/launch", Some("# Launch\n"), Some(&fm)).unwrap();
        assert_eq!(path, "plans/launch.md");

        let raw = std::fs::read_to_string(dir.path().join("documents/plans/launch.md")).unwrap();
        assert!(raw.starts_with("---\ntitle: \"Launch\"\n"));

        let doc = v.read("plans/launch").unwrap();
        assert_eq!(doc.path, "plans/launch.md");
        assert_eq!(doc.frontmatter, fm);
        assert_eq!(doc.content, "# Launch\n");
    }

    #[test]
    fn write_without_frontmatter_is_plain_body() {
        let dir = TempDir::new().unwrap();
        let v = vault(&dir);
        v.write("plain", Some("just text"), Some(&DocFrontmatter::default()))
            .unwrap();
        let raw = std::fs::read_to_string(dir.path().join("documents/plain.md")).unwrap();
        assert_eq!(raw, "just text");
    }

    #[test]
    fn read_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let v = vault(&dir);
        assert!(matches!(v.read("ghost"), Err(McError::DocNotFound(p)) if p == "ghost.md"));
    }

    #[test]
    fn read_bad_frontmatter_is_invalid() {
        let dir = TempDir::new().unwrap();
        let v = vault(&dir);
        v.write("broken", Some("---\ntitle: [x\n---\nbody"), None)
            .unwrap();
        assert!(matches!(
            v.read("broken"),
            Err(McError::InvalidFrontmatter { .. })
        ));
    }

    #[test]
    fn render_html_supports_tables_and_tasks() {
        let html = render_html("| a | b |\n|---|---|\n| 1 | 2 |\n\n- [x] done\n~~old~~");
        assert!(html.contains("<table>"));
        assert!(html.contains("type=\"checkbox\""));
        assert!(html.contains("<del>old</del>"));
    }
}
