//! Page chrome: navigation bar and the outlet pages render into.

use crate::routes::Route;
use render_tree::{NodeId, SharedTree, Tree, TreeError};

/// A node removed from the tree when this handle drops.
pub struct OwnedNode {
    tree: SharedTree,
    node: NodeId,
}

impl OwnedNode {
    pub fn new(tree: &SharedTree, node: NodeId) -> Self {
        Self {
            tree: tree.clone(),
            node,
        }
    }

    pub fn id(&self) -> NodeId {
        self.node
    }
}

impl Drop for OwnedNode {
    fn drop(&mut self) {
        self.tree.lock().remove(self.node);
    }
}

/// Links shown in the navigation bar.
pub const NAV_LINKS: &[(&str, &str)] = &[
    ("/", "Home"),
    ("/about", "About"),
    ("/video/1", "Video 1"),
    ("/video/2", "Video 2"),
];

pub struct Layout {
    pub nav: NodeId,
    pub outlet: NodeId,
}

impl Layout {
    /// Render the navigation bar and an empty `<main>` outlet under `parent`.
    pub fn render(tree: &mut Tree, parent: NodeId) -> Result<Self, TreeError> {
        let shell = tree.create_element("div");
        tree.set_attribute(shell, "class", "min-h-screen")?;
        tree.append_child(parent, shell)?;

        let nav = tree.create_element("nav");
        tree.append_child(shell, nav)?;
        for (href, label) in NAV_LINKS {
            let link = link(tree, href, label)?;
            tree.append_child(nav, link)?;
        }

        let outlet = tree.create_element("main");
        tree.append_child(shell, outlet)?;
        Ok(Self { nav, outlet })
    }

    /// Mark the nav link for `route` active.
    pub fn highlight(&self, tree: &mut Tree, route: &Route) -> Result<(), TreeError> {
        let path = route.path();
        let links: Vec<NodeId> = tree.children(self.nav).to_vec();
        for link in links {
            if tree.attribute(link, "href") == Some(path.as_str()) {
                tree.set_attribute(link, "aria-current", "page")?;
            } else {
                tree.remove_attribute(link, "aria-current");
            }
        }
        Ok(())
    }
}

/// `<a href=..>label</a>`, detached.
pub fn link(tree: &mut Tree, href: &str, label: &str) -> Result<NodeId, TreeError> {
    let link = tree.create_element("a");
    tree.set_attribute(link, "href", href)?;
    let text = tree.create_text(label);
    tree.append_child(link, text)?;
    Ok(link)
}

/// `<tag>text</tag>`, detached.
pub fn text_element(tree: &mut Tree, tag: &str, text: &str) -> Result<NodeId, TreeError> {
    let element = tree.create_element(tag);
    let leaf = tree.create_text(text);
    tree.append_child(element, leaf)?;
    Ok(element)
}
