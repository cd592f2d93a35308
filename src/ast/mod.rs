mod ast_node;
mod scope;

pub use self::{
    ast_node::{Assignee, Node, NodeKind},
    scope::ScopeId,
};

/// Thin owner of a parsed program's root node. The parser that produces one
/// is out of scope here; this type exists so `resolve_symbols`/`compile`
/// have a named input type rather than a bare `Node`.
pub struct AbstractSyntaxTree {
    root: Node,
}

impl AbstractSyntaxTree {
    pub fn new(root: Node) -> Self {
        AbstractSyntaxTree { root }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Node {
        &mut self.root
    }

    pub fn into_root(self) -> Node {
        self.root
    }
}
