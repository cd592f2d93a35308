//! Symbol resolution: walks the AST, builds the nested scope tree, and binds
//! every name use to its declaration.

use log::debug;

use crate::ast::{Assignee, Node, NodeKind};
use crate::error::ResolverError;
use crate::symbol_table::{SymbolKind, SymbolTable};

/// Annotates `root` in place with scopes and symbol bindings, using
/// children-before-self (post-order) visitation: most annotations depend
/// only on the local node, so descending first keeps each handler simple.
/// Returns the global symbol table backing every scope created during the
/// walk, so `CodeGenerator` can later revisit a function's scope by the
/// `ScopeId` stamped onto its node.
pub fn resolve_symbols(root: &mut Node) -> Result<SymbolTable, ResolverError> {
    let global = SymbolTable::new();
    resolve_node(root, &global)?;
    Ok(global)
}

fn resolve_node(node: &mut Node, scope: &SymbolTable) -> Result<(), ResolverError> {
    if resolve_special(node, scope)? {
        return Ok(());
    }
    for child in node.subnodes_mut() {
        resolve_node(child, scope)?;
    }
    Ok(())
}

/// Handles the node kinds the resolver special-cases. Returns `Ok(true)` if
/// `node` was one of them (fully handled); `Ok(false)` if the caller should
/// fall back to generic child traversal.
fn resolve_special(node: &mut Node, scope: &SymbolTable) -> Result<bool, ResolverError> {
    match &mut node.kind {
        NodeKind::FunctionDeclaration { name: _, params, body } => {
            let child_scope = scope.new_child(0);
            for param in params.iter() {
                // Parameters are bound directly into the new scope rather
                // than relying on the body containing a matching
                // declare-variable per parameter.
                child_scope.define(param, SymbolKind::Variable)?;
            }
            resolve_node(body, &child_scope)?;
            node.scope = Some(child_scope.scope_id());
            Ok(true)
        }
        NodeKind::DeclareVariable { name, initializer } => {
            if let Some(init) = initializer {
                resolve_node(init, scope)?;
            }
            if scope.is_defined_locally(name) {
                return Err(ResolverError::DuplicateDefinition(name.clone()));
            }
            let symbol = scope.define(name, SymbolKind::Variable)?;
            node.symbol = Some(symbol);
            Ok(true)
        }
        NodeKind::DeclareConstant { name, initializer } => {
            if let Some(init) = initializer {
                resolve_node(init, scope)?;
            }
            if scope.is_defined_locally(name) {
                return Err(ResolverError::DuplicateDefinition(name.clone()));
            }
            let symbol = scope.define(name, SymbolKind::Constant)?;
            node.symbol = Some(symbol);
            Ok(true)
        }
        NodeKind::AccessVariable { name } => {
            let symbol = scope
                .get(name)
                .ok_or_else(|| ResolverError::UndeclaredName(name.clone()))?;
            node.symbol = Some(symbol);
            Ok(true)
        }
        NodeKind::AssignmentStatement { assignee, expression } => {
            resolve_node(expression, scope)?;
            match assignee {
                Assignee::Single(name) => {
                    let symbol = resolve_assignment_target(name, scope)?;
                    node.symbol = Some(symbol);
                }
                Assignee::Multi(names) => {
                    let mut symbols = Vec::with_capacity(names.len());
                    for name in names.iter() {
                        symbols.push(resolve_assignment_target(name, scope)?);
                    }
                    node.symbols = Some(symbols);
                }
            }
            Ok(true)
        }
        NodeKind::IfStatement { condition, if_block, else_block } => {
            resolve_node(condition, scope)?;
            // No new scope is introduced here; ifBlock/elseBlock see the
            // enclosing scope's bindings directly.
            resolve_node(if_block, scope)?;
            if let Some(else_block) = else_block {
                resolve_node(else_block, scope)?;
            }
            Ok(true)
        }
        _ => Ok(false),
    }
}

fn resolve_assignment_target(name: &str, scope: &SymbolTable) -> Result<crate::symbol_table::Symbol, ResolverError> {
    let symbol = scope
        .get(name)
        .ok_or_else(|| ResolverError::UndeclaredName(name.to_string()))?;
    if symbol.kind() != SymbolKind::Variable {
        return Err(ResolverError::AssignToConstant(name.to_string()));
    }
    debug!("bound assignment target '{}'", name);
    Ok(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Node;

    #[test]
    fn duplicate_declaration_in_same_scope_fails() {
        let mut root = Node::block(vec![
            Node::declare_variable("x", Some(Node::number(1.0))),
            Node::declare_variable("x", Some(Node::number(2.0))),
        ]);
        let err = resolve_symbols(&mut root).unwrap_err();
        assert_eq!(err, ResolverError::DuplicateDefinition("x".to_string()));
    }

    #[test]
    fn undeclared_access_fails() {
        let mut root = Node::expr_statement(Node::access_variable("missing"));
        let err = resolve_symbols(&mut root).unwrap_err();
        assert_eq!(err, ResolverError::UndeclaredName("missing".to_string()));
    }

    #[test]
    fn assignment_to_constant_fails() {
        let mut root = Node::block(vec![
            Node::declare_constant("c", Some(Node::number(1.0))),
            Node::new(NodeKind::AssignmentStatement {
                assignee: Assignee::Single("c".to_string()),
                expression: Box::new(Node::number(2.0)),
            }),
        ]);
        let err = resolve_symbols(&mut root).unwrap_err();
        assert_eq!(err, ResolverError::AssignToConstant("c".to_string()));
    }

    #[test]
    fn inner_scope_shadows_outer_without_colliding() {
        let mut root = Node::block(vec![
            Node::declare_variable("x", Some(Node::number(1.0))),
            Node::new(NodeKind::IfStatement {
                condition: Box::new(Node::number(1.0)),
                if_block: Box::new(Node::block(vec![Node::declare_variable(
                    "y",
                    Some(Node::access_variable("x")),
                )])),
                else_block: None,
            }),
        ]);
        assert!(resolve_symbols(&mut root).is_ok());
    }

    #[test]
    fn function_parameters_are_bound_in_the_new_scope() {
        let mut root = Node::new(NodeKind::FunctionDeclaration {
            name: "add".to_string(),
            params: vec!["a".to_string(), "b".to_string()],
            body: Box::new(Node::return_statement(Node::operation(
                "+",
                vec![Node::access_variable("a"), Node::access_variable("b")],
            ))),
        });
        resolve_symbols(&mut root).unwrap();
        let scope_id = root.scope.expect("function scope recorded");
        assert_eq!(scope_id.index(), 1);
    }

    #[test]
    fn function_scope_positions_are_a_permutation_of_one_to_n() {
        let mut root = Node::new(NodeKind::FunctionDeclaration {
            name: "f".to_string(),
            params: vec!["a".to_string(), "b".to_string()],
            body: Box::new(Node::block(vec![Node::declare_variable(
                "c",
                Some(Node::number(0.0)),
            )])),
        });
        let table = resolve_symbols(&mut root).unwrap();
        let scope_id = root.scope.expect("function scope recorded");
        let func_scope = table.at(scope_id);
        assert_eq!(func_scope.get_num_symbols(), 3);
        let mut positions: Vec<u32> = ["a", "b", "c"]
            .iter()
            .map(|name| func_scope.get(name).unwrap().position())
            .collect();
        positions.sort_unstable();
        assert_eq!(positions, vec![1, 2, 3]);
    }

    #[test]
    fn resolving_equivalent_trees_twice_yields_the_same_positions() {
        let make_tree = || {
            Node::block(vec![
                Node::declare_variable("x", Some(Node::number(1.0))),
                Node::declare_variable("y", Some(Node::number(2.0))),
            ])
        };
        let mut first = make_tree();
        let mut second = make_tree();
        resolve_symbols(&mut first).unwrap();
        resolve_symbols(&mut second).unwrap();
        let extract = |node: &Node| match &node.kind {
            NodeKind::Block(statements) => statements
                .iter()
                .map(|s| s.symbol.as_ref().unwrap().position())
                .collect::<Vec<_>>(),
            _ => panic!("expected block"),
        };
        assert_eq!(extract(&first), extract(&second));
    }
}
