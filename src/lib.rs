//! Lowers a resolved AST into the target assembly dialect: binds names to
//! scratch slots via [`resolver::resolve_symbols`], then lowers the
//! annotated tree via [`codegen::CodeGenerator`]. Parsing, linking, and the
//! runtime the emitted program executes against are all out of scope here.

mod ast;
mod codegen;
mod config;
mod error;
mod resolver;
mod symbol_table;

pub use ast::{AbstractSyntaxTree, Assignee, Node, NodeKind, ScopeId};
pub use codegen::CodeGenerator;
pub use config::Config;
pub use error::{CompileError, GeneratorError, ResolverError, StackUnderflow};
pub use resolver::resolve_symbols;
pub use symbol_table::{Symbol, SymbolKind, SymbolTable};

use log::info;

/// Runs the full pipeline described in §2: resolve, generate, prefix with
/// the version pragma the runtime contract requires as the program's first
/// line.
pub fn compile(ast: &mut AbstractSyntaxTree, config: &Config) -> Result<String, CompileError> {
    let table = resolve_symbols(ast.root_mut())?;
    info!("resolved symbols, lowering to target assembly");
    let body = CodeGenerator::generate_code(ast.root(), table, config)?;
    Ok(format!("#pragma version {}\r\n{}", config.version_pragma, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_prefixes_version_pragma() {
        let mut ast = AbstractSyntaxTree::new(Node::return_statement(Node::number(1.0)));
        let output = compile(&mut ast, &Config::default()).unwrap();
        assert!(output.starts_with("#pragma version 3\r\n"));
        assert!(output.ends_with("int 1\r\nreturn"));
    }

    #[test]
    fn compile_surfaces_resolver_errors() {
        let mut ast = AbstractSyntaxTree::new(Node::expr_statement(Node::access_variable("missing")));
        let err = compile(&mut ast, &Config::default()).unwrap_err();
        assert!(matches!(err, CompileError::Resolver(ResolverError::UndeclaredName(_))));
    }
}
