//! Two-pass code generation: walks the (already resolved) AST, produces
//! instructions via a [`CodeEmitter`], synthesises function prologues and
//! epilogues, and manages control-flow labels and the logical stack
//! counter that lives inside the emitter.

mod builtins;
pub mod emitter;

use log::debug;

use crate::ast::{Assignee, Node, NodeKind};
use crate::config::Config;
use crate::error::GeneratorError;
use crate::symbol_table::{Symbol, SymbolTable};

use self::emitter::CodeEmitter;

pub struct CodeGenerator {
    emitter: CodeEmitter,
    table: SymbolTable,
    control_id: u64,
    current_function: Option<String>,
}

impl CodeGenerator {
    fn new(table: SymbolTable) -> Self {
        CodeGenerator {
            emitter: CodeEmitter::new(),
            table,
            control_id: 0,
            current_function: None,
        }
    }

    /// Runs the full two-pass lowering described in §4.4 and returns the
    /// emitted body (without the version pragma prefix `compile()` adds).
    pub fn generate_code(root: &Node, table: SymbolTable, config: &Config) -> Result<String, GeneratorError> {
        let mut generator = CodeGenerator::new(table);

        let mut functions = Vec::new();
        collect_functions(root, &mut functions);

        if !functions.is_empty() {
            generator.emit(format!("int {}", config.max_scratch), 1, 0, None)?;
            generator.emit("store 0", 0, 1, None)?;
        }

        generator.generate_node(root)?;

        if !functions.is_empty() {
            generator.emit("b program_end", 0, 0, None)?;
            for function in &functions {
                generator.generate_function(function)?;
            }
            generator.emitter.label("program_end", None);
        }

        Ok(generator.emitter.output())
    }

    fn next_control_id(&mut self) -> u64 {
        let id = self.control_id;
        self.control_id += 1;
        id
    }

    fn emit(&mut self, text: impl Into<String>, pushed: u32, popped: u32, comment: Option<&str>) -> Result<(), GeneratorError> {
        self.emitter.add(text, pushed, popped, comment)?;
        Ok(())
    }

    fn emit_store(&mut self, symbol: &Symbol) -> Result<(), GeneratorError> {
        if symbol.is_global() {
            self.emit("dup", 1, 0, None)?;
            self.emit(format!("store {}", symbol.position()), 0, 1, None)?;
        } else {
            self.emit(format!("int {}", symbol.position()), 1, 0, None)?;
            self.emit("load 0", 1, 0, None)?;
            self.emit("+", 1, 2, None)?;
            self.emit("dig 1", 1, 0, None)?;
            self.emit("stores", 0, 2, None)?;
        }
        Ok(())
    }

    fn generate_function(&mut self, function: &Node) -> Result<(), GeneratorError> {
        let (name, params) = match &function.kind {
            NodeKind::FunctionDeclaration { name, params, body: _ } => (name, params),
            _ => unreachable!("collect_functions only collects FunctionDeclaration nodes"),
        };
        let scope_id = function
            .scope
            .expect("resolve_symbols must annotate every function-declaration with its scope");
        let func_scope = self.table.at(scope_id);
        let num_locals = func_scope.get_num_symbols();

        debug!("lowering function '{}' ({} locals)", name, num_locals);

        self.emitter.reset_stack();
        self.emitter.assume_pushed(params.len() as u32);

        self.emitter.label(name.clone(), None);
        self.emit("load 0", 1, 0, None)?;
        self.emit("load 0", 1, 0, None)?;
        self.emit(format!("int {}", num_locals + 1), 1, 0, None)?;
        self.emit("-", 1, 2, None)?;
        self.emit("store 0", 0, 1, None)?;
        self.emit("load 0", 1, 0, None)?;
        self.emit("swap", 2, 2, None)?;
        self.emit("stores", 0, 2, None)?;

        for param in params.iter().rev() {
            let symbol = func_scope
                .get(param)
                .expect("resolve_symbols must bind every parameter into the function's scope");
            self.emit(format!("int {}", symbol.position()), 1, 0, None)?;
            self.emit("load 0", 1, 0, None)?;
            self.emit("+", 1, 2, None)?;
            self.emit("stores", 0, 2, Some(param))?;
        }

        let body = match &function.kind {
            NodeKind::FunctionDeclaration { body, .. } => body.as_ref(),
            _ => unreachable!(),
        };
        let previous_function = self.current_function.replace(name.clone());
        self.generate_node(body)?;
        self.current_function = previous_function;

        self.emitter.reset_stack();
        self.emitter.label(format!("{}-cleanup", name), None);
        self.emit("load 0", 1, 0, None)?;
        self.emit("loads", 1, 1, None)?;
        self.emit("store 0", 0, 1, None)?;
        self.emit("retsub", 0, 0, None)?;

        Ok(())
    }

    fn generate_node(&mut self, node: &Node) -> Result<(), GeneratorError> {
        match &node.kind {
            NodeKind::Number(value) => {
                self.emit(format!("int {}", format_number(*value)), 1, 0, None)?;
            }
            NodeKind::StringLiteral(value) => {
                self.emit(format!("byte \"{}\"", value), 1, 0, None)?;
            }
            NodeKind::Operation { opcode, args, num_items_added, num_items_removed } => {
                for arg in args {
                    self.generate_node(arg)?;
                }
                let pushed = num_items_added.unwrap_or(1);
                let popped = num_items_removed.unwrap_or(2);
                self.emit(opcode.clone(), pushed, popped, None)?;
            }
            NodeKind::ExprStatement { expression } => {
                self.emitter.reset_stack();
                self.generate_node(expression)?;
                self.emitter.pop_all();
            }
            NodeKind::ReturnStatement { expression } => {
                self.emitter.reset_stack();
                self.generate_node(expression)?;
                match &self.current_function {
                    Some(name) => self.emit(format!("b {}-cleanup", name), 0, 0, None)?,
                    None => self.emit("return", 0, 0, None)?,
                }
            }
            NodeKind::DeclareVariable { initializer, .. } | NodeKind::DeclareConstant { initializer, .. } => {
                self.emitter.reset_stack();
                if let Some(initializer) = initializer {
                    self.generate_node(initializer)?;
                    self.emitter.pop_all();
                }
            }
            NodeKind::AccessVariable { name } => {
                let symbol = node
                    .symbol
                    .as_ref()
                    .unwrap_or_else(|| panic!("access-variable '{}' was not resolved before codegen", name));
                if symbol.is_global() {
                    self.emit(format!("load {}", symbol.position()), 1, 0, None)?;
                } else {
                    self.emit("load 0", 1, 0, None)?;
                    self.emit(format!("int {}", symbol.position()), 1, 0, None)?;
                    self.emit("+", 1, 2, None)?;
                    self.emit("loads", 1, 1, None)?;
                }
            }
            NodeKind::AssignmentStatement { assignee: _, expression } => {
                self.generate_node(expression)?;
                if let Some(symbol) = node.symbol.clone() {
                    self.emit_store(&symbol)?;
                } else if let Some(symbols) = node.symbols.clone() {
                    for symbol in symbols.iter().rev() {
                        self.emit_store(symbol)?;
                    }
                } else {
                    return Err(GeneratorError::NoAssignmentTarget);
                }
            }
            NodeKind::IfStatement { condition, if_block, else_block } => {
                self.generate_node(condition)?;
                let k = self.next_control_id();
                self.emit(format!("bz else_{}", k), 0, 1, None)?;
                self.generate_node(if_block)?;
                self.emit(format!("b end_{}", k), 0, 0, None)?;
                self.emitter.label(format!("else_{}", k), None);
                if let Some(else_block) = else_block {
                    self.generate_node(else_block)?;
                }
                self.emitter.label(format!("end_{}", k), None);
            }
            NodeKind::WhileStatement { condition, body } => {
                let k = self.next_control_id();
                self.emitter.label(format!("loop_start_{}", k), None);
                self.generate_node(condition)?;
                self.emit(format!("bz loop_end_{}", k), 0, 1, None)?;
                self.generate_node(body)?;
                self.emit(format!("b loop_start_{}", k), 0, 0, None)?;
                self.emitter.label(format!("loop_end_{}", k), None);
            }
            NodeKind::FunctionCall { name, function_args } => {
                self.generate_call(name, function_args)?;
            }
            NodeKind::FunctionDeclaration { .. } => {
                // Emitted separately by the dedicated function pass.
            }
            NodeKind::Block(statements) => {
                for statement in statements {
                    self.generate_node(statement)?;
                }
            }
            NodeKind::Statement(inner) => {
                self.generate_node(inner)?;
            }
        }
        Ok(())
    }

    fn generate_call(&mut self, name: &str, function_args: &[Node]) -> Result<(), GeneratorError> {
        if let Some(builtin) = builtins::lookup(name) {
            debug!("dispatching builtin call '{}'", name);
            return builtin(self, name, function_args);
        }
        for arg in function_args {
            self.generate_node(arg)?;
        }
        self.emit(format!("callsub {}", name), 1, function_args.len() as u32, None)?;
        Ok(())
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

fn collect_functions<'a>(node: &'a Node, out: &mut Vec<&'a Node>) {
    match &node.kind {
        NodeKind::FunctionDeclaration { body, .. } => {
            out.push(node);
            collect_functions(body, out);
        }
        NodeKind::Block(statements) => {
            for statement in statements {
                collect_functions(statement, out);
            }
        }
        NodeKind::Statement(inner) => collect_functions(inner, out),
        NodeKind::IfStatement { if_block, else_block, .. } => {
            collect_functions(if_block, out);
            if let Some(else_block) = else_block {
                collect_functions(else_block, out);
            }
        }
        NodeKind::WhileStatement { body, .. } => collect_functions(body, out),
        NodeKind::ExprStatement { .. }
        | NodeKind::ReturnStatement { .. }
        | NodeKind::DeclareVariable { .. }
        | NodeKind::DeclareConstant { .. }
        | NodeKind::AccessVariable { .. }
        | NodeKind::AssignmentStatement { .. }
        | NodeKind::FunctionCall { .. }
        | NodeKind::Operation { .. }
        | NodeKind::Number(_)
        | NodeKind::StringLiteral(_) => {}
    }
}
