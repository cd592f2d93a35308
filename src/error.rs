use thiserror::Error;

/// Failures raised while walking the AST to bind names and allocate slots.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolverError {
    #[error("'{0}' is already declared in this scope")]
    DuplicateDefinition(String),

    #[error("'{0}' is not declared in any enclosing scope")]
    UndeclaredName(String),

    /// Reserved for a parser/AST that carries assignment targets as bare
    /// expression subtrees; this crate's `Assignee` enforces the
    /// access-variable-only invariant by construction (it only ever holds
    /// bound names, never an arbitrary node), so the resolver never has a
    /// non-lvalue subtree to reject here.
    #[error("assignment target is not an access-variable")]
    NotAnLvalue,

    #[error("cannot assign to constant '{0}'")]
    AssignToConstant(String),
}

/// Failures raised while lowering the (now annotated) AST into instructions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeneratorError {
    /// Reserved for the pre-compilation stripped-down sibling tool; the
    /// generator's visitor match is exhaustive and never constructs this.
    #[error("encountered an unexpected node type")]
    UnknownNodeType,

    #[error("assignment node carries neither a symbol nor a symbols annotation")]
    NoAssignmentTarget,

    #[error("builtin '{0}' received a malformed argument: {1}")]
    InvalidBuiltinArgument(String, String),

    #[error(transparent)]
    StackUnderflow(#[from] StackUnderflow),
}

/// Internal invariant violation: the emitter was asked to pop more values
/// than the current statement has pushed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("stack underflow: attempted to pop {attempted} item(s) at depth {depth}")]
pub struct StackUnderflow {
    pub attempted: u32,
    pub depth: u32,
}

/// Unifies the two pipeline stages' error types for `compile()`'s single
/// `Result`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("symbol resolution failed: {0}")]
    Resolver(#[from] ResolverError),

    #[error("code generation failed: {0}")]
    Generator(#[from] GeneratorError),
}
