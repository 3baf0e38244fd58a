//! Reference expression language: lexer, parser, code generator and the
//! built-in instruction table.
//!
//! The parameter model only talks to this module through [`Compiler`] and
//! [`IdResolver`], so another language can be plugged in without touching
//! [`crate::Program`].

pub(crate) mod ast;
pub(crate) mod codegen;
pub(crate) mod instructions;
pub(crate) mod lexer;
pub(crate) mod parser;

use crate::foundation::error::ParamResult;

pub use ast::{Ast, BinaryOp, ExternDeclaration, Tree, UnaryOp};
pub use instructions::{Builtin, InstructionSet, opcode};

/// Callback used by [`Compiler::compile`] to bind free identifiers.
///
/// Called once per occurrence of an identifier that is not a local binding,
/// in program-evaluation order.
pub trait IdResolver {
    /// Returns the tree `id` stands for.
    fn resolve(&mut self, id: &str) -> ParamResult<Tree>;
}

/// Compiler service consumed by [`crate::Program`].
pub trait Compiler {
    /// Parses a whole program.
    fn parse_source(&self, source: &str) -> ParamResult<Ast>;

    /// Parses a single expression, as stored in `expr` parameters.
    fn parse_expr(&self, text: &str) -> ParamResult<Tree>;

    /// The read-only table of built-in operations.
    fn instruction_set(&self) -> &InstructionSet;

    /// Generates flat code for `ast`, resolving free identifiers through `resolver`.
    fn compile(&self, ast: &Ast, resolver: &mut dyn IdResolver) -> ParamResult<Vec<i32>>;
}

/// The compiler for the language shipped with this crate.
#[derive(Debug, Clone, Default)]
pub struct StandardCompiler {
    instructions: InstructionSet,
}

impl StandardCompiler {
    /// Creates a compiler with [`InstructionSet::standard`].
    pub fn new() -> Self {
        Self::default()
    }
}

impl Compiler for StandardCompiler {
    fn parse_source(&self, source: &str) -> ParamResult<Ast> {
        parser::parse_source(source)
    }

    fn parse_expr(&self, text: &str) -> ParamResult<Tree> {
        parser::parse_expr(text)
    }

    fn instruction_set(&self) -> &InstructionSet {
        &self.instructions
    }

    fn compile(&self, ast: &Ast, resolver: &mut dyn IdResolver) -> ParamResult<Vec<i32>> {
        codegen::generate(ast, resolver)
    }
}
