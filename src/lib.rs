//! fractal-params models the parameters of fractal programs.
//!
//! A fractal program is a small expression language whose `extern`
//! declarations and free identifiers become user-editable parameters. This
//! crate parses and compiles those programs to bytecode, resolves every
//! parameter the bytecode depends on, and keeps the user's overrides in a
//! serializable [`ParameterStore`].
//!
//! # Overview
//!
//! 1. **Parse**: program text becomes an [`Ast`] via a [`Compiler`]
//! 2. **Resolve**: every identifier is bound to a declared, builtin or inline parameter
//! 3. **Compile**: the resolved tree is lowered to an `i32` instruction stream
//! 4. **Merge** (optional): a [`ProgramSet`] unifies the parameters of several programs
//!    into one [`ParameterTable`]
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **All or nothing**: an edit is compiled before it is applied; on error nothing changes.
//! - **Deterministic**: the same store always yields the same code and the same table.
//!
//! # Getting started
//!
//! For a walkthrough of the language and the editing model, see [`crate::guide`].
#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![allow(missing_docs_in_private_items)]

mod foundation;
mod lang;
mod param;
mod program;
mod provider;

/// Standalone documentation for the language and the editing model.
pub mod guide;

pub use foundation::core::{Affine, Cplx, OPAQUE_BLACK, Palette, Point, Scale};
pub use foundation::error::{ParamError, ParamResult};
pub use lang::{
    Ast, BinaryOp, Builtin, Compiler, ExternDeclaration, IdResolver, InstructionSet,
    StandardCompiler, Tree, UnaryOp, opcode,
};
pub use param::ptype::{ParameterType, Value};
pub use param::store::ParameterStore;
pub use program::ProgramOpts;
pub use program::model::{Listener, ListenerId, Program, StagedEdit};
pub use program::resolver::{ResolvedParameter, SCALE_ID, SOURCE_ID};
pub use provider::set::{ProgramSet, TableListener};
pub use provider::table::{ParameterEntry, ParameterTable};
