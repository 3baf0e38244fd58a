//! # fractal-params guide
//!
//! A walkthrough of how a fractal program turns into bytecode and how its
//! parameters are edited, alone or together with other programs.
//!
//! If you only want to inspect files, the `fractparam` binary prints merged
//! parameter tables and applies single edits to stored configurations.
//!
//! ---
//!
//! ## Core concepts
//!
//! - [`ParameterStore`](crate::ParameterStore): program text plus the values the user overrode
//! - [`Program`](crate::Program): a store together with its compiled form
//! - [`ResolvedParameter`](crate::ResolvedParameter): one parameter the compiled code depends on
//! - [`ProgramSet`](crate::ProgramSet): several programs whose parameters are edited together
//! - [`ParameterTable`](crate::ParameterTable): the merged, ordered view of a set's parameters
//! - [`Compiler`](crate::Compiler): parses and lowers program text, see [`StandardCompiler`](crate::StandardCompiler)
//!
//! A program only exists in compiled form. Every change produces a new store,
//! compiles it, and is applied only if compilation succeeds:
//!
//! 1. Stage: [`Program::stage_value`](crate::Program::stage_value) compiles the edited store
//! 2. Commit: [`Program::commit`](crate::Program::commit) installs it, records history and notifies listeners
//!
//! [`Program::set_value`](crate::Program::set_value) does both.
//!
//! ---
//!
//! ## The language
//!
//! Programs are `;`-separated statements:
//!
//! ```text
//! extern bailout "escape radius" real = 4;
//! extern colors palette = [#ff000000, #ffffffff];
//! var z = 0:0;
//! var r = abs(z) < bailout;
//! colors(re(z):im(z))
//! ```
//!
//! - `extern id ["description"] type = default` declares a parameter.
//! - `var id = expr` binds a value; each `var` gets its own slot.
//! - `re:im` builds a complex number, `#aarrggbb` is a color literal.
//! - `[ ... ]` builds a vector, used for palettes and scales.
//! - Builtins such as `sin`, `abs` or `palette(n, coord)` are called by name.
//!
//! Identifiers are resolved in this order: local bindings, parameters already
//! resolved, `extern` declarations, builtins, and finally an inline `expr`
//! parameter that defaults to `0`. Inline parameters let a program mention a
//! value that the user fills in later.
//!
//! ---
//!
//! ## Parameter types
//!
//! [`ParameterType`](crate::ParameterType) lists the nine types: `int`, `real`,
//! `cplx`, `bool`, `expr`, `color`, `palette`, `scale` and `source`. Values are
//! coerced on the way into a store, so an `int` parameter accepts a `real`
//! value (truncated) and an `expr` parameter accepts anything that prints
//! as program text.
//!
//! `palette` parameters become a one-argument function that calls
//! `palette(n, coord)`, where `n` is the palette's position in [`Program::palettes`](crate::Program::palettes).
//! `scale` parameters are not referenceable from code; the program reports
//! them through [`Program::scales`](crate::Program::scales).
//!
//! ---
//!
//! ## Editing several programs
//!
//! A [`ProgramSet`](crate::ProgramSet) shares parameter ids across programs.
//! Setting a shared id edits every program that requires it; if any of them
//! fails to compile, none changes. Ids marked exclusive are kept per program
//! and get one table row per owner.
//!
//! The merged table keeps `Source` and `Scale` first, then follows the
//! declaration order of every program, key program first. Inline parameters
//! stay next to the declared parameter that precedes them.
//!
//! ---
//!
//! ## Persistence
//!
//! Stores serialize to JSON with `serde_json`:
//!
//! ```text
//! {
//!   "code": "extern a int = 0; var x = a",
//!   "data": { "a": { "type": "int", "value": 3 } }
//! }
//! ```
//!
//! See [`ParameterStore::to_json`](crate::ParameterStore::to_json).
