use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::foundation::core::{Palette, Scale};
use crate::foundation::error::{ParamError, ParamResult};
use crate::lang::{Ast, Compiler, ExternDeclaration};
use crate::param::ptype::Value;
use crate::param::store::ParameterStore;
use crate::program::ProgramOpts;
use crate::program::history::EditHistory;
use crate::program::resolver::{Compiled, ResolvedParameter, SCALE_ID, SOURCE_ID, compile_store};

/// Callback invoked after a program changed.
pub type Listener = Box<dyn FnMut(&Program)>;

/// Handle returned by listener registration, used for removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

/// A compiled candidate configuration that has not been applied yet.
///
/// Produced by [`Program::stage_value`] or [`Program::stage_store`], applied
/// with [`Program::commit`]. Dropping it discards the edit.
#[must_use]
#[derive(Clone, Debug)]
pub struct StagedEdit {
    store: ParameterStore,
    compiled: Compiled,
}

impl StagedEdit {
    /// The store that becomes current on commit.
    pub fn store(&self) -> &ParameterStore {
        &self.store
    }
}

/// One program instance: a [`ParameterStore`] together with its compiled form.
///
/// Every edit compiles the candidate store first and only replaces the
/// current state on success, so a failed edit leaves the program unchanged
/// and fires no listener.
pub struct Program {
    compiler: Rc<dyn Compiler>,
    opts: ProgramOpts,
    store: ParameterStore,
    compiled: Compiled,
    history: EditHistory,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl Program {
    /// Compiles `store` with default options.
    pub fn new(compiler: Rc<dyn Compiler>, store: ParameterStore) -> ParamResult<Self> {
        Self::with_opts(compiler, ProgramOpts::default(), store)
    }

    /// Compiles `store`. A program only exists in compiled form, so any
    /// compile error is returned here.
    pub fn with_opts(
        compiler: Rc<dyn Compiler>,
        opts: ProgramOpts,
        store: ParameterStore,
    ) -> ParamResult<Self> {
        let compiled = compile_store(compiler.as_ref(), &opts, &store, None)?;
        Ok(Self {
            compiler,
            opts,
            history: EditHistory::new(store.clone()),
            store,
            compiled,
            listeners: Vec::new(),
            next_listener: 0,
        })
    }

    /// Compiles `store` against this program's compiler without applying it.
    pub fn stage_store(&self, store: ParameterStore) -> ParamResult<StagedEdit> {
        let ast = (store.source() == self.store.source()).then(|| self.compiled.ast.clone());
        let compiled = compile_store(self.compiler.as_ref(), &self.opts, &store, ast)?;
        Ok(StagedEdit { store, compiled })
    }

    /// Compiles the store that results from setting `id` to `value`, or from
    /// resetting it to its default if `value` is `None`.
    ///
    /// Returns `Ok(None)` if `id` is not a required parameter of this program.
    /// Setting [`SOURCE_ID`] replaces the program text.
    pub fn stage_value(&self, id: &str, value: Option<Value>) -> ParamResult<Option<StagedEdit>> {
        let Some(param) = self.parameter(id) else {
            return Ok(None);
        };
        let store = if id == SOURCE_ID {
            match value {
                Some(Value::Source(text) | Value::Expr(text)) => self.store.with_source(text),
                Some(other) => {
                    return Err(ParamError::type_cast(param.ptype, format!("{other:?}")));
                }
                None => return Err(ParamError::unsupported("source has no default")),
            }
        } else {
            match value {
                Some(v) => self.store.with_value(id, param.ptype, v)?,
                None => self.store.without_value(id),
            }
        };
        self.stage_store(store).map(Some)
    }

    /// Applies a staged edit, records it in the history and notifies listeners.
    pub fn commit(&mut self, edit: StagedEdit) {
        if edit.store != self.store {
            self.history.record(edit.store.clone());
        }
        self.install(edit);
    }

    fn install(&mut self, edit: StagedEdit) {
        self.store = edit.store;
        self.compiled = edit.compiled;
        self.notify();
    }

    /// Sets or resets one parameter. Returns `Ok(false)` if `id` is not
    /// required by this program.
    #[tracing::instrument(skip(self, value))]
    pub fn set_value(&mut self, id: &str, value: Option<Value>) -> ParamResult<bool> {
        match self.stage_value(id, value) {
            Ok(Some(edit)) => {
                self.commit(edit);
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(e) => {
                tracing::debug!(error = %e, "edit rolled back");
                Err(e)
            }
        }
    }

    /// Replaces the whole configuration.
    pub fn set_store(&mut self, store: ParameterStore) -> ParamResult<()> {
        let edit = self.stage_store(store).inspect_err(|e| {
            tracing::debug!(error = %e, "store replacement rolled back");
        })?;
        self.commit(edit);
        Ok(())
    }

    /// Parses and compiles the current store again.
    #[tracing::instrument(skip_all)]
    pub fn recompile(&mut self) -> ParamResult<()> {
        let compiled = compile_store(self.compiler.as_ref(), &self.opts, &self.store, None)?;
        let store = self.store.clone();
        self.install(StagedEdit { store, compiled });
        Ok(())
    }

    /// Steps back in the edit history. Returns `Ok(false)` at the oldest entry.
    pub fn history_back(&mut self) -> ParamResult<bool> {
        let Some(store) = self.history.peek_back().cloned() else {
            return Ok(false);
        };
        tracing::debug!("history back");
        let compiled = compile_store(self.compiler.as_ref(), &self.opts, &store, None)?;
        self.history.step_back();
        self.install(StagedEdit { store, compiled });
        Ok(true)
    }

    /// Steps forward in the edit history. Returns `Ok(false)` at the newest entry.
    pub fn history_forward(&mut self) -> ParamResult<bool> {
        let Some(store) = self.history.peek_forward().cloned() else {
            return Ok(false);
        };
        tracing::debug!("history forward");
        let compiled = compile_store(self.compiler.as_ref(), &self.opts, &store, None)?;
        self.history.step_forward();
        self.install(StagedEdit { store, compiled });
        Ok(true)
    }

    /// True if [`Program::history_back`] would move.
    pub fn can_go_back(&self) -> bool {
        self.history.can_go_back()
    }

    /// True if [`Program::history_forward`] would move.
    pub fn can_go_forward(&self) -> bool {
        self.history.can_go_forward()
    }

    /// Registers a callback fired after every successful change.
    pub fn add_listener(&mut self, listener: impl FnMut(&Program) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(l, _)| *l != id);
        self.listeners.len() != before
    }

    fn notify(&mut self) {
        let mut listeners = std::mem::take(&mut self.listeners);
        for (_, l) in &mut listeners {
            l(self);
        }
        self.listeners = listeners;
    }

    /// Current configuration.
    pub fn store(&self) -> &ParameterStore {
        &self.store
    }

    /// Current program text.
    pub fn source(&self) -> &str {
        self.store.source()
    }

    /// Options the program compiles with.
    pub fn opts(&self) -> &ProgramOpts {
        &self.opts
    }

    /// Compiler service shared with the owning set, if any.
    pub fn compiler(&self) -> &Rc<dyn Compiler> {
        &self.compiler
    }

    /// Flat code of the last successful compile.
    pub fn code(&self) -> &[i32] {
        &self.compiled.code
    }

    /// Parsed source.
    pub fn ast(&self) -> &Ast {
        &self.compiled.ast
    }

    /// Extern declarations in source order.
    pub fn extern_declarations(&self) -> &[ExternDeclaration] {
        &self.compiled.externs
    }

    /// Parameters bound by the last compile, in resolution order.
    ///
    /// The first two are always [`SOURCE_ID`] and [`SCALE_ID`].
    pub fn required_parameters(&self) -> &[ResolvedParameter] {
        &self.compiled.required
    }

    /// A required parameter by id.
    pub fn parameter(&self, id: &str) -> Option<&ResolvedParameter> {
        self.compiled
            .index
            .get(id)
            .map(|&i| &self.compiled.required[i])
    }

    /// Effective value of a required parameter.
    pub fn value(&self, id: &str) -> Option<&Value> {
        self.parameter(id).map(|p| &p.value)
    }

    /// The effective view transform.
    pub fn scale(&self) -> Scale {
        match self.value(SCALE_ID) {
            Some(Value::Scale(s)) => *s,
            _ => self.opts.default_scale,
        }
    }

    /// Palettes referenced by the code; `palette(i, ..)` samples entry `i`.
    pub fn palettes(&self) -> &[Palette] {
        &self.compiled.palettes
    }

    /// Values of declared `scale` externs other than [`SCALE_ID`].
    pub fn scales(&self) -> &[Scale] {
        &self.compiled.scales
    }

    /// Declaration index per required parameter, in resolution order.
    ///
    /// Parameters without a declaration take the degree of the closest
    /// declared parameter before them, or -1.
    pub fn parameter_degrees(&self) -> Vec<(String, i32)> {
        let mut order: HashMap<&str, i32> = HashMap::new();
        for (i, decl) in self.compiled.externs.iter().enumerate() {
            order.insert(decl.id.as_str(), i as i32);
        }
        let mut last = -1;
        self.compiled
            .required
            .iter()
            .map(|p| {
                if let Some(&d) = order.get(p.id.as_str()) {
                    last = d;
                }
                (p.id.clone(), last)
            })
            .collect()
    }
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("store", &self.store)
            .field("code_len", &self.compiled.code.len())
            .field("required", &self.compiled.required.len())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/program/model.rs"]
mod tests;
