use std::cell::OnceCell;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use crate::foundation::error::{ParamError, ParamResult};
use crate::lang::Compiler;
use crate::param::ptype::{ParameterType, Value};
use crate::param::store::ParameterStore;
use crate::program::ProgramOpts;
use crate::program::model::{ListenerId, Program};
use crate::provider::table::ParameterTable;

/// Callback invoked whenever the merged table of a [`ProgramSet`] changes.
pub type TableListener = Box<dyn FnMut(&ProgramSet)>;

/// Several programs edited together.
///
/// Parameter ids are shared across programs unless marked exclusive. Setting
/// a shared id edits every program that requires it, and either all of them
/// change or none does.
pub struct ProgramSet {
    compiler: Rc<dyn Compiler>,
    opts: ProgramOpts,
    programs: Vec<Program>,
    key_index: Option<usize>,
    exclusive: BTreeSet<String>,
    table: OnceCell<ParameterTable>,
    table_listeners: Vec<(ListenerId, TableListener)>,
    next_listener: u64,
}

impl ProgramSet {
    /// An empty set compiling with default options.
    pub fn new(compiler: Rc<dyn Compiler>) -> Self {
        Self::with_opts(compiler, ProgramOpts::default())
    }

    /// An empty set; every added program compiles with `opts`.
    pub fn with_opts(compiler: Rc<dyn Compiler>, opts: ProgramOpts) -> Self {
        Self {
            compiler,
            opts,
            programs: Vec::new(),
            key_index: None,
            exclusive: BTreeSet::new(),
            table: OnceCell::new(),
            table_listeners: Vec::new(),
            next_listener: 0,
        }
    }

    fn check_index(&self, index: usize) -> ParamResult<()> {
        if index < self.programs.len() {
            Ok(())
        } else {
            Err(ParamError::IndexOutOfRange {
                index,
                len: self.programs.len(),
            })
        }
    }

    /// Compiles `store` into a new program at the end. The first program
    /// becomes the key program.
    pub fn add_program(&mut self, store: ParameterStore) -> ParamResult<usize> {
        let program = Program::with_opts(self.compiler.clone(), self.opts, store)?;
        self.programs.push(program);
        self.key_index.get_or_insert(0);
        self.invalidate();
        Ok(self.programs.len() - 1)
    }

    /// Removes the program at `index`. The key index keeps pointing at the
    /// same program; if the key program itself is removed, the program that
    /// takes its place becomes key.
    pub fn remove_program(&mut self, index: usize) -> ParamResult<Program> {
        self.check_index(index)?;
        let program = self.programs.remove(index);
        self.key_index = match self.key_index {
            _ if self.programs.is_empty() => None,
            Some(k) if index < k || k == self.programs.len() => Some(k - 1),
            other => other,
        };
        self.invalidate();
        Ok(program)
    }

    /// Replaces the whole configuration of one program.
    pub fn set_program_store(&mut self, index: usize, store: ParameterStore) -> ParamResult<()> {
        self.check_index(index)?;
        self.programs[index].set_store(store)?;
        self.invalidate();
        Ok(())
    }

    /// Program at `index`.
    pub fn program(&self, index: usize) -> ParamResult<&Program> {
        self.check_index(index)?;
        Ok(&self.programs[index])
    }

    /// All programs in index order.
    pub fn programs(&self) -> &[Program] {
        &self.programs
    }

    /// Number of programs.
    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    /// Index of the key program; `None` while the set is empty.
    pub fn key_index(&self) -> Option<usize> {
        self.key_index
    }

    /// Makes `index` the key program, which leads the traversal order.
    pub fn set_key_index(&mut self, index: usize) -> ParamResult<()> {
        self.check_index(index)?;
        self.key_index = Some(index);
        self.invalidate();
        Ok(())
    }

    /// Key program first, then the others in index order.
    pub fn traversal_order(&self) -> Vec<usize> {
        let Some(key) = self.key_index else {
            return Vec::new();
        };
        std::iter::once(key)
            .chain((0..self.programs.len()).filter(|&i| i != key))
            .collect()
    }

    /// Marks `id` as exclusive. Returns false if it already was.
    pub fn add_exclusive_parameter(&mut self, id: &str) -> bool {
        let added = self.exclusive.insert(id.to_owned());
        if added {
            self.invalidate();
        }
        added
    }

    /// Marks `id` as shared again. Returns false if it was not exclusive.
    pub fn remove_exclusive_parameter(&mut self, id: &str) -> bool {
        let removed = self.exclusive.remove(id);
        if removed {
            self.invalidate();
        }
        removed
    }

    /// True if `id` is kept per program.
    pub fn is_exclusive(&self, id: &str) -> bool {
        self.exclusive.contains(id)
    }

    /// True if `id` is unified across programs.
    pub fn is_shared(&self, id: &str) -> bool {
        !self.is_exclusive(id)
    }

    /// Exclusive ids in lexical order.
    pub fn exclusive_parameters(&self) -> impl Iterator<Item = &str> + '_ {
        self.exclusive.iter().map(String::as_str)
    }

    /// Sets or resets (`value == None`) a parameter.
    ///
    /// An exclusive id with an `owner` only edits that program. Otherwise every
    /// program requiring `id` is edited; they must agree on its type unless
    /// they treat it as `expr`. Nothing changes if any program rejects the
    /// edit. Returns whether a program changed.
    #[tracing::instrument(skip(self, value))]
    pub fn set_parameter(
        &mut self,
        id: &str,
        owner: Option<usize>,
        value: Option<Value>,
    ) -> ParamResult<bool> {
        let targets: Vec<usize> = match owner {
            Some(o) if self.is_exclusive(id) => {
                self.check_index(o)?;
                vec![o]
            }
            _ => {
                let all: Vec<usize> = (0..self.programs.len())
                    .filter(|&i| self.programs[i].parameter(id).is_some())
                    .collect();
                if all.is_empty() {
                    return Err(ParamError::UnknownParameter(id.to_owned()));
                }
                all
            }
        };

        let mut declared: Option<ParameterType> = None;
        for &i in &targets {
            let Some(p) = self.programs[i].parameter(id) else {
                continue;
            };
            if p.ptype == ParameterType::Expr {
                continue;
            }
            match declared {
                None => declared = Some(p.ptype),
                Some(t) if t != p.ptype => {
                    return Err(ParamError::type_cast(
                        t,
                        format!("{} declared by program {i}", p.ptype),
                    ));
                }
                Some(_) => {}
            }
        }

        let mut staged = Vec::with_capacity(targets.len());
        for &i in &targets {
            let edit = self.programs[i].stage_value(id, value.clone()).inspect_err(|e| {
                tracing::debug!(program = i, error = %e, "shared edit rolled back");
            })?;
            if let Some(edit) = edit {
                staged.push((i, edit));
            }
        }

        let changed = !staged.is_empty();
        for (i, edit) in staged {
            self.programs[i].commit(edit);
        }
        if changed {
            self.invalidate();
        }
        Ok(changed)
    }

    /// Steps one program back in its history.
    pub fn history_back(&mut self, index: usize) -> ParamResult<bool> {
        self.check_index(index)?;
        let moved = self.programs[index].history_back()?;
        if moved {
            self.invalidate();
        }
        Ok(moved)
    }

    /// Steps one program forward in its history.
    pub fn history_forward(&mut self, index: usize) -> ParamResult<bool> {
        self.check_index(index)?;
        let moved = self.programs[index].history_forward()?;
        if moved {
            self.invalidate();
        }
        Ok(moved)
    }

    /// The merged parameter table, rebuilt if anything changed since the
    /// last call.
    pub fn table(&self) -> &ParameterTable {
        self.table.get_or_init(|| {
            ParameterTable::build(&self.programs, &self.traversal_order(), &self.exclusive)
        })
    }

    /// Effective value of `id` as seen by program `owner`.
    pub fn parameter_value(&self, id: &str, owner: usize) -> Option<&Value> {
        self.table().entry(id, owner).map(|e| &e.parameter.value)
    }

    /// Registers a listener on the program at `index`.
    pub fn add_listener(
        &mut self,
        index: usize,
        listener: impl FnMut(&Program) + 'static,
    ) -> ParamResult<ListenerId> {
        self.check_index(index)?;
        Ok(self.programs[index].add_listener(listener))
    }

    /// Removes a listener from the program at `index`.
    pub fn remove_listener(&mut self, index: usize, id: ListenerId) -> ParamResult<bool> {
        self.check_index(index)?;
        Ok(self.programs[index].remove_listener(id))
    }

    /// Registers a callback fired whenever the merged table is invalidated.
    pub fn add_table_listener(&mut self, listener: impl FnMut(&ProgramSet) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.table_listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a table listener. Returns false if it was not registered.
    pub fn remove_table_listener(&mut self, id: ListenerId) -> bool {
        let before = self.table_listeners.len();
        self.table_listeners.retain(|(l, _)| *l != id);
        self.table_listeners.len() != before
    }

    fn invalidate(&mut self) {
        self.table.take();
        let mut listeners = std::mem::take(&mut self.table_listeners);
        for (_, l) in &mut listeners {
            l(self);
        }
        self.table_listeners = listeners;
    }
}

impl fmt::Debug for ProgramSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgramSet")
            .field("programs", &self.programs)
            .field("key_index", &self.key_index)
            .field("exclusive", &self.exclusive)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/provider/set.rs"]
mod tests;
