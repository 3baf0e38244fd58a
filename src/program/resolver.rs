use std::collections::HashMap;

use crate::foundation::core::{Palette, Scale};
use crate::foundation::error::{ParamError, ParamResult};
use crate::lang::{Ast, Builtin, Compiler, ExternDeclaration, IdResolver, Tree};
use crate::param::ptype::{ParameterType, Value};
use crate::param::store::ParameterStore;
use crate::program::ProgramOpts;

/// Id of the always-present source parameter.
pub const SOURCE_ID: &str = "Source";
/// Id of the always-present view transform parameter.
pub const SCALE_ID: &str = "Scale";

const SOURCE_DESCRIPTION: &str = "Source Code";
const SCALE_DESCRIPTION: &str = "Current Zoom";
const INLINE_DESCRIPTION: &str = "inline parameter";
const PALETTE_ARG: &str = "coord";

#[derive(Clone, Debug, PartialEq)]
/// One parameter bound while compiling a program.
pub struct ResolvedParameter {
    /// Identifier.
    pub id: String,
    /// Label for editors.
    pub description: String,
    /// Effective value: the stored override or the declared default.
    pub value: Value,
    /// Declared type; `expr` for inline parameters.
    pub ptype: ParameterType,
    /// True iff the store holds no override for `id`.
    pub is_default: bool,
    /// Tree compiled in place of the identifier; `None` when it cannot be
    /// referenced from code.
    pub(crate) tree: Option<Tree>,
}

/// Output of one successful compile.
#[derive(Clone, Debug)]
pub(crate) struct Compiled {
    pub(crate) ast: Ast,
    pub(crate) externs: Vec<ExternDeclaration>,
    pub(crate) code: Vec<i32>,
    pub(crate) required: Vec<ResolvedParameter>,
    pub(crate) index: HashMap<String, usize>,
    pub(crate) palettes: Vec<Palette>,
    pub(crate) scales: Vec<Scale>,
}

/// Compiles `store` without touching any program state.
///
/// `ast` may be passed when the caller knows it matches `store.source()`.
pub(crate) fn compile_store(
    compiler: &dyn Compiler,
    opts: &ProgramOpts,
    store: &ParameterStore,
    ast: Option<Ast>,
) -> ParamResult<Compiled> {
    let ast = match ast {
        Some(ast) => ast,
        None => compiler.parse_source(store.source())?,
    };
    let externs = ast.extern_declarations();

    let mut pass = ResolutionPass::new(compiler, store, &externs);
    pass.insert_placeholders(opts)?;
    let code = compiler.compile(&ast, &mut pass)?;
    let scales = pass.declared_scales()?;
    let ResolutionPass {
        required,
        index,
        palettes,
        ..
    } = pass;

    Ok(Compiled {
        ast,
        externs,
        code,
        required,
        index,
        palettes,
        scales,
    })
}

/// Binds identifiers for one compile: declared externs first, then builtins,
/// then inline `expr` parameters.
struct ResolutionPass<'a> {
    compiler: &'a dyn Compiler,
    store: &'a ParameterStore,
    externs: &'a [ExternDeclaration],
    decls: HashMap<&'a str, &'a ExternDeclaration>,
    required: Vec<ResolvedParameter>,
    index: HashMap<String, usize>,
    palette_ordinals: HashMap<String, usize>,
    palettes: Vec<Palette>,
    last_description: Option<String>,
}

impl<'a> ResolutionPass<'a> {
    fn new(
        compiler: &'a dyn Compiler,
        store: &'a ParameterStore,
        externs: &'a [ExternDeclaration],
    ) -> Self {
        Self {
            compiler,
            store,
            externs,
            decls: externs.iter().map(|d| (d.id.as_str(), d)).collect(),
            required: Vec::new(),
            index: HashMap::new(),
            palette_ordinals: HashMap::new(),
            palettes: Vec::new(),
            last_description: None,
        }
    }

    fn push(&mut self, param: ResolvedParameter) -> usize {
        let i = self.required.len();
        self.index.insert(param.id.clone(), i);
        self.required.push(param);
        i
    }

    fn insert_placeholders(&mut self, opts: &ProgramOpts) -> ParamResult<()> {
        self.push(ResolvedParameter {
            id: SOURCE_ID.to_owned(),
            description: SOURCE_DESCRIPTION.to_owned(),
            value: Value::Source(self.store.source().to_owned()),
            ptype: ParameterType::Source,
            is_default: true,
            tree: None,
        });

        let (scale, is_default) = match self.store.value(SCALE_ID) {
            Some(Value::Scale(s)) => (*s, false),
            _ => match self.decls.get(SCALE_ID) {
                Some(decl) => match ParameterType::Scale.to_value(&decl.default)? {
                    Value::Scale(s) => (s, true),
                    _ => (opts.default_scale, true),
                },
                None => (opts.default_scale, true),
            },
        };
        self.push(ResolvedParameter {
            id: SCALE_ID.to_owned(),
            description: SCALE_DESCRIPTION.to_owned(),
            value: Value::Scale(scale),
            ptype: ParameterType::Scale,
            is_default,
            tree: None,
        });
        Ok(())
    }

    /// Values of every `scale` extern other than [`SCALE_ID`], in declaration order.
    fn declared_scales(&self) -> ParamResult<Vec<Scale>> {
        let mut out = Vec::new();
        for decl in self.externs {
            // A redeclared id counts once, with its last declaration.
            let current = self.decls.get(decl.id.as_str()).copied();
            if decl.id == SCALE_ID
                || decl.type_name != ParameterType::Scale.name()
                || !current.is_some_and(|d| std::ptr::eq(d, decl))
            {
                continue;
            }
            let value = match self.store.value(&decl.id) {
                Some(v @ Value::Scale(_)) => v.clone(),
                _ => ParameterType::Scale.to_value(&decl.default)?,
            };
            if let Value::Scale(s) = value {
                out.push(s);
            }
        }
        Ok(out)
    }

    fn materialize(&mut self, decl: &ExternDeclaration) -> ParamResult<ResolvedParameter> {
        let ptype =
            ParameterType::from_name(&decl.type_name).ok_or_else(|| ParamError::UnknownType {
                id: decl.id.clone(),
                type_name: decl.type_name.clone(),
            })?;

        let (value, is_default) = match self.store.value(&decl.id) {
            Some(v) if v.ptype() == ptype => (v.clone(), false),
            _ => (ptype.to_value(&decl.default)?, true),
        };

        let tree = match (&value, ptype) {
            (Value::Palette(p), ParameterType::Palette) => {
                let next = self.palette_ordinals.len();
                let ordinal = *self
                    .palette_ordinals
                    .entry(decl.id.clone())
                    .or_insert(next);
                if ordinal == self.palettes.len() {
                    self.palettes.push(p.clone());
                }
                Some(palette_lambda(ordinal as i32))
            }
            (_, ParameterType::Scale | ParameterType::Source) => None,
            _ => Some(ptype.to_tree(&value, self.compiler)?),
        };

        Ok(ResolvedParameter {
            id: decl.id.clone(),
            description: decl.description.clone(),
            value,
            ptype,
            is_default,
            tree,
        })
    }

    fn inline(&self, id: &str) -> ParamResult<ResolvedParameter> {
        let (value, is_default) = match self.store.value(id) {
            Some(v @ Value::Expr(_)) => (v.clone(), false),
            _ => (Value::Expr("0".to_owned()), true),
        };
        let tree = ParameterType::Expr.to_tree(&value, self.compiler)?;
        Ok(ResolvedParameter {
            id: id.to_owned(),
            description: self
                .last_description
                .clone()
                .unwrap_or_else(|| INLINE_DESCRIPTION.to_owned()),
            value,
            ptype: ParameterType::Expr,
            is_default,
            tree: Some(tree),
        })
    }

    fn tree_of(&self, i: usize) -> ParamResult<Tree> {
        let param = &self.required[i];
        param.tree.clone().ok_or_else(|| {
            ParamError::unsupported(format!(
                "{} '{}' is not referenceable from code",
                param.ptype, param.id
            ))
        })
    }
}

impl IdResolver for ResolutionPass<'_> {
    fn resolve(&mut self, id: &str) -> ParamResult<Tree> {
        if let Some(&i) = self.index.get(id) {
            tracing::trace!(id, "cached parameter");
            if self.decls.contains_key(id) {
                self.last_description = Some(self.required[i].description.clone());
            }
            return self.tree_of(i);
        }

        if let Some(&decl) = self.decls.get(id) {
            tracing::trace!(id, ty = %decl.type_name, "declared parameter");
            let param = self.materialize(decl)?;
            self.last_description = Some(param.description.clone());
            let i = self.push(param);
            return self.tree_of(i);
        }

        if let Some(op) = self.compiler.instruction_set().get(id) {
            tracing::trace!(id, "builtin");
            return Ok(Tree::Builtin(op));
        }

        tracing::trace!(id, "inline parameter");
        let param = self.inline(id)?;
        let i = self.push(param);
        self.tree_of(i)
    }
}

/// `coord -> palette(ordinal, coord)`
fn palette_lambda(ordinal: i32) -> Tree {
    Tree::Lambda {
        params: vec![PALETTE_ARG.to_owned()],
        body: Box::new(Tree::App {
            func: Box::new(Tree::Builtin(Builtin::Palette)),
            args: vec![Tree::Int(ordinal), Tree::Id(PALETTE_ARG.to_owned())],
        }),
    }
}
