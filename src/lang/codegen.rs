use std::collections::HashMap;

use crate::foundation::core::Cplx;
use crate::foundation::error::{ParamError, ParamResult};
use crate::lang::IdResolver;
use crate::lang::ast::{Ast, BinaryOp, Stmt, Tree, UnaryOp};
use crate::lang::instructions::{Builtin, Kind, opcode};

#[derive(Debug, Clone)]
enum Binding {
    /// A `var` living in a numbered slot.
    Slot(i32, Kind),
    /// A lambda argument, compiled lazily in the scope stack it was bound in.
    Tree(Tree, usize),
}

enum Callee {
    Builtin(Builtin),
    Lambda {
        params: Vec<String>,
        body: Tree,
    },
}

/// Lowers an [`Ast`] to flat code, asking `resolver` for every free identifier.
pub(crate) fn generate(ast: &Ast, resolver: &mut dyn IdResolver) -> ParamResult<Vec<i32>> {
    let mut g = CodeGen {
        resolver,
        scopes: vec![HashMap::new()],
        code: Vec::new(),
        next_slot: 0,
        expanding: Vec::new(),
    };
    for stmt in &ast.stmts {
        match stmt {
            Stmt::Extern(_) => {}
            Stmt::Var { name, init } => {
                let kind = g.expr(init)?;
                let slot = g.next_slot;
                g.next_slot += 1;
                g.emit(&[opcode::STORE, slot]);
                g.scopes[0].insert(name.clone(), Binding::Slot(slot, kind));
            }
            Stmt::Expr(e) => {
                g.expr(e)?;
                g.emit(&[opcode::POP]);
            }
        }
    }
    Ok(g.code)
}

struct CodeGen<'r> {
    resolver: &'r mut dyn IdResolver,
    scopes: Vec<HashMap<String, Binding>>,
    code: Vec<i32>,
    next_slot: i32,
    /// Resolver ids currently being expanded.
    expanding: Vec<String>,
}

impl CodeGen<'_> {
    fn emit(&mut self, words: &[i32]) {
        self.code.extend_from_slice(words);
    }

    fn lookup(&self, id: &str) -> Option<Binding> {
        self.scopes.iter().rev().find_map(|s| s.get(id).cloned())
    }

    /// Compiles `tree` with only the innermost `depth` scopes visible.
    fn expr_at(&mut self, tree: &Tree, depth: usize) -> ParamResult<Kind> {
        let hidden = self.scopes.split_off(depth);
        let out = self.expr(tree);
        self.scopes.extend(hidden);
        out
    }

    fn resolve(&mut self, id: &str) -> ParamResult<Tree> {
        if self.expanding.iter().any(|e| e == id) {
            return Err(ParamError::type_error(format!(
                "'{id}' refers to itself"
            )));
        }
        self.resolver.resolve(id)
    }

    fn expr(&mut self, tree: &Tree) -> ParamResult<Kind> {
        match tree {
            Tree::Int(v) => {
                self.emit(&[opcode::CONST_INT, *v]);
                Ok(Kind::Int)
            }
            Tree::Real(v) => {
                let [hi, lo] = split_f64(*v);
                self.emit(&[opcode::CONST_REAL, hi, lo]);
                Ok(Kind::Real)
            }
            Tree::Cplx(Cplx { re, im }) => {
                let [re_hi, re_lo] = split_f64(*re);
                let [im_hi, im_lo] = split_f64(*im);
                self.emit(&[opcode::CONST_CPLX, re_hi, re_lo, im_hi, im_lo]);
                Ok(Kind::Cplx)
            }
            Tree::Bool(b) => {
                self.emit(&[opcode::CONST_BOOL, i32::from(*b)]);
                Ok(Kind::Bool)
            }
            Tree::Str(_) | Tree::Vec(_) | Tree::Builtin(_) | Tree::Lambda { .. } => Err(
                ParamError::type_error(format!("a {} cannot be used as a value", tree.kind_name())),
            ),
            Tree::Id(id) => self.ident(id),
            Tree::Unary { op, arg } => {
                let k = self.expr(arg)?;
                match op {
                    UnaryOp::Neg if k.is_numeric() => {
                        self.emit(&[opcode::NEG]);
                        Ok(k)
                    }
                    UnaryOp::Not if k == Kind::Bool => {
                        self.emit(&[opcode::NOT]);
                        Ok(Kind::Bool)
                    }
                    _ => Err(ParamError::type_error(format!(
                        "operator {op:?} is not defined for {k:?}"
                    ))),
                }
            }
            Tree::Binary { op, left, right } => {
                let l = self.expr(left)?;
                let r = self.expr(right)?;
                let kind = binary_kind(*op, l, r)?;
                self.emit(&[binary_opcode(*op)]);
                Ok(kind)
            }
            Tree::App { func, args } => self.call(func, args),
        }
    }

    fn ident(&mut self, id: &str) -> ParamResult<Kind> {
        match self.lookup(id) {
            Some(Binding::Slot(slot, kind)) => {
                self.emit(&[opcode::LOAD, slot]);
                Ok(kind)
            }
            Some(Binding::Tree(tree, depth)) => self.expr_at(&tree, depth),
            None => {
                let tree = self.resolve(id)?;
                self.expanding.push(id.to_owned());
                let out = self.expr(&tree);
                self.expanding.pop();
                out
            }
        }
    }

    fn callee(&mut self, func: &Tree) -> ParamResult<Callee> {
        let mut current = func.clone();
        // Follows identifier aliases, bounded by the expansion guard.
        let mut pushed = 0usize;
        let out = loop {
            match current {
                Tree::Builtin(b) => break Ok(Callee::Builtin(b)),
                Tree::Lambda { params, body } => {
                    break Ok(Callee::Lambda {
                        params,
                        body: *body,
                    });
                }
                Tree::Id(id) => match self.lookup(&id) {
                    Some(Binding::Tree(tree, _)) => current = tree,
                    Some(Binding::Slot(..)) => {
                        break Err(ParamError::type_error(format!("'{id}' is not a function")));
                    }
                    None => match self.resolve(&id) {
                        Ok(tree) => {
                            self.expanding.push(id);
                            pushed += 1;
                            current = tree;
                        }
                        Err(e) => break Err(e),
                    },
                },
                other => {
                    break Err(ParamError::type_error(format!(
                        "a {} is not a function",
                        other.kind_name()
                    )));
                }
            }
        };
        let keep = self.expanding.len() - pushed;
        self.expanding.truncate(keep);
        out
    }

    fn call(&mut self, func: &Tree, args: &[Tree]) -> ParamResult<Kind> {
        match self.callee(func)? {
            Callee::Builtin(b) => {
                let mut kinds = Vec::with_capacity(args.len());
                for a in args {
                    kinds.push(self.expr(a)?);
                }
                let kind = b.result_kind(&kinds)?;
                self.emit(&[opcode::CALL, b.opcode(), args.len() as i32]);
                Ok(kind)
            }
            Callee::Lambda { params, body } => {
                if params.len() != args.len() {
                    return Err(ParamError::type_error(format!(
                        "function expects {} argument(s), got {}",
                        params.len(),
                        args.len()
                    )));
                }
                let depth = self.scopes.len();
                let scope = params
                    .into_iter()
                    .zip(args.iter().cloned())
                    .map(|(p, a)| (p, Binding::Tree(a, depth)))
                    .collect();
                self.scopes.push(scope);
                let out = self.expr(&body);
                self.scopes.pop();
                out
            }
        }
    }
}

fn split_f64(v: f64) -> [i32; 2] {
    let bits = v.to_bits();
    [(bits >> 32) as u32 as i32, bits as u32 as i32]
}

fn binary_kind(op: BinaryOp, l: Kind, r: Kind) -> ParamResult<Kind> {
    let mismatch = || {
        Err(ParamError::type_error(format!(
            "operator {op:?} is not defined for {l:?} and {r:?}"
        )))
    };
    let numeric = l.is_numeric() && r.is_numeric();
    let ordered = numeric && l != Kind::Cplx && r != Kind::Cplx;
    match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Pow
            if numeric =>
        {
            Ok(l.max(r))
        }
        BinaryOp::Mod if ordered => Ok(l.max(r)),
        BinaryOp::Cons if ordered => Ok(Kind::Cplx),
        BinaryOp::Eq | BinaryOp::Ne if numeric || (l == Kind::Bool && r == Kind::Bool) => {
            Ok(Kind::Bool)
        }
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge if ordered => Ok(Kind::Bool),
        BinaryOp::And | BinaryOp::Or if l == Kind::Bool && r == Kind::Bool => Ok(Kind::Bool),
        _ => mismatch(),
    }
}

fn binary_opcode(op: BinaryOp) -> i32 {
    match op {
        BinaryOp::Add => opcode::ADD,
        BinaryOp::Sub => opcode::SUB,
        BinaryOp::Mul => opcode::MUL,
        BinaryOp::Div => opcode::DIV,
        BinaryOp::Mod => opcode::MOD,
        BinaryOp::Pow => opcode::POW,
        BinaryOp::Cons => opcode::CONS,
        BinaryOp::Eq => opcode::EQ,
        BinaryOp::Ne => opcode::NE,
        BinaryOp::Lt => opcode::LT,
        BinaryOp::Le => opcode::LE,
        BinaryOp::Gt => opcode::GT,
        BinaryOp::Ge => opcode::GE,
        BinaryOp::And => opcode::AND,
        BinaryOp::Or => opcode::OR,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/lang/codegen.rs"]
mod tests;
