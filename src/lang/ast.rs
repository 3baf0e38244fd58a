use crate::foundation::core::Cplx;
use crate::lang::instructions::Builtin;

#[derive(Debug, Clone, PartialEq)]
/// Expression tree shared by the parser, the code generator and identifier resolvers.
pub enum Tree {
    /// Integer literal.
    Int(i32),
    /// Real literal.
    Real(f64),
    /// Complex literal.
    Cplx(Cplx),
    /// Boolean literal.
    Bool(bool),
    /// String literal; only meaningful as an extern default.
    Str(String),
    /// Vector literal; only meaningful as an extern default.
    Vec(Vec<Tree>),
    /// Free or bound identifier.
    Id(String),
    /// A built-in operation of the instruction set.
    Builtin(Builtin),
    /// Unary operator application.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        arg: Box<Tree>,
    },
    /// Binary operator application.
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Tree>,
        /// Right operand.
        right: Box<Tree>,
    },
    /// Function application.
    App {
        /// Callee.
        func: Box<Tree>,
        /// Arguments in evaluation order.
        args: Vec<Tree>,
    },
    /// Anonymous function, inlined at its call sites.
    Lambda {
        /// Parameter names.
        params: Vec<String>,
        /// Body referencing the parameters.
        body: Box<Tree>,
    },
}

impl Tree {
    /// Short description of the node kind for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Tree::Int(_) => "int",
            Tree::Real(_) => "real",
            Tree::Cplx(_) => "cplx",
            Tree::Bool(_) => "bool",
            Tree::Str(_) => "string",
            Tree::Vec(_) => "vector",
            Tree::Id(_) => "identifier",
            Tree::Builtin(_) => "builtin",
            Tree::Unary { .. } | Tree::Binary { .. } | Tree::App { .. } => "expression",
            Tree::Lambda { .. } => "function",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
/// Prefix operators.
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
/// Infix operators. `Cons` builds a complex number from two reals.
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Cons,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
/// A source-level `extern` statement.
pub struct ExternDeclaration {
    /// Parameter id.
    pub id: String,
    /// Declared type name, resolved later via [`crate::ParameterType::from_name`].
    pub type_name: String,
    /// Human readable label; defaults to the id.
    pub description: String,
    /// Default literal.
    pub default: Tree,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Stmt {
    Extern(ExternDeclaration),
    Var { name: String, init: Tree },
    Expr(Tree),
}

#[derive(Debug, Clone, PartialEq)]
/// A parsed program.
pub struct Ast {
    pub(crate) stmts: Vec<Stmt>,
}

impl Ast {
    /// All extern declarations in source order.
    pub fn extern_declarations(&self) -> Vec<ExternDeclaration> {
        self.stmts
            .iter()
            .filter_map(|s| match s {
                Stmt::Extern(decl) => Some(decl.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of top-level statements.
    pub fn len(&self) -> usize {
        self.stmts.len()
    }

    /// True if the program holds no statements.
    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }
}
