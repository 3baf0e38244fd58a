use std::collections::BTreeMap;

use crate::foundation::error::{ParamError, ParamResult};

/// Opcodes of the flat instruction stream. Each is followed by its operands.
pub mod opcode {
    /// `CONST_INT value`
    pub const CONST_INT: i32 = 1;
    /// `CONST_REAL hi lo` (IEEE-754 bits)
    pub const CONST_REAL: i32 = 2;
    /// `CONST_CPLX re_hi re_lo im_hi im_lo`
    pub const CONST_CPLX: i32 = 3;
    /// `CONST_BOOL 0|1`
    pub const CONST_BOOL: i32 = 4;
    /// `LOAD slot`
    pub const LOAD: i32 = 5;
    /// `STORE slot`
    pub const STORE: i32 = 6;
    /// Discard the top of the stack.
    pub const POP: i32 = 7;
    /// `CALL builtin argc`
    pub const CALL: i32 = 8;

    #[allow(missing_docs)]
    pub const NEG: i32 = 10;
    #[allow(missing_docs)]
    pub const NOT: i32 = 11;
    #[allow(missing_docs)]
    pub const ADD: i32 = 12;
    #[allow(missing_docs)]
    pub const SUB: i32 = 13;
    #[allow(missing_docs)]
    pub const MUL: i32 = 14;
    #[allow(missing_docs)]
    pub const DIV: i32 = 15;
    #[allow(missing_docs)]
    pub const MOD: i32 = 16;
    #[allow(missing_docs)]
    pub const POW: i32 = 17;
    #[allow(missing_docs)]
    pub const CONS: i32 = 18;
    #[allow(missing_docs)]
    pub const EQ: i32 = 19;
    #[allow(missing_docs)]
    pub const NE: i32 = 20;
    #[allow(missing_docs)]
    pub const LT: i32 = 21;
    #[allow(missing_docs)]
    pub const LE: i32 = 22;
    #[allow(missing_docs)]
    pub const GT: i32 = 23;
    #[allow(missing_docs)]
    pub const GE: i32 = 24;
    #[allow(missing_docs)]
    pub const AND: i32 = 25;
    #[allow(missing_docs)]
    pub const OR: i32 = 26;
}

/// Static value kind tracked by the code generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Kind {
    Bool,
    Int,
    Real,
    Cplx,
}

impl Kind {
    pub(crate) fn is_numeric(self) -> bool {
        !matches!(self, Kind::Bool)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
/// Built-in operations of the standard instruction set.
pub enum Builtin {
    Sin,
    Cos,
    Tan,
    Exp,
    Log,
    Sqrt,
    Abs,
    Re,
    Im,
    Conj,
    Arg,
    Floor,
    Ceil,
    Min,
    Max,
    /// Samples palette `ordinal` at a complex coordinate, yielding an ARGB int.
    Palette,
}

impl Builtin {
    const ALL: [Builtin; 16] = [
        Builtin::Sin,
        Builtin::Cos,
        Builtin::Tan,
        Builtin::Exp,
        Builtin::Log,
        Builtin::Sqrt,
        Builtin::Abs,
        Builtin::Re,
        Builtin::Im,
        Builtin::Conj,
        Builtin::Arg,
        Builtin::Floor,
        Builtin::Ceil,
        Builtin::Min,
        Builtin::Max,
        Builtin::Palette,
    ];

    /// Name under which the operation is visible to programs.
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Sin => "sin",
            Builtin::Cos => "cos",
            Builtin::Tan => "tan",
            Builtin::Exp => "exp",
            Builtin::Log => "log",
            Builtin::Sqrt => "sqrt",
            Builtin::Abs => "abs",
            Builtin::Re => "re",
            Builtin::Im => "im",
            Builtin::Conj => "conj",
            Builtin::Arg => "arg",
            Builtin::Floor => "floor",
            Builtin::Ceil => "ceil",
            Builtin::Min => "min",
            Builtin::Max => "max",
            Builtin::Palette => "palette",
        }
    }

    /// Operand emitted after [`opcode::CALL`].
    pub fn opcode(self) -> i32 {
        100 + Self::ALL.iter().position(|b| *b == self).unwrap_or(0) as i32
    }

    /// Number of arguments.
    pub fn arity(self) -> usize {
        match self {
            Builtin::Min | Builtin::Max | Builtin::Palette => 2,
            _ => 1,
        }
    }

    pub(crate) fn result_kind(self, args: &[Kind]) -> ParamResult<Kind> {
        if args.len() != self.arity() {
            return Err(ParamError::type_error(format!(
                "'{}' expects {} argument(s), got {}",
                self.name(),
                self.arity(),
                args.len()
            )));
        }
        if let Some(k) = args.iter().find(|k| !k.is_numeric()) {
            return Err(ParamError::type_error(format!(
                "'{}' expects numeric arguments, got {k:?}",
                self.name()
            )));
        }
        let widest = args.iter().copied().max().unwrap_or(Kind::Int);
        match self {
            Builtin::Sin | Builtin::Cos | Builtin::Tan | Builtin::Exp | Builtin::Log
            | Builtin::Sqrt => Ok(widest.max(Kind::Real)),
            Builtin::Abs | Builtin::Re | Builtin::Im | Builtin::Arg => Ok(Kind::Real),
            Builtin::Conj => Ok(Kind::Cplx),
            Builtin::Floor | Builtin::Ceil | Builtin::Min | Builtin::Max => {
                if widest == Kind::Cplx {
                    return Err(ParamError::type_error(format!(
                        "'{}' is not defined for complex numbers",
                        self.name()
                    )));
                }
                Ok(if matches!(self, Builtin::Floor | Builtin::Ceil) {
                    Kind::Int
                } else {
                    widest
                })
            }
            Builtin::Palette => {
                if args[0] != Kind::Int {
                    return Err(ParamError::type_error(
                        "palette ordinal must be an int constant",
                    ));
                }
                Ok(Kind::Int)
            }
        }
    }
}

/// Read-only table of built-in operations, keyed by name.
#[derive(Debug, Clone)]
pub struct InstructionSet {
    table: BTreeMap<&'static str, Builtin>,
}

impl InstructionSet {
    /// The standard set containing every [`Builtin`].
    pub fn standard() -> Self {
        Self {
            table: Builtin::ALL.iter().map(|b| (b.name(), *b)).collect(),
        }
    }

    /// Looks up an operation by name.
    pub fn get(&self, name: &str) -> Option<Builtin> {
        self.table.get(name).copied()
    }

    /// Iterates over all names in lexical order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.table.keys().copied()
    }
}

impl Default for InstructionSet {
    fn default() -> Self {
        Self::standard()
    }
}
