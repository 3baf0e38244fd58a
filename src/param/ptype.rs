use std::fmt;

use crate::foundation::core::{Cplx, Palette, Scale};
use crate::foundation::error::{ParamError, ParamResult};
use crate::foundation::math::Fnv1a64;
use crate::lang::{Compiler, Tree};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
/// The closed set of parameter kinds.
pub enum ParameterType {
    /// 32-bit integer.
    Int,
    /// Double precision real.
    Real,
    /// Complex number.
    Cplx,
    /// Boolean.
    Bool,
    /// Expression text, parsed again at every compile.
    Expr,
    /// ARGB color.
    Color,
    /// Color grid sampled through the `palette` builtin.
    Palette,
    /// View transform.
    Scale,
    /// The program text itself.
    Source,
}

impl ParameterType {
    /// Every type, in declaration order.
    pub const ALL: [ParameterType; 9] = [
        ParameterType::Int,
        ParameterType::Real,
        ParameterType::Cplx,
        ParameterType::Bool,
        ParameterType::Expr,
        ParameterType::Color,
        ParameterType::Palette,
        ParameterType::Scale,
        ParameterType::Source,
    ];

    /// The name used in `extern` declarations and persisted data.
    pub fn name(self) -> &'static str {
        match self {
            ParameterType::Int => "int",
            ParameterType::Real => "real",
            ParameterType::Cplx => "cplx",
            ParameterType::Bool => "bool",
            ParameterType::Expr => "expr",
            ParameterType::Color => "color",
            ParameterType::Palette => "palette",
            ParameterType::Scale => "scale",
            ParameterType::Source => "source",
        }
    }

    /// Inverse of [`ParameterType::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Converts a declaration literal into a native value.
    ///
    /// Fails with [`ParamError::Type`] if the literal has the wrong shape.
    pub fn to_value(self, literal: &Tree) -> ParamResult<Value> {
        let shape = || {
            ParamError::type_error(format!(
                "{} literal expected, found {}",
                self.name(),
                literal.kind_name()
            ))
        };
        match self {
            ParameterType::Int => int_literal(literal).map(Value::Int).ok_or_else(shape),
            ParameterType::Color => int_literal(literal)
                .map(|v| Value::Color(v as u32))
                .ok_or_else(shape),
            ParameterType::Real => real_literal(literal).map(Value::Real).ok_or_else(shape),
            ParameterType::Cplx => match literal {
                Tree::Cplx(c) => Ok(Value::Cplx(*c)),
                other => real_literal(other)
                    .map(|re| Value::Cplx(Cplx::new(re, 0.0)))
                    .ok_or_else(shape),
            },
            ParameterType::Bool => match literal {
                Tree::Bool(b) => Ok(Value::Bool(*b)),
                _ => Err(shape()),
            },
            ParameterType::Expr => match literal {
                Tree::Str(s) => Ok(Value::Expr(s.clone())),
                _ => Err(shape()),
            },
            ParameterType::Palette => palette_literal(literal).map(Value::Palette),
            ParameterType::Scale => match literal {
                Tree::Vec(items) if items.len() == 6 => {
                    let mut c = [0.0; 6];
                    for (slot, item) in c.iter_mut().zip(items) {
                        *slot = real_literal(item).ok_or_else(shape)?;
                    }
                    Ok(Value::Scale(Scale::from(c)))
                }
                _ => Err(shape()),
            },
            ParameterType::Source => Err(ParamError::type_error(
                "source cannot be declared inside a program, use expr instead",
            )),
        }
    }

    /// Converts a native value into the tree that is compiled in place of the
    /// parameter.
    ///
    /// Palettes, scales and sources have no literal form and fail with
    /// [`ParamError::Unsupported`]. Expression text is parsed with `compiler`.
    pub fn to_tree(self, value: &Value, compiler: &dyn Compiler) -> ParamResult<Tree> {
        match self.coerce(value.clone())? {
            Value::Int(v) => Ok(Tree::Int(v)),
            Value::Real(v) => Ok(Tree::Real(v)),
            Value::Cplx(c) => Ok(Tree::Cplx(c)),
            Value::Bool(b) => Ok(Tree::Bool(b)),
            Value::Color(c) => Ok(Tree::Int(c as i32)),
            Value::Expr(text) => compiler.parse_expr(&text),
            Value::Palette(_) | Value::Scale(_) | Value::Source(_) => Err(
                ParamError::unsupported(format!("{} has no literal form", self.name())),
            ),
        }
    }

    /// Converts `value` into this type's native form.
    ///
    /// Numbers convert between int, real and color and lift to complex. Any
    /// finite scalar renders to expression text.
    pub fn coerce(self, value: Value) -> ParamResult<Value> {
        let cast = |v: &Value| ParamError::type_cast(self, v.describe());
        let out = match (self, value) {
            (ParameterType::Int, Value::Int(v)) => Value::Int(v),
            (ParameterType::Int, Value::Real(v)) => Value::Int(v as i32),
            (ParameterType::Int, Value::Color(v)) => Value::Int(v as i32),

            (ParameterType::Real, Value::Int(v)) => Value::Real(f64::from(v)),
            (ParameterType::Real, Value::Real(v)) => Value::Real(v),
            (ParameterType::Real, Value::Color(v)) => Value::Real(f64::from(v)),

            (ParameterType::Color, Value::Int(v)) => Value::Color(v as u32),
            (ParameterType::Color, Value::Real(v)) => Value::Color(v as i64 as u32),
            (ParameterType::Color, Value::Color(v)) => Value::Color(v),

            (ParameterType::Cplx, Value::Cplx(c)) => Value::Cplx(c),
            (ParameterType::Cplx, v @ (Value::Int(_) | Value::Real(_))) => {
                let re = v.as_f64().ok_or_else(|| cast(&v))?;
                Value::Cplx(Cplx::new(re, 0.0))
            }

            (ParameterType::Bool, Value::Bool(b)) => Value::Bool(b),

            (ParameterType::Expr, Value::Expr(s)) => Value::Expr(s),
            (ParameterType::Expr, Value::Int(v)) => Value::Expr(v.to_string()),
            // NaN and infinities have no literal form.
            (ParameterType::Expr, v @ Value::Real(r)) if !r.is_finite() => return Err(cast(&v)),
            (ParameterType::Expr, v @ Value::Cplx(c)) if !(c.re.is_finite() && c.im.is_finite()) => {
                return Err(cast(&v));
            }
            (ParameterType::Expr, Value::Real(v)) => Value::Expr(format!("{v:?}")),
            (ParameterType::Expr, Value::Cplx(c)) => Value::Expr(format!("{:?}:{:?}", c.re, c.im)),
            (ParameterType::Expr, Value::Bool(b)) => Value::Expr(b.to_string()),
            (ParameterType::Expr, Value::Color(c)) => Value::Expr(format!("#{c:08x}")),

            (ParameterType::Palette, Value::Palette(p)) => Value::Palette(p),
            (ParameterType::Scale, Value::Scale(s)) => Value::Scale(s),
            (ParameterType::Source, Value::Source(s) | Value::Expr(s)) => Value::Source(s),

            (_, v) => return Err(cast(&v)),
        };
        Ok(out)
    }

    /// True if [`ParameterType::coerce`] would accept `value`.
    pub fn accepts(self, value: &Value) -> bool {
        self.coerce(value.clone()).is_ok()
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
/// A native parameter value, tagged with its type.
#[allow(missing_docs)]
pub enum Value {
    Int(i32),
    Real(f64),
    Cplx(Cplx),
    Bool(bool),
    Expr(String),
    Color(u32),
    Palette(Palette),
    Scale(Scale),
    Source(String),
}

impl Value {
    /// The type tag of this value.
    pub fn ptype(&self) -> ParameterType {
        match self {
            Value::Int(_) => ParameterType::Int,
            Value::Real(_) => ParameterType::Real,
            Value::Cplx(_) => ParameterType::Cplx,
            Value::Bool(_) => ParameterType::Bool,
            Value::Expr(_) => ParameterType::Expr,
            Value::Color(_) => ParameterType::Color,
            Value::Palette(_) => ParameterType::Palette,
            Value::Scale(_) => ParameterType::Scale,
            Value::Source(_) => ParameterType::Source,
        }
    }

    /// Text of `expr` and `source` values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Expr(s) | Value::Source(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric scalar as `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(f64::from(*v)),
            Value::Real(v) => Some(*v),
            Value::Color(v) => Some(f64::from(*v)),
            _ => None,
        }
    }

    fn describe(&self) -> String {
        match self {
            Value::Int(v) => format!("int {v}"),
            Value::Real(v) => format!("real {v}"),
            Value::Cplx(c) => format!("cplx {}:{}", c.re, c.im),
            Value::Bool(b) => format!("bool {b}"),
            Value::Expr(s) => format!("expr {s:?}"),
            Value::Color(c) => format!("color #{c:08x}"),
            Value::Palette(p) => format!("palette {}x{}", p.width(), p.height()),
            Value::Scale(_) => "scale".to_owned(),
            Value::Source(_) => "source".to_owned(),
        }
    }

    pub(crate) fn hash_into(&self, h: &mut Fnv1a64) {
        h.write_u8(self.ptype() as u8);
        match self {
            Value::Int(v) => h.write_u32(*v as u32),
            Value::Real(v) => h.write_f64(*v),
            Value::Cplx(c) => {
                h.write_f64(c.re);
                h.write_f64(c.im);
            }
            Value::Bool(b) => h.write_u8(u8::from(*b)),
            Value::Expr(s) | Value::Source(s) => h.write_str(s),
            Value::Color(c) => h.write_u32(*c),
            Value::Palette(p) => {
                h.write_u32(p.width());
                h.write_u32(p.height());
                for c in p.colors() {
                    h.write_u32(*c);
                }
            }
            Value::Scale(s) => {
                for c in <[f64; 6]>::from(*s) {
                    h.write_f64(c);
                }
            }
        }
    }
}

fn int_literal(t: &Tree) -> Option<i32> {
    match t {
        Tree::Int(v) => Some(*v),
        _ => None,
    }
}

fn real_literal(t: &Tree) -> Option<f64> {
    match t {
        Tree::Int(v) => Some(f64::from(*v)),
        Tree::Real(v) => Some(*v),
        _ => None,
    }
}

/// `c`, `[c, c]` (one color per row) or `[[c, c], [c], []]`.
fn palette_literal(t: &Tree) -> ParamResult<Palette> {
    let rows = match t {
        Tree::Int(c) => vec![vec![*c as u32]],
        Tree::Vec(items) => {
            let mut rows = Vec::with_capacity(items.len());
            for item in items {
                rows.push(match item {
                    Tree::Int(c) => vec![*c as u32],
                    Tree::Vec(colors) => colors
                        .iter()
                        .map(|c| int_literal(c).map(|v| v as u32))
                        .collect::<Option<Vec<_>>>()
                        .ok_or_else(|| ParamError::type_error("palette colors must be ints"))?,
                    other => {
                        return Err(ParamError::type_error(format!(
                            "palette row expected, found {}",
                            other.kind_name()
                        )));
                    }
                });
            }
            rows
        }
        other => {
            return Err(ParamError::type_error(format!(
                "palette literal expected, found {}",
                other.kind_name()
            )));
        }
    };
    Palette::from_rows(&rows)
}

#[cfg(test)]
#[path = "../../tests/unit/param/ptype.rs"]
mod tests;
