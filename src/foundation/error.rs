use crate::param::ptype::ParameterType;

/// Convenience result type used across the crate.
pub type ParamResult<T> = Result<T, ParamError>;

/// Top-level error taxonomy used by the parameter model APIs.
#[derive(thiserror::Error, Debug)]
pub enum ParamError {
    /// Malformed program source or expression text.
    #[error("syntax error at byte {offset}: {message}")]
    Syntax {
        /// Byte offset into the parsed text.
        offset: usize,
        /// Human readable description.
        message: String,
    },

    /// An extern declares a type name that is not a known [`ParameterType`].
    #[error("unknown type error: '{type_name}' declared for '{id}'")]
    UnknownType {
        /// Declared parameter id.
        id: String,
        /// The unrecognized type name.
        type_name: String,
    },

    /// A literal does not have the shape required by a type, or code generation
    /// found operands of incompatible kinds.
    #[error("type error: {0}")]
    Type(String),

    /// A native value is incompatible with a declared or inferred parameter type.
    #[error("type cast error: cannot use {found} as {expected}")]
    TypeCast {
        /// Parameter type that was required.
        expected: ParameterType,
        /// Description of the offending value.
        found: String,
    },

    /// A structurally disallowed conversion or reference.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Program index outside of the owning collection.
    #[error("index error: {index} is out of range for length {len}")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Collection length at the time of the request.
        len: usize,
    },

    /// No program requires a parameter with this id.
    #[error("unknown parameter: '{0}'")]
    UnknownParameter(String),

    /// Errors when serializing or deserializing parameter stores.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ParamError {
    /// Build a [`ParamError::Syntax`] value.
    pub fn syntax(offset: usize, msg: impl Into<String>) -> Self {
        Self::Syntax {
            offset,
            message: msg.into(),
        }
    }

    /// Build a [`ParamError::Type`] value.
    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::Type(msg.into())
    }

    /// Build a [`ParamError::TypeCast`] value.
    pub fn type_cast(expected: ParameterType, found: impl Into<String>) -> Self {
        Self::TypeCast {
            expected,
            found: found.into(),
        }
    }

    /// Build a [`ParamError::Unsupported`] value.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Build a [`ParamError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// True for the compile error family: syntax, unknown types and type errors
    /// raised while parsing or generating code.
    pub fn is_compile_error(&self) -> bool {
        matches!(
            self,
            Self::Syntax { .. } | Self::UnknownType { .. } | Self::Type(_)
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
