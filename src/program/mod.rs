pub(crate) mod history;
pub(crate) mod model;
pub(crate) mod resolver;

use crate::foundation::core::Scale;

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Settings shared by every program compiled with them.
pub struct ProgramOpts {
    /// Scale used when a program neither declares nor stores one.
    pub default_scale: Scale,
}

impl Default for ProgramOpts {
    fn default() -> Self {
        Self {
            default_scale: Scale::DEFAULT,
        }
    }
}
