use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use crate::foundation::error::{ParamError, ParamResult};
use crate::foundation::math::Fnv1a64;
use crate::param::ptype::{ParameterType, Value};

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "StoreRepr", into = "StoreRepr")]
/// Immutable snapshot of a program configuration: source text plus the
/// user-set parameter values.
///
/// Every mutator returns a new store. A parameter without an entry uses the
/// default from its declaration.
pub struct ParameterStore {
    source: String,
    values: BTreeMap<String, Value>,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct StoreRepr {
    code: String,
    #[serde(default)]
    data: BTreeMap<String, Value>,
}

impl ParameterStore {
    /// A store holding `source` and no overrides.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            values: BTreeMap::new(),
        }
    }

    /// The program text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Copy with different source text and the same overrides.
    pub fn with_source(&self, source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            values: self.values.clone(),
        }
    }

    /// Copy with `id` set to `value`, converted to `ptype`.
    ///
    /// `source` values cannot be stored; use [`ParameterStore::with_source`].
    pub fn with_value(&self, id: &str, ptype: ParameterType, value: Value) -> ParamResult<Self> {
        if ptype == ParameterType::Source {
            return Err(ParamError::unsupported(format!(
                "'{id}' cannot be stored as source"
            )));
        }
        let value = ptype.coerce(value)?;
        let mut values = self.values.clone();
        values.insert(id.to_owned(), value);
        Ok(Self {
            source: self.source.clone(),
            values,
        })
    }

    /// Copy with the override for `id` removed.
    pub fn without_value(&self, id: &str) -> Self {
        let mut values = self.values.clone();
        values.remove(id);
        Self {
            source: self.source.clone(),
            values,
        }
    }

    /// The stored override, if any.
    pub fn value(&self, id: &str) -> Option<&Value> {
        self.values.get(id)
    }

    /// Type tag of the stored override, if any.
    pub fn ptype(&self, id: &str) -> Option<ParameterType> {
        self.values.get(id).map(Value::ptype)
    }

    /// True iff no override is stored for `id`.
    pub fn is_default(&self, id: &str) -> bool {
        !self.values.contains_key(id)
    }

    /// Ids with an override, in lexical order.
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.values.keys().map(String::as_str)
    }

    /// Number of overrides.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if the store has no overrides.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Stable 64-bit digest of source and overrides.
    pub fn fingerprint(&self) -> u64 {
        let mut h = Fnv1a64::new_default();
        h.write_str(&self.source);
        h.write_u64(self.values.len() as u64);
        for (id, value) in &self.values {
            h.write_str(id);
            value.hash_into(&mut h);
        }
        h.finish()
    }

    /// Serializes as `{"code": ..., "data": {...}}`.
    pub fn to_json(&self) -> ParamResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ParamError::serde(e.to_string()))
    }

    /// Inverse of [`ParameterStore::to_json`].
    pub fn from_json(text: &str) -> ParamResult<Self> {
        serde_json::from_str(text).map_err(|e| ParamError::serde(e.to_string()))
    }
}

impl Hash for ParameterStore {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.fingerprint());
    }
}

impl TryFrom<StoreRepr> for ParameterStore {
    type Error = ParamError;

    fn try_from(r: StoreRepr) -> Result<Self, Self::Error> {
        if let Some((id, _)) = r.data.iter().find(|(_, v)| v.ptype() == ParameterType::Source) {
            return Err(ParamError::serde(format!(
                "'{id}' is stored with type source"
            )));
        }
        Ok(Self {
            source: r.code,
            values: r.data,
        })
    }
}

impl From<ParameterStore> for StoreRepr {
    fn from(s: ParameterStore) -> Self {
        Self {
            code: s.source,
            data: s.values,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/param/store.rs"]
mod tests;
