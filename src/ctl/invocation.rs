use std::collections::btree_map;
use std::collections::BTreeMap;

use crate::constants::ENV_PREFIX;

/// Keyed connection fields of one client invocation.
///
/// Keys are flag names without leading dashes. Iteration order is the key
/// order, so both encodings are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagSet {
    fields: BTreeMap<String, String>,
}

impl FlagSet {
    pub fn insert(
        &mut self,
        key: &str,
        value: impl Into<String>,
    ) {
        self.fields.insert(key.to_string(), value.into());
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.fields.iter()
    }
}

/// Syntax a [`FlagSet`] is rendered in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// `--key=value` arguments
    Flags,
    /// `ETCDCTL_KEY=value` environment entries
    Env,
}

/// A rendered [`FlagSet`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationVector {
    Flags(Vec<String>),
    Env(BTreeMap<String, String>),
}

impl Encoding {
    pub fn encode(
        self,
        fields: &FlagSet,
    ) -> InvocationVector {
        match self {
            Encoding::Flags => InvocationVector::Flags(
                fields
                    .iter()
                    .map(|(key, value)| format!("--{key}={value}"))
                    .collect(),
            ),
            Encoding::Env => InvocationVector::Env(
                fields
                    .iter()
                    .map(|(key, value)| (env_key(key), value.clone()))
                    .collect(),
            ),
        }
    }
}

/// Environment variable the client reads for flag `key`:
/// `dial-timeout` becomes `ETCDCTL_DIAL_TIMEOUT`.
pub fn env_key(key: &str) -> String {
    format!("{}_{}", ENV_PREFIX, key.to_uppercase().replace('-', "_"))
}
