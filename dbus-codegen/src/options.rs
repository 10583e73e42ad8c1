use dbus_signature::Mode;

/// How interfaces with the same name from several documents are combined
#[derive(Copy, Clone, Debug, Eq, PartialEq, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicy {
    /// Fail with `Error::DuplicateInterface`
    Reject,
    KeepFirst,
    KeepLast,
}

impl Default for MergePolicy {
    fn default() -> Self {
        MergePolicy::Reject
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    /// Resolution mode for method and signal args. Properties are always native.
    pub mode: Mode,

    /// Used by `merge`
    pub merge: MergePolicy,
}

impl Options {
    /// Reads options from a TOML table, e.g. `mode = "wire"`.
    pub fn from_toml(source: &str) -> crate::Result<Self> {
        Ok(toml::from_str(source)?)
    }
}
