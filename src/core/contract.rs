//! Contract identities used to key loggers in a dispatcher or registry

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Identity of a logger contract
///
/// A dispatcher holds at most one child per identity, and a registry holds at
/// most one registration per identity. Identities are usually derived from a
/// type with [`ContractId::of`], but any stable name works.
///
/// # Example
///
/// ```
/// use log_dispatch::{ContractId, MemorySink};
///
/// let by_type = ContractId::of::<MemorySink>();
/// let by_name = ContractId::named("audit");
///
/// assert_ne!(by_type, by_name);
/// assert_eq!(by_name.as_str(), "audit");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractId(Cow<'static, str>);

impl ContractId {
    /// Identity derived from a type's fully qualified name
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self(Cow::Borrowed(std::any::type_name::<T>()))
    }

    /// Identity from an explicit name
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment of the identity (`a::b::FileSink` -> `FileSink`)
    pub fn short_name(&self) -> &str {
        let name = self.as_str();
        let base = name.split('<').next().unwrap_or(name);
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for ContractId {
    fn from(name: &'static str) -> Self {
        Self::named(name)
    }
}
