//! Type-safe wrapper for tenant identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a principal (catalog owner) or a row owner.
///
/// Stored in the `user_id` column of both physical tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TenantId(i64);

impl TenantId {
    #[inline]
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    #[inline]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TenantId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_id_conversions() {
        let id: TenantId = 42.into();
        assert_eq!(id, TenantId::new(42));
        assert_eq!(id.as_i64(), 42);
        assert_eq!(id.to_string(), "42");
    }
}
