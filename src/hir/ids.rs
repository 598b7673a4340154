//! Local symbol identifiers.

use std::fmt;

use crate::config::LocalNumbering;

/// A `local<N>` identifier.
///
/// Assigned sequentially as local declarations are discovered. Stable as
/// long as declaration order in the unit does not change.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct LocalId(pub u32);

impl LocalId {
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LocalId({})", self.0)
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "local{}", self.0)
    }
}

impl From<u32> for LocalId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Hands out [`LocalId`]s according to the configured numbering policy.
#[derive(Clone, Debug)]
pub struct LocalIdAllocator {
    policy: LocalNumbering,
    next: u32,
    /// Number of bodies currently entered.
    depth: u32,
}

impl LocalIdAllocator {
    pub fn new(policy: LocalNumbering) -> Self {
        Self {
            policy,
            next: 0,
            depth: 0,
        }
    }

    pub fn fresh(&mut self) -> LocalId {
        let id = LocalId(self.next);
        self.next += 1;
        id
    }

    /// Entering a method, constructor or initializer body. Under per-method
    /// numbering only an outermost body restarts the counter: bodies of
    /// local and anonymous classes continue the enclosing one, so no two
    /// locals of one member share a number.
    pub fn enter_body(&mut self) {
        if self.policy == LocalNumbering::PerMethod && self.depth == 0 {
            self.next = 0;
        }
        self.depth += 1;
    }

    /// Leaving the body entered last.
    pub fn exit_body(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_id_display() {
        assert_eq!(LocalId::new(3).to_string(), "local3");
        assert_eq!(format!("{:?}", LocalId::from(1)), "LocalId(1)");
    }

    #[test]
    fn test_per_unit_numbering_is_monotonic() {
        let mut ids = LocalIdAllocator::new(LocalNumbering::PerUnit);
        ids.enter_body();
        assert_eq!(ids.fresh(), LocalId(0));
        assert_eq!(ids.fresh(), LocalId(1));
        ids.exit_body();
        ids.enter_body();
        assert_eq!(ids.fresh(), LocalId(2));
    }

    #[test]
    fn test_per_method_numbering_restarts_only_at_outermost_body() {
        let mut ids = LocalIdAllocator::new(LocalNumbering::PerMethod);
        ids.enter_body();
        assert_eq!(ids.fresh(), LocalId(0));
        ids.enter_body();
        assert_eq!(ids.fresh(), LocalId(1));
        ids.exit_body();
        assert_eq!(ids.fresh(), LocalId(2));
        ids.exit_body();
        ids.enter_body();
        assert_eq!(ids.fresh(), LocalId(0));
    }
}
