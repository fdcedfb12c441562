//! Dotted numeric object identifiers.
//!
//! Walk bookkeeping relies on the lexicographic ordering of arcs, so [`Oid`]
//! derives `Ord` over its backing `Vec<u32>`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// An object identifier as a sequence of numeric arcs.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Oid(Vec<u32>);

impl Oid {
    pub fn from_arcs(arcs: &[u32]) -> Self {
        Oid(arcs.to_vec())
    }

    pub fn arcs(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, arc: u32) {
        self.0.push(arc);
    }

    /// A new oid extending `self` by one arc.
    pub fn child(&self, arc: u32) -> Oid {
        let mut arcs = self.0.clone();
        arcs.push(arc);
        Oid(arcs)
    }

    pub fn last(&self) -> Option<u32> {
        self.0.last().copied()
    }

    /// True when `base` is a prefix of `self` (every oid starts with itself).
    pub fn starts_with(&self, base: &Oid) -> bool {
        self.0.starts_with(&base.0)
    }

    /// The arcs following `base`, or `None` when `base` is not a prefix.
    pub fn suffix(&self, base: &Oid) -> Option<&[u32]> {
        if self.starts_with(base) {
            Some(&self.0[base.0.len()..])
        } else {
            None
        }
    }
}

impl From<Vec<u32>> for Oid {
    fn from(arcs: Vec<u32>) -> Self {
        Oid(arcs)
    }
}

impl From<&[u32]> for Oid {
    fn from(arcs: &[u32]) -> Self {
        Oid(arcs.to_vec())
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for arc in &self.0 {
            write!(f, ".{arc}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
#[error("invalid oid: {0}")]
pub struct ParseOidError(String);

impl FromStr for Oid {
    type Err = ParseOidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.strip_prefix('.').unwrap_or(s);
        if trimmed.is_empty() {
            return Err(ParseOidError(s.to_string()));
        }
        let mut arcs = Vec::with_capacity(8);
        for part in trimmed.split('.') {
            let arc = part
                .parse::<u32>()
                .map_err(|_| ParseOidError(s.to_string()))?;
            arcs.push(arc);
        }
        Ok(Oid(arcs))
    }
}
