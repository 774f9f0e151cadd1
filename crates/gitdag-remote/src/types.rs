use std::fmt;

use gitdag_types::GitOid;

/// Where a listed ref points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefTarget {
    /// A direct object reference.
    Oid(GitOid),
    /// A symbolic pointer, already rewritten to the `@<target>` convention
    /// the client expects.
    Pointer(String),
}

impl fmt::Display for RefTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefTarget::Oid(oid) => write!(f, "{oid}"),
            RefTarget::Pointer(target) => write!(f, "{target}"),
        }
    }
}

/// One advertised ref. Rendered as the protocol line `<target> <name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefEntry {
    pub name: String,
    pub target: RefTarget,
}

impl RefEntry {
    pub fn direct(name: impl Into<String>, oid: GitOid) -> Self {
        Self {
            name: name.into(),
            target: RefTarget::Oid(oid),
        }
    }

    pub fn pointer(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: RefTarget::Pointer(target.into()),
        }
    }

    /// The zero-hash placeholder advertised for a branch the remote lacks.
    pub fn absent(name: impl Into<String>) -> Self {
        Self::direct(name, GitOid::zero())
    }
}

impl fmt::Display for RefEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.target, self.name)
    }
}
