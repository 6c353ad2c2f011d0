//! Interned identifiers for per-context name tables.

use lasso::Rodeo;

/// An interned name inside a single execution context.
///
/// Idents are indices into one context's [`Interner`]; they are transient
/// per-context state and are never written into a cache artifact.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Ident(u32);

impl Ident {
    /// Returns the raw `u32` index of this identifier.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

// SAFETY: `Ident` wraps a `u32` which is always a valid `usize` on 32-bit and
// 64-bit platforms. `try_from_usize` rejects values that don't fit in `u32`.
unsafe impl lasso::Key for Ident {
    fn into_usize(self) -> usize {
        self.0 as usize
    }

    fn try_from_usize(int: usize) -> Option<Self> {
        u32::try_from(int).ok().map(Ident)
    }
}

/// Single-threaded string interner backed by [`lasso::Rodeo`].
///
/// Each execution context owns one; nothing is shared across contexts.
pub struct Interner {
    rodeo: Rodeo<Ident>,
}

impl Interner {
    /// Creates a new empty interner.
    pub fn new() -> Self {
        Self {
            rodeo: Rodeo::new(),
        }
    }

    /// Interns a string, returning its [`Ident`].
    pub fn get_or_intern(&mut self, s: &str) -> Ident {
        self.rodeo.get_or_intern(s)
    }

    /// Looks up a string without interning it.
    pub fn get(&self, s: &str) -> Option<Ident> {
        self.rodeo.get(s)
    }

    /// Resolves an [`Ident`] back to its string value.
    ///
    /// # Panics
    ///
    /// Panics if the `Ident` was not created by this interner.
    pub fn resolve(&self, ident: Ident) -> &str {
        self.rodeo.resolve(&ident)
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_resolve_roundtrip() {
        let mut interner = Interner::new();
        let id = interner.get_or_intern("print");
        assert_eq!(interner.resolve(id), "print");
    }

    #[test]
    fn same_string_same_ident() {
        let mut interner = Interner::new();
        let a = interner.get_or_intern("add");
        let b = interner.get_or_intern("add");
        assert_eq!(a, b);
        assert_eq!(interner.resolve(b), "add");
    }

    #[test]
    fn get_does_not_intern() {
        let mut interner = Interner::new();
        assert!(interner.get("missing").is_none());
        let id = interner.get_or_intern("present");
        assert_eq!(id.as_raw(), 0);
        assert_eq!(interner.get("present"), Some(id));
    }

    #[test]
    fn separate_interners_are_independent() {
        let mut a = Interner::new();
        let mut b = Interner::new();
        a.get_or_intern("first");
        let in_a = a.get_or_intern("shared");
        let in_b = b.get_or_intern("shared");
        assert_ne!(in_a.as_raw(), in_b.as_raw());
    }
}
