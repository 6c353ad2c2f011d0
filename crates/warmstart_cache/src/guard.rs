//! Consumption guard: forbids fresh compilation while a cache is consumed.
//!
//! Every execution context owns one [`CompileGate`]. Fresh compilation needs
//! a [`CompilePermit`], and [`CompileGate::permit`] is the only way to get
//! one. While a [`DisallowCompilation`] scope is alive the gate refuses to
//! issue permits, so a backend that tries to recompile instead of rebuilding
//! from the artifact fails with a [`GuardViolation`].

use std::cell::Cell;
use std::marker::PhantomData;

/// A fresh compile was attempted inside a [`DisallowCompilation`] scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("fresh compilation attempted while consuming a code cache (guard depth {depth})")]
pub struct GuardViolation {
    /// How many guard scopes were active.
    pub depth: u32,
}

/// Per-context switch deciding whether fresh compilation is allowed.
///
/// `Send` but not `Sync`: a context is driven by one thread at a time.
#[derive(Debug, Default)]
pub struct CompileGate {
    depth: Cell<u32>,
}

impl CompileGate {
    /// Creates a gate that allows compilation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters a scope in which fresh compilation is forbidden.
    ///
    /// Scopes nest; compilation is allowed again once every scope is dropped.
    pub fn disallow(&self) -> DisallowCompilation<'_> {
        self.depth.set(self.depth.get() + 1);
        DisallowCompilation { gate: self }
    }

    /// Returns `true` if no [`DisallowCompilation`] scope is active.
    pub fn is_allowed(&self) -> bool {
        self.depth.get() == 0
    }

    /// Number of active [`DisallowCompilation`] scopes.
    pub fn depth(&self) -> u32 {
        self.depth.get()
    }

    /// Requests permission to compile from source.
    pub fn permit(&self) -> Result<CompilePermit<'_>, GuardViolation> {
        match self.depth.get() {
            0 => Ok(CompilePermit {
                _gate: PhantomData,
            }),
            depth => Err(GuardViolation { depth }),
        }
    }
}

/// RAII scope returned by [`CompileGate::disallow`].
#[must_use = "compilation is only disallowed while the scope is held"]
#[derive(Debug)]
pub struct DisallowCompilation<'a> {
    gate: &'a CompileGate,
}

impl Drop for DisallowCompilation<'_> {
    fn drop(&mut self) {
        self.gate.depth.set(self.gate.depth.get() - 1);
    }
}

/// Proof that fresh compilation was allowed when it was requested.
///
/// Required by [`CompilationBackend::compile`](crate::CompilationBackend::compile).
#[derive(Debug)]
pub struct CompilePermit<'a> {
    _gate: PhantomData<&'a CompileGate>,
}
