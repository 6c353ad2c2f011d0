//! Host-provided native functions callable from scripts.
//!
//! A [`NativeRegistry`] is built once and injected into the
//! [`Engine`](crate::Engine). Each context resolves it into its own
//! [`NativeTable`] at creation, keyed by names interned in that context.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use tracing::info;
use warmstart_common::{Ident, Interner};

use crate::error::EngineError;
use crate::value::Value;

/// Output lines collected by natives such as `print`.
pub type Console = Vec<String>;

/// A native callable, polymorphic over a fixed set of shapes.
#[derive(Clone, Copy)]
pub enum NativeFn {
    /// One numeric argument.
    Unary(fn(f64) -> f64),
    /// Two numeric arguments.
    Binary(fn(f64, f64) -> f64),
    /// Any arguments, with access to the context's console.
    Variadic(fn(&mut Console, &[Value]) -> Result<Value, String>),
}

impl NativeFn {
    /// Invokes the native. Errors are plain messages; the VM attaches context.
    pub fn call(&self, console: &mut Console, args: &[Value]) -> Result<Value, String> {
        match *self {
            NativeFn::Unary(f) => match args {
                [a] => Ok(Value::Number(f(number_arg(a, 0)?))),
                _ => Err(format!("expected 1 argument, got {}", args.len())),
            },
            NativeFn::Binary(f) => match args {
                [a, b] => Ok(Value::Number(f(number_arg(a, 0)?, number_arg(b, 1)?))),
                _ => Err(format!("expected 2 arguments, got {}", args.len())),
            },
            NativeFn::Variadic(f) => f(console, args),
        }
    }
}

impl std::fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shape = match self {
            NativeFn::Unary(_) => "Unary",
            NativeFn::Binary(_) => "Binary",
            NativeFn::Variadic(_) => "Variadic",
        };
        write!(f, "NativeFn::{shape}")
    }
}

fn number_arg(value: &Value, index: usize) -> Result<f64, String> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(format!(
            "argument {index} must be a number, got {}",
            other.type_name()
        )),
    }
}

fn native_add(a: f64, b: f64) -> f64 {
    a + b
}

fn native_print(console: &mut Console, args: &[Value]) -> Result<Value, String> {
    if args.is_empty() {
        return Err("expected at least 1 argument".to_string());
    }
    let line = args
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    info!(target: "warmstart::print", "{line}");
    console.push(line);
    Ok(Value::Undefined)
}

/// The extension natives shipped with the engine.
const EXTENSION: &[(&str, NativeFn)] = &[
    ("add", NativeFn::Binary(native_add)),
    ("print", NativeFn::Variadic(native_print)),
];

/// Named native functions available to every context of an engine.
#[derive(Debug, Clone, Default)]
pub struct NativeRegistry {
    natives: BTreeMap<String, NativeFn>,
}

impl NativeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every shipped extension native (`add`, `print`).
    pub fn with_extension() -> Self {
        let mut registry = Self::new();
        for (name, f) in EXTENSION {
            registry.register(name, *f);
        }
        registry
    }

    /// A registry holding the named subset of the shipped extension natives.
    pub fn from_names(names: &[String]) -> Result<Self, EngineError> {
        let mut registry = Self::new();
        for name in names {
            let (_, f) = EXTENSION
                .iter()
                .find(|(known, _)| known == name)
                .ok_or_else(|| EngineError::UnknownNative(name.clone()))?;
            registry.register(name, *f);
        }
        Ok(registry)
    }

    /// Registers or replaces a native.
    pub fn register(&mut self, name: &str, f: NativeFn) -> &mut Self {
        self.natives.insert(name.to_string(), f);
        self
    }

    /// Looks up a native by name.
    pub fn get(&self, name: &str) -> Option<NativeFn> {
        self.natives.get(name).copied()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.natives.keys().map(String::as_str)
    }

    /// Number of registered natives.
    pub fn len(&self) -> usize {
        self.natives.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.natives.is_empty()
    }
}

/// Per-context resolution of a registry.
pub struct NativeTable {
    interner: Interner,
    natives: HashMap<Ident, NativeFn>,
    globals: HashMap<Ident, Value>,
}

impl NativeTable {
    /// Resolves every native of `registry` into a fresh table.
    pub fn resolve(registry: &Arc<NativeRegistry>) -> Self {
        let mut interner = Interner::new();
        let natives = registry
            .natives
            .iter()
            .map(|(name, f)| (interner.get_or_intern(name), *f))
            .collect();
        Self {
            interner,
            natives,
            globals: HashMap::new(),
        }
    }

    /// Looks up a native by name.
    pub fn native(&self, name: &str) -> Option<NativeFn> {
        let id = self.interner.get(name)?;
        self.natives.get(&id).copied()
    }

    /// Looks up a context global by name.
    pub fn global(&self, name: &str) -> Option<&Value> {
        let id = self.interner.get(name)?;
        self.globals.get(&id)
    }

    /// Sets a context global.
    pub fn set_global(&mut self, name: &str, value: Value) {
        let id = self.interner.get_or_intern(name);
        self.globals.insert(id, value);
    }

    fn sorted_names<'a>(&'a self, ids: impl Iterator<Item = &'a Ident>) -> Vec<&'a str> {
        let mut names: Vec<&str> = ids.map(|id| self.interner.resolve(*id)).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for NativeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeTable")
            .field("natives", &self.sorted_names(self.natives.keys()))
            .field("globals", &self.sorted_names(self.globals.keys()))
            .finish()
    }
}
