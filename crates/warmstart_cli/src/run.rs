//! `warmstart run`: compile a script from source and run it.

use std::path::Path;

use warmstart_engine::{Context, Value};

use crate::session::{load_engine, read_source, CommandResult};
use crate::GlobalArgs;

/// Runs the `warmstart run` command.
pub fn run(script: &Path, global: &GlobalArgs) -> CommandResult {
    let engine = load_engine(global)?;
    let source = read_source(script)?;

    let mut cx = Context::create(&engine);
    let compiled = cx.compile(&source)?;
    let value = cx.run(&compiled)?;
    print_completion(&mut cx, &value);
    cx.dispose();
    Ok(0)
}

/// Prints the lines written by `print`, then the completion value unless it
/// is `undefined`.
pub fn print_completion(cx: &mut Context, value: &Value) {
    for line in cx.take_output() {
        println!("{line}");
    }
    if *value != Value::Undefined {
        println!("{value}");
    }
}
