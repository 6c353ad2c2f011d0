//! `warmstart demo`: code cache round trip between two contexts.

use warmstart_engine::{CacheOutcome, Context, Engine, SourceDescriptor, Value};

use crate::session::{load_engine, CommandResult};
use crate::GlobalArgs;

const SQRT_SCRIPT: &str = "Math.sqrt(16)";
const EXTENSION_SCRIPT: &str = "print('add(2, 3) =', add(2, 3)); add(40, 2)";

/// Runs the `warmstart demo` command.
pub fn run(global: &GlobalArgs) -> CommandResult {
    let engine = load_engine(global)?;
    for line in round_trip(&engine, SQRT_SCRIPT, "demo/sqrt.js")? {
        println!("{line}");
    }
    for line in round_trip(&engine, EXTENSION_SCRIPT, "demo/extension.js")? {
        println!("{line}");
    }
    Ok(0)
}

/// Compiles `text` in one context, disposes it, consumes the artifact in a
/// second context and returns the second context's output followed by the
/// completion value.
fn round_trip(
    engine: &Engine,
    text: &str,
    origin: &str,
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let source = SourceDescriptor::new(text, origin);

    let mut producer = Context::create(engine);
    let script = producer.compile(&source)?;
    let artifact = producer.create_code_cache(&script)?;
    producer.dispose();

    let mut consumer = Context::create(engine);
    let (script, outcome) = consumer.compile_or_consume(&source, Some(&artifact))?;
    if outcome != CacheOutcome::Consumed {
        return Err(format!("{origin}: code cache was not consumed ({outcome:?})").into());
    }
    let value = consumer.run(&script)?;

    let mut lines = consumer.take_output();
    if value != Value::Undefined {
        lines.push(value.to_string());
    }
    Ok(lines)
}
