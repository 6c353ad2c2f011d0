//! Stack machine executing a [`Chunk`] inside one context.

use std::cmp::Ordering;

use crate::bytecode::{Chunk, Op};
use crate::error::ExecutionError;
use crate::natives::{Console, NativeTable};
use crate::value::Value;

/// Everything a chunk may touch while it runs.
pub(crate) struct Frame<'a> {
    pub chunk: &'a Chunk,
    pub origin: &'a str,
    pub table: &'a NativeTable,
    pub console: &'a mut Console,
    pub max_stack: usize,
}

/// Runs the chunk to completion and returns its completion value.
pub(crate) fn execute(frame: Frame<'_>) -> Result<Value, ExecutionError> {
    let Frame {
        chunk,
        origin,
        table,
        console,
        max_stack,
    } = frame;
    let fail = |message: String| ExecutionError {
        origin: origin.to_string(),
        message,
    };

    let mut stack: Vec<Value> = Vec::with_capacity(max_stack.min(64));
    let local_count = chunk.local_count as usize;
    if local_count > chunk.ops.len() {
        return Err(fail(format!(
            "{local_count} locals exceed a chunk of {} ops",
            chunk.ops.len()
        )));
    }
    let mut locals = vec![Value::Undefined; local_count];
    let mut result = Value::Undefined;

    macro_rules! pop {
        () => {
            stack
                .pop()
                .ok_or_else(|| fail("operand stack underflow".to_string()))?
        };
    }
    macro_rules! push {
        ($v:expr) => {{
            if stack.len() >= max_stack {
                return Err(fail(format!("operand stack overflow (limit {max_stack})")));
            }
            stack.push($v);
        }};
    }

    for op in &chunk.ops {
        match *op {
            Op::Const(i) => push!(lookup(&chunk.constants, i, &fail)?.clone()),
            Op::LoadLocal(i) => push!(lookup(&locals, i, &fail)?.clone()),
            Op::StoreLocal(i) => {
                let value = pop!();
                let slot = locals
                    .get_mut(i as usize)
                    .ok_or_else(|| fail(format!("local {i} out of range")))?;
                *slot = value;
            }
            Op::LoadGlobal(i) => {
                let name = lookup(&chunk.names, i, &fail)?;
                let value = table
                    .global(name)
                    .ok_or_else(|| fail(format!("{name} is not defined")))?;
                push!(value.clone());
            }
            Op::Neg => {
                let v = pop!();
                push!(Value::Number(-v.to_number()));
            }
            Op::Not => {
                let v = pop!();
                push!(Value::Bool(!v.is_truthy()));
            }
            Op::Add => {
                let r = pop!();
                let l = pop!();
                let v = match (&l, &r) {
                    (Value::Str(_), _) | (_, Value::Str(_)) => Value::Str(format!("{l}{r}")),
                    _ => Value::Number(l.to_number() + r.to_number()),
                };
                push!(v);
            }
            Op::Sub | Op::Mul | Op::Div | Op::Rem => {
                let r = pop!().to_number();
                let l = pop!().to_number();
                push!(Value::Number(match *op {
                    Op::Sub => l - r,
                    Op::Mul => l * r,
                    Op::Div => l / r,
                    _ => l % r,
                }));
            }
            Op::Eq | Op::Ne => {
                let r = pop!();
                let l = pop!();
                let equal = l == r;
                push!(Value::Bool(if *op == Op::Eq { equal } else { !equal }));
            }
            Op::Lt | Op::Le | Op::Gt | Op::Ge => {
                let r = pop!();
                let l = pop!();
                let ordering = match (&l, &r) {
                    (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
                    _ => l.to_number().partial_cmp(&r.to_number()),
                };
                let holds = match (ordering, *op) {
                    (None, _) => false,
                    (Some(o), Op::Lt) => o == Ordering::Less,
                    (Some(o), Op::Le) => o != Ordering::Greater,
                    (Some(o), Op::Gt) => o == Ordering::Greater,
                    (Some(o), _) => o != Ordering::Less,
                };
                push!(Value::Bool(holds));
            }
            Op::CallBuiltin { builtin, argc } => {
                let args = take_args(&mut stack, argc, &fail)?;
                let numbers: Vec<f64> = args.iter().map(Value::to_number).collect();
                push!(Value::Number(builtin.apply(&numbers)));
            }
            Op::CallNative { name, argc } => {
                let name = lookup(&chunk.names, name, &fail)?;
                let args = take_args(&mut stack, argc, &fail)?;
                let native = table
                    .native(name)
                    .ok_or_else(|| fail(format!("{name} is not a function")))?;
                let value = native
                    .call(console, &args)
                    .map_err(|e| fail(format!("{name}: {e}")))?;
                push!(value);
            }
            Op::SetResult => result = pop!(),
            Op::Return => return Ok(result),
        }
    }
    Err(fail("fell off the end of the chunk".to_string()))
}

fn lookup<'v, T>(
    items: &'v [T],
    index: u32,
    fail: &impl Fn(String) -> ExecutionError,
) -> Result<&'v T, ExecutionError> {
    items
        .get(index as usize)
        .ok_or_else(|| fail(format!("index {index} out of range")))
}

fn take_args(
    stack: &mut Vec<Value>,
    argc: u8,
    fail: &impl Fn(String) -> ExecutionError,
) -> Result<Vec<Value>, ExecutionError> {
    let argc = argc as usize;
    if stack.len() < argc {
        return Err(fail("operand stack underflow".to_string()));
    }
    Ok(stack.split_off(stack.len() - argc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::Builtin;
    use crate::natives::NativeRegistry;
    use std::sync::Arc;
    use warmstart_common::ContentHash;

    fn chunk(ops: Vec<Op>, constants: Vec<Value>, names: Vec<&str>) -> Chunk {
        Chunk {
            ops,
            constants,
            names: names.into_iter().map(String::from).collect(),
            local_count: 1,
            source_tag: ContentHash::from_bytes(b"vm"),
        }
    }

    fn run(chunk: &Chunk, max_stack: usize) -> (Result<Value, ExecutionError>, Console) {
        let table = NativeTable::resolve(&Arc::new(NativeRegistry::with_extension()));
        let mut console = Console::new();
        let result = execute(Frame {
            chunk,
            origin: "vm test",
            table: &table,
            console: &mut console,
            max_stack,
        });
        (result, console)
    }

    #[test]
    fn arithmetic_and_result() {
        let c = chunk(
            vec![
                Op::Const(0),
                Op::Const(1),
                Op::Add,
                Op::Const(1),
                Op::Mul,
                Op::SetResult,
                Op::Return,
            ],
            vec![Value::Number(1.0), Value::Number(2.0)],
            vec![],
        );
        assert_eq!(run(&c, 16).0, Ok(Value::Number(6.0)));
    }

    #[test]
    fn string_concatenation() {
        let c = chunk(
            vec![Op::Const(0), Op::Const(1), Op::Add, Op::SetResult, Op::Return],
            vec![Value::Str("n=".into()), Value::Number(4.0)],
            vec![],
        );
        assert_eq!(run(&c, 16).0, Ok(Value::Str("n=4".into())));
    }

    #[test]
    fn comparisons_with_nan_are_false() {
        let c = chunk(
            vec![Op::Const(0), Op::Const(1), Op::Le, Op::SetResult, Op::Return],
            vec![Value::Number(f64::NAN), Value::Number(1.0)],
            vec![],
        );
        assert_eq!(run(&c, 16).0, Ok(Value::Bool(false)));
    }

    #[test]
    fn builtin_call() {
        let c = chunk(
            vec![
                Op::Const(0),
                Op::CallBuiltin {
                    builtin: Builtin::Sqrt,
                    argc: 1,
                },
                Op::SetResult,
                Op::Return,
            ],
            vec![Value::Number(16.0)],
            vec![],
        );
        assert_eq!(run(&c, 16).0, Ok(Value::Number(4.0)));
    }

    #[test]
    fn native_call_and_console() {
        let c = chunk(
            vec![
                Op::Const(0),
                Op::CallNative { name: 0, argc: 1 },
                Op::SetResult,
                Op::Return,
            ],
            vec![Value::Str("hello".into())],
            vec!["print"],
        );
        let (result, console) = run(&c, 16);
        assert_eq!(result, Ok(Value::Undefined));
        assert_eq!(console, vec!["hello".to_string()]);
    }

    #[test]
    fn unknown_native_is_execution_error() {
        let c = chunk(
            vec![Op::CallNative { name: 0, argc: 0 }, Op::Return],
            vec![],
            vec!["launch"],
        );
        let err = run(&c, 16).0.unwrap_err();
        assert_eq!(err.origin, "vm test");
        assert_eq!(err.message, "launch is not a function");
    }

    #[test]
    fn undefined_global_is_execution_error() {
        let c = chunk(vec![Op::LoadGlobal(0), Op::Return], vec![], vec!["ghost"]);
        assert_eq!(run(&c, 16).0.unwrap_err().message, "ghost is not defined");
    }

    #[test]
    fn stack_limit_is_enforced() {
        let c = chunk(
            vec![Op::Const(0), Op::Const(0), Op::Const(0), Op::Return],
            vec![Value::Number(1.0)],
            vec![],
        );
        let err = run(&c, 2).0.unwrap_err();
        assert!(err.message.contains("overflow"));
    }

    #[test]
    fn underflow_is_an_error_not_a_panic() {
        let c = chunk(vec![Op::Add, Op::Return], vec![], vec![]);
        assert!(run(&c, 16).0.unwrap_err().message.contains("underflow"));
    }

    #[test]
    fn empty_result_is_undefined() {
        let c = chunk(vec![Op::Return], vec![], vec![]);
        assert_eq!(run(&c, 16).0, Ok(Value::Undefined));
    }

    #[test]
    fn local_count_larger_than_chunk_is_refused() {
        let mut c = chunk(vec![Op::Return], vec![], vec![]);
        c.local_count = u32::MAX;
        let err = run(&c, 16).0.unwrap_err();
        assert!(err.message.contains("locals exceed"));
    }
}
