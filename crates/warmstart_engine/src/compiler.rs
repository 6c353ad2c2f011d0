//! Lowers a parsed [`Program`] to a [`Chunk`].

use std::collections::HashMap;

use warmstart_common::ContentHash;

use crate::ast::{BinaryOp, Expr, Program, Stmt, UnaryOp};
use crate::bytecode::{Builtin, Chunk, Op};
use crate::value::Value;

/// A semantic error at a byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticError {
    /// Byte offset of the offending construct.
    pub offset: usize,
    /// Description of the problem.
    pub message: String,
}

/// Compiler inputs besides the program itself.
pub struct CompileOptions<'a> {
    /// Fold arithmetic on literal operands.
    pub constant_folding: bool,
    /// Identity tag stored in the chunk.
    pub source_tag: ContentHash,
    /// Context constants that may be inlined.
    pub constants: &'a HashMap<String, Value>,
}

/// Output of [`compile_program`].
#[derive(Debug)]
pub struct Compiled {
    /// The bytecode.
    pub chunk: Chunk,
    /// Context constants that were inlined. Non-empty means the chunk is
    /// only meaningful in the context that compiled it.
    pub inlined: Vec<String>,
}

/// Compiles `program` into bytecode.
pub fn compile_program(
    program: &Program,
    options: &CompileOptions<'_>,
) -> Result<Compiled, SemanticError> {
    let mut cx = Codegen {
        options,
        ops: Vec::new(),
        constants: Vec::new(),
        names: Vec::new(),
        locals: HashMap::new(),
        inlined: Vec::new(),
    };
    for stmt in &program.body {
        cx.stmt(stmt)?;
    }
    cx.ops.push(Op::Return);

    let local_count = u32::try_from(cx.locals.len()).map_err(|_| SemanticError {
        offset: 0,
        message: "too many locals".to_string(),
    })?;
    Ok(Compiled {
        chunk: Chunk {
            ops: cx.ops,
            constants: cx.constants,
            names: cx.names,
            local_count,
            source_tag: options.source_tag,
        },
        inlined: cx.inlined,
    })
}

struct Codegen<'a> {
    options: &'a CompileOptions<'a>,
    ops: Vec<Op>,
    constants: Vec<Value>,
    names: Vec<String>,
    locals: HashMap<String, u32>,
    inlined: Vec<String>,
}

impl Codegen<'_> {
    fn stmt(&mut self, stmt: &Stmt) -> Result<(), SemanticError> {
        match stmt {
            Stmt::Let { name, init, offset } => {
                if self.locals.contains_key(name) {
                    return Err(SemanticError {
                        offset: *offset,
                        message: format!("'{name}' has already been declared"),
                    });
                }
                self.expr(init)?;
                let slot = self.locals.len() as u32;
                self.locals.insert(name.clone(), slot);
                self.ops.push(Op::StoreLocal(slot));
            }
            Stmt::Expr(expr) => {
                self.expr(expr)?;
                self.ops.push(Op::SetResult);
            }
        }
        Ok(())
    }

    fn expr(&mut self, expr: &Expr) -> Result<(), SemanticError> {
        if self.options.constant_folding {
            if let Some(n) = fold(expr) {
                self.push_const(Value::Number(n));
                return Ok(());
            }
        }

        match expr {
            Expr::Number(n) => self.push_const(Value::Number(*n)),
            Expr::Str(s) => self.push_const(Value::Str(s.clone())),
            Expr::Bool(b) => self.push_const(Value::Bool(*b)),
            Expr::Undefined => self.push_const(Value::Undefined),
            Expr::Name { name, .. } => {
                if let Some(&slot) = self.locals.get(name) {
                    self.ops.push(Op::LoadLocal(slot));
                } else if let Some(value) = self.options.constants.get(name) {
                    self.push_const(value.clone());
                    if !self.inlined.contains(name) {
                        self.inlined.push(name.clone());
                    }
                } else {
                    let idx = self.name_index(name);
                    self.ops.push(Op::LoadGlobal(idx));
                }
            }
            Expr::Unary { op, operand } => {
                self.expr(operand)?;
                self.ops.push(match op {
                    UnaryOp::Neg => Op::Neg,
                    UnaryOp::Not => Op::Not,
                });
            }
            Expr::Binary { op, lhs, rhs } => {
                self.expr(lhs)?;
                self.expr(rhs)?;
                self.ops.push(binary_op(*op));
            }
            Expr::Call {
                callee,
                args,
                offset,
            } => {
                let argc = self.args(args, *offset)?;
                let name = self.name_index(callee);
                self.ops.push(Op::CallNative { name, argc });
            }
            Expr::Member {
                object,
                member,
                args,
                offset,
            } => self.member(object, member, args.as_deref(), *offset)?,
        }
        Ok(())
    }

    fn member(
        &mut self,
        object: &str,
        member: &str,
        args: Option<&[Expr]>,
        offset: usize,
    ) -> Result<(), SemanticError> {
        if object != "Math" {
            return Err(SemanticError {
                offset,
                message: format!("unknown object '{object}'"),
            });
        }
        let Some(args) = args else {
            let value = match member {
                "PI" => std::f64::consts::PI,
                "E" => std::f64::consts::E,
                _ => {
                    return Err(SemanticError {
                        offset,
                        message: format!("unknown property 'Math.{member}'"),
                    })
                }
            };
            self.push_const(Value::Number(value));
            return Ok(());
        };

        let builtin = Builtin::from_name(member).ok_or_else(|| SemanticError {
            offset,
            message: format!("unknown function 'Math.{member}'"),
        })?;
        if let Some(arity) = builtin.arity() {
            if args.len() != arity {
                return Err(SemanticError {
                    offset,
                    message: format!(
                        "'Math.{member}' takes {arity} argument(s), got {}",
                        args.len()
                    ),
                });
            }
        }
        let argc = self.args(args, offset)?;
        self.ops.push(Op::CallBuiltin { builtin, argc });
        Ok(())
    }

    fn args(&mut self, args: &[Expr], offset: usize) -> Result<u8, SemanticError> {
        let argc = u8::try_from(args.len()).map_err(|_| SemanticError {
            offset,
            message: "too many arguments".to_string(),
        })?;
        for arg in args {
            self.expr(arg)?;
        }
        Ok(argc)
    }

    fn push_const(&mut self, value: Value) {
        let idx = match self.constants.iter().position(|c| same_constant(c, &value)) {
            Some(idx) => idx,
            None => {
                self.constants.push(value);
                self.constants.len() - 1
            }
        };
        self.ops.push(Op::Const(idx as u32));
    }

    fn name_index(&mut self, name: &str) -> u32 {
        match self.names.iter().position(|n| n == name) {
            Some(idx) => idx as u32,
            None => {
                self.names.push(name.to_string());
                (self.names.len() - 1) as u32
            }
        }
    }
}

/// Constant-pool deduplication; compares numbers bitwise so NaN and -0 are kept apart.
fn same_constant(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.to_bits() == y.to_bits(),
        _ => a == b,
    }
}

fn binary_op(op: BinaryOp) -> Op {
    match op {
        BinaryOp::Add => Op::Add,
        BinaryOp::Sub => Op::Sub,
        BinaryOp::Mul => Op::Mul,
        BinaryOp::Div => Op::Div,
        BinaryOp::Rem => Op::Rem,
        BinaryOp::Eq => Op::Eq,
        BinaryOp::Ne => Op::Ne,
        BinaryOp::Lt => Op::Lt,
        BinaryOp::Le => Op::Le,
        BinaryOp::Gt => Op::Gt,
        BinaryOp::Ge => Op::Ge,
    }
}

/// Evaluates purely numeric literal arithmetic, including `Math` calls on
/// literals. Returns `None` for anything else.
fn fold(expr: &Expr) -> Option<f64> {
    match expr {
        Expr::Number(n) => Some(*n),
        Expr::Unary {
            op: UnaryOp::Neg,
            operand,
        } => fold(operand).map(|n| -n),
        Expr::Binary { op, lhs, rhs } => {
            let (l, r) = (fold(lhs)?, fold(rhs)?);
            match op {
                BinaryOp::Add => Some(l + r),
                BinaryOp::Sub => Some(l - r),
                BinaryOp::Mul => Some(l * r),
                BinaryOp::Div => Some(l / r),
                BinaryOp::Rem => Some(l % r),
                _ => None,
            }
        }
        Expr::Member {
            object,
            member,
            args: Some(args),
            ..
        } if object == "Math" => {
            let builtin = Builtin::from_name(member)?;
            if builtin.arity().is_some_and(|arity| arity != args.len()) {
                return None;
            }
            let values = args.iter().map(fold).collect::<Option<Vec<_>>>()?;
            Some(builtin.apply(&values))
        }
        _ => None,
    }
}
