//! Syntax tree produced by the parser.

/// A unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Numeric negation.
    Neg,
    /// Logical not.
    Not,
}

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`, numeric addition or string concatenation.
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
    /// `==`, strict equality.
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

/// An expression. `offset` fields are byte offsets into the source.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal.
    Number(f64),
    /// String literal.
    Str(String),
    /// `true` / `false`.
    Bool(bool),
    /// `undefined`.
    Undefined,
    /// A bare name: a local, a context constant, or a context global.
    Name {
        /// The identifier.
        name: String,
        /// Where it appears.
        offset: usize,
    },
    /// `-e` or `!e`.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Expr>,
    },
    /// `l op r`.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// `name(args)`, a native call.
    Call {
        /// The native's name.
        callee: String,
        /// Arguments.
        args: Vec<Expr>,
        /// Where the callee appears.
        offset: usize,
    },
    /// `Object.member(args)` or `Object.member`.
    Member {
        /// The object name (only `Math` is known).
        object: String,
        /// The member name.
        member: String,
        /// Call arguments, `None` for a property read.
        args: Option<Vec<Expr>>,
        /// Where the object name appears.
        offset: usize,
    },
}

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `let name = init`.
    Let {
        /// The new local's name.
        name: String,
        /// Its initializer.
        init: Expr,
        /// Where the name appears.
        offset: usize,
    },
    /// An expression whose value becomes the completion value.
    Expr(Expr),
}

/// A parsed script.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    /// Statements in source order.
    pub body: Vec<Stmt>,
}
