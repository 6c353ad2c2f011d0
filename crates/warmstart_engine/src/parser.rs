//! Recursive-descent parser from tokens to a [`Program`].

use crate::ast::{BinaryOp, Expr, Program, Stmt, UnaryOp};
use crate::lexer::{tokenize, LexError, Token, TokenKind};

/// Nesting depth beyond which the parser gives up rather than recurse further.
const MAX_NESTING: usize = 256;

/// A syntax error at a byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Byte offset of the offending token.
    pub offset: usize,
    /// Description of the problem.
    pub message: String,
}

impl From<LexError> for ParseError {
    fn from(e: LexError) -> Self {
        Self {
            offset: e.offset,
            message: e.message,
        }
    }
}

/// Parses a whole script.
pub fn parse(text: &str) -> Result<Program, ParseError> {
    let tokens = tokenize(text)?;
    Parser {
        tokens,
        pos: 0,
        depth: 0,
    }
    .program()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos].kind
    }

    fn offset(&self) -> usize {
        self.tokens[self.pos].offset
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), ParseError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("expected {kind}")))
        }
    }

    fn unexpected(&self, context: &str) -> ParseError {
        ParseError {
            offset: self.offset(),
            message: format!("{context}, found {}", self.peek()),
        }
    }

    fn program(mut self) -> Result<Program, ParseError> {
        let mut body = Vec::new();
        loop {
            while self.eat(&TokenKind::Semi) {}
            if *self.peek() == TokenKind::Eof {
                break;
            }
            body.push(self.statement()?);
            if *self.peek() != TokenKind::Eof {
                self.expect(&TokenKind::Semi)?;
            }
        }
        Ok(Program { body })
    }

    fn statement(&mut self) -> Result<Stmt, ParseError> {
        if self.eat(&TokenKind::Let) {
            let offset = self.offset();
            let name = match self.advance().kind {
                TokenKind::Ident(name) => name,
                other => {
                    return Err(ParseError {
                        offset,
                        message: format!("expected identifier after 'let', found {other}"),
                    })
                }
            };
            self.expect(&TokenKind::Assign)?;
            let init = self.expression()?;
            return Ok(Stmt::Let { name, init, offset });
        }
        Ok(Stmt::Expr(self.expression()?))
    }

    fn expression(&mut self) -> Result<Expr, ParseError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(self.unexpected("expression nested too deeply"));
        }
        let result = self.equality();
        self.depth -= 1;
        result
    }

    fn binary_level(
        &mut self,
        ops: &[(TokenKind, BinaryOp)],
        next: fn(&mut Self) -> Result<Expr, ParseError>,
    ) -> Result<Expr, ParseError> {
        let mut lhs = next(self)?;
        // Each operator folded into `lhs` deepens the tree by one level, so a
        // long chain counts against the same limit as nested parentheses.
        let entry = self.depth;
        let result = 'outer: loop {
            for (kind, op) in ops {
                if self.eat(kind) {
                    self.depth += 1;
                    if self.depth > MAX_NESTING {
                        break 'outer Err(self.unexpected("expression nested too deeply"));
                    }
                    let rhs = match next(self) {
                        Ok(rhs) => rhs,
                        Err(e) => break 'outer Err(e),
                    };
                    lhs = Expr::Binary {
                        op: *op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    };
                    continue 'outer;
                }
            }
            break Ok(lhs);
        };
        self.depth = entry;
        result
    }

    fn equality(&mut self) -> Result<Expr, ParseError> {
        self.binary_level(
            &[(TokenKind::EqEq, BinaryOp::Eq), (TokenKind::NotEq, BinaryOp::Ne)],
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> Result<Expr, ParseError> {
        self.binary_level(
            &[
                (TokenKind::Lt, BinaryOp::Lt),
                (TokenKind::Le, BinaryOp::Le),
                (TokenKind::Gt, BinaryOp::Gt),
                (TokenKind::Ge, BinaryOp::Ge),
            ],
            Self::term,
        )
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        self.binary_level(
            &[(TokenKind::Plus, BinaryOp::Add), (TokenKind::Minus, BinaryOp::Sub)],
            Self::factor,
        )
    }

    fn factor(&mut self) -> Result<Expr, ParseError> {
        self.binary_level(
            &[
                (TokenKind::Star, BinaryOp::Mul),
                (TokenKind::Slash, BinaryOp::Div),
                (TokenKind::Percent, BinaryOp::Rem),
            ],
            Self::unary,
        )
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Bang => UnaryOp::Not,
            _ => return self.primary(),
        };
        self.advance();
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(self.unexpected("expression nested too deeply"));
        }
        let operand = self.unary();
        self.depth -= 1;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand?),
        })
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let offset = self.offset();
        match self.peek().clone() {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::Number(n))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::Str(s))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Bool(true))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Bool(false))
            }
            TokenKind::Undefined => {
                self.advance();
                Ok(Expr::Undefined)
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.expression()?;
                self.expect(&TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::Ident(name) => {
                self.advance();
                if self.eat(&TokenKind::Dot) {
                    let member = match self.advance().kind {
                        TokenKind::Ident(member) => member,
                        other => {
                            return Err(ParseError {
                                offset,
                                message: format!("expected member name after '.', found {other}"),
                            })
                        }
                    };
                    let args = if *self.peek() == TokenKind::LParen {
                        Some(self.arguments()?)
                    } else {
                        None
                    };
                    return Ok(Expr::Member {
                        object: name,
                        member,
                        args,
                        offset,
                    });
                }
                if *self.peek() == TokenKind::LParen {
                    let args = self.arguments()?;
                    return Ok(Expr::Call {
                        callee: name,
                        args,
                        offset,
                    });
                }
                Ok(Expr::Name { name, offset })
            }
            _ => Err(self.unexpected("expected expression")),
        }
    }

    fn arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();
        if self.eat(&TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            if self.eat(&TokenKind::Comma) {
                continue;
            }
            self.expect(&TokenKind::RParen)?;
            return Ok(args);
        }
    }
}
