//! Tokenizer for script source text.

use std::fmt;

/// The kind of a lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// A numeric literal.
    Number(f64),
    /// A string literal with escapes resolved.
    Str(String),
    /// An identifier.
    Ident(String),
    /// `let`
    Let,
    /// `true`
    True,
    /// `false`
    False,
    /// `undefined`
    Undefined,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `!`
    Bang,
    /// `=`
    Assign,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
    /// `;`
    Semi,
    /// `.`
    Dot,
    /// End of input.
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Number(n) => return write!(f, "number {n}"),
            TokenKind::Str(_) => "string literal",
            TokenKind::Ident(name) => return write!(f, "identifier '{name}'"),
            TokenKind::Let => "'let'",
            TokenKind::True => "'true'",
            TokenKind::False => "'false'",
            TokenKind::Undefined => "'undefined'",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::Bang => "'!'",
            TokenKind::Assign => "'='",
            TokenKind::EqEq => "'=='",
            TokenKind::NotEq => "'!='",
            TokenKind::Lt => "'<'",
            TokenKind::Le => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::Ge => "'>='",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::Comma => "','",
            TokenKind::Semi => "';'",
            TokenKind::Dot => "'.'",
            TokenKind::Eof => "end of input",
        };
        f.write_str(s)
    }
}

/// A token and the byte offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What was lexed.
    pub kind: TokenKind,
    /// Byte offset into the source text.
    pub offset: usize,
}

/// A lexical error at a byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    /// Byte offset of the offending character.
    pub offset: usize,
    /// Description of the problem.
    pub message: String,
}

/// Splits `text` into tokens, ending with [`TokenKind::Eof`].
pub fn tokenize(text: &str) -> Result<Vec<Token>, LexError> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        let start = i;

        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        if c == b'/' && bytes.get(i + 1) == Some(&b'/') {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            continue;
        }

        let kind = match c {
            b'0'..=b'9' => {
                while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                    i += 1;
                }
                if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
                    i += 1;
                    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
                        i += 1;
                    }
                    while i < bytes.len() && bytes[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                let literal = &text[start..i];
                let n = literal.parse::<f64>().map_err(|_| LexError {
                    offset: start,
                    message: format!("invalid number literal '{literal}'"),
                })?;
                tokens.push(Token {
                    kind: TokenKind::Number(n),
                    offset: start,
                });
                continue;
            }
            b'"' | b'\'' => {
                let (s, end) = lex_string(text, start)?;
                i = end;
                tokens.push(Token {
                    kind: TokenKind::Str(s),
                    offset: start,
                });
                continue;
            }
            c if c.is_ascii_alphabetic() || c == b'_' || c == b'$' => {
                while i < bytes.len()
                    && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'$')
                {
                    i += 1;
                }
                let kind = match &text[start..i] {
                    "let" => TokenKind::Let,
                    "true" => TokenKind::True,
                    "false" => TokenKind::False,
                    "undefined" => TokenKind::Undefined,
                    word => TokenKind::Ident(word.to_string()),
                };
                tokens.push(Token {
                    kind,
                    offset: start,
                });
                continue;
            }
            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'*' => TokenKind::Star,
            b'/' => TokenKind::Slash,
            b'%' => TokenKind::Percent,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b',' => TokenKind::Comma,
            b';' => TokenKind::Semi,
            b'.' => TokenKind::Dot,
            b'=' | b'!' | b'<' | b'>' => {
                let followed_by_eq = bytes.get(i + 1) == Some(&b'=');
                if followed_by_eq {
                    i += 1;
                }
                match (c, followed_by_eq) {
                    (b'=', false) => TokenKind::Assign,
                    (b'=', true) => TokenKind::EqEq,
                    (b'!', false) => TokenKind::Bang,
                    (b'!', true) => TokenKind::NotEq,
                    (b'<', false) => TokenKind::Lt,
                    (b'<', true) => TokenKind::Le,
                    (b'>', false) => TokenKind::Gt,
                    _ => TokenKind::Ge,
                }
            }
            _ => {
                let ch = text[start..].chars().next().unwrap_or('?');
                return Err(LexError {
                    offset: start,
                    message: format!("unexpected character '{ch}'"),
                });
            }
        };
        i += 1;
        tokens.push(Token {
            kind,
            offset: start,
        });
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        offset: text.len(),
    });
    Ok(tokens)
}

/// Lexes a quoted string starting at `start`; returns the value and the
/// offset just past the closing quote.
fn lex_string(text: &str, start: usize) -> Result<(String, usize), LexError> {
    let mut chars = text[start..].char_indices();
    let quote = chars.next().map(|(_, q)| q).unwrap_or('"');
    let mut value = String::new();

    while let Some((idx, ch)) = chars.next() {
        match ch {
            c if c == quote => return Ok((value, start + idx + c.len_utf8())),
            '\\' => match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                Some((_, other)) => value.push(other),
                None => break,
            },
            '\n' => break,
            c => value.push(c),
        }
    }

    Err(LexError {
        offset: start,
        message: "unterminated string literal".to_string(),
    })
}

/// Converts a byte offset into a 1-based `(line, column)` pair.
pub fn line_col(text: &str, offset: usize) -> (u32, u32) {
    let mut line = 1u32;
    let mut col = 1u32;
    for (idx, ch) in text.char_indices() {
        if idx >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(text).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn member_call() {
        assert_eq!(
            kinds("Math.sqrt(16)"),
            vec![
                TokenKind::Ident("Math".into()),
                TokenKind::Dot,
                TokenKind::Ident("sqrt".into()),
                TokenKind::LParen,
                TokenKind::Number(16.0),
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn operators_and_keywords() {
        assert_eq!(
            kinds("let x = 1 <= 2 != !true"),
            vec![
                TokenKind::Let,
                TokenKind::Ident("x".into()),
                TokenKind::Assign,
                TokenKind::Number(1.0),
                TokenKind::Le,
                TokenKind::Number(2.0),
                TokenKind::NotEq,
                TokenKind::Bang,
                TokenKind::True,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(kinds("2.5e3")[0], TokenKind::Number(2500.0));
        assert!(tokenize("1.2.3").is_err());
    }

    #[test]
    fn strings_and_escapes() {
        assert_eq!(kinds(r#""a\"b""#)[0], TokenKind::Str("a\"b".into()));
        assert_eq!(kinds("'it\\n'")[0], TokenKind::Str("it\n".into()));
        let err = tokenize("\"open").unwrap_err();
        assert_eq!(err.offset, 0);
        assert!(err.message.contains("unterminated"));
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("1 // one\n+ 2"),
            vec![
                TokenKind::Number(1.0),
                TokenKind::Plus,
                TokenKind::Number(2.0),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn unexpected_character() {
        let err = tokenize("1 # 2").unwrap_err();
        assert_eq!(err.offset, 2);
        assert!(err.message.contains('#'));
    }

    #[test]
    fn offsets_to_line_col() {
        let text = "let a = 1;\nlet b = ;";
        assert_eq!(line_col(text, 0), (1, 1));
        assert_eq!(line_col(text, 19), (2, 9));
    }
}
