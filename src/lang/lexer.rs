use crate::foundation::error::{ParamError, ParamResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    pub(crate) start: usize,
    pub(crate) end: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Ident(String),
    /// Kept wide so the parser can range-check after folding a leading minus.
    Int(i64),
    Real(f64),
    Str(String),
    Extern,
    Var,
    True,
    False,

    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Colon,
    Assign,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,

    Bang,

    EqEq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    AndAnd,
    OrOr,

    Eof,
}

pub(crate) fn lex(input: &str) -> ParamResult<Vec<Token>> {
    let mut out = Vec::new();
    let bytes = input.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        // Line comment
        if c == '/' && bytes.get(i + 1) == Some(&b'/') {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            continue;
        }

        let start = i;

        // Hex integer: 0x[0-9a-fA-F]+, reinterpreted as i32 so ARGB colors fit.
        if c == '0' && matches!(bytes.get(i + 1), Some(b'x' | b'X')) {
            i += 2;
            let digits = i;
            while i < bytes.len() && (bytes[i] as char).is_ascii_hexdigit() {
                i += 1;
            }
            let v = u32::from_str_radix(&input[digits..i], 16)
                .map_err(|_| ParamError::syntax(start, "invalid hex literal"))?;
            out.push(Token {
                kind: TokenKind::Int(i64::from(v as i32)),
                span: Span { start, end: i },
            });
            continue;
        }

        // Number: [0-9]+(.[0-9]+)?([eE][+-]?[0-9]+)? or .[0-9]+([eE][+-]?[0-9]+)?
        if c.is_ascii_digit()
            || (c == '.' && i + 1 < bytes.len() && (bytes[i + 1] as char).is_ascii_digit())
        {
            let mut is_real = false;
            if c == '.' {
                is_real = true;
                i += 1;
            } else {
                while i < bytes.len() && (bytes[i] as char).is_ascii_digit() {
                    i += 1;
                }
                if i < bytes.len()
                    && (bytes[i] as char) == '.'
                    && i + 1 < bytes.len()
                    && (bytes[i + 1] as char).is_ascii_digit()
                {
                    is_real = true;
                    i += 1;
                }
            }

            while i < bytes.len() && (bytes[i] as char).is_ascii_digit() {
                i += 1;
            }

            if i < bytes.len() && matches!(bytes[i] as char, 'e' | 'E') {
                let e_pos = i;
                is_real = true;
                i += 1;
                if i < bytes.len() && matches!(bytes[i] as char, '+' | '-') {
                    i += 1;
                }
                let exp_start = i;
                while i < bytes.len() && (bytes[i] as char).is_ascii_digit() {
                    i += 1;
                }
                if exp_start == i {
                    return Err(ParamError::syntax(
                        e_pos,
                        "invalid number exponent (expected digits)",
                    ));
                }
            }

            let s = &input[start..i];
            let kind = if is_real {
                TokenKind::Real(
                    s.parse()
                        .map_err(|_| ParamError::syntax(start, "invalid number"))?,
                )
            } else {
                TokenKind::Int(
                    s.parse()
                        .map_err(|_| ParamError::syntax(start, "integer out of range"))?,
                )
            };
            out.push(Token {
                kind,
                span: Span { start, end: i },
            });
            continue;
        }

        // Color: #rgb, #argb, #rrggbb, #aarrggbb
        if c == '#' {
            i += 1;
            let digits = i;
            while i < bytes.len() && (bytes[i] as char).is_ascii_hexdigit() {
                i += 1;
            }
            let argb = parse_color(&input[digits..i])
                .ok_or_else(|| ParamError::syntax(start, "invalid color literal"))?;
            out.push(Token {
                kind: TokenKind::Int(i64::from(argb as i32)),
                span: Span { start, end: i },
            });
            continue;
        }

        if c == '"' {
            i += 1;
            let mut s = String::new();
            loop {
                let Some(&b) = bytes.get(i) else {
                    return Err(ParamError::syntax(start, "unterminated string literal"));
                };
                match b {
                    b'"' => {
                        i += 1;
                        break;
                    }
                    b'\\' => {
                        let escaped = match bytes.get(i + 1) {
                            Some(b'n') => '\n',
                            Some(b't') => '\t',
                            Some(b'"') => '"',
                            Some(b'\\') => '\\',
                            _ => return Err(ParamError::syntax(i, "invalid escape sequence")),
                        };
                        s.push(escaped);
                        i += 2;
                    }
                    _ => {
                        // Copy whole UTF-8 sequences.
                        let ch = input[i..].chars().next().unwrap_or('\u{fffd}');
                        s.push(ch);
                        i += ch.len_utf8();
                    }
                }
            }
            out.push(Token {
                kind: TokenKind::Str(s),
                span: Span { start, end: i },
            });
            continue;
        }

        // Ident
        if c.is_ascii_alphabetic() || c == '_' {
            i += 1;
            while i < bytes.len() {
                let ch = bytes[i] as char;
                if ch.is_ascii_alphanumeric() || ch == '_' {
                    i += 1;
                } else {
                    break;
                }
            }
            let s = &input[start..i];
            let kind = match s {
                "extern" => TokenKind::Extern,
                "var" => TokenKind::Var,
                "true" => TokenKind::True,
                "false" => TokenKind::False,
                _ => TokenKind::Ident(s.to_owned()),
            };
            out.push(Token {
                kind,
                span: Span { start, end: i },
            });
            continue;
        }

        // Two-char operators
        if i + 1 < bytes.len() {
            let kind = match &bytes[i..i + 2] {
                b"&&" => Some(TokenKind::AndAnd),
                b"||" => Some(TokenKind::OrOr),
                b"==" => Some(TokenKind::EqEq),
                b"!=" => Some(TokenKind::Ne),
                b"<=" => Some(TokenKind::Le),
                b">=" => Some(TokenKind::Ge),
                _ => None,
            };
            if let Some(kind) = kind {
                i += 2;
                out.push(Token {
                    kind,
                    span: Span { start, end: i },
                });
                continue;
            }
        }

        // Single-char tokens
        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '=' => TokenKind::Assign,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '^' => TokenKind::Caret,
            '!' => TokenKind::Bang,
            '<' => TokenKind::Lt,
            '>' => TokenKind::Gt,
            _ => {
                return Err(ParamError::syntax(
                    start,
                    format!("unexpected character '{c}'"),
                ));
            }
        };
        i += 1;
        out.push(Token {
            kind,
            span: Span { start, end: i },
        });
    }

    out.push(Token {
        kind: TokenKind::Eof,
        span: Span {
            start: input.len(),
            end: input.len(),
        },
    });

    Ok(out)
}

/// Expands short forms nibble-wise; a missing alpha channel is opaque.
fn parse_color(hex: &str) -> Option<u32> {
    let nibbles: Vec<u32> = hex.chars().map(|c| c.to_digit(16)).collect::<Option<_>>()?;
    let (a, rgb) = match nibbles.len() {
        3 => (0xff, nibbles.iter().fold(0, |acc, n| (acc << 8) | (n * 0x11))),
        4 => (
            nibbles[0] * 0x11,
            nibbles[1..].iter().fold(0, |acc, n| (acc << 8) | (n * 0x11)),
        ),
        6 => (0xff, nibbles.iter().fold(0, |acc, n| (acc << 4) | n)),
        8 => (
            nibbles[0] * 0x10 + nibbles[1],
            nibbles[2..].iter().fold(0, |acc, n| (acc << 4) | n),
        ),
        _ => return None,
    };
    Some((a << 24) | rgb)
}
