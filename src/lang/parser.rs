use crate::foundation::core::Cplx;
use crate::foundation::error::{ParamError, ParamResult};
use crate::lang::ast::{Ast, BinaryOp, ExternDeclaration, Stmt, Tree, UnaryOp};
use crate::lang::lexer::{Span, Token, TokenKind, lex};

pub(crate) fn parse_source(src: &str) -> ParamResult<Ast> {
    let mut p = Parser {
        tokens: lex(src)?,
        pos: 0,
    };
    let mut stmts = Vec::new();
    loop {
        while p.consume(TokenKind::Semicolon) {}
        if p.peek().kind == TokenKind::Eof {
            break;
        }
        stmts.push(p.parse_stmt()?);
        if !p.consume(TokenKind::Semicolon) {
            p.expect(TokenKind::Eof)?;
            break;
        }
    }
    Ok(Ast { stmts })
}

pub(crate) fn parse_expr(src: &str) -> ParamResult<Tree> {
    let mut p = Parser {
        tokens: lex(src)?,
        pos: 0,
    };
    let expr = p.parse_or()?;
    p.expect(TokenKind::Eof)?;
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn bump(&mut self) -> &Token {
        let t = &self.tokens[self.pos];
        // Eof is sticky.
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn span(&self) -> Span {
        self.peek().span
    }

    fn expect(&mut self, kind: TokenKind) -> ParamResult<()> {
        if self.peek().kind == kind {
            self.bump();
            Ok(())
        } else {
            Err(ParamError::syntax(
                self.span().start,
                format!("expected {kind:?}, found {:?}", self.peek().kind),
            ))
        }
    }

    fn consume(&mut self, kind: TokenKind) -> bool {
        if self.peek().kind == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    fn ident(&mut self, what: &str) -> ParamResult<String> {
        let t = self.bump().clone();
        match t.kind {
            TokenKind::Ident(s) => Ok(s),
            other => Err(ParamError::syntax(
                t.span.start,
                format!("expected {what}, found {other:?}"),
            )),
        }
    }

    fn parse_stmt(&mut self) -> ParamResult<Stmt> {
        if self.consume(TokenKind::Extern) {
            let id = self.ident("extern name")?;
            let description = if let TokenKind::Str(s) = self.peek().kind.clone() {
                self.bump();
                s
            } else {
                id.clone()
            };
            let type_name = self.ident("extern type")?;
            self.expect(TokenKind::Assign)?;
            let default = self.parse_or()?;
            return Ok(Stmt::Extern(ExternDeclaration {
                id,
                type_name,
                description,
                default,
            }));
        }
        if self.consume(TokenKind::Var) {
            let name = self.ident("variable name")?;
            self.expect(TokenKind::Assign)?;
            let init = self.parse_or()?;
            return Ok(Stmt::Var { name, init });
        }
        Ok(Stmt::Expr(self.parse_or()?))
    }

    fn parse_or(&mut self) -> ParamResult<Tree> {
        let mut e = self.parse_and()?;
        while self.consume(TokenKind::OrOr) {
            let r = self.parse_and()?;
            e = binary(BinaryOp::Or, e, r);
        }
        Ok(e)
    }

    fn parse_and(&mut self) -> ParamResult<Tree> {
        let mut e = self.parse_equality()?;
        while self.consume(TokenKind::AndAnd) {
            let r = self.parse_equality()?;
            e = binary(BinaryOp::And, e, r);
        }
        Ok(e)
    }

    fn parse_equality(&mut self) -> ParamResult<Tree> {
        let mut e = self.parse_comparison()?;
        loop {
            let op = if self.consume(TokenKind::EqEq) {
                BinaryOp::Eq
            } else if self.consume(TokenKind::Ne) {
                BinaryOp::Ne
            } else {
                break;
            };
            let r = self.parse_comparison()?;
            e = binary(op, e, r);
        }
        Ok(e)
    }

    fn parse_comparison(&mut self) -> ParamResult<Tree> {
        let mut e = self.parse_cons()?;
        loop {
            let op = if self.consume(TokenKind::Lt) {
                BinaryOp::Lt
            } else if self.consume(TokenKind::Le) {
                BinaryOp::Le
            } else if self.consume(TokenKind::Gt) {
                BinaryOp::Gt
            } else if self.consume(TokenKind::Ge) {
                BinaryOp::Ge
            } else {
                break;
            };
            let r = self.parse_cons()?;
            e = binary(op, e, r);
        }
        Ok(e)
    }

    fn parse_cons(&mut self) -> ParamResult<Tree> {
        let e = self.parse_term()?;
        if !self.consume(TokenKind::Colon) {
            return Ok(e);
        }
        let r = self.parse_term()?;
        Ok(match (literal_f64(&e), literal_f64(&r)) {
            (Some(re), Some(im)) => Tree::Cplx(Cplx::new(re, im)),
            _ => binary(BinaryOp::Cons, e, r),
        })
    }

    fn parse_term(&mut self) -> ParamResult<Tree> {
        let mut e = self.parse_factor()?;
        loop {
            let op = if self.consume(TokenKind::Plus) {
                BinaryOp::Add
            } else if self.consume(TokenKind::Minus) {
                BinaryOp::Sub
            } else {
                break;
            };
            let r = self.parse_factor()?;
            e = binary(op, e, r);
        }
        Ok(e)
    }

    fn parse_factor(&mut self) -> ParamResult<Tree> {
        let mut e = self.parse_pow()?;
        loop {
            let op = if self.consume(TokenKind::Star) {
                BinaryOp::Mul
            } else if self.consume(TokenKind::Slash) {
                BinaryOp::Div
            } else if self.consume(TokenKind::Percent) {
                BinaryOp::Mod
            } else {
                break;
            };
            let r = self.parse_pow()?;
            e = binary(op, e, r);
        }
        Ok(e)
    }

    fn parse_pow(&mut self) -> ParamResult<Tree> {
        let base = self.parse_unary()?;
        if self.consume(TokenKind::Caret) {
            // right associative
            let exp = self.parse_pow()?;
            return Ok(binary(BinaryOp::Pow, base, exp));
        }
        Ok(base)
    }

    fn parse_unary(&mut self) -> ParamResult<Tree> {
        if self.peek().kind == TokenKind::Minus {
            let minus = self.bump().span.start;
            if let TokenKind::Int(v) = self.peek().kind
                && self.tokens[self.pos + 1].kind != TokenKind::LParen
            {
                let at = self.bump().span.start;
                return Ok(Tree::Int(int_literal(-v, at)?));
            }
            let e = self.parse_unary()?;
            return Ok(match e {
                Tree::Int(v) => Tree::Int(
                    v.checked_neg()
                        .ok_or_else(|| ParamError::syntax(minus, "integer out of range"))?,
                ),
                Tree::Real(v) => Tree::Real(-v),
                Tree::Cplx(c) => Tree::Cplx(Cplx::new(-c.re, -c.im)),
                other => Tree::Unary {
                    op: UnaryOp::Neg,
                    arg: Box::new(other),
                },
            });
        }
        if self.consume(TokenKind::Bang) {
            let e = self.parse_unary()?;
            return Ok(Tree::Unary {
                op: UnaryOp::Not,
                arg: Box::new(e),
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> ParamResult<Tree> {
        let mut e = self.parse_primary()?;
        while self.consume(TokenKind::LParen) {
            let args = self.parse_list(TokenKind::RParen)?;
            e = Tree::App {
                func: Box::new(e),
                args,
            };
        }
        Ok(e)
    }

    fn parse_list(&mut self, close: TokenKind) -> ParamResult<Vec<Tree>> {
        let mut items = Vec::new();
        if self.consume(close.clone()) {
            return Ok(items);
        }
        loop {
            items.push(self.parse_or()?);
            if self.consume(TokenKind::Comma) {
                continue;
            }
            self.expect(close)?;
            return Ok(items);
        }
    }

    fn parse_primary(&mut self) -> ParamResult<Tree> {
        let t = self.bump().clone();
        match t.kind {
            TokenKind::Int(v) => Ok(Tree::Int(int_literal(v, t.span.start)?)),
            TokenKind::Real(v) => Ok(Tree::Real(v)),
            TokenKind::Str(s) => Ok(Tree::Str(s)),
            TokenKind::True => Ok(Tree::Bool(true)),
            TokenKind::False => Ok(Tree::Bool(false)),
            TokenKind::Ident(s) => Ok(Tree::Id(s)),
            TokenKind::LParen => {
                let e = self.parse_or()?;
                self.expect(TokenKind::RParen)?;
                Ok(e)
            }
            TokenKind::LBracket => Ok(Tree::Vec(self.parse_list(TokenKind::RBracket)?)),
            other => Err(ParamError::syntax(
                t.span.start,
                format!("unexpected token {other:?}"),
            )),
        }
    }
}

fn binary(op: BinaryOp, left: Tree, right: Tree) -> Tree {
    Tree::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn int_literal(v: i64, at: usize) -> ParamResult<i32> {
    i32::try_from(v).map_err(|_| ParamError::syntax(at, "integer out of range"))
}

fn literal_f64(t: &Tree) -> Option<f64> {
    match t {
        Tree::Int(v) => Some(f64::from(*v)),
        Tree::Real(v) => Some(*v),
        _ => None,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/lang/parser.rs"]
mod tests;
