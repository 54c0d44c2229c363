use crate::expressions::ast::{BinaryOp, Expr, Lit, Stmt, UnaryOp};
use crate::expressions::error::ParseError;
use crate::expressions::lexer::{lex, Span, Token, TokenKind};

/// Deepest nesting of groups, unary operators and blocks accepted.
const MAX_DEPTH: usize = 64;

pub(crate) fn parse_program(src: &str) -> Result<Vec<Stmt>, ParseError> {
    let tokens = lex(src)?;
    let mut p = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let mut stmts = Vec::new();
    while p.peek().kind != TokenKind::Eof {
        if let Some(stmt) = p.parse_stmt()? {
            stmts.push(stmt);
        }
    }
    Ok(stmts)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_at(&self, ahead: usize) -> &TokenKind {
        let idx = (self.pos + ahead).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    fn bump(&mut self) -> &Token {
        let t = &self.tokens[self.pos];
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn span(&self) -> Span {
        self.peek().span
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), ParseError> {
        if self.peek().kind == kind {
            self.bump();
            Ok(())
        } else {
            Err(ParseError::new(
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

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        let t = self.bump().clone();
        match t.kind {
            TokenKind::Ident(s) => Ok(s),
            other => Err(ParseError::new(
                t.span.start,
                format!("expected identifier, found {other:?}"),
            )),
        }
    }

    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError::new(self.span().start, "expression nested too deeply"));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Returns `None` for an empty statement (a lone `;`).
    fn parse_stmt(&mut self) -> Result<Option<Stmt>, ParseError> {
        if self.consume(TokenKind::Semicolon) {
            return Ok(None);
        }

        if self.consume(TokenKind::Var) {
            let name = self.expect_ident()?;
            let init = if self.consume(TokenKind::Assign) {
                Some(self.parse_expr()?)
            } else {
                None
            };
            self.consume(TokenKind::Semicolon);
            return Ok(Some(Stmt::Var { name, init }));
        }

        if self.consume(TokenKind::If) {
            self.expect(TokenKind::LParen)?;
            let cond = self.parse_expr()?;
            self.expect(TokenKind::RParen)?;
            let then_branch = self.nested(Self::parse_branch)?;
            let else_branch = if self.consume(TokenKind::Else) {
                self.nested(Self::parse_branch)?
            } else {
                Vec::new()
            };
            return Ok(Some(Stmt::If {
                cond,
                then_branch,
                else_branch,
            }));
        }

        if let (TokenKind::Ident(name), TokenKind::Assign) = (&self.peek().kind, self.peek_at(1)) {
            let name = name.clone();
            self.bump();
            self.bump();
            let value = self.parse_expr()?;
            self.consume(TokenKind::Semicolon);
            return Ok(Some(Stmt::Assign { name, value }));
        }

        let e = self.parse_expr()?;
        self.consume(TokenKind::Semicolon);
        Ok(Some(Stmt::Expr(e)))
    }

    fn parse_branch(&mut self) -> Result<Vec<Stmt>, ParseError> {
        if self.consume(TokenKind::LBrace) {
            let mut stmts = Vec::new();
            while !self.consume(TokenKind::RBrace) {
                if self.peek().kind == TokenKind::Eof {
                    return Err(ParseError::new(self.span().start, "unterminated block"));
                }
                if let Some(stmt) = self.parse_stmt()? {
                    stmts.push(stmt);
                }
            }
            return Ok(stmts);
        }
        Ok(self.parse_stmt()?.into_iter().collect())
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.nested(Self::parse_or)
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut e = self.parse_and()?;
        while self.consume(TokenKind::OrOr) {
            let r = self.parse_and()?;
            e = binary(BinaryOp::Or, e, r);
        }
        Ok(e)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut e = self.parse_equality()?;
        while self.consume(TokenKind::AndAnd) {
            let r = self.parse_equality()?;
            e = binary(BinaryOp::And, e, r);
        }
        Ok(e)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
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

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let mut e = self.parse_term()?;
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
            let r = self.parse_term()?;
            e = binary(op, e, r);
        }
        Ok(e)
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
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

    fn parse_factor(&mut self) -> Result<Expr, ParseError> {
        let mut e = self.parse_unary()?;
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
            let r = self.parse_unary()?;
            e = binary(op, e, r);
        }
        Ok(e)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if self.consume(TokenKind::Minus) {
            let e = self.nested(Self::parse_unary)?;
            // Fold negative literals so `-1` matches like `1` does.
            if let Expr::Lit(Lit::Num(n)) = e {
                return Ok(Expr::Lit(Lit::Num(-n)));
            }
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                expr: Box::new(e),
            });
        }
        if self.consume(TokenKind::Bang) {
            let e = self.nested(Self::parse_unary)?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                expr: Box::new(e),
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut e = self.parse_primary()?;

        loop {
            if self.consume(TokenKind::Dot) {
                let property = self.expect_ident()?;
                e = Expr::Member {
                    object: Box::new(e),
                    property,
                };
                continue;
            }

            if self.consume(TokenKind::LParen) {
                let args = self.parse_list(TokenKind::RParen)?;
                e = Expr::Call {
                    callee: Box::new(e),
                    args,
                };
                continue;
            }

            if self.consume(TokenKind::LBracket) {
                let index = self.parse_expr()?;
                self.expect(TokenKind::RBracket)?;
                e = Expr::Index {
                    object: Box::new(e),
                    index: Box::new(index),
                };
                continue;
            }

            break;
        }

        Ok(e)
    }

    fn parse_list(&mut self, close: TokenKind) -> Result<Vec<Expr>, ParseError> {
        let mut items = Vec::new();
        if self.consume(close.clone()) {
            return Ok(items);
        }
        loop {
            items.push(self.parse_expr()?);
            if self.consume(TokenKind::Comma) {
                continue;
            }
            self.expect(close)?;
            return Ok(items);
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let t = self.bump().clone();
        match t.kind {
            TokenKind::Number(v) => Ok(Expr::Lit(Lit::Num(v))),
            TokenKind::Str(s) => Ok(Expr::Lit(Lit::Str(s))),
            TokenKind::True => Ok(Expr::Lit(Lit::Bool(true))),
            TokenKind::False => Ok(Expr::Lit(Lit::Bool(false))),
            TokenKind::Ident(s) => Ok(Expr::Ident(s)),
            TokenKind::LParen => {
                let e = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(e)
            }
            TokenKind::LBracket => Ok(Expr::Array(self.parse_list(TokenKind::RBracket)?)),
            other => Err(ParseError::new(
                t.span.start,
                format!("unexpected token {other:?}"),
            )),
        }
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_expr(src: &str) -> Expr {
        match parse_program(src).unwrap().as_slice() {
            [Stmt::Expr(e)] => e.clone(),
            other => panic!("unexpected program: {other:?}"),
        }
    }

    #[test]
    fn parses_chained_calls() {
        let e = single_expr("comp('icon').layer('control').effect('primary')('Color')");
        let Expr::Call { callee, args } = e else {
            panic!("expected call");
        };
        assert_eq!(args, vec![Expr::Lit(Lit::Str("Color".into()))]);
        let (object, effect_args) = callee.as_method_call("effect").unwrap();
        assert_eq!(effect_args[0].as_str_lit(), Some("primary"));
        assert!(object.as_method_call("layer").is_some());
    }

    #[test]
    fn parses_bm_rt_assignment() {
        let program = parse_program("var $bm_rt;\n$bm_rt = $bm_mul(value, 2);").unwrap();
        assert_eq!(program.len(), 2);
        assert!(matches!(&program[0], Stmt::Var { name, init: None } if name == "$bm_rt"));
        match &program[1] {
            Stmt::Assign { name, value } => {
                assert_eq!(name, "$bm_rt");
                assert_eq!(value.as_named_call("$bm_mul").map(|a| a.len()), Some(2));
            }
            other => panic!("unexpected stmt: {other:?}"),
        }
    }

    #[test]
    fn parses_if_else_blocks() {
        let src = "var $bm_rt;\nif (thisComp.layer('c').effect('m')('Menu') == 1) {\n    $bm_rt = 10;\n} else {\n    $bm_rt = 20;\n}";
        let program = parse_program(src).unwrap();
        match &program[1] {
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                assert!(matches!(cond, Expr::Binary { op: BinaryOp::Eq, .. }));
                assert_eq!(then_branch.len(), 1);
                assert_eq!(else_branch.len(), 1);
            }
            other => panic!("unexpected stmt: {other:?}"),
        }
    }

    #[test]
    fn parses_unbraced_branches() {
        let program = parse_program("if (a == 1) $bm_rt = 1; else $bm_rt = 2;").unwrap();
        assert_eq!(program.len(), 1);
    }

    #[test]
    fn arithmetic_precedence() {
        let e = single_expr("1 + 2 * 3");
        assert!(matches!(e, Expr::Binary { op: BinaryOp::Add, .. }));
    }

    #[test]
    fn negative_literals_fold() {
        assert_eq!(single_expr("-2.5"), Expr::Lit(Lit::Num(-2.5)));
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(parse_program("comp('a'))").is_err());
        assert!(parse_program("if (a { }").is_err());
    }

    #[test]
    fn deep_nesting_is_an_error() {
        let parens = format!("{}1{}", "(".repeat(5000), ")".repeat(5000));
        let err = parse_program(&parens).unwrap_err();
        assert_eq!(err.message, "expression nested too deeply");
        assert!(parse_program(&format!("{}a", "!".repeat(5000))).is_err());
        assert!(parse_program(&format!("{}1", "-".repeat(5000))).is_err());
        assert!(parse_program(&"if (a) ".repeat(5000)).is_err());

        let shallow = format!("{}1{}", "(".repeat(50), ")".repeat(50));
        assert!(parse_program(&shallow).is_ok());
    }
}
