//! Parser implementation

use super::ast::*;
use crate::lexer::*;
use rulegate_core::SyntaxError;
use std::collections::BTreeSet;

/// Built-ins whose first argument names a field.
pub const PATH_FUNCTIONS: [&str; 2] = ["changed", "get"];

// ============================================================================
// PARSER
// ============================================================================

/// Recursive-descent parser over one expression's tokens.
///
/// A parser is built per call to [`parse`]; it holds no state that outlives
/// that call.
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) pos: usize,
    identifiers: BTreeSet<String>,
    functions: BTreeSet<String>,
    depth: usize,
    max_depth: Option<usize>,
}

impl Parser {
    /// Create a new parser from a vector of tokens.
    ///
    /// An `Eof` token is appended when the stream does not end in one.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind != TokenKind::Eof).unwrap_or(true) {
            let span = tokens.last().map(|t| t.span).unwrap_or_default();
            tokens.push(Token {
                kind: TokenKind::Eof,
                span: Span {
                    start: span.end,
                    ..span
                },
            });
        }
        Self {
            tokens,
            pos: 0,
            identifiers: BTreeSet::new(),
            functions: BTreeSet::new(),
            depth: 0,
            max_depth: None,
        }
    }

    /// Reject expressions nesting groups, arrays or calls deeper than `max`.
    pub fn with_max_depth(mut self, max: usize) -> Self {
        self.max_depth = Some(max);
        self
    }

    /// Parse the tokens into a ParsedExpression.
    pub fn parse(&mut self) -> Result<ParsedExpression, SyntaxError> {
        if self.is_at_end() {
            return Err(self.error("Unexpected end of expression"));
        }

        let ast = self.parse_expression()?;

        if !self.is_at_end() {
            return Err(self.error(&format!("Unexpected token near {}", self.current().kind)));
        }

        Ok(ParsedExpression {
            ast,
            identifiers: std::mem::take(&mut self.identifiers),
            functions: std::mem::take(&mut self.functions),
        })
    }

    pub(crate) fn parse_expression(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_and()?;

        while self.check(&TokenKind::Or) {
            self.advance();
            let right = self.parse_and()?;
            left = Expr::Logical {
                op: LogicalOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_comparison()?;

        while self.check(&TokenKind::And) {
            self.advance();
            let right = self.parse_comparison()?;
            left = Expr::Logical {
                op: LogicalOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_unary()?;

        while let Some(op) = self.match_binary_op() {
            let right = self.parse_unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// No prefix operators exist yet; kept as its own precedence level.
    fn parse_unary(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        match &self.current().kind {
            TokenKind::LParen => {
                self.advance();
                self.enter_nested()?;
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen, "')' to close group")?;
                self.depth -= 1;
                Ok(expr)
            }
            TokenKind::LBracket => {
                self.advance();
                self.enter_nested()?;
                let items = self.parse_list(TokenKind::RBracket, "']' to close array")?;
                self.depth -= 1;
                Ok(Expr::Array(items))
            }
            TokenKind::String(s) => {
                let s = s.clone();
                self.advance();
                Ok(Expr::Literal(Literal::String(s)))
            }
            TokenKind::Number(text) => {
                // Malformed text such as `1.2.3` is accepted as NaN.
                let n = text.parse::<f64>().unwrap_or(f64::NAN);
                self.advance();
                Ok(Expr::Literal(Literal::Number(n)))
            }
            TokenKind::Boolean(b) => {
                let b = *b;
                self.advance();
                Ok(Expr::Literal(Literal::Bool(b)))
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expr::Literal(Literal::Null))
            }
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                if self.check(&TokenKind::LParen) {
                    self.advance();
                    self.parse_call(name)
                } else {
                    self.identifiers.insert(name.clone());
                    Ok(Expr::Identifier(name))
                }
            }
            TokenKind::Eof => Err(self.error("Unexpected end of expression")),
            other => Err(self.error(&format!("Unexpected token {}", other))),
        }
    }

    /// Parse call arguments; the opening `(` is already consumed.
    fn parse_call(&mut self, name: String) -> Result<Expr, SyntaxError> {
        self.enter_nested()?;
        let args = self.parse_list(TokenKind::RParen, "')' to close argument list")?;
        self.depth -= 1;

        if PATH_FUNCTIONS.contains(&name.as_str()) {
            if let Some(Expr::Literal(Literal::String(path))) = args.first() {
                self.identifiers.insert(path.clone());
            }
        }
        self.functions.insert(name.clone());

        Ok(Expr::Call { name, args })
    }

    /// Parse `expr (',' expr)*` up to and including `close`.
    fn parse_list(&mut self, close: TokenKind, what: &str) -> Result<Vec<Expr>, SyntaxError> {
        let mut items = Vec::new();

        if self.check(&close) {
            self.advance();
            return Ok(items);
        }

        loop {
            items.push(self.parse_expression()?);
            if self.check(&TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }

        self.expect(close, what)?;
        Ok(items)
    }

    fn match_binary_op(&mut self) -> Option<BinaryOp> {
        let op = match self.current().kind {
            TokenKind::Eq => BinaryOp::Eq,
            TokenKind::Ne => BinaryOp::Ne,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::Ge => BinaryOp::Ge,
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::Le => BinaryOp::Le,
            TokenKind::In => BinaryOp::In,
            TokenKind::Contains => BinaryOp::Contains,
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    fn enter_nested(&mut self) -> Result<(), SyntaxError> {
        self.depth += 1;
        match self.max_depth {
            Some(max) if self.depth > max => Err(self.error(&format!(
                "Expression nests deeper than {} levels",
                max
            ))),
            _ => Ok(()),
        }
    }

    // ========================================================================
    // Helper methods
    // ========================================================================

    pub(crate) fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    pub(crate) fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current().kind) == std::mem::discriminant(kind)
    }

    pub(crate) fn expect(&mut self, kind: TokenKind, what: &str) -> Result<(), SyntaxError> {
        if self.check(&kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(&format!("Expected {}, found {}", what, self.current().kind)))
        }
    }

    pub(crate) fn error(&self, msg: &str) -> SyntaxError {
        let span = self.current().span;
        SyntaxError::new(msg, span.line, span.column)
    }
}

// ============================================================================
// CONVENIENCE FUNCTIONS
// ============================================================================

/// Parse an expression string.
pub fn parse(source: &str) -> Result<ParsedExpression, SyntaxError> {
    let tokens = Lexer::new(source).tokenize()?;
    Parser::new(tokens).parse()
}

/// Parse an expression string, rejecting nesting deeper than `max_depth`.
pub fn parse_with_max_depth(
    source: &str,
    max_depth: usize,
) -> Result<ParsedExpression, SyntaxError> {
    let tokens = Lexer::new(source).tokenize()?;
    Parser::new(tokens).with_max_depth(max_depth).parse()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(path: &str) -> Box<Expr> {
        Box::new(Expr::Identifier(path.to_string()))
    }

    fn num(n: f64) -> Box<Expr> {
        Box::new(Expr::Literal(Literal::Number(n)))
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_simple_comparison() {
        let parsed = parse("amount >= 50000").unwrap();
        assert_eq!(
            parsed.ast,
            Expr::Binary {
                op: BinaryOp::Ge,
                left: ident("amount"),
                right: num(50000.0),
            }
        );
        assert_eq!(parsed.identifiers, set(&["amount"]));
        assert!(parsed.functions.is_empty());
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let parsed = parse("a == 1 or b == 2 and c == 3").unwrap();
        match parsed.ast {
            Expr::Logical {
                op: LogicalOp::Or,
                right,
                ..
            } => assert!(matches!(
                *right,
                Expr::Logical {
                    op: LogicalOp::And,
                    ..
                }
            )),
            other => panic!("expected or at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_symbolic_logical_operators() {
        assert_eq!(
            parse("a && b || c").unwrap().ast,
            parse("a and b or c").unwrap().ast
        );
    }

    #[test]
    fn test_comparison_is_left_associative() {
        let parsed = parse("a == b == c").unwrap();
        match parsed.ast {
            Expr::Binary { left, right, .. } => {
                assert!(matches!(*left, Expr::Binary { .. }));
                assert_eq!(right, ident("c"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parentheses_override_precedence() {
        let parsed = parse("(a or b) and c").unwrap();
        assert!(matches!(
            parsed.ast,
            Expr::Logical {
                op: LogicalOp::And,
                ..
            }
        ));
    }

    #[test]
    fn test_array_literal() {
        let parsed = parse("status in ['A', 'B']").unwrap();
        match parsed.ast {
            Expr::Binary {
                op: BinaryOp::In,
                right,
                ..
            } => assert_eq!(
                *right,
                Expr::Array(vec![
                    Expr::Literal(Literal::String("A".to_string())),
                    Expr::Literal(Literal::String("B".to_string())),
                ])
            ),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(parse("x in []").unwrap().ast, Expr::Binary { .. }));
    }

    #[test]
    fn test_call_records_function_and_literal_path() {
        let parsed = parse("changed('status') and get(\"owner.id\") != null").unwrap();
        assert_eq!(parsed.identifiers, set(&["owner.id", "status"]));
        assert_eq!(parsed.functions, set(&["changed", "get"]));
    }

    #[test]
    fn test_call_with_identifier_argument() {
        let parsed = parse("changed(watchedField)").unwrap();
        assert_eq!(parsed.identifiers, set(&["watchedField"]));
        assert_eq!(
            parsed.ast,
            Expr::Call {
                name: "changed".to_string(),
                args: vec![Expr::Identifier("watchedField".to_string())],
            }
        );
    }

    #[test]
    fn test_unknown_function_parses() {
        let parsed = parse("now() > 0 or noargs()").unwrap();
        assert_eq!(parsed.functions, set(&["noargs", "now"]));
        assert!(parsed.identifiers.is_empty());
    }

    #[test]
    fn test_other_function_literal_not_an_identifier() {
        let parsed = parse("lookup('status')").unwrap();
        assert!(parsed.identifiers.is_empty());
    }

    #[test]
    fn test_malformed_number_is_nan() {
        match parse("1.2.3").unwrap().ast {
            Expr::Literal(Literal::Number(n)) => assert!(n.is_nan()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_keyword_literals() {
        assert_eq!(
            parse("NULL").unwrap().ast,
            Expr::Literal(Literal::Null)
        );
        assert_eq!(
            parse("True").unwrap().ast,
            Expr::Literal(Literal::Bool(true))
        );
    }

    #[test]
    fn test_unsupported_operator_is_syntax_error() {
        assert!(parse("amount ~~ 50000").is_err());
        assert!(parse("amount = 50000").is_err());
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        let err = parse("a == 1 b").unwrap_err();
        assert!(err.message.contains("Unexpected token near"));
        assert_eq!(err.column, 8);
    }

    #[test]
    fn test_missing_closers_named() {
        let err = parse("(a == 1").unwrap_err();
        assert!(err.message.contains("')'"), "{}", err.message);

        let err = parse("x in ['a', 'b'").unwrap_err();
        assert!(err.message.contains("']'"), "{}", err.message);

        let err = parse("changed('a'").unwrap_err();
        assert!(err.message.contains("argument list"), "{}", err.message);
    }

    #[test]
    fn test_empty_and_dangling_input() {
        assert!(parse("").unwrap_err().message.contains("end of expression"));
        assert!(parse("   ").is_err());
        assert!(parse("a ==").is_err());
        assert!(parse("a and").is_err());
        assert!(parse("[1,]").is_err());
        assert!(parse(")").is_err());
    }

    #[test]
    fn test_max_depth() {
        assert!(parse_with_max_depth("((a))", 2).is_ok());
        let err = parse_with_max_depth("(((a)))", 2).unwrap_err();
        assert!(err.message.contains("deeper than 2"));
        assert!(parse_with_max_depth("get([[1]])", 2).is_err());
        assert!(parse("((((((((((a))))))))))").is_ok());
    }
}
