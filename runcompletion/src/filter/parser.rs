//! Recursive-descent parser producing the filter AST.
//!
//! ```text
//! expr    := and ("or" and)*
//! and     := unary ("and" unary)*
//! unary   := "not" unary | primary
//! primary := "(" expr ")" | match
//! match   := value ["not"] "in" selector
//!          | selector ("==" | "!=" | "<" | "<=" | ">" | ">=") value
//!          | selector "is" ["not"] "empty"
//!          | selector ["not"] ("contains" | "matches") value
//! ```
//!
//! Keywords are recognised by position, so a property may share a
//! keyword's name: `empty is empty` tests the property `empty`.

use super::lexer::{tokenize, Token, TokenKind};
use super::FilterParseError;
use regex::Regex;

/// Deepest nesting of `not` and parentheses accepted.
pub const MAX_DEPTH: usize = 64;

/// A dotted path into a property map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    segments: Vec<String>,
}

impl Selector {
    /// Splits a dotted path into segments.
    pub(crate) fn parse(path: &str, offset: usize) -> Result<Self, FilterParseError> {
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(FilterParseError::new(format!("invalid selector `{path}`"), offset));
        }
        Ok(Self { segments })
    }

    /// The path segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    Less,
    /// `<=`
    LessOrEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterOrEqual,
}

/// A filter expression.
#[derive(Debug, Clone)]
pub enum Expr {
    /// Every term holds.
    And(Vec<Expr>),
    /// At least one term holds.
    Or(Vec<Expr>),
    /// The inner expression does not hold.
    Not(Box<Expr>),
    /// `selector <op> value`
    Compare {
        /// The property compared.
        selector: Selector,
        /// The operator.
        op: Comparison,
        /// The literal, coerced to the property's type at evaluation.
        value: String,
    },
    /// `selector is empty`
    IsEmpty(Selector),
    /// `selector contains value`, or `value in selector`.
    Contains {
        /// The collection or string searched.
        selector: Selector,
        /// The needle.
        value: String,
    },
    /// `selector matches "regex"`
    Matches {
        /// The string property.
        selector: Selector,
        /// The compiled pattern.
        pattern: Regex,
    },
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
    end: usize,
    depth: usize,
}

pub(crate) fn parse(input: &str) -> Result<Expr, FilterParseError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(FilterParseError::new("empty expression", 0));
    }
    let mut parser = Parser {
        tokens,
        position: 0,
        end: input.len(),
        depth: 0,
    };
    let expr = parser.or_expr()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(FilterParseError::new("unexpected trailing input", token.offset)),
    }
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        self.peek().is_some_and(|t| t.kind.is_keyword(keyword))
    }

    fn peek_keyword_at(&self, distance: usize, keyword: &str) -> bool {
        self.tokens
            .get(self.position + distance)
            .is_some_and(|t| t.kind.is_keyword(keyword))
    }

    /// True when the token at `distance` starts a match rather than being
    /// a keyword: it is followed by an operator, by `is`, `contains`,
    /// `matches`, or by `in` and a selector.
    fn is_operand_at(&self, distance: usize) -> bool {
        let at = |offset: usize| self.tokens.get(self.position + distance + offset);
        if !matches!(at(0), Some(Token { kind: TokenKind::Word(_) | TokenKind::Quoted(_), .. })) {
            return false;
        }
        let Some(following) = at(1) else {
            return false;
        };
        let selector_after = |offset: usize| {
            matches!(at(offset), Some(Token { kind: TokenKind::Word(_), .. }))
        };
        match &following.kind {
            TokenKind::Eq
            | TokenKind::Ne
            | TokenKind::Lt
            | TokenKind::Le
            | TokenKind::Gt
            | TokenKind::Ge => true,
            kind if kind.is_keyword("is") || kind.is_keyword("contains") || kind.is_keyword("matches") => true,
            kind if kind.is_keyword("in") => selector_after(2),
            kind if kind.is_keyword("not") => at(2).is_some_and(|t| {
                t.kind.is_keyword("contains")
                    || t.kind.is_keyword("matches")
                    || (t.kind.is_keyword("in") && selector_after(3))
            }),
            _ => false,
        }
    }

    fn enter(&mut self, offset: usize) -> Result<(), FilterParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(FilterParseError::new(
                format!("expression nested deeper than {MAX_DEPTH} levels"),
                offset,
            ));
        }
        Ok(())
    }

    fn next(&mut self) -> Result<Token, FilterParseError> {
        let token = self
            .tokens
            .get(self.position)
            .cloned()
            .ok_or_else(|| FilterParseError::new("unexpected end of expression", self.end))?;
        self.position += 1;
        Ok(token)
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), FilterParseError> {
        let token = self.next()?;
        if token.kind.is_keyword(keyword) {
            Ok(())
        } else {
            Err(FilterParseError::new(format!("expected `{keyword}`"), token.offset))
        }
    }

    fn or_expr(&mut self) -> Result<Expr, FilterParseError> {
        let mut terms = vec![self.and_expr()?];
        while self.peek_keyword("or") {
            self.position += 1;
            terms.push(self.and_expr()?);
        }
        Ok(flatten(terms, Expr::Or))
    }

    fn and_expr(&mut self) -> Result<Expr, FilterParseError> {
        let mut terms = vec![self.unary()?];
        while self.peek_keyword("and") {
            self.position += 1;
            terms.push(self.unary()?);
        }
        Ok(flatten(terms, Expr::And))
    }

    fn unary(&mut self) -> Result<Expr, FilterParseError> {
        if self.peek_keyword("not") && !self.is_operand_at(0) {
            let offset = self.peek().map_or(self.end, |t| t.offset);
            self.position += 1;
            self.enter(offset)?;
            let inner = self.unary()?;
            self.depth -= 1;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, FilterParseError> {
        if let Some(Token { kind: TokenKind::LParen, offset }) = self.peek() {
            let offset = *offset;
            self.position += 1;
            self.enter(offset)?;
            let expr = self.or_expr()?;
            let closing = self.next()?;
            if closing.kind != TokenKind::RParen {
                return Err(FilterParseError::new("expected `)`", closing.offset));
            }
            self.depth -= 1;
            return Ok(expr);
        }
        self.match_expr()
    }

    fn operand(&mut self) -> Result<(String, bool, usize), FilterParseError> {
        let token = self.next()?;
        match token.kind {
            TokenKind::Word(word) => Ok((word, false, token.offset)),
            TokenKind::Quoted(text) => Ok((text, true, token.offset)),
            _ => Err(FilterParseError::new("expected a selector or value", token.offset)),
        }
    }

    fn selector(&mut self) -> Result<Selector, FilterParseError> {
        let (text, quoted, offset) = self.operand()?;
        if quoted {
            return Err(FilterParseError::new("expected a selector", offset));
        }
        Selector::parse(&text, offset)
    }

    fn match_expr(&mut self) -> Result<Expr, FilterParseError> {
        let (first, quoted, offset) = self.operand()?;

        // `value in selector` / `value not in selector`
        if self.peek_keyword("in") || (self.peek_keyword("not") && self.peek_keyword_at(1, "in")) {
            let negated = self.peek_keyword("not");
            self.position += if negated { 2 } else { 1 };
            let selector = self.selector()?;
            let expr = Expr::Contains {
                selector,
                value: first,
            };
            return Ok(negate(expr, negated));
        }

        if quoted {
            return Err(FilterParseError::new("expected a selector", offset));
        }
        let selector = Selector::parse(&first, offset)?;

        let token = self.next()?;
        let op = match token.kind {
            TokenKind::Eq => Some(Comparison::Equal),
            TokenKind::Ne => Some(Comparison::NotEqual),
            TokenKind::Lt => Some(Comparison::Less),
            TokenKind::Le => Some(Comparison::LessOrEqual),
            TokenKind::Gt => Some(Comparison::Greater),
            TokenKind::Ge => Some(Comparison::GreaterOrEqual),
            _ => None,
        };
        if let Some(op) = op {
            let (value, _, _) = self.operand()?;
            return Ok(Expr::Compare { selector, op, value });
        }

        if token.kind.is_keyword("is") {
            let negated = self.peek_keyword("not");
            if negated {
                self.position += 1;
            }
            self.expect_keyword("empty")?;
            return Ok(negate(Expr::IsEmpty(selector), negated));
        }

        let negated = token.kind.is_keyword("not");
        let keyword = if negated { self.next()? } else { token };

        if keyword.kind.is_keyword("contains") {
            let (value, _, _) = self.operand()?;
            return Ok(negate(Expr::Contains { selector, value }, negated));
        }

        if keyword.kind.is_keyword("matches") {
            let (value, _, value_offset) = self.operand()?;
            let pattern = Regex::new(&value).map_err(|e| {
                FilterParseError::new(format!("invalid regular expression: {e}"), value_offset)
            })?;
            return Ok(negate(Expr::Matches { selector, pattern }, negated));
        }

        Err(FilterParseError::new("expected an operator", keyword.offset))
    }
}

fn flatten(mut terms: Vec<Expr>, combine: fn(Vec<Expr>) -> Expr) -> Expr {
    if terms.len() == 1 {
        terms.remove(0)
    } else {
        combine(terms)
    }
}

fn negate(expr: Expr, negated: bool) -> Expr {
    if negated {
        Expr::Not(Box::new(expr))
    } else {
        expr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_comparison() {
        let expr = parse("x.y == 1").unwrap();
        match expr {
            Expr::Compare { selector, op, value } => {
                assert_eq!(selector.segments(), ["x", "y"]);
                assert_eq!(op, Comparison::Equal);
                assert_eq!(value, "1");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_precedence_and_binds_tighter() {
        let expr = parse("a == 1 or b == 2 and c == 3").unwrap();
        assert!(matches!(expr, Expr::Or(ref terms) if matches!(terms[1], Expr::And(_))));
    }

    #[test]
    fn test_parentheses() {
        let expr = parse("(a == 1 or b == 2) and c == 3").unwrap();
        assert!(matches!(expr, Expr::And(ref terms) if matches!(terms[0], Expr::Or(_))));
    }

    #[test]
    fn test_in_and_not_in() {
        assert!(matches!(parse(r#""gpu" in tags"#).unwrap(), Expr::Contains { .. }));
        assert!(matches!(parse("gpu not in tags").unwrap(), Expr::Not(_)));
    }

    #[test]
    fn test_is_empty_forms() {
        assert!(matches!(parse("tags is empty").unwrap(), Expr::IsEmpty(_)));
        assert!(matches!(parse("tags is not empty").unwrap(), Expr::Not(_)));
    }

    #[test]
    fn test_matches() {
        assert!(matches!(parse(r#"name matches "^m[0-9]+$""#).unwrap(), Expr::Matches { .. }));
        assert!(parse(r#"name matches "(""#).is_err());
    }

    #[test]
    fn test_errors() {
        assert!(parse("").is_err());
        assert!(parse("x ==").is_err());
        assert!(parse("x 1").is_err());
        assert!(parse("(x == 1").is_err());
        assert!(parse("x == 1 y").is_err());
        assert!(parse(r#""x" == 1"#).is_err());
        assert!(parse("x..y == 1").is_err());
        assert!(parse("not").is_err());
        assert!(parse("x == 1 and").is_err());
    }

    #[test]
    fn test_long_chains_stay_flat() {
        let input = vec!["x == 1"; 10_000].join(" or ");
        match parse(&input).unwrap() {
            Expr::Or(terms) => assert_eq!(terms.len(), 10_000),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |depth: usize| format!("{}x == 1{}", "(".repeat(depth), ")".repeat(depth));
        assert!(parse(&nested(MAX_DEPTH)).is_ok());
        let err = parse(&nested(20_000)).unwrap_err();
        assert_eq!(err.offset, MAX_DEPTH);

        let negations = |depth: usize| format!("{}x == 1", "not ".repeat(depth));
        assert!(parse(&negations(MAX_DEPTH)).is_ok());
        assert!(parse(&negations(200_000)).is_err());
    }

    #[test]
    fn test_keywords_as_selectors() {
        assert!(matches!(parse("empty is empty").unwrap(), Expr::IsEmpty(_)));
        assert!(matches!(parse("in == 1").unwrap(), Expr::Compare { .. }));
        assert!(matches!(parse("not == 1").unwrap(), Expr::Compare { .. }));
        assert!(matches!(parse("not contains gpu").unwrap(), Expr::Contains { .. }));
        assert!(matches!(parse("and == or and matches != is").unwrap(), Expr::And(_)));
        assert!(matches!(parse("not x == 1").unwrap(), Expr::Not(_)));
        assert!(matches!(parse("not in tags").unwrap(), Expr::Contains { .. }));
    }
}
