//! Tokenizer for filter expressions.

use super::FilterParseError;

/// A lexical token with its byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenKind {
    LParen,
    RParen,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// A bare word: selector, keyword, number or unquoted value.
    Word(String),
    /// A quoted string with escapes resolved.
    Quoted(String),
}

impl TokenKind {
    /// Returns true if this is the bare keyword `keyword`.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Self::Word(word) if word == keyword)
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | '+' | ':')
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>, FilterParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let kind = match c {
            '(' => {
                chars.next();
                TokenKind::LParen
            }
            ')' => {
                chars.next();
                TokenKind::RParen
            }
            '=' => {
                chars.next();
                match chars.next() {
                    Some((_, '=')) => TokenKind::Eq,
                    _ => return Err(FilterParseError::new("expected `==`", offset)),
                }
            }
            '!' => {
                chars.next();
                match chars.next() {
                    Some((_, '=')) => TokenKind::Ne,
                    _ => return Err(FilterParseError::new("expected `!=`", offset)),
                }
            }
            '<' | '>' => {
                chars.next();
                let or_equal = matches!(chars.peek(), Some((_, '=')));
                if or_equal {
                    chars.next();
                }
                match (c, or_equal) {
                    ('<', false) => TokenKind::Lt,
                    ('<', true) => TokenKind::Le,
                    ('>', false) => TokenKind::Gt,
                    _ => TokenKind::Ge,
                }
            }
            '"' | '`' => {
                chars.next();
                let quote = c;
                let mut value = String::new();
                let mut closed = false;
                while let Some((_, next)) = chars.next() {
                    if next == quote {
                        closed = true;
                        break;
                    }
                    if next == '\\' && quote == '"' {
                        match chars.next() {
                            Some((_, 'n')) => value.push('\n'),
                            Some((_, 't')) => value.push('\t'),
                            Some((_, escaped)) => value.push(escaped),
                            None => break,
                        }
                    } else {
                        value.push(next);
                    }
                }
                if !closed {
                    return Err(FilterParseError::new("unterminated string", offset));
                }
                TokenKind::Quoted(value)
            }
            c if is_word_char(c) => {
                let mut word = String::new();
                while let Some(&(_, next)) = chars.peek() {
                    if !is_word_char(next) {
                        break;
                    }
                    word.push(next);
                    chars.next();
                }
                TokenKind::Word(word)
            }
            other => {
                return Err(FilterParseError::new(
                    format!("unexpected character `{other}`"),
                    offset,
                ))
            }
        };

        tokens.push(Token { kind, offset });
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("== != < <= > >= ( )"),
            vec![
                TokenKind::Eq,
                TokenKind::Ne,
                TokenKind::Lt,
                TokenKind::Le,
                TokenKind::Gt,
                TokenKind::Ge,
                TokenKind::LParen,
                TokenKind::RParen,
            ]
        );
    }

    #[test]
    fn test_words_and_strings() {
        assert_eq!(
            kinds(r#"x.y=="a \"b\"" and -1.5"#),
            vec![
                TokenKind::Word("x.y".into()),
                TokenKind::Eq,
                TokenKind::Quoted("a \"b\"".into()),
                TokenKind::Word("and".into()),
                TokenKind::Word("-1.5".into()),
            ]
        );
    }

    #[test]
    fn test_backtick_strings_are_raw() {
        assert_eq!(kinds(r"`a\d`"), vec![TokenKind::Quoted(r"a\d".into())]);
    }

    #[test]
    fn test_errors() {
        assert!(tokenize("x = 1").is_err());
        assert!(tokenize("x ! 1").is_err());
        assert!(tokenize(r#"x == "open"#).is_err());
        assert!(tokenize("x == 1 ; y").is_err());
    }
}
