//! Build-constraint expressions.
//!
//! Two syntaxes feed the same evaluator: `//go:build` expressions with
//! `&&`, `||`, `!` and parentheses, and legacy `// +build` lines where
//! spaces mean OR, commas mean AND, and multiple lines AND together. When a
//! file carries both, the `//go:build` line wins.

use std::collections::HashSet;

/// A parsed constraint expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A bare tag.
    Tag(String),
    /// Negation.
    Not(Box<Expr>),
    /// Conjunction.
    And(Box<Expr>, Box<Expr>),
    /// Disjunction.
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Evaluate against a tag oracle.
    pub fn eval(&self, is_set: &dyn Fn(&str) -> bool) -> bool {
        match self {
            Self::Tag(tag) => is_set(tag),
            Self::Not(inner) => !inner.eval(is_set),
            Self::And(a, b) => a.eval(is_set) && b.eval(is_set),
            Self::Or(a, b) => a.eval(is_set) || b.eval(is_set),
        }
    }

    /// Collect every tag the expression mentions.
    pub fn collect_tags(&self, out: &mut HashSet<String>) {
        match self {
            Self::Tag(tag) => {
                out.insert(tag.clone());
            }
            Self::Not(inner) => inner.collect_tags(out),
            Self::And(a, b) | Self::Or(a, b) => {
                a.collect_tags(out);
                b.collect_tags(out);
            }
        }
    }
}

/// Parse a `//go:build` expression body. Returns `None` on malformed input;
/// callers treat an unparseable constraint as "file excluded" the way the
/// reference toolchain rejects such files.
#[must_use]
pub fn parse_go_build(input: &str) -> Option<Expr> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_or()?;
    if parser.pos == parser.tokens.len() {
        Some(expr)
    } else {
        None
    }
}

/// Parse one legacy `// +build` line into an expression: space-separated
/// options OR together, comma-separated terms AND together.
#[must_use]
pub fn parse_plus_build(line: &str) -> Option<Expr> {
    let mut options: Option<Expr> = None;
    for option in line.split_whitespace() {
        let mut terms: Option<Expr> = None;
        for term in option.split(',') {
            let (negate, tag) = match term.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, term),
            };
            if tag.is_empty() || !tag.chars().all(is_tag_char) {
                return None;
            }
            let mut expr = Expr::Tag(tag.to_string());
            if negate {
                expr = Expr::Not(Box::new(expr));
            }
            terms = Some(match terms {
                Some(prev) => Expr::And(Box::new(prev), Box::new(expr)),
                None => expr,
            });
        }
        let term_expr = terms?;
        options = Some(match options {
            Some(prev) => Expr::Or(Box::new(prev), Box::new(term_expr)),
            None => term_expr,
        });
    }
    options
}

fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Tag(String),
    Not,
    And,
    Or,
    Open,
    Close,
}

fn tokenize(input: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '!' => {
                chars.next();
                tokens.push(Token::Not);
            }
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            '&' => {
                chars.next();
                if chars.next() != Some('&') {
                    return None;
                }
                tokens.push(Token::And);
            }
            '|' => {
                chars.next();
                if chars.next() != Some('|') {
                    return None;
                }
                tokens.push(Token::Or);
            }
            c if is_tag_char(c) => {
                let mut tag = String::new();
                while let Some(&c) = chars.peek() {
                    if !is_tag_char(c) {
                        break;
                    }
                    tag.push(c);
                    chars.next();
                }
                tokens.push(Token::Tag(tag));
            }
            _ => return None,
        }
    }
    Some(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn parse_or(&mut self) -> Option<Expr> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Some(left)
    }

    fn parse_and(&mut self) -> Option<Expr> {
        let mut left = self.parse_unary()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let right = self.parse_unary()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Some(left)
    }

    fn parse_unary(&mut self) -> Option<Expr> {
        match self.peek()? {
            Token::Not => {
                self.pos += 1;
                Some(Expr::Not(Box::new(self.parse_unary()?)))
            }
            Token::Open => {
                self.pos += 1;
                let inner = self.parse_or()?;
                if self.peek() == Some(&Token::Close) {
                    self.pos += 1;
                    Some(inner)
                } else {
                    None
                }
            }
            Token::Tag(_) => {
                let Some(Token::Tag(tag)) = self.peek().cloned() else {
                    return None;
                };
                self.pos += 1;
                Some(Expr::Tag(tag))
            }
            _ => None,
        }
    }
}
