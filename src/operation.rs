use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const ANONYMOUS_OPERATION: &str = "Anonymous Operation";

static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[_A-Za-z][_0-9A-Za-z]*$").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    #[default]
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "query" => Some(OperationKind::Query),
            "mutation" => Some(OperationKind::Mutation),
            "subscription" => Some(OperationKind::Subscription),
            _ => None,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Query => f.write_str("query"),
            OperationKind::Mutation => f.write_str("mutation"),
            OperationKind::Subscription => f.write_str("subscription"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OperationInfo {
    pub kind: OperationKind,
    pub name: Option<String>,
}

pub fn operation_name(query: &str) -> Option<String> {
    inspect(query).name
}

pub fn operation_kind(query: &str) -> OperationKind {
    inspect(query).kind
}

pub fn display_name(name: Option<&str>) -> &str {
    name.filter(|n| !n.is_empty()).unwrap_or(ANONYMOUS_OPERATION)
}

pub fn inspect(query: &str) -> OperationInfo {
    let tokens = top_level_tokens(query);
    let mut previous: Option<&Token> = None;

    for (index, token) in tokens.iter().enumerate() {
        let at_definition_start = matches!(previous, None | Some(Token::Punct('}')));
        if at_definition_start {
            match token {
                Token::Punct('{') => return OperationInfo::default(),
                Token::Word(word) => {
                    if let Some(kind) = OperationKind::from_keyword(word) {
                        let name = match tokens.get(index + 1) {
                            Some(Token::Word(candidate)) if NAME_PATTERN.is_match(candidate) => {
                                Some(candidate.clone())
                            }
                            _ => None,
                        };
                        return OperationInfo { kind, name };
                    }
                }
                _ => {}
            }
        }
        previous = Some(token);
    }

    OperationInfo::default()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Punct(char),
}

/// Tokens outside of any selection set. Braces that open and close a
/// top-level block are kept so definition boundaries stay visible.
fn top_level_tokens(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut chars = source.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '#' => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        break;
                    }
                }
            }
            '"' => skip_string(&mut chars),
            '{' => {
                if depth == 0 {
                    tokens.push(Token::Punct('{'));
                }
                depth += 1;
            }
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    tokens.push(Token::Punct('}'));
                }
            }
            c if depth == 0 && is_word_char(c) => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if is_word_char(next) {
                        word.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Word(word));
            }
            c if depth == 0 && !c.is_whitespace() && c != ',' => tokens.push(Token::Punct(c)),
            _ => {}
        }
    }

    tokens
}

// Words are raw runs so a malformed name such as `1st` fails `NAME_PATTERN`.
fn is_word_char(c: char) -> bool {
    !c.is_whitespace()
        && !matches!(
            c,
            ',' | '"' | '#' | '!' | '$' | '&' | '(' | ')' | '.' | ':' | '=' | '@' | '[' | ']'
                | '{' | '|' | '}'
        )
}

fn skip_string(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    let mut block = false;
    if chars.peek() == Some(&'"') {
        chars.next();
        if chars.peek() == Some(&'"') {
            chars.next();
            block = true;
        } else {
            // empty string literal
            return;
        }
    }

    let mut quotes = 0;
    while let Some(ch) = chars.next() {
        match ch {
            '\\' if !block => {
                chars.next();
            }
            '"' if block => {
                quotes += 1;
                if quotes == 3 {
                    return;
                }
            }
            '"' => return,
            _ => quotes = 0,
        }
    }
}
