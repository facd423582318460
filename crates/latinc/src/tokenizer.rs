//! An eager tokenizer for Latin source.
//!
//! The whole input is scanned before anything is handed to the parser, and a
//! second pass over the finished token list checks that parentheses and braces
//! balance. Splitting the two keeps the scan loop free of nesting bookkeeping
//! while still reporting the exact opener or closer at fault.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::numerals;

pub const COPULA: &str = "esse";
pub const NULL_WORD: &str = "nullus";
pub const BOOLEAN_WORDS: [&str; 2] = ["verum", "falsum"];
pub const OPERATOR_WORDS: [&str; 8] = [
    "sit",           // is
    "nonest",        // is not
    "maior",         // greater
    "minor",         // less
    "additum",       // plus
    "detractum",     // minus
    "multiplicatum", // multiplied by
    "divisum",       // divided by
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Keyword {
    Dico,
    Constituo,
    Pono,
    Si,
    Dum,
}

impl Keyword {
    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            "dico" => Some(Keyword::Dico),
            "constituo" => Some(Keyword::Constituo),
            "pono" => Some(Keyword::Pono),
            "si" => Some(Keyword::Si),
            "dum" => Some(Keyword::Dum),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Dico => "dico",
            Keyword::Constituo => "constituo",
            Keyword::Pono => "pono",
            Keyword::Si => "si",
            Keyword::Dum => "dum",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenData {
    Keyword(Keyword),
    Name(String),
    /// The `esse` marker between a declared name and its initializer.
    Copula,
    Number(i64),
    String(String),
    Boolean(String),
    Null,
    Operator(String),
    Semicolon,
    Parenthesis { is_opening: bool },
    Brace { is_opening: bool },
}

impl TokenData {
    /// The source text this token stands for, used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            TokenData::Keyword(keyword) => format!("keyword '{}'", keyword.as_str()),
            TokenData::Name(name) => format!("name '{name}'"),
            TokenData::Copula => format!("'{COPULA}'"),
            TokenData::Number(value) => format!("number {value}"),
            TokenData::String(text) => format!("string \"{text}\""),
            TokenData::Boolean(word) => format!("boolean '{word}'"),
            TokenData::Null => format!("'{NULL_WORD}'"),
            TokenData::Operator(word) => format!("operator '{word}'"),
            TokenData::Semicolon => "';'".to_string(),
            TokenData::Parenthesis { is_opening: true } => "'('".to_string(),
            TokenData::Parenthesis { is_opening: false } => "')'".to_string(),
            TokenData::Brace { is_opening: true } => "'{'".to_string(),
            TokenData::Brace { is_opening: false } => "'}'".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Byte offset into the source.
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self {
            offset: 0,
            line,
            column,
        }
    }

    pub fn advance(&mut self, c: char) {
        self.offset += c.len_utf8();
        self.column += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} column {}", self.line, self.column)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub data: TokenData,
    pub position: Position,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    #[error("unknown character '{character}' at {position}")]
    UnknownCharacter { character: char, position: Position },
    #[error("unfinished string at {position}")]
    UnterminatedString { position: Position },
    #[error("unmatched opening {} at {position}", delimiter_name(.delimiter))]
    UnmatchedOpening { delimiter: char, position: Position },
    #[error("unmatched closing {} at {position}", delimiter_name(.delimiter))]
    UnmatchedClosing { delimiter: char, position: Position },
}

impl LexError {
    pub fn position(&self) -> Position {
        match self {
            LexError::UnknownCharacter { position, .. }
            | LexError::UnterminatedString { position }
            | LexError::UnmatchedOpening { position, .. }
            | LexError::UnmatchedClosing { position, .. } => *position,
        }
    }
}

fn delimiter_name(delimiter: &char) -> &'static str {
    match delimiter {
        '(' | ')' => "parenthesis",
        _ => "curly brace",
    }
}

#[tracing::instrument(level = "trace", skip_all)]
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    // Every program ends with a terminator, followed by a space sentinel.
    let mut input = source.to_string();
    if !input.ends_with(';') {
        input.push(';');
    }
    input.push(' ');

    let tokens = scan(&input)?;
    check_balance(&tokens)?;
    trace!(token_count = tokens.len(), "Tokenized source");
    Ok(tokens)
}

fn scan(input: &str) -> Result<Vec<Token>, LexError> {
    let mut chars = input.chars().peekable();
    let mut tokens = vec![];
    let mut position = Position::default();

    while let Some(c) = chars.next() {
        let start = position;
        position.advance(c);

        let data = if c.is_whitespace() {
            continue;
        } else if c == ';' {
            TokenData::Semicolon
        } else if c == '"' {
            let mut string = String::new();
            loop {
                match chars.next() {
                    Some('"') => {
                        position.advance('"');
                        break;
                    }
                    Some(c) => {
                        position.advance(c);
                        string.push(c);
                    }
                    None => return Err(LexError::UnterminatedString { position: start }),
                }
            }
            TokenData::String(string)
        } else if c == '(' || c == ')' {
            TokenData::Parenthesis {
                is_opening: c == '(',
            }
        } else if c == '{' || c == '}' {
            TokenData::Brace {
                is_opening: c == '{',
            }
        } else if c == '-' && chars.peek().is_some_and(|next| numerals::is_glyph(*next)) {
            let mut numeral = String::from("-");
            while let Some(c) = chars.next_if(|next| numerals::is_glyph(*next)) {
                position.advance(c);
                numeral.push(c);
            }
            TokenData::Number(numeral_value(&numeral))
        } else if c.is_ascii_alphabetic() || c == '_' {
            let mut word = String::new();
            word.push(c);
            while let Some(c) = chars.next_if(|next| next.is_ascii_alphabetic() || *next == '_') {
                position.advance(c);
                word.push(c);
            }
            classify_word(word)
        } else {
            return Err(LexError::UnknownCharacter {
                character: c,
                position: start,
            });
        };

        tokens.push(Token {
            data,
            position: start,
        });
    }

    Ok(tokens)
}

fn classify_word(word: String) -> TokenData {
    if numerals::is_numeral(&word) {
        TokenData::Number(numeral_value(&word))
    } else if let Some(keyword) = Keyword::from_word(&word) {
        TokenData::Keyword(keyword)
    } else if word == NULL_WORD {
        TokenData::Null
    } else if word == COPULA {
        TokenData::Copula
    } else if BOOLEAN_WORDS.contains(&word.as_str()) {
        TokenData::Boolean(word)
    } else if OPERATOR_WORDS.contains(&word.as_str()) {
        TokenData::Operator(word)
    } else {
        TokenData::Name(word)
    }
}

/// Only ever called on text made of numeral glyphs.
fn numeral_value(numeral: &str) -> i64 {
    numerals::parse_numeral(numeral).unwrap_or_default()
}

/// Verifies that every parenthesis and brace in `tokens` is matched.
///
/// A stray closer fails immediately; openers left over at the end are
/// reported at the earliest one.
pub fn check_balance(tokens: &[Token]) -> Result<(), LexError> {
    let mut parens: Vec<Position> = vec![];
    let mut braces: Vec<Position> = vec![];

    for token in tokens {
        let (stack, delimiter, is_opening) = match token.data {
            TokenData::Parenthesis { is_opening } => (&mut parens, '(', is_opening),
            TokenData::Brace { is_opening } => (&mut braces, '{', is_opening),
            _ => continue,
        };
        if is_opening {
            stack.push(token.position);
        } else if stack.pop().is_none() {
            return Err(LexError::UnmatchedClosing {
                delimiter: if delimiter == '(' { ')' } else { '}' },
                position: token.position,
            });
        }
    }

    if let Some(position) = parens.first() {
        return Err(LexError::UnmatchedOpening {
            delimiter: '(',
            position: *position,
        });
    }
    if let Some(position) = braces.first() {
        return Err(LexError::UnmatchedOpening {
            delimiter: '{',
            position: *position,
        });
    }
    Ok(())
}
