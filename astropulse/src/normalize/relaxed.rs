//! Restricted literal parser for quasi-JSON emitted by language models.
//!
//! Models frequently hand tools payloads like
//! `{flare_class: 'X1.8', kp_index: 7}` — unquoted keys, single-quoted
//! strings, Python-style keyword literals. This parser accepts that dialect
//! on top of plain JSON and can only ever produce data values; there is no
//! evaluation of any kind.

use serde_json::{Map, Number, Value};

/// Parses a relaxed literal. Returns `None` on any syntax the dialect does
/// not cover; callers fall back to wrapping the raw text.
pub(crate) fn parse(input: &str) -> Option<Value> {
    let chars: Vec<char> = input.chars().collect();
    let mut parser = Parser { chars, pos: 0 };
    parser.skip_ws();
    let value = parser.value()?;
    parser.skip_ws();
    if parser.pos == parser.chars.len() {
        Some(value)
    } else {
        None
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, expected: char) -> Option<()> {
        if self.peek() == Some(expected) {
            self.pos += 1;
            Some(())
        } else {
            None
        }
    }

    fn value(&mut self) -> Option<Value> {
        self.skip_ws();
        match self.peek()? {
            '{' => self.object(),
            '[' => self.array(),
            '"' | '\'' => self.quoted_string().map(Value::String),
            c if c == '-' || c == '+' || c.is_ascii_digit() => self.number(),
            c if is_word_char(c) => Some(self.word()),
            _ => None,
        }
    }

    fn object(&mut self) -> Option<Value> {
        self.eat('{')?;
        let mut map = Map::new();
        loop {
            self.skip_ws();
            if self.eat('}').is_some() {
                return Some(Value::Object(map));
            }
            let key = match self.peek()? {
                '"' | '\'' => self.quoted_string()?,
                c if is_word_char(c) => self.bare_word(),
                _ => return None,
            };
            self.skip_ws();
            self.eat(':')?;
            let value = self.value()?;
            map.insert(key, value);
            self.skip_ws();
            match self.peek()? {
                ',' => {
                    self.pos += 1;
                }
                '}' => {}
                _ => return None,
            }
        }
    }

    fn array(&mut self) -> Option<Value> {
        self.eat('[')?;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.eat(']').is_some() {
                return Some(Value::Array(items));
            }
            items.push(self.value()?);
            self.skip_ws();
            match self.peek()? {
                ',' => {
                    self.pos += 1;
                }
                ']' => {}
                _ => return None,
            }
        }
    }

    fn quoted_string(&mut self) -> Option<String> {
        let quote = self.bump()?;
        let mut out = String::new();
        loop {
            match self.bump()? {
                c if c == quote => return Some(out),
                '\\' => match self.bump()? {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    other => out.push(other),
                },
                c => out.push(c),
            }
        }
    }

    fn number(&mut self) -> Option<Value> {
        let start = self.pos;
        if matches!(self.peek(), Some('-' | '+')) {
            self.pos += 1;
        }
        let mut is_float = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' => self.pos += 1,
                '.' | 'e' | 'E' => {
                    is_float = true;
                    self.pos += 1;
                }
                '-' | '+' if is_float => self.pos += 1,
                _ => break,
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        if !is_float {
            if let Ok(n) = text.parse::<i64>() {
                return Some(Value::Number(Number::from(n)));
            }
        }
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
    }

    /// A bare word: keyword literals map to their JSON values, anything else
    /// becomes a string (source locations like `N24E63` arrive unquoted).
    fn word(&mut self) -> Value {
        let word = self.bare_word();
        match word.as_str() {
            "true" | "True" => Value::Bool(true),
            "false" | "False" => Value::Bool(false),
            "null" | "None" => Value::Null,
            _ => Value::String(word),
        }
    }

    fn bare_word(&mut self) -> String {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if is_word_char(c)) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}
