//! `Key=Value;` connection string parsing and building.

use std::fmt;

use crate::connectors::types::BindError;

/// Ordered keyword/value pairs of a connection string.
///
/// Keywords keep the position they were first set at; setting an existing
/// keyword replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionStringBuilder {
    pairs: Vec<(String, String)>,
}

impl ConnectionStringBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `text`, mapping each keyword through `canonical`.
    ///
    /// Values may be wrapped in single or double quotes; a doubled quote
    /// inside a quoted value is a literal quote.
    pub fn parse(text: &str, canonical: impl Fn(&str) -> String) -> Result<Self, BindError> {
        let mut builder = Self::new();
        let mut rest = text;

        loop {
            rest = rest.trim_start_matches(|c: char| c == ';' || c.is_whitespace());
            if rest.is_empty() {
                break;
            }
            let eq = match rest.find(['=', ';']) {
                Some(i) if rest[i..].starts_with('=') => i,
                _ => {
                    return Err(BindError::invalid(
                        "connection_string",
                        format!("expected `key=value` near `{rest}`"),
                    ))
                }
            };
            let key = rest[..eq].trim();
            if key.is_empty() {
                return Err(BindError::invalid("connection_string", "empty keyword"));
            }
            let (value, remaining) = read_value(rest[eq + 1..].trim_start())?;
            builder.set(canonical(key), value);
            rest = remaining;
        }
        Ok(builder)
    }

    /// Set `keyword` to `value`.
    pub fn set(&mut self, keyword: impl Into<String>, value: impl Into<String>) {
        let keyword = keyword.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == keyword) {
            Some((_, existing)) => *existing = value,
            None => self.pairs.push((keyword, value)),
        }
    }

    pub fn get(&self, keyword: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == keyword)
            .map(|(_, v)| v.as_str())
    }

    pub fn remove(&mut self, keyword: &str) -> Option<String> {
        let index = self.pairs.iter().position(|(k, _)| k == keyword)?;
        Some(self.pairs.remove(index).1)
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn read_value(input: &str) -> Result<(String, &str), BindError> {
    let quote = match input.chars().next() {
        Some(q @ ('\'' | '"')) => q,
        _ => {
            let end = input.find(';').unwrap_or(input.len());
            return Ok((input[..end].trim().to_string(), &input[end..]));
        }
    };

    let mut value = String::new();
    let mut chars = input[1..].char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c != quote {
            value.push(c);
            continue;
        }
        if chars.peek().is_some_and(|&(_, next)| next == quote) {
            chars.next();
            value.push(quote);
            continue;
        }
        // Closing quote: 1 for the opening quote, then the closing one.
        let after = &input[1 + i + c.len_utf8()..];
        let after = after.trim_start();
        if !(after.is_empty() || after.starts_with(';')) {
            return Err(BindError::invalid(
                "connection_string",
                "unexpected text after quoted value",
            ));
        }
        return Ok((value, after));
    }
    Err(BindError::invalid("connection_string", "unterminated quoted value"))
}

fn needs_quoting(value: &str) -> bool {
    value.contains([';', '\'', '"'])
        || value.starts_with(char::is_whitespace)
        || value.ends_with(char::is_whitespace)
}

impl fmt::Display for ConnectionStringBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.pairs.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            if needs_quoting(value) {
                write!(f, "{key}='{}'", value.replace('\'', "''"))?;
            } else {
                write!(f, "{key}={value}")?;
            }
        }
        Ok(())
    }
}
