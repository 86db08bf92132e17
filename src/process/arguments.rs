//! Argument lists handed to the spawned executable.

use std::fmt;

/// Ordered argument tokens for one invocation.
///
/// Tokens are passed to the OS as a vector; no shell ever sees them. A
/// pre-joined string (the form command builders usually produce) is
/// tokenized by [`Arguments::parse`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arguments {
    tokens: Vec<String>,
}

impl Arguments {
    /// Create an empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokenize a pre-joined argument string.
    ///
    /// Whitespace separates tokens. Double quotes group text into one token
    /// and are removed. Inside or outside quotes, `\"` and `\\` escape the
    /// following character; any other backslash is literal. `""` produces
    /// an empty token.
    pub fn parse(line: &str) -> Self {
        let mut tokens = Vec::new();
        let mut current = String::new();
        let mut in_token = false;
        let mut quoted = false;
        let mut chars = line.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '\\' if matches!(chars.peek(), Some('"') | Some('\\')) => {
                    if let Some(escaped) = chars.next() {
                        current.push(escaped);
                    }
                    in_token = true;
                }
                '"' => {
                    quoted = !quoted;
                    in_token = true;
                }
                c if c.is_whitespace() && !quoted => {
                    if in_token {
                        tokens.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                }
                c => {
                    current.push(c);
                    in_token = true;
                }
            }
        }

        if in_token {
            tokens.push(current);
        }

        Self { tokens }
    }

    /// Append one token.
    pub fn push(&mut self, token: impl Into<String>) {
        self.tokens.push(token.into());
    }

    /// Builder-style variant of [`push`](Self::push).
    pub fn arg(mut self, token: impl Into<String>) -> Self {
        self.push(token);
        self
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Check if there are no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Iterate over the tokens in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    /// Borrow the tokens as a slice.
    pub fn as_slice(&self) -> &[String] {
        &self.tokens
    }
}

fn needs_quoting(token: &str) -> bool {
    token.is_empty() || token.chars().any(|c| c.is_whitespace() || c == '"')
}

impl fmt::Display for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            if needs_quoting(token) {
                let escaped = token.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "\"{}\"", escaped)?;
            } else {
                f.write_str(token)?;
            }
        }
        Ok(())
    }
}

impl From<&str> for Arguments {
    fn from(line: &str) -> Self {
        Self::parse(line)
    }
}

impl From<String> for Arguments {
    fn from(line: String) -> Self {
        Self::parse(&line)
    }
}

impl From<&String> for Arguments {
    fn from(line: &String) -> Self {
        Self::parse(line)
    }
}

impl From<Vec<String>> for Arguments {
    fn from(tokens: Vec<String>) -> Self {
        Self { tokens }
    }
}

impl<const N: usize> From<[&str; N]> for Arguments {
    fn from(tokens: [&str; N]) -> Self {
        tokens.into_iter().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for Arguments {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Arguments {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}
