#![forbid(unsafe_code)]

//! Tokenizer for the stylesheet syntax.

/// A lexical token.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Token {
    Ident(String),
    /// Identifier immediately followed by `(`; the paren is consumed.
    Function(String),
    /// `#` followed by name characters.
    Hash(String),
    String(String),
    Number(f64),
    Percentage(f64),
    Dimension { value: f64, unit: String },
    Whitespace,
    Colon,
    Semicolon,
    Comma,
    RParen,
    LBrace,
    RBrace,
    Delim(char),
}

/// A token and the 1-based line it starts on.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub line: usize,
}

pub(crate) struct Tokenizer {
    input: Vec<char>,
    pos: usize,
    line: usize,
}

impl Tokenizer {
    pub(crate) fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
            line: 1,
        }
    }

    pub(crate) fn tokenize_all(mut self) -> Vec<Spanned> {
        let mut tokens = Vec::new();
        while let Some(tok) = self.next_token() {
            tokens.push(tok);
        }
        tokens
    }

    fn next_token(&mut self) -> Option<Spanned> {
        self.consume_comments();
        let ch = self.peek()?;
        let line = self.line;

        let token = if is_whitespace(ch) {
            while self.peek().is_some_and(is_whitespace) {
                self.advance();
            }
            // A comment between two whitespace runs still separates terms once.
            self.consume_comments();
            while self.peek().is_some_and(is_whitespace) {
                self.advance();
            }
            Token::Whitespace
        } else if ch == '"' || ch == '\'' {
            self.consume_string(ch)
        } else if ch == '#' {
            self.advance();
            if self.peek().is_some_and(is_name_char) {
                Token::Hash(self.consume_name())
            } else {
                Token::Delim('#')
            }
        } else if self.starts_number() {
            self.consume_numeric()
        } else if self.starts_ident() {
            let name = self.consume_name();
            if self.peek() == Some('(') {
                self.advance();
                Token::Function(name)
            } else {
                Token::Ident(name)
            }
        } else {
            self.advance();
            match ch {
                ':' => Token::Colon,
                ';' => Token::Semicolon,
                ',' => Token::Comma,
                ')' => Token::RParen,
                '{' => Token::LBrace,
                '}' => Token::RBrace,
                other => Token::Delim(other),
            }
        };
        Some(Spanned { token, line })
    }

    // --- Helper methods ---

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
        }
        Some(ch)
    }

    fn consume_comments(&mut self) {
        while self.peek() == Some('/') && self.peek_at(1) == Some('*') {
            self.advance();
            self.advance();
            loop {
                match self.advance() {
                    None => return,
                    Some('*') if self.peek() == Some('/') => {
                        self.advance();
                        break;
                    }
                    Some(_) => {}
                }
            }
        }
    }

    fn consume_string(&mut self, quote: char) -> Token {
        self.advance();
        let mut value = String::new();
        while let Some(ch) = self.advance() {
            match ch {
                c if c == quote => break,
                '\\' => {
                    if let Some(escaped) = self.advance() {
                        value.push(escaped);
                    }
                }
                c => value.push(c),
            }
        }
        Token::String(value)
    }

    fn starts_number(&self) -> bool {
        let digit_at = |i: usize| self.peek_at(i).is_some_and(|c| c.is_ascii_digit());
        match self.peek() {
            Some(c) if c.is_ascii_digit() => true,
            Some('.') => digit_at(1),
            Some('+' | '-') => digit_at(1) || (self.peek_at(1) == Some('.') && digit_at(2)),
            _ => false,
        }
    }

    fn starts_ident(&self) -> bool {
        match self.peek() {
            Some('-') => self
                .peek_at(1)
                .is_some_and(|c| c == '-' || is_name_start_char(c)),
            Some(c) => is_name_start_char(c),
            None => false,
        }
    }

    fn consume_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if !is_name_char(ch) {
                break;
            }
            name.push(ch);
            self.advance();
        }
        name
    }

    fn consume_numeric(&mut self) -> Token {
        let value = self.consume_number();
        if self.peek() == Some('%') {
            self.advance();
            return Token::Percentage(value);
        }
        if self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            let unit = self.consume_name();
            return Token::Dimension { value, unit };
        }
        Token::Number(value)
    }

    fn consume_number(&mut self) -> f64 {
        let mut repr = String::new();
        if let Some(sign @ ('+' | '-')) = self.peek() {
            repr.push(sign);
            self.advance();
        }
        while let Some(d) = self.peek().filter(char::is_ascii_digit) {
            repr.push(d);
            self.advance();
        }
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            repr.push('.');
            self.advance();
            while let Some(d) = self.peek().filter(char::is_ascii_digit) {
                repr.push(d);
                self.advance();
            }
        }
        // Digits were checked above, so this only fails on a bare sign.
        repr.parse::<f64>().unwrap_or(0.0)
    }
}

fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r' | '\x0C')
}

fn is_name_start_char(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || !ch.is_ascii()
}

fn is_name_char(ch: char) -> bool {
    is_name_start_char(ch) || ch.is_ascii_digit() || ch == '-'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        Tokenizer::new(input)
            .tokenize_all()
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn basic_tokens() {
        assert_eq!(
            tokens(".button:hover { -fx-opacity: 0.5; }"),
            vec![
                Token::Delim('.'),
                Token::Ident("button".into()),
                Token::Colon,
                Token::Ident("hover".into()),
                Token::Whitespace,
                Token::LBrace,
                Token::Whitespace,
                Token::Ident("-fx-opacity".into()),
                Token::Colon,
                Token::Whitespace,
                Token::Number(0.5),
                Token::Semicolon,
                Token::Whitespace,
                Token::RBrace,
            ]
        );
    }

    #[test]
    fn numbers_and_dimensions() {
        assert_eq!(
            tokens("12px -1.5em 50% .25 +3"),
            vec![
                Token::Dimension { value: 12.0, unit: "px".into() },
                Token::Whitespace,
                Token::Dimension { value: -1.5, unit: "em".into() },
                Token::Whitespace,
                Token::Percentage(50.0),
                Token::Whitespace,
                Token::Number(0.25),
                Token::Whitespace,
                Token::Number(3.0),
            ]
        );
    }

    #[test]
    fn hashes_strings_functions() {
        assert_eq!(
            tokens("#fff 'a\\'b' rgb("),
            vec![
                Token::Hash("fff".into()),
                Token::Whitespace,
                Token::String("a'b".into()),
                Token::Whitespace,
                Token::Function("rgb".into()),
            ]
        );
    }

    #[test]
    fn comments_skipped_and_lines_tracked() {
        let spanned = Tokenizer::new("/* a\nb */ x\n\ny").tokenize_all();
        let idents: Vec<(String, usize)> = spanned
            .into_iter()
            .filter_map(|s| match s.token {
                Token::Ident(name) => Some((name, s.line)),
                _ => None,
            })
            .collect();
        assert_eq!(idents, vec![("x".into(), 2), ("y".into(), 4)]);
    }

    #[test]
    fn unterminated_comment_ends_input() {
        assert_eq!(tokens("a /* never closed"), vec![Token::Ident("a".into()), Token::Whitespace]);
    }
}
