//! Hand-written lexer for intent source text.
//!
//! Scans left to right tracking 1-based line/column. Whitespace is skipped,
//! `#` starts a comment running to the end of the line, quoted spans become
//! string tokens (`\` escapes the next character literally), and identifier
//! runs are upgraded to keywords when they match [`KEYWORDS`].
//!
//! [`tokenize`] is strict: stray characters and unterminated strings are a
//! [`LexError`]. [`tokenize_lenient`] drops stray characters and lets an
//! unterminated string run to end of input.

use super::error::LexError;
use std::fmt;

/// Reserved words.
pub const KEYWORDS: &[&str] = &[
    "intent",
    "goal",
    "capabilities",
    "constraints",
    "architecture",
    "success_criteria",
];

/// Token category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,
    Identifier,
    String,
    ArrayBracket,
    Brace,
    Colon,
    Comma,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyword => write!(f, "keyword"),
            Self::Identifier => write!(f, "identifier"),
            Self::String => write!(f, "string"),
            Self::ArrayBracket => write!(f, "bracket"),
            Self::Brace => write!(f, "brace"),
            Self::Colon => write!(f, "colon"),
            Self::Comma => write!(f, "comma"),
        }
    }
}

/// A lexical token. For strings, `text` is the unescaped content.
///
/// `line`/`column` mark the first source character; `end_line`/`end_column`
/// mark the position just past the last one, quotes and escapes included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::String => write!(f, "string \"{}\"", self.text),
            TokenKind::Keyword | TokenKind::Identifier => write!(f, "{} '{}'", self.kind, self.text),
            _ => write!(f, "'{}'", self.text),
        }
    }
}

/// Tokenize strictly.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(source);
    lexer.scan();
    match lexer.errors.into_iter().next() {
        Some(e) => Err(e),
        None => Ok(lexer.tokens),
    }
}

/// Tokenize without failing. Problems are logged and skipped.
pub fn tokenize_lenient(source: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(source);
    lexer.scan();
    for e in &lexer.errors {
        tracing::warn!(error = %e, "lenient lexer skipped input");
    }
    lexer.tokens
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
    errors: Vec<LexError>,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Push a token that ends at the current position.
    fn push(&mut self, kind: TokenKind, text: String, line: usize, column: usize) {
        self.tokens.push(Token {
            kind,
            text,
            line,
            column,
            end_line: self.line,
            end_column: self.column,
        });
    }

    fn scan(&mut self) {
        while let Some(c) = self.peek() {
            let (line, column) = (self.line, self.column);
            match c {
                c if c.is_whitespace() => {
                    self.advance();
                }
                '#' => self.skip_comment(),
                '{' | '}' => {
                    self.advance();
                    self.push(TokenKind::Brace, c.to_string(), line, column);
                }
                '[' | ']' => {
                    self.advance();
                    self.push(TokenKind::ArrayBracket, c.to_string(), line, column);
                }
                ':' => {
                    self.advance();
                    self.push(TokenKind::Colon, c.to_string(), line, column);
                }
                ',' => {
                    self.advance();
                    self.push(TokenKind::Comma, c.to_string(), line, column);
                }
                '"' | '\'' => self.scan_string(c, line, column),
                c if c.is_ascii_alphabetic() || c == '_' => self.scan_word(line, column),
                other => {
                    self.advance();
                    self.errors.push(LexError::UnexpectedChar {
                        ch: other,
                        line,
                        column,
                    });
                }
            }
        }
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn scan_string(&mut self, quote: char, line: usize, column: usize) {
        self.advance();
        let mut text = String::new();
        loop {
            match self.advance() {
                None => {
                    self.errors
                        .push(LexError::UnterminatedString { line, column });
                    break;
                }
                Some('\\') => match self.advance() {
                    Some(escaped) => text.push(escaped),
                    None => {
                        self.errors
                            .push(LexError::UnterminatedString { line, column });
                        break;
                    }
                },
                Some(c) if c == quote => break,
                Some(c) => text.push(c),
            }
        }
        self.push(TokenKind::String, text, line, column);
    }

    fn scan_word(&mut self, line: usize, column: usize) {
        let mut word = String::new();
        while let Some(c) = self.peek() {
            if !(c.is_ascii_alphanumeric() || c == '_') {
                break;
            }
            word.push(c);
            self.advance();
        }
        let kind = if KEYWORDS.contains(&word.as_str()) {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        };
        self.push(kind, word, line, column);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_lexer_header() {
        let tokens = tokenize("intent build_crud {").unwrap();
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Keyword, TokenKind::Identifier, TokenKind::Brace]
        );
        assert_eq!(tokens[1].text, "build_crud");
        assert_eq!((tokens[2].line, tokens[2].column), (1, 19));
    }

    #[test]
    fn test_lexer_keywords_exact_match_only() {
        let tokens = tokenize("goal goals Goal success_criteria").unwrap();
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Keyword,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Keyword
            ]
        );
    }

    #[test]
    fn test_lexer_punctuation() {
        let tokens = tokenize("{ key: [\"a\", 'b'] }").unwrap();
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Brace,
                TokenKind::Identifier,
                TokenKind::Colon,
                TokenKind::ArrayBracket,
                TokenKind::String,
                TokenKind::Comma,
                TokenKind::String,
                TokenKind::ArrayBracket,
                TokenKind::Brace,
            ]
        );
        assert_eq!(tokens[6].text, "b");
    }

    #[test]
    fn test_lexer_tracks_lines_and_columns() {
        let tokens = tokenize("intent x {\n  goal: \"g\"\n}").unwrap();
        let goal = &tokens[3];
        assert_eq!(goal.text, "goal");
        assert_eq!((goal.line, goal.column), (2, 3));
        let close = tokens.last().unwrap();
        assert_eq!((close.line, close.column), (3, 1));
    }

    #[test]
    fn test_lexer_comments_skipped() {
        let src = "# leading comment\nintent x { # trailing\n}";
        let tokens = tokenize(src).unwrap();
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[0].line, 2);
    }

    #[test]
    fn test_lexer_escape_is_literal() {
        let tokens = tokenize(r#""say \"hi\" \n""#).unwrap();
        assert_eq!(tokens.len(), 1);
        // `\n` is not a newline escape, just a literal `n`
        assert_eq!(tokens[0].text, "say \"hi\" n");
    }

    #[test]
    fn test_lexer_multiline_string_advances_line() {
        let tokens = tokenize("\"a\nb\" x").unwrap();
        assert_eq!(tokens[0].text, "a\nb");
        assert_eq!((tokens[1].line, tokens[1].column), (2, 4));
    }

    #[test]
    fn test_lexer_strict_rejects_stray_char() {
        let err = tokenize("intent x { goal: @ }").unwrap_err();
        assert_eq!(
            err,
            LexError::UnexpectedChar {
                ch: '@',
                line: 1,
                column: 18
            }
        );
    }

    #[test]
    fn test_lexer_strict_rejects_digits() {
        assert!(matches!(
            tokenize("timeout: 30"),
            Err(LexError::UnexpectedChar { ch: '3', .. })
        ));
    }

    #[test]
    fn test_lexer_unterminated_string() {
        let err = tokenize("goal: \"never closed").unwrap_err();
        assert_eq!(err, LexError::UnterminatedString { line: 1, column: 7 });
    }

    #[test]
    fn test_lexer_lenient_drops_stray_chars() {
        let tokens = tokenize_lenient("intent x { goal: @ \"g\" ; }");
        assert_eq!(tokens.len(), 7);
        assert!(tokens.iter().all(|t| t.text != "@" && t.text != ";"));
    }

    #[test]
    fn test_lexer_lenient_unterminated_runs_to_end() {
        let tokens = tokenize_lenient("'open");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "open");
    }

    #[test]
    fn test_lexer_end_position_covers_quotes_and_escapes() {
        let tokens = tokenize(r#"goal: "a\"b""#).unwrap();
        let s = &tokens[2];
        assert_eq!(s.text, "a\"b");
        assert_eq!((s.column, s.end_column), (7, 13));
        assert_eq!((tokens[0].end_line, tokens[0].end_column), (1, 5));

        let multi = tokenize("'a\nb'").unwrap();
        assert_eq!((multi[0].end_line, multi[0].end_column), (2, 4));
    }

    #[test]
    fn test_lexer_empty_input() {
        assert!(tokenize("").unwrap().is_empty());
        assert!(tokenize("   \n\t# only a comment").unwrap().is_empty());
    }

    #[test]
    fn test_lexer_token_display() {
        let tokens = tokenize("goal \"x\" :").unwrap();
        assert_eq!(tokens[0].to_string(), "keyword 'goal'");
        assert_eq!(tokens[1].to_string(), "string \"x\"");
        assert_eq!(tokens[2].to_string(), "':'");
    }
}
