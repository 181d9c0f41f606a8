//! Recursive-descent parser producing the intent AST.
//!
//! Grammar:
//! ```text
//! Program     := IntentDecl*
//! IntentDecl  := 'intent' IDENT ObjectBody
//! ObjectBody  := '{' (KeyValue (',')? )* '}'
//! KeyValue    := (IDENT | KEYWORD) ':' Value
//! Value       := Array | ObjectBody | STRING | IDENT
//! Array       := '[' (STRING (',')? )* ']'
//! ```
//!
//! The first unexpected token aborts the parse with a [`ParseError`].
//! Object bodies nest at most [`MAX_NESTING_DEPTH`] deep, the intent body
//! included.

use super::error::ParseError;
use super::lexer::{Token, TokenKind};
use super::types::Value;
use indexmap::IndexMap;
use std::fmt;

/// Deepest allowed object-body nesting.
pub const MAX_NESTING_DEPTH: usize = 64;

/// AST node category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    IntentDeclaration,
    ObjectBody,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IntentDeclaration => write!(f, "IntentDeclaration"),
            Self::ObjectBody => write!(f, "ObjectBody"),
        }
    }
}

/// AST node. An `IntentDeclaration` holds the intent name and a single
/// `ObjectBody` child whose value is the key/value map.
#[derive(Debug, Clone, PartialEq)]
pub struct AstNode {
    pub kind: NodeKind,
    pub value: Value,
    pub children: Vec<AstNode>,
}

impl AstNode {
    /// The object-body map of an intent declaration, if present.
    pub fn body(&self) -> Option<&IndexMap<String, Value>> {
        self.children.iter().find_map(|c| match (&c.kind, &c.value) {
            (NodeKind::ObjectBody, Value::Map(map)) => Some(map),
            _ => None,
        })
    }
}

/// Parse exactly one intent declaration. Trailing tokens are an error.
pub fn parse(tokens: &[Token]) -> Result<AstNode, ParseError> {
    let mut parser = Parser::new(tokens);
    let decl = parser.intent_decl()?;
    if parser.peek().is_some() {
        return Err(parser.unexpected("end of input"));
    }
    Ok(decl)
}

/// Parse zero or more intent declarations.
pub fn parse_program(tokens: &[Token]) -> Result<Vec<AstNode>, ParseError> {
    let mut parser = Parser::new(tokens);
    let mut decls = Vec::new();
    while parser.peek().is_some() {
        decls.push(parser.intent_decl()?);
    }
    Ok(decls)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn consume(&mut self) -> Option<&'a Token> {
        let tok = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(tok)
    }

    fn peek_is(&self, kind: TokenKind, text: &str) -> bool {
        self.peek().is_some_and(|t| t.kind == kind && t.text == text)
    }

    /// Consume the next token if it has `kind` (and `text`, when given).
    fn expect(&mut self, kind: TokenKind, text: Option<&str>) -> Result<&'a Token, ParseError> {
        let matches = self
            .peek()
            .is_some_and(|t| t.kind == kind && text.is_none_or(|v| t.text == v));
        if !matches {
            let expected = match text {
                Some(v) => format!("'{}'", v),
                None => kind.to_string(),
            };
            return Err(self.unexpected(&expected));
        }
        self.consume().ok_or_else(|| self.unexpected(&kind.to_string()))
    }

    /// Error positioned at the next token, or after the last one at EOF.
    fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(tok) => ParseError {
                line: tok.line,
                column: tok.column,
                expected: expected.to_string(),
                found: tok.to_string(),
            },
            None => {
                let (line, column) = self
                    .tokens
                    .last()
                    .map(|t| (t.end_line, t.end_column))
                    .unwrap_or((1, 1));
                ParseError {
                    line,
                    column,
                    expected: expected.to_string(),
                    found: "end of input".to_string(),
                }
            }
        }
    }

    fn intent_decl(&mut self) -> Result<AstNode, ParseError> {
        self.expect(TokenKind::Keyword, Some("intent"))?;
        let name = self.expect(TokenKind::Identifier, None)?.text.clone();
        let body = self.object_body()?;
        Ok(AstNode {
            kind: NodeKind::IntentDeclaration,
            value: Value::Str(name),
            children: vec![AstNode {
                kind: NodeKind::ObjectBody,
                value: Value::Map(body),
                children: Vec::new(),
            }],
        })
    }

    fn object_body(&mut self) -> Result<IndexMap<String, Value>, ParseError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.unexpected(&format!("nesting depth <= {}", MAX_NESTING_DEPTH)));
        }
        self.depth += 1;
        let body = self.object_entries();
        self.depth -= 1;
        body
    }

    fn object_entries(&mut self) -> Result<IndexMap<String, Value>, ParseError> {
        self.expect(TokenKind::Brace, Some("{"))?;
        let mut map = IndexMap::new();
        loop {
            if self.peek_is(TokenKind::Brace, "}") {
                self.consume();
                return Ok(map);
            }
            if self.peek().is_none() {
                return Err(self.unexpected("'}'"));
            }
            let (key, value) = self.key_value()?;
            if map.insert(key.clone(), value).is_some() {
                tracing::debug!(key = %key, "duplicate key, last value wins");
            }
            if self.peek_is(TokenKind::Comma, ",") {
                self.consume();
            }
        }
    }

    fn key_value(&mut self) -> Result<(String, Value), ParseError> {
        let key = match self.peek() {
            Some(t) if matches!(t.kind, TokenKind::Identifier | TokenKind::Keyword) => {
                t.text.clone()
            }
            _ => return Err(self.unexpected("key")),
        };
        self.consume();
        self.expect(TokenKind::Colon, Some(":"))?;
        let value = self.value()?;
        Ok((key, value))
    }

    fn value(&mut self) -> Result<Value, ParseError> {
        let Some(tok) = self.peek() else {
            return Err(self.unexpected("value"));
        };
        match (tok.kind, tok.text.as_str()) {
            (TokenKind::ArrayBracket, "[") => self.array().map(Value::List),
            (TokenKind::Brace, "{") => self.object_body().map(Value::Map),
            (TokenKind::String, _) | (TokenKind::Identifier, _) => {
                self.consume();
                Ok(Value::Str(tok.text.clone()))
            }
            _ => Err(self.unexpected("value")),
        }
    }

    fn array(&mut self) -> Result<Vec<String>, ParseError> {
        self.expect(TokenKind::ArrayBracket, Some("["))?;
        let mut items = Vec::new();
        loop {
            match self.peek() {
                Some(t) if t.kind == TokenKind::ArrayBracket && t.text == "]" => {
                    self.consume();
                    return Ok(items);
                }
                Some(t) if t.kind == TokenKind::String => {
                    items.push(t.text.clone());
                    self.consume();
                }
                _ => return Err(self.unexpected("string or ']'")),
            }
            if self.peek_is(TokenKind::Comma, ",") {
                self.consume();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lexer::tokenize;

    fn parse_src(src: &str) -> Result<AstNode, ParseError> {
        parse(&tokenize(src).unwrap())
    }

    const CANONICAL: &str = r#"
intent build_crud {
  goal: "Create a simple product catalog API",
  capabilities: ["create products", "read products", "update products", "delete products"],
  constraints: ["validate input data", "require authentication"]
}
"#;

    #[test]
    fn test_parser_canonical() {
        let ast = parse_src(CANONICAL).unwrap();
        assert_eq!(ast.kind, NodeKind::IntentDeclaration);
        assert_eq!(ast.value, Value::Str("build_crud".into()));
        assert_eq!(ast.children.len(), 1);
        let body = ast.body().unwrap();
        assert_eq!(
            body["goal"],
            Value::Str("Create a simple product catalog API".into())
        );
        match &body["capabilities"] {
            Value::List(items) => assert_eq!(items.len(), 4),
            other => panic!("expected list, got {:?}", other),
        }
        let keys: Vec<&str> = body.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["goal", "capabilities", "constraints"]);
    }

    #[test]
    fn test_parser_commas_optional() {
        let ast = parse_src("intent x { goal: \"g\" capabilities: [\"a\" \"b\"] }").unwrap();
        let body = ast.body().unwrap();
        assert_eq!(body["capabilities"], Value::List(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn test_parser_nested_object_and_ident_value() {
        let src = r#"intent svc {
  architecture: { style: microservices, storage: { engine: "postgres" } }
}"#;
        let ast = parse_src(src).unwrap();
        let arch = match &ast.body().unwrap()["architecture"] {
            Value::Map(m) => m.clone(),
            other => panic!("expected map, got {:?}", other),
        };
        assert_eq!(arch["style"], Value::Str("microservices".into()));
        match &arch["storage"] {
            Value::Map(inner) => assert_eq!(inner["engine"], Value::Str("postgres".into())),
            other => panic!("expected nested map, got {:?}", other),
        }
    }

    #[test]
    fn test_parser_empty_body() {
        let ast = parse_src("intent empty {}").unwrap();
        assert!(ast.body().unwrap().is_empty());
    }

    #[test]
    fn test_parser_duplicate_key_last_wins() {
        let ast = parse_src("intent x { goal: \"a\", constraints: [], goal: \"b\" }").unwrap();
        let body = ast.body().unwrap();
        assert_eq!(body["goal"], Value::Str("b".into()));
        assert_eq!(body.get_index(0).map(|(k, _)| k.as_str()), Some("goal"));
    }

    #[test]
    fn test_parser_missing_intent_keyword() {
        let err = parse_src("build { }").unwrap_err();
        assert_eq!(err.expected, "'intent'");
        assert_eq!(err.found, "identifier 'build'");
        assert_eq!((err.line, err.column), (1, 1));
    }

    #[test]
    fn test_parser_missing_colon() {
        let err = parse_src("intent x {\n  goal \"g\"\n}").unwrap_err();
        assert_eq!(err.expected, "':'");
        assert_eq!((err.line, err.column), (2, 8));
    }

    #[test]
    fn test_parser_array_rejects_identifiers() {
        let err = parse_src("intent x { capabilities: [read] }").unwrap_err();
        assert_eq!(err.expected, "string or ']'");
        assert_eq!(err.found, "identifier 'read'");
    }

    #[test]
    fn test_parser_unclosed_body_at_eof() {
        let err = parse_src("intent x { goal: \"g\"").unwrap_err();
        assert_eq!(err.found, "end of input");
        assert_eq!(err.expected, "'}'");
    }

    #[test]
    fn test_parser_keyword_not_allowed_as_name() {
        let err = parse_src("intent goal {}").unwrap_err();
        assert_eq!(err.expected, "identifier");
    }

    #[test]
    fn test_parser_trailing_tokens_rejected() {
        let err = parse_src("intent a {} intent b {}").unwrap_err();
        assert_eq!(err.expected, "end of input");
    }

    #[test]
    fn test_parser_program_multiple() {
        let tokens = tokenize("intent a {}\n# second\nintent b { goal: \"g\" }").unwrap();
        let decls = parse_program(&tokens).unwrap();
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[1].value, Value::Str("b".into()));
    }

    #[test]
    fn test_parser_eof_column_after_closing_quote() {
        let err = parse_src("intent x { goal: \"a\\\"b\"").unwrap_err();
        assert_eq!(err.found, "end of input");
        // `"a\"b"` spans columns 18..=23
        assert_eq!((err.line, err.column), (1, 24));
    }

    fn nested_architecture(levels: usize) -> String {
        format!(
            "intent deep {{ goal: \"g\", capabilities: [\"x\"], architecture: {}leaf{} }}",
            "{ a: ".repeat(levels),
            " }".repeat(levels)
        )
    }

    #[test]
    fn test_parser_nesting_limit() {
        // intent body plus 63 nested blocks is exactly the limit
        parse_src(&nested_architecture(MAX_NESTING_DEPTH - 1)).unwrap();

        let err = parse_src(&nested_architecture(MAX_NESTING_DEPTH)).unwrap_err();
        assert_eq!(err.expected, "nesting depth <= 64");
        assert_eq!(err.found, "'{'");
    }

    #[test]
    fn test_parser_deep_nesting_is_an_error_not_a_crash() {
        let err = parse_src(&nested_architecture(200_000)).unwrap_err();
        assert!(err.expected.starts_with("nesting depth"));
    }

    #[test]
    fn test_parser_empty_input() {
        let err = parse(&[]).unwrap_err();
        assert_eq!((err.line, err.column), (1, 1));
        assert!(parse_program(&[]).unwrap().is_empty());
    }
}
