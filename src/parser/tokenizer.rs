//! SQL tokenization
//!
//! Implements a total, single-pass tokenizer for SQL text following
//! SQLite's rules: keywords, identifiers (bare and quoted), numeric,
//! string and blob literals, bound variables, operators, and comments.
//! The tokenizer never fails; bytes it cannot place become `Illegal`
//! tokens which the parser surfaces as errors with their position.

use std::collections::HashMap;

use lazy_static::lazy_static;

// ============================================================================
// Token Types
// ============================================================================

/// Token kind enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Special
    Eof,
    Illegal,

    // Skippable
    Whitespace,
    Comment,

    // Literals
    Integer,
    Float,
    String,
    Blob,

    // Identifiers and bound variables
    Identifier,
    Variable,

    // Keywords (alphabetical)
    Abort,
    All,
    Always,
    And,
    As,
    Asc,
    Autoincrement,
    Begin,
    Between,
    By,
    Case,
    Cast,
    Check,
    Collate,
    Commit,
    Constraint,
    Create,
    Cross,
    CurrentDate,
    CurrentTime,
    CurrentTimestamp,
    Default,
    Deferred,
    Delete,
    Desc,
    Distinct,
    Drop,
    Else,
    End,
    Escape,
    Except,
    Exclusive,
    Exists,
    Explain,
    Fail,
    Filter,
    Foreign,
    From,
    Full,
    Generated,
    Glob,
    Group,
    Having,
    If,
    Ignore,
    Immediate,
    In,
    Index,
    Inner,
    Insert,
    Intersect,
    Into,
    Is,
    Isnull,
    Join,
    Key,
    Left,
    Like,
    Limit,
    Match,
    Natural,
    Not,
    Notnull,
    Null,
    Offset,
    On,
    Or,
    Order,
    Outer,
    Plan,
    Primary,
    Query,
    References,
    Regexp,
    Replace,
    Right,
    Rollback,
    Select,
    Set,
    Stored,
    Table,
    Temp,
    Temporary,
    Then,
    Transaction,
    Union,
    Unique,
    Update,
    Using,
    Values,
    Virtual,
    When,
    Where,
    Without,

    // Operators
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    Percent,    // %
    Eq,         // =
    EqEq,       // ==
    Ne,         // <>
    BangEq,     // !=
    Lt,         // <
    Le,         // <=
    Gt,         // >
    Ge,         // >=
    Ampersand,  // &
    Pipe,       // |
    DoublePipe, // ||
    LtLt,       // <<
    GtGt,       // >>
    Tilde,      // ~
    Arrow,      // ->
    ArrowArrow, // ->>

    // Punctuation
    LParen,    // (
    RParen,    // )
    Comma,     // ,
    Semicolon, // ;
    Dot,       // .
}

impl TokenKind {
    /// Whitespace and comments are yielded but filtered by higher layers
    pub fn is_skippable(&self) -> bool {
        matches!(self, TokenKind::Whitespace | TokenKind::Comment)
    }

    /// Check if this token is a keyword
    pub fn is_keyword(&self) -> bool {
        KEYWORDS.values().any(|k| k == self)
    }
}

lazy_static! {
    /// The closed keyword table, keyed by uppercase spelling
    static ref KEYWORDS: HashMap<&'static str, TokenKind> = {
        let mut m = HashMap::new();
        m.insert("ABORT", TokenKind::Abort);
        m.insert("ALL", TokenKind::All);
        m.insert("ALWAYS", TokenKind::Always);
        m.insert("AND", TokenKind::And);
        m.insert("AS", TokenKind::As);
        m.insert("ASC", TokenKind::Asc);
        m.insert("AUTOINCREMENT", TokenKind::Autoincrement);
        m.insert("BEGIN", TokenKind::Begin);
        m.insert("BETWEEN", TokenKind::Between);
        m.insert("BY", TokenKind::By);
        m.insert("CASE", TokenKind::Case);
        m.insert("CAST", TokenKind::Cast);
        m.insert("CHECK", TokenKind::Check);
        m.insert("COLLATE", TokenKind::Collate);
        m.insert("COMMIT", TokenKind::Commit);
        m.insert("CONSTRAINT", TokenKind::Constraint);
        m.insert("CREATE", TokenKind::Create);
        m.insert("CROSS", TokenKind::Cross);
        m.insert("CURRENT_DATE", TokenKind::CurrentDate);
        m.insert("CURRENT_TIME", TokenKind::CurrentTime);
        m.insert("CURRENT_TIMESTAMP", TokenKind::CurrentTimestamp);
        m.insert("DEFAULT", TokenKind::Default);
        m.insert("DEFERRED", TokenKind::Deferred);
        m.insert("DELETE", TokenKind::Delete);
        m.insert("DESC", TokenKind::Desc);
        m.insert("DISTINCT", TokenKind::Distinct);
        m.insert("DROP", TokenKind::Drop);
        m.insert("ELSE", TokenKind::Else);
        m.insert("END", TokenKind::End);
        m.insert("ESCAPE", TokenKind::Escape);
        m.insert("EXCEPT", TokenKind::Except);
        m.insert("EXCLUSIVE", TokenKind::Exclusive);
        m.insert("EXISTS", TokenKind::Exists);
        m.insert("EXPLAIN", TokenKind::Explain);
        m.insert("FAIL", TokenKind::Fail);
        m.insert("FILTER", TokenKind::Filter);
        m.insert("FOREIGN", TokenKind::Foreign);
        m.insert("FROM", TokenKind::From);
        m.insert("FULL", TokenKind::Full);
        m.insert("GENERATED", TokenKind::Generated);
        m.insert("GLOB", TokenKind::Glob);
        m.insert("GROUP", TokenKind::Group);
        m.insert("HAVING", TokenKind::Having);
        m.insert("IF", TokenKind::If);
        m.insert("IGNORE", TokenKind::Ignore);
        m.insert("IMMEDIATE", TokenKind::Immediate);
        m.insert("IN", TokenKind::In);
        m.insert("INDEX", TokenKind::Index);
        m.insert("INNER", TokenKind::Inner);
        m.insert("INSERT", TokenKind::Insert);
        m.insert("INTERSECT", TokenKind::Intersect);
        m.insert("INTO", TokenKind::Into);
        m.insert("IS", TokenKind::Is);
        m.insert("ISNULL", TokenKind::Isnull);
        m.insert("JOIN", TokenKind::Join);
        m.insert("KEY", TokenKind::Key);
        m.insert("LEFT", TokenKind::Left);
        m.insert("LIKE", TokenKind::Like);
        m.insert("LIMIT", TokenKind::Limit);
        m.insert("MATCH", TokenKind::Match);
        m.insert("NATURAL", TokenKind::Natural);
        m.insert("NOT", TokenKind::Not);
        m.insert("NOTNULL", TokenKind::Notnull);
        m.insert("NULL", TokenKind::Null);
        m.insert("OFFSET", TokenKind::Offset);
        m.insert("ON", TokenKind::On);
        m.insert("OR", TokenKind::Or);
        m.insert("ORDER", TokenKind::Order);
        m.insert("OUTER", TokenKind::Outer);
        m.insert("PLAN", TokenKind::Plan);
        m.insert("PRIMARY", TokenKind::Primary);
        m.insert("QUERY", TokenKind::Query);
        m.insert("REFERENCES", TokenKind::References);
        m.insert("REGEXP", TokenKind::Regexp);
        m.insert("REPLACE", TokenKind::Replace);
        m.insert("RIGHT", TokenKind::Right);
        m.insert("ROLLBACK", TokenKind::Rollback);
        m.insert("SELECT", TokenKind::Select);
        m.insert("SET", TokenKind::Set);
        m.insert("STORED", TokenKind::Stored);
        m.insert("TABLE", TokenKind::Table);
        m.insert("TEMP", TokenKind::Temp);
        m.insert("TEMPORARY", TokenKind::Temporary);
        m.insert("THEN", TokenKind::Then);
        m.insert("TRANSACTION", TokenKind::Transaction);
        m.insert("UNION", TokenKind::Union);
        m.insert("UNIQUE", TokenKind::Unique);
        m.insert("UPDATE", TokenKind::Update);
        m.insert("USING", TokenKind::Using);
        m.insert("VALUES", TokenKind::Values);
        m.insert("VIRTUAL", TokenKind::Virtual);
        m.insert("WHEN", TokenKind::When);
        m.insert("WHERE", TokenKind::Where);
        m.insert("WITHOUT", TokenKind::Without);
        m
    };
}

/// Map identifier text to a keyword kind, if it is one (case-insensitive)
pub fn keyword_token(text: &str) -> Option<TokenKind> {
    KEYWORDS.get(text.to_ascii_uppercase().as_str()).copied()
}

// ============================================================================
// Token
// ============================================================================

/// A token from the SQL source
#[derive(Debug, Clone)]
pub struct Token {
    /// Token type
    pub kind: TokenKind,
    /// Start byte offset in source
    pub start: usize,
    /// End byte offset in source (exclusive)
    pub end: usize,
    /// Line number (1-based)
    pub line: u32,
    /// Column number (1-based)
    pub column: u32,
}

impl Token {
    /// Create a new token
    pub fn new(kind: TokenKind, start: usize, end: usize, line: u32, column: u32) -> Self {
        Token {
            kind,
            start,
            end,
            line,
            column,
        }
    }

    /// Get the lexeme of this token from the source (source form preserved)
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }

    /// Get the byte length of this token
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if the token is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Tokenizer
// ============================================================================

/// SQL tokenizer
pub struct Tokenizer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    column: u32,
}

impl<'a> Tokenizer<'a> {
    /// Create a new tokenizer
    pub fn new(source: &'a str) -> Self {
        Tokenizer {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Get the next token; returns Eof repeatedly after input exhaustion
    pub fn next_token(&mut self) -> Token {
        if self.is_eof() {
            return Token::new(TokenKind::Eof, self.pos, self.pos, self.line, self.column);
        }

        let start = self.pos;
        let start_line = self.line;
        let start_column = self.column;

        let kind = self.scan_token();

        Token::new(kind, start, self.pos, start_line, start_column)
    }

    /// Scan a single token starting at the current position
    fn scan_token(&mut self) -> TokenKind {
        let c = self.current();

        // Whitespace
        if c.is_ascii_whitespace() {
            while !self.is_eof() && self.current().is_ascii_whitespace() {
                self.advance();
            }
            return TokenKind::Whitespace;
        }

        // -- comment to end of line
        if c == b'-' && self.peek() == Some(b'-') {
            while !self.is_eof() && self.current() != b'\n' {
                self.advance();
            }
            return TokenKind::Comment;
        }

        // /* */ comment (unterminated runs to EOF)
        if c == b'/' && self.peek() == Some(b'*') {
            self.advance();
            self.advance();
            while !self.is_eof() {
                if self.current() == b'*' && self.peek() == Some(b'/') {
                    self.advance();
                    self.advance();
                    break;
                }
                self.advance();
            }
            return TokenKind::Comment;
        }

        // Numbers
        if c.is_ascii_digit() {
            return self.scan_number();
        }

        // A '.' immediately followed by a digit begins a float literal
        if c == b'.' {
            if let Some(next) = self.peek() {
                if next.is_ascii_digit() {
                    return self.scan_number();
                }
            }
        }

        // Blob literals (before identifiers: x is a letter)
        if (c == b'x' || c == b'X') && self.peek() == Some(b'\'') {
            return self.scan_blob();
        }

        // Identifiers and keywords
        if c.is_ascii_alphabetic() || c == b'_' {
            return self.scan_identifier();
        }

        // Quoted identifiers
        if c == b'"' || c == b'`' || c == b'[' {
            return self.scan_quoted_identifier();
        }

        // Strings
        if c == b'\'' {
            return self.scan_string();
        }

        // Bound variables
        if matches!(c, b'?' | b':' | b'@' | b'$' | b'#') {
            return self.scan_variable();
        }

        // Operators and punctuation
        self.scan_operator()
    }

    /// Scan a numeric literal (integer or float)
    fn scan_number(&mut self) -> TokenKind {
        // Hex form: always an integer
        if self.current() == b'0' && matches!(self.peek(), Some(b'x') | Some(b'X')) {
            self.advance();
            self.advance();
            while !self.is_eof() && (self.current().is_ascii_hexdigit() || self.current() == b'_') {
                self.advance();
            }
            return TokenKind::Integer;
        }

        let mut is_float = false;

        // Integer part with optional '_' separators between digits
        self.scan_digits();

        // Fractional part promotes to float
        if !self.is_eof() && self.current() == b'.' {
            self.advance();
            self.scan_digits();
            is_float = true;
        }

        // Exponent promotes to float (only if digits follow)
        if !self.is_eof() && matches!(self.current(), b'e' | b'E') {
            let saved_pos = self.pos;
            let saved_col = self.column;
            self.advance();
            if !self.is_eof() && matches!(self.current(), b'+' | b'-') {
                self.advance();
            }
            if !self.is_eof() && self.current().is_ascii_digit() {
                self.scan_digits();
                is_float = true;
            } else {
                // Not an exponent, back out
                self.pos = saved_pos;
                self.column = saved_col;
            }
        }

        if is_float {
            TokenKind::Float
        } else {
            TokenKind::Integer
        }
    }

    /// Consume a run of digits, allowing '_' separators between digits
    fn scan_digits(&mut self) {
        while !self.is_eof() {
            let c = self.current();
            if c.is_ascii_digit() {
                self.advance();
            } else if c == b'_' && self.peek().map(|n| n.is_ascii_digit()).unwrap_or(false) {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Scan an identifier or keyword
    fn scan_identifier(&mut self) -> TokenKind {
        let start = self.pos;

        while !self.is_eof() {
            let c = self.current();
            if c.is_ascii_alphanumeric() || c == b'_' || c == b'$' {
                self.advance();
            } else {
                break;
            }
        }

        let text = &self.source[start..self.pos];
        keyword_token(text).unwrap_or(TokenKind::Identifier)
    }

    /// Scan a quoted identifier ("foo", `foo`, or [foo])
    ///
    /// Doubled closing quotes stay in the lexeme; `unquote` decodes them.
    fn scan_quoted_identifier(&mut self) -> TokenKind {
        let quote = self.current();
        let close = if quote == b'[' { b']' } else { quote };
        self.advance();

        while !self.is_eof() {
            if self.current() == close {
                if quote != b'[' && self.peek() == Some(close) {
                    self.advance();
                    self.advance();
                } else {
                    self.advance();
                    return TokenKind::Identifier;
                }
            } else {
                self.advance();
            }
        }

        // Unterminated
        TokenKind::Illegal
    }

    /// Scan a string literal; doubled '' is an escaped apostrophe
    fn scan_string(&mut self) -> TokenKind {
        self.advance(); // opening quote

        while !self.is_eof() {
            if self.current() == b'\'' {
                if self.peek() == Some(b'\'') {
                    self.advance();
                    self.advance();
                } else {
                    self.advance();
                    return TokenKind::String;
                }
            } else {
                self.advance();
            }
        }

        // Unterminated
        TokenKind::Illegal
    }

    /// Scan a blob literal (X'...'); requires an even number of hex digits
    fn scan_blob(&mut self) -> TokenKind {
        self.advance(); // x or X
        self.advance(); // opening quote

        let mut digits = 0usize;
        let mut bad = false;
        while !self.is_eof() && self.current() != b'\'' {
            if !self.current().is_ascii_hexdigit() {
                bad = true;
            }
            digits += 1;
            self.advance();
        }

        if self.is_eof() {
            return TokenKind::Illegal;
        }
        self.advance(); // closing quote

        if bad || digits % 2 != 0 {
            TokenKind::Illegal
        } else {
            TokenKind::Blob
        }
    }

    /// Scan a bound variable: ?, ?N, :name, @name, $name, #name
    fn scan_variable(&mut self) -> TokenKind {
        let lead = self.current();
        self.advance();

        if lead == b'?' {
            // Optional trailing parameter number
            while !self.is_eof() && self.current().is_ascii_digit() {
                self.advance();
            }
            return TokenKind::Variable;
        }

        // Named form requires at least one name character
        let mut chars = 0;
        while !self.is_eof() {
            let c = self.current();
            if c.is_ascii_alphanumeric() || c == b'_' || c == b'$' {
                self.advance();
                chars += 1;
            } else {
                break;
            }
        }

        if chars == 0 {
            TokenKind::Illegal
        } else {
            TokenKind::Variable
        }
    }

    /// Scan an operator or punctuation (longest match)
    fn scan_operator(&mut self) -> TokenKind {
        let c = self.current();
        self.advance();

        match c {
            b'+' => TokenKind::Plus,
            b'-' => {
                if !self.is_eof() && self.current() == b'>' {
                    self.advance();
                    if !self.is_eof() && self.current() == b'>' {
                        self.advance();
                        TokenKind::ArrowArrow
                    } else {
                        TokenKind::Arrow
                    }
                } else {
                    TokenKind::Minus
                }
            }
            b'*' => TokenKind::Star,
            b'/' => TokenKind::Slash,
            b'%' => TokenKind::Percent,
            b'=' => {
                if !self.is_eof() && self.current() == b'=' {
                    self.advance();
                    TokenKind::EqEq
                } else {
                    TokenKind::Eq
                }
            }
            b'<' => {
                if self.is_eof() {
                    return TokenKind::Lt;
                }
                match self.current() {
                    b'=' => {
                        self.advance();
                        TokenKind::Le
                    }
                    b'>' => {
                        self.advance();
                        TokenKind::Ne
                    }
                    b'<' => {
                        self.advance();
                        TokenKind::LtLt
                    }
                    _ => TokenKind::Lt,
                }
            }
            b'>' => {
                if self.is_eof() {
                    return TokenKind::Gt;
                }
                match self.current() {
                    b'=' => {
                        self.advance();
                        TokenKind::Ge
                    }
                    b'>' => {
                        self.advance();
                        TokenKind::GtGt
                    }
                    _ => TokenKind::Gt,
                }
            }
            b'!' => {
                if !self.is_eof() && self.current() == b'=' {
                    self.advance();
                    TokenKind::BangEq
                } else {
                    TokenKind::Illegal
                }
            }
            b'&' => TokenKind::Ampersand,
            b'|' => {
                if !self.is_eof() && self.current() == b'|' {
                    self.advance();
                    TokenKind::DoublePipe
                } else {
                    TokenKind::Pipe
                }
            }
            b'~' => TokenKind::Tilde,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b',' => TokenKind::Comma,
            b';' => TokenKind::Semicolon,
            b'.' => TokenKind::Dot,
            _ => {
                // Consume the remainder of a multi-byte character so the
                // lexeme stays a valid str slice
                while !self.is_eof() && (self.current() & 0xC0) == 0x80 {
                    self.advance();
                }
                TokenKind::Illegal
            }
        }
    }

    /// Check if at end of input
    fn is_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Get current byte
    fn current(&self) -> u8 {
        self.bytes[self.pos]
    }

    /// Peek at next byte
    fn peek(&self) -> Option<u8> {
        if self.pos + 1 < self.bytes.len() {
            Some(self.bytes[self.pos + 1])
        } else {
            None
        }
    }

    /// Advance one byte, tracking line and column
    fn advance(&mut self) {
        let c = self.bytes[self.pos];
        self.pos += 1;
        if c == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }
}

// ============================================================================
// Quote Decoding
// ============================================================================

/// Decode a quoted lexeme: strips the surrounding quotes and collapses
/// doubled quote characters. Unquoted input is returned unchanged.
pub fn unquote(lexeme: &str) -> String {
    let bytes = lexeme.as_bytes();
    if bytes.len() < 2 {
        return lexeme.to_string();
    }

    let (open, close) = (bytes[0], bytes[bytes.len() - 1]);
    match (open, close) {
        (b'"', b'"') | (b'`', b'`') | (b'\'', b'\'') => {
            let inner = &lexeme[1..lexeme.len() - 1];
            let q = open as char;
            inner.replace(&format!("{}{}", q, q), &q.to_string())
        }
        (b'[', b']') => lexeme[1..lexeme.len() - 1].to_string(),
        _ => lexeme.to_string(),
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Tokenize a SQL string, yielding every token including whitespace and
/// comments; the final token is always Eof
pub fn tokenize_all(source: &str) -> Vec<Token> {
    let mut tokenizer = Tokenizer::new(source);
    let mut tokens = Vec::new();

    loop {
        let token = tokenizer.next_token();
        let is_eof = token.kind == TokenKind::Eof;
        tokens.push(token);
        if is_eof {
            break;
        }
    }

    tokens
}

/// Tokenize a SQL string, dropping skippable tokens
pub fn tokenize(source: &str) -> Vec<Token> {
    tokenize_all(source)
        .into_iter()
        .filter(|t| !t.kind.is_skippable())
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokenize_keywords() {
        let tokens = tokenize("SELECT FROM WHERE");
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[0].kind, TokenKind::Select);
        assert_eq!(tokens[1].kind, TokenKind::From);
        assert_eq!(tokens[2].kind, TokenKind::Where);
        assert_eq!(tokens[3].kind, TokenKind::Eof);
    }

    #[test]
    fn test_tokenize_case_insensitive() {
        let tokens = tokenize("select FROM Where");
        assert_eq!(tokens[0].kind, TokenKind::Select);
        assert_eq!(tokens[1].kind, TokenKind::From);
        assert_eq!(tokens[2].kind, TokenKind::Where);
    }

    #[test]
    fn test_tokenize_identifiers() {
        let tokens = tokenize("foo bar123 _baz");
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[2].kind, TokenKind::Identifier);
    }

    #[test]
    fn test_tokenize_numbers() {
        assert_eq!(
            kinds("42 3.14 1e10 0x1F .5 5. 1_000"),
            vec![
                TokenKind::Integer,
                TokenKind::Float,
                TokenKind::Float,
                TokenKind::Integer,
                TokenKind::Float,
                TokenKind::Float,
                TokenKind::Integer,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_number_lexemes() {
        let source = "1_000 0xFF_EC 2.5e-3";
        let tokens = tokenize(source);
        assert_eq!(tokens[0].text(source), "1_000");
        assert_eq!(tokens[1].text(source), "0xFF_EC");
        assert_eq!(tokens[2].text(source), "2.5e-3");
    }

    #[test]
    fn test_tokenize_strings() {
        let source = "'hello' 'it''s'";
        let tokens = tokenize(source);
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[1].kind, TokenKind::String);
        assert_eq!(tokens[1].text(source), "'it''s'");
    }

    #[test]
    fn test_tokenize_multiline_string() {
        let source = "'line1\nline2' x";
        let tokens = tokenize(source);
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn test_tokenize_blob() {
        let tokens = tokenize("X'48656C6C6F' x'ab'");
        assert_eq!(tokens[0].kind, TokenKind::Blob);
        assert_eq!(tokens[1].kind, TokenKind::Blob);
    }

    #[test]
    fn test_tokenize_blob_odd_digits() {
        let tokens = tokenize("X'abc'");
        assert_eq!(tokens[0].kind, TokenKind::Illegal);
    }

    #[test]
    fn test_tokenize_operators() {
        assert_eq!(
            kinds("+ - * / = == <> != <= >= << >> || & | ~ -> ->>"),
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Eq,
                TokenKind::EqEq,
                TokenKind::Ne,
                TokenKind::BangEq,
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::LtLt,
                TokenKind::GtGt,
                TokenKind::DoublePipe,
                TokenKind::Ampersand,
                TokenKind::Pipe,
                TokenKind::Tilde,
                TokenKind::Arrow,
                TokenKind::ArrowArrow,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_comments_skipped() {
        let tokens = tokenize("SELECT -- comment\nFROM");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].kind, TokenKind::Select);
        assert_eq!(tokens[1].kind, TokenKind::From);
    }

    #[test]
    fn test_tokenize_all_keeps_skippable() {
        let tokens = tokenize_all("SELECT /* multi\nline */ FROM");
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert!(kinds.contains(&TokenKind::Whitespace));
        assert!(kinds.contains(&TokenKind::Comment));
        assert_eq!(*kinds.last().unwrap(), TokenKind::Eof);
    }

    #[test]
    fn test_tokenize_block_comment_lines() {
        let tokens = tokenize("SELECT /* multi\nline */ FROM");
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn test_tokenize_quoted_identifier() {
        let source = "\"my table\" `another` [bracketed] \"do\"\"ble\"";
        let tokens = tokenize(source);
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[2].kind, TokenKind::Identifier);
        assert_eq!(tokens[3].kind, TokenKind::Identifier);
        // Lexeme preserves the quotes
        assert_eq!(tokens[0].text(source), "\"my table\"");
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"my table\""), "my table");
        assert_eq!(unquote("`tick`"), "tick");
        assert_eq!(unquote("[brackets]"), "brackets");
        assert_eq!(unquote("\"do\"\"ble\""), "do\"ble");
        assert_eq!(unquote("'it''s'"), "it's");
        assert_eq!(unquote("bare"), "bare");
    }

    #[test]
    fn test_tokenize_variables() {
        let source = "? ?17 :name @var $dollar #hash";
        let tokens = tokenize(source);
        for t in &tokens[..6] {
            assert_eq!(t.kind, TokenKind::Variable);
        }
        assert_eq!(tokens[0].text(source), "?");
        assert_eq!(tokens[1].text(source), "?17");
        assert_eq!(tokens[2].text(source), ":name");
        assert_eq!(tokens[3].text(source), "@var");
        assert_eq!(tokens[4].text(source), "$dollar");
        assert_eq!(tokens[5].text(source), "#hash");
    }

    #[test]
    fn test_tokenize_lone_colon_illegal() {
        let tokens = tokenize(": x");
        assert_eq!(tokens[0].kind, TokenKind::Illegal);
    }

    #[test]
    fn test_tokenize_illegal_byte() {
        let tokens = tokenize("SELECT \\ FROM");
        assert_eq!(tokens[1].kind, TokenKind::Illegal);
    }

    #[test]
    fn test_tokenize_select_statement() {
        assert_eq!(
            kinds("SELECT id, name FROM users WHERE id = 1"),
            vec![
                TokenKind::Select,
                TokenKind::Identifier,
                TokenKind::Comma,
                TokenKind::Identifier,
                TokenKind::From,
                TokenKind::Identifier,
                TokenKind::Where,
                TokenKind::Identifier,
                TokenKind::Eq,
                TokenKind::Integer,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_token_position() {
        let tokens = tokenize("SELECT\n  FROM");
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[0].column, 1);
        assert_eq!(tokens[1].line, 2);
        assert_eq!(tokens[1].column, 3);
    }

    #[test]
    fn test_eof_repeats() {
        let mut t = Tokenizer::new("x");
        assert_eq!(t.next_token().kind, TokenKind::Identifier);
        assert_eq!(t.next_token().kind, TokenKind::Eof);
        assert_eq!(t.next_token().kind, TokenKind::Eof);
    }

    #[test]
    fn test_lexeme_roundtrip() {
        let source = "SELECT a, 'str' -- c\nFROM t /* b */ WHERE x > 0x1F";
        let tokens = tokenize_all(source);
        let joined: String = tokens.iter().map(|t| t.text(source)).collect();
        assert_eq!(joined, source);
    }

    #[test]
    fn test_is_keyword() {
        assert!(TokenKind::Select.is_keyword());
        assert!(TokenKind::Between.is_keyword());
        assert!(!TokenKind::Identifier.is_keyword());
        assert!(!TokenKind::Plus.is_keyword());
    }
}
