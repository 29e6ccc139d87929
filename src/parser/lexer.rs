//! Action language tokenizer.

use std::mem;

use crate::parser::ParseError;

/// Lexical token.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum TokenKind {
    /// Bare word, used for names and unquoted values.
    Word(String),
    /// Quoted or parenthesized text.
    Text(String),
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Pipe,
    Comma,
    Semicolon,
    Colon,
    Equals,
    Newline,
    Eof,
}

impl TokenKind {
    /// Human readable token description.
    pub fn describe(&self) -> String {
        match self {
            Self::Word(word) => format!("{word:?}"),
            Self::Text(_) => "quoted text".into(),
            Self::LeftBrace => "'{'".into(),
            Self::RightBrace => "'}'".into(),
            Self::LeftBracket => "'['".into(),
            Self::RightBracket => "']'".into(),
            Self::Pipe => "'|'".into(),
            Self::Comma => "','".into(),
            Self::Semicolon => "';'".into(),
            Self::Colon => "':'".into(),
            Self::Equals => "'='".into(),
            Self::Newline => "end of line".into(),
            Self::Eof => "end of input".into(),
        }
    }
}

/// Token with its source position.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

/// Split source text into tokens.
pub fn tokenize(text: &str) -> Result<Vec<Token>, ParseError> {
    let mut lexer = Lexer::new();
    for c in text.chars() {
        lexer.advance(c)?;
    }
    lexer.finish()
}

/// Tokenizer state.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum State {
    /// Between tokens.
    Start,
    /// Inside a bare word.
    Word,
    /// Inside a comment, until the end of the line.
    Comment,
    /// Inside quoted text, terminated by `close`.
    Quoted { close: char },
    /// After a backslash inside quoted text.
    Escape { close: char },
    /// After a backslash outside of quoted text.
    Continuation,
}

struct Lexer {
    state: State,
    tokens: Vec<Token>,
    buffer: String,

    /// Position of the next character.
    line: usize,
    column: usize,

    /// Start position of the pending token.
    token_line: usize,
    token_column: usize,
}

impl Lexer {
    fn new() -> Self {
        Self {
            state: State::Start,
            tokens: Vec::new(),
            buffer: String::new(),
            token_line: 1,
            token_column: 1,
            line: 1,
            column: 1,
        }
    }

    /// Process the next character.
    fn advance(&mut self, c: char) -> Result<(), ParseError> {
        match self.state {
            State::Start => self.start(c)?,
            State::Word if is_word_char(c) => self.buffer.push(c),
            State::Word => {
                self.push_buffer(TokenKind::Word);
                self.start(c)?;
            },
            State::Comment if c == '\n' => self.start(c)?,
            State::Comment => (),
            State::Quoted { close } if c == close => {
                self.push_buffer(TokenKind::Text);
            },
            State::Quoted { close } if c == '\\' => self.state = State::Escape { close },
            State::Quoted { .. } => self.buffer.push(c),
            State::Escape { close } => {
                // Unknown escapes are preserved verbatim.
                if !matches!(c, '"' | '(' | ')' | '\\') {
                    self.buffer.push('\\');
                }
                self.buffer.push(c);
                self.state = State::Quoted { close };
            },
            State::Continuation if c == '\n' => self.state = State::Start,
            State::Continuation if c == '\r' => (),
            State::Continuation => {
                return Err(self.error("expected end of line after '\\'"));
            },
        }

        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Ok(())
    }

    /// Process a character between tokens.
    fn start(&mut self, c: char) -> Result<(), ParseError> {
        self.state = State::Start;
        self.token_line = self.line;
        self.token_column = self.column;

        let kind = match c {
            '\n' => TokenKind::Newline,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            '|' => TokenKind::Pipe,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '=' => TokenKind::Equals,
            ')' => return Err(self.error("unexpected ')'")),
            '#' => {
                self.state = State::Comment;
                return Ok(());
            },
            '\\' => {
                self.state = State::Continuation;
                return Ok(());
            },
            '"' => {
                self.state = State::Quoted { close: '"' };
                return Ok(());
            },
            '(' => {
                self.state = State::Quoted { close: ')' };
                return Ok(());
            },
            c if c.is_whitespace() => return Ok(()),
            c => {
                self.buffer.push(c);
                self.state = State::Word;
                return Ok(());
            },
        };

        self.push(kind);

        Ok(())
    }

    /// Complete tokenization.
    fn finish(mut self) -> Result<Vec<Token>, ParseError> {
        match self.state {
            State::Word => self.push_buffer(TokenKind::Word),
            State::Quoted { .. } | State::Escape { .. } => {
                return Err(ParseError::new(
                    self.token_line,
                    self.token_column,
                    "unterminated string",
                ));
            },
            State::Start | State::Comment | State::Continuation => (),
        }

        self.token_line = self.line;
        self.token_column = self.column;
        self.push(TokenKind::Eof);

        Ok(self.tokens)
    }

    /// Emit a token starting at the pending token position.
    fn push(&mut self, kind: TokenKind) {
        self.tokens.push(Token { kind, line: self.token_line, column: self.token_column });
    }

    /// Emit the buffered text as token.
    fn push_buffer(&mut self, kind: fn(String) -> TokenKind) {
        let text = mem::take(&mut self.buffer);
        self.push(kind(text));
        self.state = State::Start;
    }

    /// Create an error at the current position.
    fn error(&self, message: &str) -> ParseError {
        ParseError::new(self.line, self.column, message)
    }
}

/// Check if a character can be part of a bare word.
fn is_word_char(c: char) -> bool {
    !c.is_whitespace()
        && !matches!(
            c,
            '{' | '}' | '[' | ']' | '|' | ',' | ';' | ':' | '=' | '"' | '(' | ')' | '\\'
        )
}
