//! Action language parser.
//!
//! ```text
//! list    := { action | ';' | '\n' } EOF
//! action  := filter | '{' list '}' | NAME { option }
//! filter  := '[' [ test ] ']' action [ '|' action ]
//! test    := NAME [ '=' value ] [ (',' | '|') test ]
//! option  := NAME ':' value
//! value   := WORD | '"' text '"' | '(' text ')' | '{' list '}'
//! ```

use std::error::Error;
use std::fmt::{self, Display, Formatter};

use crate::action::{Action, ActionRegistry};
use crate::filter::{Filter, FilterRegistry};
use crate::list::{ActionList, Combinator, Conditional, Entry, TestChain, TestTerm};
use crate::parser::lexer::{Token, TokenKind};
use crate::value::{Options, Value};

pub mod lexer;

/// Maximum nesting depth of blocks and filters.
const MAX_DEPTH: usize = 64;

/// Malformed action list source.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self { line, column, message: message.into() }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

impl Error for ParseError {}

/// Parse action list source text.
///
/// Unknown actions and filters are skipped with a warning, they never cause
/// the parse to fail.
pub fn parse(
    text: &str,
    actions: &ActionRegistry,
    filters: &FilterRegistry,
) -> Result<ActionList, ParseError> {
    let tokens = lexer::tokenize(text)?;
    let mut parser = Parser { tokens, index: 0, depth: 0, actions, filters };

    let entries = parser.list(false)?;

    Ok(entries.into_iter().collect())
}

/// Recursive descent parser state.
struct Parser<'a> {
    tokens: Vec<Token>,
    index: usize,
    depth: usize,
    actions: &'a ActionRegistry,
    filters: &'a FilterRegistry,
}

impl<'a> Parser<'a> {
    /// Parse a list of actions.
    ///
    /// Nested lists are terminated by `}`, top-level lists by the end of input.
    fn list(&mut self, nested: bool) -> Result<Vec<Entry>, ParseError> {
        let mut entries = Vec::new();

        loop {
            match self.peek() {
                TokenKind::Eof if nested => return Err(self.unexpected("'}'")),
                TokenKind::Eof => break,
                TokenKind::RightBrace if nested => {
                    self.bump();
                    break;
                },
                TokenKind::Newline | TokenKind::Semicolon => self.bump(),
                _ => entries.append(&mut self.action()?),
            }
        }

        Ok(entries)
    }

    /// Parse a single action, block or filter.
    ///
    /// Blocks are flattened into their entries and unknown actions produce no
    /// entries at all.
    fn action(&mut self) -> Result<Vec<Entry>, ParseError> {
        match self.peek() {
            TokenKind::LeftBracket => Ok(vec![Entry::Conditional(self.filter()?)]),
            TokenKind::LeftBrace => {
                self.bump();
                self.nested(|parser| parser.list(true))
            },
            TokenKind::Word(_) => {
                let name = self.word()?;
                let options = self.options()?;
                let action = Action::new(self.actions, &name, options);
                Ok(action.map(Entry::Action).into_iter().collect())
            },
            _ => Err(self.unexpected("action")),
        }
    }

    /// Parse the options following an action name.
    fn options(&mut self) -> Result<Options, ParseError> {
        let mut options = Options::new();

        while matches!(self.peek(), TokenKind::Word(_))
            && self.peek_nth(1) == &TokenKind::Colon
        {
            let name = self.word()?;
            self.bump();
            let value = self.value()?;
            options.insert(&name, value);
        }

        Ok(options)
    }

    /// Parse a filtered conditional.
    fn filter(&mut self) -> Result<Conditional, ParseError> {
        self.expect(TokenKind::LeftBracket, "'['")?;

        let test = match self.peek() {
            TokenKind::RightBracket => None,
            _ => Some(self.tests()?),
        };

        self.expect(TokenKind::RightBracket, "']'")?;

        let then = self.nested(|parser| parser.action())?;

        let otherwise = match self.peek() {
            TokenKind::Pipe => {
                self.bump();
                self.nested(|parser| parser.action())?
            },
            _ => Vec::new(),
        };

        let then = then.into_iter().collect();
        let otherwise = otherwise.into_iter().collect();

        Ok(Conditional::new(test, then, otherwise))
    }

    /// Parse a chain of filter tests.
    fn tests(&mut self) -> Result<TestChain, ParseError> {
        let mut terms = Vec::new();

        loop {
            let key = self.word()?;

            let value = match self.peek() {
                TokenKind::Equals => {
                    self.bump();
                    Some(self.value()?)
                },
                _ => None,
            };

            let filter = Filter::new(self.filters, &key, value);

            let combinator = match self.peek() {
                TokenKind::Comma => Combinator::And,
                TokenKind::Pipe => Combinator::Or,
                _ => {
                    terms.push(TestTerm::new(filter, Combinator::Or));
                    break;
                },
            };
            self.bump();

            terms.push(TestTerm::new(filter, combinator));
        }

        Ok(TestChain::new(terms))
    }

    /// Parse an option or test value.
    fn value(&mut self) -> Result<Value, ParseError> {
        match self.peek() {
            TokenKind::Word(text) | TokenKind::Text(text) => {
                let value = Value::from(text.as_str());
                self.bump();
                Ok(value)
            },
            TokenKind::LeftBrace => {
                self.bump();
                let entries = self.nested(|parser| parser.list(true))?;
                Ok(Value::list(entries.into_iter().collect()))
            },
            _ => Err(self.unexpected("value")),
        }
    }

    /// Run a parser function one nesting level deeper.
    fn nested<T, F>(&mut self, f: F) -> Result<T, ParseError>
    where
        F: FnOnce(&mut Self) -> Result<T, ParseError>,
    {
        if self.depth >= MAX_DEPTH {
            let token = self.token();
            return Err(ParseError::new(token.line, token.column, "nesting too deep"));
        }

        self.depth += 1;
        let result = f(self);
        self.depth -= 1;

        result
    }

    /// Consume a bare word.
    fn word(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            TokenKind::Word(word) => {
                let word = word.clone();
                self.bump();
                Ok(word)
            },
            _ => Err(self.unexpected("name")),
        }
    }

    /// Consume a specific token.
    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<(), ParseError> {
        if self.peek() != &kind {
            return Err(self.unexpected(expected));
        }

        self.bump();

        Ok(())
    }

    /// Current token.
    fn token(&self) -> &Token {
        // The token stream always ends with an EOF token.
        &self.tokens[self.index.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &TokenKind {
        &self.token().kind
    }

    fn peek_nth(&self, offset: usize) -> &TokenKind {
        let index = (self.index + offset).min(self.tokens.len() - 1);
        &self.tokens[index].kind
    }

    /// Advance to the next token.
    fn bump(&mut self) {
        if self.index + 1 < self.tokens.len() {
            self.index += 1;
        }
    }

    /// Error for an unexpected token at the current position.
    fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.token();
        let message = format!("expected {expected}, found {}", token.kind.describe());
        ParseError::new(token.line, token.column, message)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testing::TestRig;

    fn rig() -> TestRig {
        let mut rig = TestRig::new(4);
        rig.subset_filter("urgent", &[1]);
        rig.subset_filter("focused", &[2]);
        rig.subset_filter("title", &[3]);
        rig
    }

    fn parse(rig: &TestRig, text: &str) -> Result<ActionList, ParseError> {
        super::parse(text, &rig.engine.actions, &rig.engine.filters)
    }

    fn action_name(entry: &Entry) -> &str {
        match entry {
            Entry::Action(action) => action.definition().name(),
            Entry::Conditional(_) => panic!("expected action, got conditional"),
        }
    }

    fn conditional(entry: &Entry) -> &Conditional {
        match entry {
            Entry::Conditional(conditional) => conditional,
            Entry::Action(_) => panic!("expected conditional, got action"),
        }
    }

    #[test]
    fn sequence() {
        let rig = rig();
        let list = parse(&rig, "Record; RecordAll\n\nrecordempty # trailing comment\n").unwrap();

        let names: Vec<_> = list.iter().map(action_name).collect();
        assert_eq!(names, vec!["record", "recordall", "recordempty"]);
    }

    #[test]
    fn options() {
        let rig = rig();
        let list = parse(&rig, r#"Record tag:first extra:"two words" nested:{ Record }"#).unwrap();

        let action = match list.first() {
            Some(Entry::Action(action)) => action,
            entry => panic!("unexpected entry {entry:?}"),
        };
        assert_eq!(action.options().string("tag"), Some("first"));
        assert_eq!(action.options().string("extra"), Some("two words"));
        assert_eq!(action.options().get("nested").unwrap().as_list().len(), 1);
    }

    #[test]
    fn actions_without_options_share_a_line() {
        let rig = rig();
        let list = parse(&rig, "Record tag:a RecordAll").unwrap();
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn filter_chain() {
        let rig = rig();
        let list = parse(&rig, "[urgent,nofocused|title=xterm] Record | RecordAll").unwrap();
        assert_eq!(list.len(), 1);

        let conditional = conditional(list.first().unwrap());
        let terms = conditional.test.as_ref().unwrap().terms();
        assert_eq!(terms.len(), 3);
        assert_eq!(terms[0].combinator, Combinator::And);
        assert_eq!(terms[1].combinator, Combinator::Or);
        assert_eq!(terms[2].combinator, Combinator::Or);
        assert!(terms[1].filter.as_ref().unwrap().inverted());
        assert_eq!(terms[2].filter.as_ref().unwrap().value(), Some(&Value::from("xterm")));

        assert_eq!(action_name(conditional.then.first().unwrap()), "record");
        assert_eq!(action_name(conditional.otherwise.first().unwrap()), "recordall");
    }

    #[test]
    fn empty_filter_and_blocks() {
        let rig = rig();
        let list = parse(&rig, "[] { Record RecordAll }\n{ RecordEmpty }").unwrap();
        assert_eq!(list.len(), 2);

        let conditional = conditional(list.first().unwrap());
        assert!(conditional.test.is_none());
        assert_eq!(conditional.then.len(), 2);
        assert!(conditional.otherwise.is_empty());

        assert_eq!(action_name(list.iter().nth(1).unwrap()), "recordempty");
    }

    #[test]
    fn nested_filters() {
        let rig = rig();
        let list = parse(&rig, "[urgent] [focused] Record | RecordAll | RecordEmpty").unwrap();

        let outer = conditional(list.first().unwrap());
        let inner = conditional(outer.then.first().unwrap());
        assert_eq!(action_name(inner.then.first().unwrap()), "record");
        assert_eq!(action_name(inner.otherwise.first().unwrap()), "recordall");
        assert_eq!(action_name(outer.otherwise.first().unwrap()), "recordempty");
    }

    #[test]
    fn unknown_names_are_skipped() {
        let rig = rig();
        let list = parse(&rig, "Frobnicate speed:11\nRecord").unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(action_name(list.first().unwrap()), "record");

        let list = parse(&rig, "[sticky|urgent] Record").unwrap();
        let terms = conditional(list.first().unwrap()).test.as_ref().unwrap().terms();
        assert!(terms[0].filter.is_none());
        assert!(terms[1].filter.is_some());
    }

    #[test]
    fn identical_sources_are_equal() {
        let rig = rig();
        let source = r#"
            # Every production at least once.
            Record tag:"quoted \"text\"" other:(paren \(text\)) \
                list:{ RecordAll; [urgent] Record }
            [urgent,nofocused|title=(x term)] { Record RecordAll } | [] RecordEmpty
            { Record tag:block }
        "#;

        let first = parse(&rig, source).unwrap();
        let second = parse(&rig, source).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);

        let different = parse(&rig, &source.replace("nofocused", "focused")).unwrap();
        assert_ne!(first, different);
    }

    #[test]
    fn missing_value() {
        let rig = rig();
        let err = parse(&rig, "Move x:").unwrap_err();
        assert_eq!((err.line, err.column), (1, 8));
        assert_eq!(err.to_string(), "1:8: expected value, found end of input");

        let err = parse(&rig, "Record x:\nRecord").unwrap_err();
        assert_eq!((err.line, err.column), (1, 10));
    }

    #[test]
    fn malformed_sources() {
        let rig = rig();

        let err = parse(&rig, "[urgent Record").unwrap_err();
        assert_eq!((err.line, err.column), (1, 9));

        let err = parse(&rig, "{ Record").unwrap_err();
        assert_eq!((err.line, err.column), (1, 9));

        let err = parse(&rig, "Record }").unwrap_err();
        assert_eq!((err.line, err.column), (1, 8));

        let err = parse(&rig, "[urgent]").unwrap_err();
        assert_eq!(err.message, "expected action, found end of input");

        let err = parse(&rig, "[urgent,] Record").unwrap_err();
        assert_eq!((err.line, err.column), (1, 9));

        let err = parse(&rig, "Record tag:\"open").unwrap_err();
        assert_eq!(err.message, "unterminated string");
    }

    #[test]
    fn nesting_limit() {
        let rig = rig();
        let deep = format!("{}Record{}", "{ ".repeat(MAX_DEPTH + 1), " }".repeat(MAX_DEPTH + 1));
        assert_eq!(parse(&rig, &deep).unwrap_err().message, "nesting too deep");

        let shallow = format!("{}Record{}", "{ ".repeat(8), " }".repeat(8));
        assert_eq!(parse(&rig, &shallow).unwrap().len(), 1);
    }
}
