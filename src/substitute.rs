//! Named placeholder substitution.
//!
//! A template is lexed with a fixed set of SQL token patterns and then fed,
//! token by token, through a small state machine. Placeholders come in two
//! shapes:
//!
//! ```text
//! :name  @name  :"quoted name"  #:name  #@name    prefix token + name token
//! %(name)s  #%(name)s                             a single token
//! ```
//!
//! Because a prefix (`:`) is only known to start a placeholder once the name
//! after it has been looked up, the prefix is held back in a pending buffer.
//! If the name is bound the pending text is dropped in favour of the literal;
//! otherwise it is written out unchanged.
//!
//! | State             | Token              | Output | Next              |
//! |-------------------|--------------------|--------|-------------------|
//! | any               | comment/whitespace | Push   | unchanged         |
//! | Chillin           | `%(name)s`         | Flush  | Chillin           |
//! | Chillin           | `#%(name)s`        | Flush  | Chillin           |
//! | Chillin           | `:` / `@`          | Hold   | InParameter       |
//! | Chillin           | `#:` / `#@`        | Hold   | InParameterLength |
//! | Chillin           | anything else      | Flush  | Chillin           |
//! | InParameter*      | word / `"ident"`   | Emit if bound, else Flush | Chillin |
//! | InParameter*      | anything else      | error  |                   |

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::BuildHasher;
use std::ops::Range;

use serde::Serialize;

use crate::encode::encode;
use crate::error::{BindError, BindResult};
use crate::lexer::{Lexer, Token, Tokens};
use crate::value::Value;

/// Kinds of SQL token the substitution engine distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlTokenKind {
    QuotedString,
    QuotedIdentifier,
    LineComment,
    BlockComment,
    ParamPrefix,
    ParamLengthPrefix,
    PyParam,
    PyParamLength,
    Word,
    Whitespace,
}

impl SqlTokenKind {
    pub fn name(self) -> &'static str {
        match self {
            SqlTokenKind::QuotedString => "quoted string",
            SqlTokenKind::QuotedIdentifier => "quoted identifier",
            SqlTokenKind::LineComment => "line comment",
            SqlTokenKind::BlockComment => "block comment",
            SqlTokenKind::ParamPrefix => "named parameter prefix",
            SqlTokenKind::ParamLengthPrefix => "named parameter length prefix",
            SqlTokenKind::PyParam => "python named parameter",
            SqlTokenKind::PyParamLength => "python named parameter length",
            SqlTokenKind::Word => "word",
            SqlTokenKind::Whitespace => "whitespace",
        }
    }
}

impl fmt::Display for SqlTokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Token patterns, in priority order.
const SQL_PATTERNS: [(SqlTokenKind, &str); 10] = [
    (SqlTokenKind::QuotedString, r"'[^']*'"),
    (SqlTokenKind::QuotedIdentifier, r#""([^"]*)""#),
    (SqlTokenKind::LineComment, r"--[^\n]*(?:\n|$)"),
    (SqlTokenKind::BlockComment, r"/\*+(?:[^*]|\*[^/])*\*+/"),
    (SqlTokenKind::ParamPrefix, r"[:@]"),
    (SqlTokenKind::ParamLengthPrefix, r"#:|#@"),
    (SqlTokenKind::PyParam, r"%\((\w+)\)s"),
    (SqlTokenKind::PyParamLength, r"#%\((\w+)\)s"),
    (SqlTokenKind::Word, r"\w+"),
    (SqlTokenKind::Whitespace, r"\s+"),
];

/// A SQL token.
pub type SqlToken<'t> = Token<'t, SqlTokenKind>;

/// Lookup of placeholder names.
pub trait Bindings {
    /// The value bound to `name`, if any.
    fn get(&self, name: &str) -> Option<&Value>;
}

impl<S: BuildHasher> Bindings for HashMap<String, Value, S> {
    fn get(&self, name: &str) -> Option<&Value> {
        HashMap::get(self, name)
    }
}

impl Bindings for BTreeMap<String, Value> {
    fn get(&self, name: &str) -> Option<&Value> {
        BTreeMap::get(self, name)
    }
}

impl Bindings for [(&str, Value)] {
    fn get(&self, name: &str) -> Option<&Value> {
        self.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }
}

impl<const N: usize> Bindings for [(&str, Value); N] {
    fn get(&self, name: &str) -> Option<&Value> {
        Bindings::get(self.as_slice(), name)
    }
}

/// What a placeholder is replaced with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// The bound value as a SQL literal.
    Value,
    /// The length of the bound value.
    Length,
}

/// How a placeholder was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Style {
    /// `:name`, `@name`, `#:name`, `#@name`
    Prefixed,
    /// `:"name"`, `@"name"`, `#:"name"`, `#@"name"`
    QuotedPrefixed,
    /// `%(name)s`, `#%(name)s`
    Python,
}

/// A placeholder found in a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placeholder<'t> {
    pub name: &'t str,
    pub target: Target,
    pub style: Style,
    /// Byte range from the prefix through the end of the name.
    pub range: Range<usize>,
}

/// State of the placeholder recognizer between tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParserState {
    /// Not inside a placeholder.
    #[default]
    Chillin,
    /// Read `:` or `@`, expecting a name.
    InParameter,
    /// Read `#:` or `#@`, expecting a name.
    InParameterLength,
}

/// What to do with a token's replacement text.
#[derive(Debug, Clone, PartialEq)]
enum Output<'t> {
    /// Append to the pending buffer.
    Push(&'t str),
    /// Commit the pending buffer, then start a new one with this text.
    Hold(&'t str),
    /// Drop the pending buffer and commit this text.
    Emit(String),
    /// Commit the pending buffer followed by this text.
    Flush(Cow<'t, str>),
}

#[derive(Debug, Clone, PartialEq)]
struct Transition<'t> {
    output: Output<'t>,
    next: ParserState,
}

impl<'t> Transition<'t> {
    fn new(output: Output<'t>, next: ParserState) -> Self {
        Self { output, next }
    }

    fn flush(text: &'t str) -> Self {
        Self::new(Output::Flush(Cow::Borrowed(text)), ParserState::Chillin)
    }
}

/// The name a prefix token is waiting for.
fn placeholder_name<'t>(token: &SqlToken<'t>) -> BindResult<(&'t str, Style)> {
    let name = match token.kind {
        Some(SqlTokenKind::Word) => Some((token.text, Style::Prefixed)),
        Some(SqlTokenKind::QuotedIdentifier) => {
            token.capture().map(|name| (name, Style::QuotedPrefixed))
        }
        _ => None,
    };
    name.ok_or_else(|| BindError::malformed(token.range.start, token.text))
}

/// Render the replacement for `name`, or `None` if it is unbound.
fn render<B: Bindings + ?Sized>(
    name: &str,
    target: Target,
    bindings: &B,
) -> BindResult<Option<String>> {
    let Some(value) = bindings.get(name) else {
        tracing::trace!(name, "unbound placeholder left as written");
        return Ok(None);
    };

    match target {
        Target::Value => encode(value).map(Some),
        Target::Length => match value.length() {
            Some(len) => Ok(Some(len.to_string())),
            None => Err(BindError::LengthNotSupported {
                name: name.to_string(),
                kind: value.kind(),
            }),
        },
    }
}

/// How a token moves the recognizer along, independent of any bindings.
#[derive(Debug, Clone, PartialEq)]
enum Step<'t> {
    /// Comment or whitespace; the state is unchanged.
    Skip,
    /// Plain text outside of a placeholder.
    Text,
    /// A prefix that starts a placeholder.
    Prefix(ParserState),
    /// The token completes a placeholder.
    Found {
        name: &'t str,
        target: Target,
        style: Style,
    },
}

fn recognize<'t>(state: ParserState, token: &SqlToken<'t>) -> BindResult<Step<'t>> {
    use SqlTokenKind as Kind;

    let step = match (state, token.kind) {
        (_, Some(Kind::LineComment | Kind::BlockComment | Kind::Whitespace)) => Step::Skip,
        (ParserState::Chillin, Some(kind @ (Kind::PyParam | Kind::PyParamLength))) => {
            let Some(name) = token.capture() else {
                return Ok(Step::Text);
            };
            Step::Found {
                name,
                target: if kind == Kind::PyParam {
                    Target::Value
                } else {
                    Target::Length
                },
                style: Style::Python,
            }
        }
        (ParserState::Chillin, Some(Kind::ParamPrefix)) => Step::Prefix(ParserState::InParameter),
        (ParserState::Chillin, Some(Kind::ParamLengthPrefix)) => {
            Step::Prefix(ParserState::InParameterLength)
        }
        (
            ParserState::Chillin,
            Some(Kind::QuotedString | Kind::QuotedIdentifier | Kind::Word) | None,
        ) => Step::Text,
        (ParserState::InParameter | ParserState::InParameterLength, _) => {
            let (name, style) = placeholder_name(token)?;
            Step::Found {
                name,
                target: if state == ParserState::InParameter {
                    Target::Value
                } else {
                    Target::Length
                },
                style,
            }
        }
    };

    Ok(step)
}

/// State machine transition function driven by a token.
fn transition<'t, B: Bindings + ?Sized>(
    state: ParserState,
    token: &SqlToken<'t>,
    bindings: &B,
) -> BindResult<Transition<'t>> {
    let text = token.text;
    let transition = match recognize(state, token)? {
        Step::Skip => Transition::new(Output::Push(text), state),
        Step::Text => Transition::flush(text),
        Step::Prefix(next) => Transition::new(Output::Hold(text), next),
        Step::Found {
            name,
            target,
            style,
        } => match render(name, target, bindings)? {
            // a python placeholder is one token, nothing is pending
            Some(sql) if style == Style::Python => {
                Transition::new(Output::Flush(Cow::Owned(sql)), ParserState::Chillin)
            }
            Some(sql) => Transition::new(Output::Emit(sql), ParserState::Chillin),
            None => Transition::flush(text),
        },
    };

    Ok(transition)
}

/// Committed output plus text withheld while a placeholder is resolved.
#[derive(Debug, Default)]
struct OutputBuffer {
    committed: String,
    pending: String,
}

impl OutputBuffer {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            committed: String::with_capacity(capacity),
            pending: String::new(),
        }
    }

    fn commit_pending(&mut self) {
        self.committed.push_str(&self.pending);
        self.pending.clear();
    }

    fn apply(&mut self, output: Output<'_>) {
        match output {
            Output::Push(text) => self.pending.push_str(text),
            Output::Hold(text) => {
                self.commit_pending();
                self.pending.push_str(text);
            }
            Output::Emit(text) => {
                self.pending.clear();
                self.committed.push_str(&text);
            }
            Output::Flush(text) => {
                self.commit_pending();
                self.committed.push_str(&text);
            }
        }
    }

    fn finish(mut self) -> String {
        self.commit_pending();
        self.committed
    }
}

/// Substitutes placeholders in SQL templates.
///
/// Holds the compiled SQL lexer; build one up front and share it by
/// reference, it is immutable and `Sync`.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use sqlbind::{Substituter, Value};
///
/// let substituter = Substituter::new().unwrap();
/// let mut bindings = HashMap::new();
/// bindings.insert("ids".to_string(), Value::from(vec![1, 2, 3]));
///
/// let sql = substituter
///     .substitute("select * from t where id in :ids limit #:ids", &bindings)
///     .unwrap();
/// assert_eq!(sql, "select * from t where id in (1, 2, 3) limit 3");
/// ```
#[derive(Debug, Clone)]
pub struct Substituter {
    lexer: Lexer<SqlTokenKind>,
}

impl Substituter {
    pub fn new() -> BindResult<Self> {
        Ok(Self {
            lexer: Lexer::new(SQL_PATTERNS)?,
        })
    }

    /// Lex `sql` with the SQL token patterns.
    pub fn tokens<'s, 't>(&'s self, sql: &'t str) -> Tokens<'s, 't, SqlTokenKind> {
        self.lexer.tokens(sql)
    }

    /// Replace bound placeholders in `sql` with their values.
    ///
    /// Unbound placeholders are left exactly as written. Input that ends
    /// right after a prefix keeps the prefix.
    pub fn substitute<B: Bindings + ?Sized>(&self, sql: &str, bindings: &B) -> BindResult<String> {
        let mut buffer = OutputBuffer::with_capacity(sql.len());
        let mut state = ParserState::default();

        for token in self.tokens(sql) {
            let Transition { output, next } = transition(state, &token, bindings)?;
            tracing::trace!(?state, ?next, text = token.text, "transition");
            buffer.apply(output);
            state = next;
        }

        let sql_out = buffer.finish();
        tracing::debug!(input = sql.len(), output = sql_out.len(), "substituted template");
        Ok(sql_out)
    }

    /// List the placeholders in `sql`, bound or not.
    pub fn placeholders<'t>(&self, sql: &'t str) -> BindResult<Vec<Placeholder<'t>>> {
        let mut found = Vec::new();
        let mut state = ParserState::Chillin;
        let mut start = 0;

        for token in self.tokens(sql) {
            match recognize(state, &token)? {
                Step::Skip | Step::Text => {}
                Step::Prefix(next) => {
                    state = next;
                    start = token.range.start;
                }
                Step::Found {
                    name,
                    target,
                    style,
                } => {
                    let range = if style == Style::Python {
                        token.range.clone()
                    } else {
                        start..token.range.end
                    };
                    found.push(Placeholder {
                        name,
                        target,
                        style,
                        range,
                    });
                    state = ParserState::Chillin;
                }
            }
        }

        Ok(found)
    }
}

/// Replace named placeholders in `sql` with values from `bindings`.
///
/// Builds a fresh [`Substituter`]; keep one around instead when rendering
/// many templates.
///
/// ```
/// use sqlbind::{substitute, Value};
///
/// let sql = substitute("select * from t where id = :x", &[("x", Value::from(5))]).unwrap();
/// assert_eq!(sql, "select * from t where id = 5");
/// ```
pub fn substitute<B: Bindings + ?Sized>(sql: &str, bindings: &B) -> BindResult<String> {
    Substituter::new()?.substitute(sql, bindings)
}
