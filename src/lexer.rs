//! Regular expression driven lexing.
//!
//! A [`Lexer`] is built from an ordered list of `(kind, pattern)` pairs. The
//! patterns are combined into one alternation, so when several of them could
//! match at the same position the one listed first wins. Scanning never fails:
//! text that no pattern matches comes out as a token with no kind.
//!
//! ```
//! use sqlbind::lexer::Lexer;
//!
//! let lexer = Lexer::new([("number", r"\d+"), ("name", r"[a-z]+")]).unwrap();
//! let kinds: Vec<_> = lexer.tokens("abc 42").map(|t| t.kind).collect();
//! assert_eq!(kinds, vec![Some("name"), None, Some("number")]);
//! ```

use std::fmt;
use std::iter::FusedIterator;
use std::ops::Range;

use regex::{Captures, Regex};
use serde::Serialize;

use crate::error::{BindError, BindResult};

/// A lexical token read from input text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token<'t, K> {
    /// Kind of the pattern that matched, or `None` for text no pattern matched.
    pub kind: Option<K>,
    /// The matched (or unmatched) input text.
    pub text: &'t str,
    /// Capturing subgroups declared inside the matching pattern, in order.
    /// `None` where a subgroup did not participate. Always empty when
    /// `kind` is `None`.
    pub captures: Vec<Option<&'t str>>,
    /// Byte range of `text` within the input.
    pub range: Range<usize>,
}

impl<'t, K> Token<'t, K> {
    fn unmatched(text: &'t str, range: Range<usize>) -> Self {
        Self {
            kind: None,
            text: &text[range.clone()],
            captures: Vec::new(),
            range,
        }
    }

    /// First capturing subgroup, if it participated in the match.
    pub fn capture(&self) -> Option<&'t str> {
        self.captures.first().copied().flatten()
    }
}

/// Where one pattern's groups live inside the combined regex.
#[derive(Debug, Clone)]
struct GroupSpec<K> {
    /// Group wrapping the whole pattern.
    group_index: usize,
    /// Capturing groups declared by the pattern itself.
    subgroups: Range<usize>,
    kind: K,
}

/// A compiled set of token patterns.
#[derive(Debug, Clone)]
pub struct Lexer<K> {
    /// `None` when built from an empty pattern list.
    regex: Option<Regex>,
    specs: Box<[GroupSpec<K>]>,
}

impl<K: Clone + fmt::Display> Lexer<K> {
    /// Compile `patterns`, an ordered list of token kinds and their regexes.
    ///
    /// Fails with [`BindError::Pattern`] if any pattern is not a valid
    /// regular expression.
    pub fn new<I, P>(patterns: I) -> BindResult<Self>
    where
        I: IntoIterator<Item = (K, P)>,
        P: AsRef<str>,
    {
        let mut specs = Vec::new();
        let mut alternatives = Vec::new();
        // Group 0 is the whole match.
        let mut next_group = 1;

        for (kind, pattern) in patterns {
            let pattern = pattern.as_ref();
            let compiled = Regex::new(pattern).map_err(|source| BindError::Pattern {
                kind: kind.to_string(),
                source,
            })?;
            let subgroup_count = compiled.captures_len() - 1;

            specs.push(GroupSpec {
                group_index: next_group,
                subgroups: next_group + 1..next_group + 1 + subgroup_count,
                kind,
            });
            alternatives.push(format!("({})", pattern));
            next_group += 1 + subgroup_count;
        }

        let regex = if alternatives.is_empty() {
            None
        } else {
            let combined = alternatives.join("|");
            let regex = Regex::new(&combined).map_err(|source| BindError::Pattern {
                kind: specs
                    .iter()
                    .map(|s| s.kind.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
                source,
            })?;
            Some(regex)
        };

        tracing::debug!(
            patterns = specs.len(),
            groups = next_group - 1,
            "compiled lexer"
        );

        Ok(Self {
            regex,
            specs: specs.into_boxed_slice(),
        })
    }
}

impl<K: Clone> Lexer<K> {
    /// Lazily scan `text` into tokens.
    pub fn tokens<'l, 't>(&'l self, text: &'t str) -> Tokens<'l, 't, K> {
        Tokens {
            lexer: self,
            text,
            cursor: 0,
            queued: None,
        }
    }

    /// Find the first non-empty match starting at or after `from`.
    fn next_match<'t>(&self, text: &'t str, mut from: usize) -> Option<Token<'t, K>> {
        let regex = self.regex.as_ref()?;

        loop {
            let caps = regex.captures_at(text, from)?;
            let whole = caps.get(0)?;
            if !whole.is_empty() {
                return Some(self.token_from(&caps, whole.range()));
            }
            // An empty match can't advance the cursor; retry one character on.
            let width = text[whole.start()..]
                .chars()
                .next()
                .map_or(1, char::len_utf8);
            from = whole.start() + width;
            if from > text.len() {
                return None;
            }
        }
    }

    fn token_from<'t>(&self, caps: &Captures<'t>, range: Range<usize>) -> Token<'t, K> {
        let text = caps.get(0).map_or("", |m| m.as_str());

        match self
            .specs
            .iter()
            .find(|spec| caps.get(spec.group_index).is_some())
        {
            Some(spec) => Token {
                kind: Some(spec.kind.clone()),
                text,
                captures: spec
                    .subgroups
                    .clone()
                    .map(|i| caps.get(i).map(|m| m.as_str()))
                    .collect(),
                range,
            },
            None => Token {
                kind: None,
                text,
                captures: Vec::new(),
                range,
            },
        }
    }
}

/// Iterator over the tokens of one input string. See [`Lexer::tokens`].
#[derive(Debug)]
pub struct Tokens<'l, 't, K> {
    lexer: &'l Lexer<K>,
    text: &'t str,
    cursor: usize,
    /// A matched token waiting behind the unmatched gap that preceded it.
    queued: Option<Token<'t, K>>,
}

impl<'t, K: Clone> Iterator for Tokens<'_, 't, K> {
    type Item = Token<'t, K>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(token) = self.queued.take() {
            return Some(token);
        }

        let start = self.cursor;
        let end = self.text.len();
        if start >= end {
            return None;
        }

        match self.lexer.next_match(self.text, start) {
            None => {
                self.cursor = end;
                Some(Token::unmatched(self.text, start..end))
            }
            Some(token) => {
                self.cursor = token.range.end;
                if token.range.start > start {
                    let gap = start..token.range.start;
                    self.queued = Some(token);
                    Some(Token::unmatched(self.text, gap))
                } else {
                    Some(token)
                }
            }
        }
    }
}

impl<K: Clone> FusedIterator for Tokens<'_, '_, K> {}

/// Build a [`Lexer`] from `patterns` and collect all tokens of `text`.
pub fn tokenize<'t, K, I, P>(text: &'t str, patterns: I) -> BindResult<Vec<Token<'t, K>>>
where
    K: Clone + fmt::Display,
    I: IntoIterator<Item = (K, P)>,
    P: AsRef<str>,
{
    Ok(Lexer::new(patterns)?.tokens(text).collect())
}
