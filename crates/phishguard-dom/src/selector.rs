//! CSS-subset selectors for platform probes
//!
//! Host applications are queried with a small, fixed selector grammar:
//! tag names, `#id`, `.class`, attribute tests (`[attr]`, `[attr="v"]`,
//! `[attr*="v"]`), compounds of those, and the descendant combinator.
//! That is the full set the platform probe tables need; anything fancier
//! belongs in a new probe, not in the grammar.

use crate::document::Element;
use smallvec::SmallVec;

/// Attribute test inside a compound selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AttrTest {
    /// `[attr]` - attribute present
    Exists(String),
    /// `[attr="v"]` - attribute equals value
    Equals(String, String),
    /// `[attr*="v"]` - attribute value contains substring
    Contains(String, String),
}

impl AttrTest {
    fn matches(&self, element: &Element) -> bool {
        match self {
            Self::Exists(name) => element.attr(name).is_some(),
            Self::Equals(name, value) => element.attr(name) == Some(value.as_str()),
            Self::Contains(name, value) => {
                element.attr(name).is_some_and(|v| v.contains(value.as_str()))
            }
        }
    }
}

/// One compound selector (everything between descendant combinators)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct Compound {
    pub(crate) tag: Option<String>,
    pub(crate) id: Option<String>,
    pub(crate) classes: SmallVec<[String; 2]>,
    pub(crate) attrs: SmallVec<[AttrTest; 2]>,
}

impl Compound {
    /// Test a single element against this compound, ignoring ancestry.
    pub(crate) fn matches(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if element.tag() != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| element.has_class(c)) {
            return false;
        }
        self.attrs.iter().all(|a| a.matches(element))
    }

    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.id.is_none() && self.classes.is_empty() && self.attrs.is_empty()
    }
}

/// A parsed selector: one or more compounds joined by descendant combinators
///
/// An element matches when it satisfies the last compound and has ancestors
/// satisfying the earlier compounds in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub(crate) parts: SmallVec<[Compound; 2]>,
}

impl Selector {
    /// Parse a selector string
    ///
    /// # Errors
    /// `SelectorError` when the input is empty or malformed.
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let mut parts: SmallVec<[Compound; 2]> = SmallVec::new();
        for raw in split_compounds(input) {
            parts.push(parse_compound(raw)?);
        }
        if parts.is_empty() {
            return Err(SelectorError::Empty);
        }
        Ok(Self { parts })
    }

    /// Parse a selector known at compile time.
    ///
    /// Probe tables carry literal selectors; a malformed literal is a defect
    /// in the table, not a runtime condition worth propagating. On error this
    /// logs and returns a selector that matches nothing, so the probe chain
    /// degrades to its next candidate.
    #[must_use]
    pub fn parse_static(input: &str) -> Self {
        match Self::parse(input) {
            Ok(sel) => sel,
            Err(e) => {
                tracing::error!(selector = input, error = %e, "invalid static selector");
                Self::never()
            }
        }
    }

    /// A selector that matches no element
    #[inline]
    #[must_use]
    pub fn never() -> Self {
        Self { parts: SmallVec::new() }
    }

    /// Whether this selector can never match
    #[inline]
    #[must_use]
    pub fn is_never(&self) -> bool {
        self.parts.is_empty()
    }
}

impl std::str::FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Selector parse failures
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SelectorError {
    /// Empty selector string
    #[error("empty selector")]
    Empty,

    /// Unterminated attribute test
    #[error("unterminated attribute test in {0:?}")]
    UnterminatedAttr(String),

    /// Unexpected character
    #[error("unexpected character {found:?} in {input:?}")]
    UnexpectedChar {
        /// Offending character
        found: char,
        /// Compound being parsed
        input: String,
    },

    /// Empty name after `.`, `#`, or inside `[...]`
    #[error("missing name in {0:?}")]
    MissingName(String),
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Split a selector into compounds at descendant combinators.
///
/// Whitespace inside an attribute test or a quoted value is part of the
/// compound, not a combinator (`[aria-label="Message body"]` is one token).
fn split_compounds(input: &str) -> SmallVec<[&str; 2]> {
    let mut parts: SmallVec<[&str; 2]> = SmallVec::new();
    let mut start = None;
    let mut in_quotes = false;
    let mut in_brackets = false;
    for (i, c) in input.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '[' if !in_quotes => in_brackets = true,
            ']' if !in_quotes => in_brackets = false,
            c if c.is_whitespace() && !in_quotes && !in_brackets => {
                if let Some(s) = start.take() {
                    parts.push(&input[s..i]);
                }
                continue;
            }
            _ => {}
        }
        if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        parts.push(&input[s..]);
    }
    parts
}

fn parse_compound(raw: &str) -> Result<Compound, SelectorError> {
    let mut compound = Compound::default();
    let mut chars = raw.chars().peekable();

    let take_name = |chars: &mut std::iter::Peekable<std::str::Chars<'_>>| {
        let mut name = String::new();
        while let Some(&c) = chars.peek() {
            if is_name_char(c) {
                name.push(c);
                chars.next();
            } else {
                break;
            }
        }
        name
    };

    // Leading tag name, if any
    if chars.peek().is_some_and(|c| is_name_char(*c)) {
        compound.tag = Some(take_name(&mut chars));
    }

    while let Some(&c) = chars.peek() {
        match c {
            '.' => {
                chars.next();
                let name = take_name(&mut chars);
                if name.is_empty() {
                    return Err(SelectorError::MissingName(raw.to_string()));
                }
                compound.classes.push(name);
            }
            '#' => {
                chars.next();
                let name = take_name(&mut chars);
                if name.is_empty() {
                    return Err(SelectorError::MissingName(raw.to_string()));
                }
                compound.id = Some(name);
            }
            '[' => {
                chars.next();
                compound.attrs.push(parse_attr_test(raw, &mut chars)?);
            }
            other => {
                return Err(SelectorError::UnexpectedChar {
                    found: other,
                    input: raw.to_string(),
                })
            }
        }
    }

    if compound.is_empty() {
        return Err(SelectorError::MissingName(raw.to_string()));
    }
    Ok(compound)
}

fn parse_attr_test(
    raw: &str,
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Result<AttrTest, SelectorError> {
    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if is_name_char(c) {
            name.push(c);
            chars.next();
        } else {
            break;
        }
    }
    if name.is_empty() {
        return Err(SelectorError::MissingName(raw.to_string()));
    }

    match chars.next() {
        Some(']') => Ok(AttrTest::Exists(name)),
        Some('=') => {
            let value = take_attr_value(raw, chars)?;
            Ok(AttrTest::Equals(name, value))
        }
        Some('*') => {
            if chars.next() != Some('=') {
                return Err(SelectorError::UnterminatedAttr(raw.to_string()));
            }
            let value = take_attr_value(raw, chars)?;
            Ok(AttrTest::Contains(name, value))
        }
        _ => Err(SelectorError::UnterminatedAttr(raw.to_string())),
    }
}

fn take_attr_value(
    raw: &str,
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Result<String, SelectorError> {
    let quoted = chars.peek() == Some(&'"');
    if quoted {
        chars.next();
    }
    let mut value = String::new();
    for c in chars.by_ref() {
        match c {
            '"' if quoted => {
                // Expect the closing bracket next
                break;
            }
            ']' if !quoted => return Ok(value),
            _ => value.push(c),
        }
    }
    if quoted {
        // Consume the trailing ']'
        return match chars.next() {
            Some(']') => Ok(value),
            _ => Err(SelectorError::UnterminatedAttr(raw.to_string())),
        };
    }
    Err(SelectorError::UnterminatedAttr(raw.to_string()))
}
