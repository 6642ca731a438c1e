//! Route template parsing.
//!
//! A route template is the mini-language routes are registered with:
//!
//! ```text
//! api/{controller}/{action=Index}/{id:int:min(1)?}
//! files/{*path}
//! {name}.{ext?}
//! ```
//!
//! [`RoutePattern::parse`] turns a template into an immutable
//! [`RoutePattern`]: a list of [`PathSegment`]s, each made of literal text,
//! separators and at most non-adjacent [`ParameterPart`]s.
//!
//! # Syntax
//!
//! | Form | Meaning |
//! |------|---------|
//! | `{name}` | required parameter |
//! | `{name?}` | optional parameter |
//! | `{name=value}` | parameter with a default |
//! | `{*name}` | catch-all, matches the remaining path |
//! | `{name:c1:c2(arg)}` | inline constraints, split on top-level `:` |
//! | `{{` / `}}` | literal braces |
//!
//! A single leading `/` or `~/` is accepted and ignored; anything else
//! starting with `/` or `~` is rejected.
//!
//! [`RoutePattern`] implements [`Display`](fmt::Display), producing a
//! canonical template that parses back to an equivalent pattern.

use crate::error::{TemplateErrorKind, TemplateParseError};
use crate::values::{values_equal, RouteValues};
use std::fmt;

// ============================================================================
// Pattern model
// ============================================================================

/// How a parameter participates in matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    /// Must be present.
    Standard,
    /// May be absent (`{id?}`).
    Optional,
    /// Consumes every remaining segment (`{*path}`).
    CatchAll,
}

/// One inline constraint token, e.g. `int` or `range(1,10)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineConstraint {
    text: String,
    name: String,
    argument: Option<String>,
}

impl InlineConstraint {
    /// Split a token into name and argument string.
    ///
    /// The argument is the text between the first `(` and a trailing `)`.
    /// A token with an unterminated `(` is kept whole as its name.
    ///
    /// ```
    /// use route_trie::InlineConstraint;
    ///
    /// let c = InlineConstraint::parse("range(1,(2))");
    /// assert_eq!(c.name(), "range");
    /// assert_eq!(c.argument(), Some("1,(2)"));
    ///
    /// assert_eq!(InlineConstraint::parse("int").argument(), None);
    /// ```
    pub fn parse(token: &str) -> Self {
        let (name, argument) = match token.find('(') {
            Some(open) if token.ends_with(')') => (
                &token[..open],
                Some(token[open + 1..token.len() - 1].to_string()),
            ),
            _ => (token, None),
        };
        Self {
            text: token.to_string(),
            name: name.to_string(),
            argument,
        }
    }

    /// The full token text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The policy name (registry key).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The raw argument string, without parentheses.
    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }
}

/// A named parameter inside a segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterPart {
    name: String,
    kind: ParameterKind,
    default: Option<String>,
    constraints: Vec<InlineConstraint>,
    /// Set when policies were attached at registration instead of inline.
    has_explicit_policies: bool,
}

impl ParameterPart {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ParameterKind {
        self.kind
    }

    pub fn is_optional(&self) -> bool {
        self.kind == ParameterKind::Optional
    }

    pub fn is_catch_all(&self) -> bool {
        self.kind == ParameterKind::CatchAll
    }

    /// Default value, inline or supplied at registration.
    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn constraints(&self) -> &[InlineConstraint] {
        &self.constraints
    }

    /// `true` if the parameter carries an inline constraint or a policy
    /// attached at registration.
    pub fn is_constrained(&self) -> bool {
        !self.constraints.is_empty() || self.has_explicit_policies
    }

    /// `true` if the parameter's segment may be missing from a path.
    pub fn can_be_absent(&self) -> bool {
        self.kind != ParameterKind::Standard || self.default.is_some()
    }

    /// Whether `/` inside a generated value is percent-encoded.
    ///
    /// Catch-all values keep their slashes so the path structure survives.
    pub fn encode_slashes(&self) -> bool {
        !self.is_catch_all()
    }
}

/// A piece of a path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart {
    /// Literal text, matched case-insensitively.
    Literal(String),
    /// A literal `.` that precedes an optional parameter; only emitted when
    /// that parameter has a value.
    Separator(String),
    /// A parameter.
    Parameter(ParameterPart),
}

impl TemplatePart {
    pub fn as_parameter(&self) -> Option<&ParameterPart> {
        match self {
            TemplatePart::Parameter(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_parameter(&self) -> bool {
        matches!(self, TemplatePart::Parameter(_))
    }
}

/// The text between two `/` separators of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    parts: Vec<TemplatePart>,
}

impl PathSegment {
    pub fn parts(&self) -> &[TemplatePart] {
        &self.parts
    }

    /// A simple segment has exactly one part. Anything else is complex and is
    /// matched as an opaque unit.
    pub fn is_simple(&self) -> bool {
        self.parts.len() == 1
    }

    /// The parameter of a simple parameter segment.
    pub fn as_parameter(&self) -> Option<&ParameterPart> {
        match self.parts.as_slice() {
            [TemplatePart::Parameter(p)] => Some(p),
            _ => None,
        }
    }

    /// The text of a simple literal segment.
    pub fn as_literal(&self) -> Option<&str> {
        match self.parts.as_slice() {
            [TemplatePart::Literal(text)] => Some(text),
            _ => None,
        }
    }

    fn parameters_mut(&mut self) -> impl Iterator<Item = &mut ParameterPart> {
        self.parts.iter_mut().filter_map(|part| match part {
            TemplatePart::Parameter(p) => Some(p),
            _ => None,
        })
    }
}

/// A parsed, immutable route template.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    raw_text: String,
    segments: Vec<PathSegment>,
    defaults: RouteValues,
    required_values: RouteValues,
}

impl RoutePattern {
    /// Parse a route template.
    ///
    /// # Examples
    ///
    /// ```
    /// use route_trie::RoutePattern;
    ///
    /// let pattern = RoutePattern::parse("/api/{controller}/{action=Index}/{id?}").unwrap();
    /// assert_eq!(pattern.segments().len(), 4);
    /// assert_eq!(pattern.defaults().get("action"), Some("Index"));
    /// assert!(pattern.parameter("id").unwrap().is_optional());
    ///
    /// assert!(RoutePattern::parse("{*rest}/tail").is_err());
    /// ```
    pub fn parse(template: &str) -> Result<Self, TemplateParseError> {
        let text = template
            .strip_prefix("~/")
            .or_else(|| template.strip_prefix('/'))
            .unwrap_or(template);

        if text.starts_with('/') || text.starts_with('~') {
            return Err(TemplateParseError::new(
                template,
                TemplateErrorKind::InvalidLeadingCharacter,
            ));
        }

        let mut parser = TemplateParser {
            text,
            pos: 0,
            seen: Vec::new(),
        };
        let segments = parser
            .parse_segments()
            .map_err(|kind| TemplateParseError::new(template, kind))?;

        // Catch-alls may only live in the final segment.
        if let Some((_, init)) = segments.split_last() {
            for segment in init {
                if let Some(p) = segment.parts.iter().filter_map(TemplatePart::as_parameter).find(|p| p.is_catch_all()) {
                    return Err(TemplateParseError::new(
                        template,
                        TemplateErrorKind::CatchAllMustBeLast(p.name.clone()),
                    ));
                }
            }
        }

        let mut defaults = RouteValues::new();
        for segment in &segments {
            for p in segment.parts.iter().filter_map(TemplatePart::as_parameter) {
                if let Some(value) = &p.default {
                    defaults.insert(p.name.clone(), value.clone());
                }
            }
        }

        Ok(Self {
            raw_text: template.to_string(),
            segments,
            defaults,
            required_values: RouteValues::new(),
        })
    }

    /// Attach defaults declared outside the template.
    ///
    /// A default for a parameter that already has an inline default is a
    /// conflict. Defaults for names that are not parameters are kept and act
    /// as fixed values of the route.
    pub fn with_defaults(mut self, defaults: &RouteValues) -> Result<Self, TemplateParseError> {
        for (key, value) in defaults.iter() {
            let mut conflict = false;
            for segment in &mut self.segments {
                for p in segment.parameters_mut() {
                    if values_equal(&p.name, key) {
                        if p.default.is_some() {
                            conflict = true;
                        } else if p.is_optional() {
                            return Err(TemplateParseError::new(
                                &self.raw_text,
                                TemplateErrorKind::OptionalWithDefault(p.name.clone()),
                            ));
                        } else {
                            p.default = Some(value.to_string());
                        }
                    }
                }
            }
            if conflict {
                return Err(TemplateParseError::new(
                    &self.raw_text,
                    TemplateErrorKind::ConflictingDefault(key.to_string()),
                ));
            }
            self.defaults.insert(key, value);
        }
        Ok(self)
    }

    /// Attach the values a caller must supply (or leave implicit) for link
    /// generation to pick this route. An empty value means "must be absent".
    pub fn with_required_values(mut self, required: RouteValues) -> Self {
        self.required_values = required;
        self
    }

    /// Record that `name` has policies beyond its inline constraints.
    pub(crate) fn mark_constrained(&mut self, name: &str) {
        for segment in &mut self.segments {
            for p in segment.parameters_mut() {
                if values_equal(&p.name, name) {
                    p.has_explicit_policies = true;
                }
            }
        }
    }

    /// The template exactly as registered.
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Every parameter, left to right.
    pub fn parameters(&self) -> impl Iterator<Item = &ParameterPart> {
        self.segments
            .iter()
            .flat_map(|s| s.parts.iter())
            .filter_map(TemplatePart::as_parameter)
    }

    /// Look up a parameter by name, case-insensitively.
    pub fn parameter(&self, name: &str) -> Option<&ParameterPart> {
        self.parameters()
            .find(|p| values_equal(&p.name, name))
    }

    /// Defaults for parameters plus fixed non-parameter values.
    pub fn defaults(&self) -> &RouteValues {
        &self.defaults
    }

    pub fn required_values(&self) -> &RouteValues {
        &self.required_values
    }

    /// `true` if the segments from `index` onward may all be absent from a
    /// path, i.e. each is a simple optional, defaulted or catch-all parameter.
    pub fn remaining_segments_can_be_absent(&self, index: usize) -> bool {
        self.segments[index..]
            .iter()
            .all(|s| s.as_parameter().is_some_and(ParameterPart::can_be_absent))
    }

    /// Structural equality: same segments, parameters and constraints.
    pub fn is_equivalent(&self, other: &RoutePattern) -> bool {
        self.segments == other.segments
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            for part in &segment.parts {
                match part {
                    TemplatePart::Literal(text) => write_escaped(f, text)?,
                    TemplatePart::Separator(text) => f.write_str(text)?,
                    TemplatePart::Parameter(p) => {
                        f.write_str("{")?;
                        if p.is_catch_all() {
                            f.write_str("*")?;
                        }
                        write_escaped(f, &p.name)?;
                        for constraint in &p.constraints {
                            f.write_str(":")?;
                            write_escaped(f, &constraint.text)?;
                        }
                        if let Some(default) = &p.default {
                            f.write_str("=")?;
                            write_escaped(f, default)?;
                        }
                        if p.is_optional() {
                            f.write_str("?")?;
                        }
                        f.write_str("}")?;
                    }
                }
            }
        }
        Ok(())
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    for c in text.chars() {
        match c {
            '{' => f.write_str("{{")?,
            '}' => f.write_str("}}")?,
            _ => write!(f, "{}", c)?,
        }
    }
    Ok(())
}

// ============================================================================
// Parser
// ============================================================================

const INVALID_NAME_CHARS: &[char] = &['{', '}', '/', '?', '*'];

struct TemplateParser<'a> {
    text: &'a str,
    pos: usize,
    seen: Vec<String>,
}

type ParseResult<T> = Result<T, TemplateErrorKind>;

impl<'a> TemplateParser<'a> {
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.text[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn advance(&mut self, c: char) {
        self.pos += c.len_utf8();
    }

    fn parse_segments(&mut self) -> ParseResult<Vec<PathSegment>> {
        let mut segments = Vec::new();
        if self.text.is_empty() {
            return Ok(segments);
        }

        loop {
            let segment = self.parse_segment()?;
            if segment.parts.is_empty() {
                return Err(TemplateErrorKind::ConsecutiveSeparators);
            }
            segments.push(segment);

            match self.peek() {
                None => break,
                Some(_) => {
                    // parse_segment only stops at '/' or the end of input.
                    self.advance('/');
                    // A single trailing separator is tolerated.
                    if self.peek().is_none() {
                        break;
                    }
                }
            }
        }

        Ok(segments)
    }

    fn parse_segment(&mut self) -> ParseResult<PathSegment> {
        let mut parts = Vec::new();
        let mut literal = String::new();

        while let Some(c) = self.peek() {
            match c {
                '/' => break,
                '{' if self.peek_second() == Some('{') => {
                    literal.push('{');
                    self.pos += 2;
                }
                '{' => {
                    flush_literal(&mut literal, &mut parts)?;
                    let parameter = self.parse_parameter()?;
                    parts.push(TemplatePart::Parameter(parameter));
                }
                '}' if self.peek_second() == Some('}') => {
                    literal.push('}');
                    self.pos += 2;
                }
                '}' => return Err(TemplateErrorKind::UnmatchedCloseBrace),
                _ => {
                    literal.push(c);
                    self.advance(c);
                }
            }
        }
        flush_literal(&mut literal, &mut parts)?;

        validate_segment(&mut parts)?;
        Ok(PathSegment { parts })
    }

    /// Parse `{...}` starting at the opening brace.
    fn parse_parameter(&mut self) -> ParseResult<ParameterPart> {
        self.advance('{');
        let mut raw = String::new();

        loop {
            let Some(c) = self.peek() else {
                return Err(TemplateErrorKind::MismatchedParameter);
            };
            match c {
                '{' if self.peek_second() == Some('{') => {
                    raw.push('{');
                    self.pos += 2;
                }
                '{' => return Err(TemplateErrorKind::UnescapedBrace),
                '}' if self.peek_second() == Some('}') => {
                    raw.push('}');
                    self.pos += 2;
                }
                '}' => {
                    self.advance('}');
                    break;
                }
                _ => {
                    raw.push(c);
                    self.advance(c);
                }
            }
        }

        let parameter = parse_parameter_text(&raw)?;
        if self
            .seen
            .iter()
            .any(|name| values_equal(name, &parameter.name))
        {
            return Err(TemplateErrorKind::RepeatedParameter(parameter.name));
        }
        self.seen.push(parameter.name.clone());
        Ok(parameter)
    }
}

fn flush_literal(literal: &mut String, parts: &mut Vec<TemplatePart>) -> ParseResult<()> {
    if literal.is_empty() {
        return Ok(());
    }
    if literal.contains('?') {
        return Err(TemplateErrorKind::InvalidLiteral(std::mem::take(literal)));
    }
    parts.push(TemplatePart::Literal(std::mem::take(literal)));
    Ok(())
}

/// Parse the unescaped text between a parameter's braces.
fn parse_parameter_text(raw: &str) -> ParseResult<ParameterPart> {
    let (mut text, catch_all) = match raw.strip_prefix('*') {
        Some(rest) => (rest, true),
        None => (raw, false),
    };
    let optional = text.ends_with('?');
    if optional {
        text = &text[..text.len() - 1];
    }

    // A name may start with ':' or '='; only later occurrences delimit it.
    let name_end = text
        .bytes()
        .enumerate()
        .position(|(i, b)| i > 0 && (b == b':' || b == b'='))
        .unwrap_or(text.len());
    let name = &text[..name_end];
    let mut rest = &text[name_end..];

    if name.is_empty() || name.contains(INVALID_NAME_CHARS) {
        return Err(TemplateErrorKind::InvalidParameterName(name.to_string()));
    }

    let mut constraints = Vec::new();
    while let Some(after) = rest.strip_prefix(':') {
        let end = constraint_end(after);
        let token = &after[..end];
        if !token.is_empty() {
            constraints.push(InlineConstraint::parse(token));
        }
        rest = &after[end..];
    }

    let default = rest.strip_prefix('=').map(str::to_string);

    if catch_all && optional {
        return Err(TemplateErrorKind::CatchAllCannotBeOptional(name.to_string()));
    }
    if optional && default.is_some() {
        return Err(TemplateErrorKind::OptionalWithDefault(name.to_string()));
    }

    let kind = if catch_all {
        ParameterKind::CatchAll
    } else if optional {
        ParameterKind::Optional
    } else {
        ParameterKind::Standard
    };

    Ok(ParameterPart {
        name: name.to_string(),
        kind,
        default,
        constraints,
        has_explicit_policies: false,
    })
}

/// Index of the first `:` or `=` outside parentheses, or the text length.
fn constraint_end(text: &str) -> usize {
    let mut depth = 0usize;
    for (i, b) in text.bytes().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b':' | b'=' if depth == 0 => return i,
            _ => {}
        }
    }
    text.len()
}

fn validate_segment(parts: &mut [TemplatePart]) -> ParseResult<()> {
    if parts.len() > 1 {
        if let Some(p) = parts
            .iter()
            .filter_map(TemplatePart::as_parameter)
            .find(|p| p.is_catch_all())
        {
            return Err(TemplateErrorKind::CatchAllInComplexSegment(p.name.clone()));
        }
    }

    if parts
        .windows(2)
        .any(|pair| pair[0].is_parameter() && pair[1].is_parameter())
    {
        return Err(TemplateErrorKind::ConsecutiveParameters);
    }

    let last = parts.len().saturating_sub(1);
    for i in 0..parts.len() {
        let Some(name) = parts[i]
            .as_parameter()
            .filter(|p| p.is_optional())
            .map(|p| p.name.clone())
        else {
            continue;
        };
        if i != last {
            return Err(TemplateErrorKind::OptionalNotLast(name));
        }
        if i > 0 {
            let after_period = matches!(&parts[i - 1], TemplatePart::Literal(text) if text == ".");
            if !after_period {
                return Err(TemplateErrorKind::OptionalNotAfterPeriod(name));
            }
            parts[i - 1] = TemplatePart::Separator(".".to_string());
        }
    }

    Ok(())
}
