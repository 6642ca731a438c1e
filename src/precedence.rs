//! Template precedence.
//!
//! Precedence ranks templates by how specific each segment is. It is a
//! decimal number with one digit per segment: the first segment is the integer
//! part, later segments are successive fractional digits.
//!
//! | Segment | Inbound digit | Outbound digit |
//! |---------|---------------|----------------|
//! | literal | 1 | 5 |
//! | complex (`{a}-{b}`) | 2 | 4 |
//! | constrained parameter | 2 | 4 |
//! | parameter | 3 | 3 |
//! | constrained catch-all | 4 | 2 |
//! | catch-all | 5 | 1 |
//!
//! Inbound precedence orders matches: **lower** is more specific. Outbound
//! precedence orders link generation candidates: **higher** is more specific.

use crate::template::{PathSegment, RoutePattern};
use std::cmp::Ordering;
use std::fmt;

/// A decimal precedence value, stored as its digit sequence.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Precedence {
    digits: Vec<u8>,
}

impl Precedence {
    /// Inbound precedence of a pattern (lower wins).
    ///
    /// ```
    /// use route_trie::{Precedence, RoutePattern};
    ///
    /// let literal = RoutePattern::parse("Customer/Index/{id}").unwrap();
    /// let catch_all = RoutePattern::parse("{controller}/{action}/{*parameters}").unwrap();
    ///
    /// assert!(Precedence::inbound(&literal) < Precedence::inbound(&catch_all));
    /// assert_eq!(Precedence::inbound(&literal).to_string(), "1.13");
    /// ```
    pub fn inbound(pattern: &RoutePattern) -> Self {
        Self::from_digits(pattern.segments().iter().map(inbound_digit))
    }

    /// Outbound precedence of a pattern (higher wins).
    pub fn outbound(pattern: &RoutePattern) -> Self {
        Self::from_digits(pattern.segments().iter().map(outbound_digit))
    }

    fn from_digits(digits: impl Iterator<Item = u8>) -> Self {
        let mut digits: Vec<u8> = digits.collect();
        while digits.last() == Some(&0) {
            digits.pop();
        }
        Self { digits }
    }

    /// The per-segment digits, most significant first.
    pub fn digits(&self) -> &[u8] {
        &self.digits
    }
}

fn inbound_digit(segment: &PathSegment) -> u8 {
    if !segment.is_simple() {
        return 2;
    }
    match segment.as_parameter() {
        None => 1,
        Some(p) => match (p.is_catch_all(), p.is_constrained()) {
            (false, true) => 2,
            (false, false) => 3,
            (true, true) => 4,
            (true, false) => 5,
        },
    }
}

fn outbound_digit(segment: &PathSegment) -> u8 {
    if !segment.is_simple() {
        return 4;
    }
    match segment.as_parameter() {
        None => 5,
        Some(p) => match (p.is_catch_all(), p.is_constrained()) {
            (false, true) => 4,
            (false, false) => 3,
            (true, true) => 2,
            (true, false) => 1,
        },
    }
}

impl Ord for Precedence {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.digits.len().max(other.digits.len());
        for i in 0..len {
            let a = self.digits.get(i).copied().unwrap_or(0);
            let b = other.digits.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => {}
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Precedence {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Precedence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.digits.split_first() {
            None => f.write_str("0"),
            Some((first, rest)) => {
                write!(f, "{}", first)?;
                if !rest.is_empty() {
                    f.write_str(".")?;
                    for digit in rest {
                        write!(f, "{}", digit)?;
                    }
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for Precedence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Precedence({})", self)
    }
}
