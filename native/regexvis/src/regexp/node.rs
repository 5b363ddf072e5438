//! Regular expression tree nodes.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::regexp::symbol::{EPSILON, is_epsilon};

/// The top level operator of a [`RegexNode`].
///
/// The declaration order is the operator rank used by the total order on
/// nodes, so it must not be rearranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operator {
    None,
    Star,
    Plus,
    Option,
    Sequence,
    Choice,
}

impl Operator {
    /// True for the postfix operators `*`, `+` and `?`.
    pub fn is_unary(self) -> bool {
        matches!(self, Operator::Star | Operator::Plus | Operator::Option)
    }

    /// Binding strength used for printing. Higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            Operator::None => 3,
            Operator::Star | Operator::Plus | Operator::Option => 2,
            Operator::Sequence => 1,
            Operator::Choice => 0,
        }
    }

    fn suffix(self) -> Option<char> {
        match self {
            Operator::Star => Some('*'),
            Operator::Plus => Some('+'),
            Operator::Option => Some('?'),
            _ => None,
        }
    }
}

#[derive(Debug)]
enum Body {
    Char(char),
    Operands(Vec<RegexNode>),
}

#[derive(Debug)]
struct Node {
    operator: Operator,
    body: Body,
}

/// An immutable, reference-shared regular expression tree.
///
/// A node is either a single character (possibly the epsilon symbol), or an
/// operator applied to an ordered list of operands. A unary operator applied
/// directly to a bare character is stored in the single-character form, so
/// `a*` is one node. SEQUENCE and CHOICE are flattened on construction: an
/// operand with the same operator as its parent is spliced into the parent,
/// and a one-operand list collapses to the operand itself.
///
/// Cloning is cheap; sub-trees are shared, never copied.
#[derive(Clone)]
pub struct RegexNode {
    inner: Arc<Node>,
}

impl RegexNode {
    fn from_node(operator: Operator, body: Body) -> Self {
        Self {
            inner: Arc::new(Node { operator, body }),
        }
    }

    /// A bare character.
    pub fn char(c: char) -> Self {
        Self::from_node(Operator::None, Body::Char(c))
    }

    /// The epsilon leaf.
    pub fn epsilon() -> Self {
        Self::char(EPSILON)
    }

    /// Apply `*` to `operand`.
    pub fn star(operand: RegexNode) -> Self {
        Self::wrap(Operator::Star, operand)
    }

    /// Apply `+` to `operand`.
    pub fn plus(operand: RegexNode) -> Self {
        Self::wrap(Operator::Plus, operand)
    }

    /// Apply `?` to `operand`.
    pub fn option(operand: RegexNode) -> Self {
        Self::wrap(Operator::Option, operand)
    }

    /// Apply a unary operator to `operand`.
    ///
    /// Fails with [`Error::IllegalArgument`] if `operator` is not one of
    /// STAR, PLUS or OPTION.
    pub fn unary(operator: Operator, operand: RegexNode) -> Result<Self> {
        if !operator.is_unary() {
            return Err(Error::illegal(format!(
                "{operator:?} is not a unary operator"
            )));
        }
        Ok(Self::wrap(operator, operand))
    }

    /// Build a node from an operator and its operands.
    ///
    /// Unary operators require exactly one operand, SEQUENCE and CHOICE at
    /// least one. NONE is only valid for characters; use [`RegexNode::char`].
    pub fn compound(operator: Operator, operands: Vec<RegexNode>) -> Result<Self> {
        if operands.is_empty() {
            return Err(Error::illegal("no operands passed"));
        }
        match operator {
            Operator::None => Err(Error::illegal(
                "NONE only allowed for single character expressions",
            )),
            op if op.is_unary() => {
                let mut operands = operands;
                match (operands.pop(), operands.is_empty()) {
                    (Some(operand), true) => Ok(Self::wrap(op, operand)),
                    _ => Err(Error::illegal(
                        "multiple operands passed for a unary operator",
                    )),
                }
            }
            op => Ok(Self::join(op, operands)),
        }
    }

    /// Shorthand for a SEQUENCE of `operands`.
    pub fn sequence(operands: Vec<RegexNode>) -> Result<Self> {
        Self::compound(Operator::Sequence, operands)
    }

    /// Shorthand for a CHOICE between `operands`.
    pub fn choice(operands: Vec<RegexNode>) -> Result<Self> {
        Self::compound(Operator::Choice, operands)
    }

    pub(crate) fn wrap(operator: Operator, operand: RegexNode) -> Self {
        // Only a bare character folds in; `a*` under another operator stays nested.
        match (operand.operator(), operand.char_value()) {
            (Operator::None, Some(c)) => Self::from_node(operator, Body::Char(c)),
            _ => Self::from_node(operator, Body::Operands(vec![operand])),
        }
    }

    /// Flatten and collapse a SEQUENCE or CHOICE operand list.
    ///
    /// An empty list yields epsilon.
    pub(crate) fn join(operator: Operator, operands: Vec<RegexNode>) -> Self {
        let mut flat = Vec::with_capacity(operands.len());
        for operand in operands {
            if operand.operator() == operator {
                flat.extend(operand.operands().iter().cloned());
            } else {
                flat.push(operand);
            }
        }
        match flat.len() {
            0 => Self::epsilon(),
            1 => flat.remove(0),
            _ => Self::from_node(operator, Body::Operands(flat)),
        }
    }

    pub fn operator(&self) -> Operator {
        self.inner.operator
    }

    /// True if this node stores a character rather than operands.
    pub fn is_single_char(&self) -> bool {
        matches!(self.inner.body, Body::Char(_))
    }

    /// The character of a single-character node.
    pub fn char_value(&self) -> Option<char> {
        match self.inner.body {
            Body::Char(c) => Some(c),
            Body::Operands(_) => None,
        }
    }

    /// The operand list; empty for single-character nodes.
    pub fn operands(&self) -> &[RegexNode] {
        match &self.inner.body {
            Body::Char(_) => &[],
            Body::Operands(operands) => operands,
        }
    }

    /// The operand of a unary node, unwrapping the single-character form.
    pub fn operand(&self) -> Option<RegexNode> {
        if !self.operator().is_unary() {
            return None;
        }
        match &self.inner.body {
            Body::Char(c) => Some(Self::char(*c)),
            Body::Operands(operands) => operands.first().cloned(),
        }
    }

    /// True for the bare epsilon leaf.
    pub fn is_epsilon(&self) -> bool {
        self.operator() == Operator::None && self.char_value().is_some_and(is_epsilon)
    }

    /// True for a bare character that is not epsilon.
    pub fn is_symbol(&self) -> bool {
        self.operator() == Operator::None && !self.is_epsilon()
    }

    /// Whether the language of this expression contains the empty word.
    pub fn is_nullable(&self) -> bool {
        match self.operator() {
            Operator::None => self.is_epsilon(),
            Operator::Star | Operator::Option => true,
            Operator::Plus => self.operand().is_some_and(|r| r.is_nullable()),
            Operator::Sequence => self.operands().iter().all(RegexNode::is_nullable),
            Operator::Choice => self.operands().iter().any(RegexNode::is_nullable),
        }
    }

    fn write_operand(f: &mut fmt::Formatter<'_>, child: &RegexNode, parent: Operator) -> fmt::Result {
        if child.operator().precedence() < parent.precedence() {
            write!(f, "({child})")
        } else {
            write!(f, "{child}")
        }
    }
}

impl fmt::Display for RegexNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operator = self.operator();
        match &self.inner.body {
            Body::Char(c) => write!(f, "{c}")?,
            Body::Operands(operands) => match operator {
                Operator::Choice => {
                    for (i, operand) in operands.iter().enumerate() {
                        if i > 0 {
                            f.write_str("|")?;
                        }
                        Self::write_operand(f, operand, operator)?;
                    }
                }
                _ => {
                    for operand in operands {
                        Self::write_operand(f, operand, operator)?;
                    }
                }
            },
        }
        if let Some(suffix) = operator.suffix() {
            write!(f, "{suffix}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for RegexNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RegexNode")
            .field(&format_args!("{self}"))
            .finish()
    }
}

impl Ord for RegexNode {
    /// Operator rank, then single characters before compounds, then the
    /// character value, then operands pairwise, then shorter before longer.
    fn cmp(&self, other: &Self) -> Ordering {
        if Arc::ptr_eq(&self.inner, &other.inner) {
            return Ordering::Equal;
        }
        self.operator()
            .cmp(&other.operator())
            .then_with(|| match (&self.inner.body, &other.inner.body) {
                (Body::Char(a), Body::Char(b)) => a.cmp(b),
                (Body::Char(_), Body::Operands(_)) => Ordering::Less,
                (Body::Operands(_), Body::Char(_)) => Ordering::Greater,
                (Body::Operands(a), Body::Operands(b)) => a
                    .iter()
                    .zip(b.iter())
                    .map(|(x, y)| x.cmp(y))
                    .find(|ord| ord.is_ne())
                    .unwrap_or_else(|| a.len().cmp(&b.len())),
            })
    }
}

impl PartialOrd for RegexNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for RegexNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RegexNode {}

impl Hash for RegexNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.operator().hash(state);
        match &self.inner.body {
            Body::Char(c) => {
                0u8.hash(state);
                c.hash(state);
            }
            Body::Operands(operands) => {
                1u8.hash(state);
                operands.len().hash(state);
                for operand in operands {
                    operand.hash(state);
                }
            }
        }
    }
}
