//! Local rewrite optimiser.
//!
//! Children are optimised first, then a fixed set of rewrites is applied at
//! the node itself. This is a single bottom-up pass, not a search for a
//! globally minimal expression.

use crate::regexp::node::{Operator, RegexNode};

impl RegexNode {
    /// Optimise the whole tree.
    pub fn optimise(&self) -> RegexNode {
        self.optimise_to_depth(usize::MAX)
    }

    /// Optimise at most `depth` levels of the tree.
    ///
    /// Depth 1 only rewrites the root, leaving its operands untouched. Depth 0
    /// returns the node unchanged.
    pub fn optimise_to_depth(&self, depth: usize) -> RegexNode {
        if depth == 0 {
            return self.clone();
        }
        let operator = self.operator();
        match operator {
            Operator::None => self.clone(),
            Operator::Star | Operator::Plus | Operator::Option => match self.operand() {
                Some(operand) => rewrite_unary(operator, operand.optimise_to_depth(depth - 1)),
                None => self.clone(),
            },
            Operator::Sequence | Operator::Choice => {
                let children: Vec<RegexNode> = self
                    .operands()
                    .iter()
                    .map(|child| child.optimise_to_depth(depth - 1))
                    .collect();
                if operator == Operator::Sequence {
                    rewrite_sequence(children)
                } else {
                    rewrite_choice(children)
                }
            }
        }
    }
}

fn rewrite_unary(operator: Operator, operand: RegexNode) -> RegexNode {
    let inner = operand.operand();
    match (operator, operand.operator(), inner) {
        // (r*)* (r+)* (r?)* -> r*
        (Operator::Star, Operator::Star | Operator::Plus | Operator::Option, Some(r)) => {
            RegexNode::star(r)
        }
        // (r*)+ -> r*, (r+)+ -> r+
        (Operator::Plus, Operator::Star | Operator::Plus, _) => operand,
        // (r?)+ -> r*
        (Operator::Plus, Operator::Option, Some(r)) => RegexNode::star(r),
        (Operator::Option, _, _) if operand.is_nullable() => operand,
        // (r+)? -> r*
        (Operator::Option, Operator::Plus, Some(r)) => RegexNode::star(r),
        _ => RegexNode::wrap(operator, operand),
    }
}

/// Merge two adjacent iterations of the same operand, if the pair table
/// allows it.
fn merge_pair(left: &RegexNode, right: &RegexNode) -> Option<RegexNode> {
    let (l, r) = (left.operator(), right.operator());
    if !l.is_unary() || !r.is_unary() || left.operand() != right.operand() {
        return None;
    }
    match (l, r) {
        (Operator::Star, Operator::Star) | (Operator::Star, Operator::Option) => Some(left.clone()),
        (Operator::Option, Operator::Star) => Some(right.clone()),
        (Operator::Star, Operator::Plus) | (Operator::Option, Operator::Plus) => {
            Some(right.clone())
        }
        (Operator::Plus, Operator::Star) | (Operator::Plus, Operator::Option) => {
            Some(left.clone())
        }
        _ => None,
    }
}

fn rewrite_sequence(children: Vec<RegexNode>) -> RegexNode {
    let mut flat = Vec::with_capacity(children.len());
    for child in children {
        if child.operator() == Operator::Sequence {
            flat.extend(child.operands().iter().cloned());
        } else {
            flat.push(child);
        }
    }
    flat.retain(|r| !r.is_epsilon());
    if flat.is_empty() {
        return RegexNode::epsilon();
    }

    let mut forward: Vec<RegexNode> = Vec::with_capacity(flat.len());
    for operand in flat {
        match forward.last().and_then(|last| merge_pair(last, &operand)) {
            Some(merged) => {
                forward.pop();
                forward.push(merged);
            }
            None => forward.push(operand),
        }
    }

    let mut backward: Vec<RegexNode> = Vec::with_capacity(forward.len());
    for operand in forward.into_iter().rev() {
        match backward.last().and_then(|last| merge_pair(&operand, last)) {
            Some(merged) => {
                backward.pop();
                backward.push(merged);
            }
            None => backward.push(operand),
        }
    }
    backward.reverse();

    RegexNode::join(Operator::Sequence, backward)
}

fn rewrite_choice(children: Vec<RegexNode>) -> RegexNode {
    let mut unique: Vec<RegexNode> = Vec::with_capacity(children.len());
    for child in children {
        let operands = if child.operator() == Operator::Choice {
            child.operands().to_vec()
        } else {
            vec![child]
        };
        for operand in operands {
            if !unique.contains(&operand) {
                unique.push(operand);
            }
        }
    }
    RegexNode::join(Operator::Choice, unique)
}
