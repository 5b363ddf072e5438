//! Recursive-descent parser for the regular expression syntax.
//!
//! Grammar, loosest binding first: `|` choice, juxtaposition for sequence,
//! postfix `*` `+` `?`, and `(...)` grouping. Whitespace is ignored and every
//! other character is a literal.

use crate::error::{RegexpError, Result};
use crate::regexp::node::{Operator, RegexNode};

/// Parse `text` into a regular expression tree.
///
/// Returns `Ok(None)` when the input contains nothing but whitespace.
pub fn parse(text: &str) -> Result<Option<RegexNode>> {
    let chars: Vec<char> = text.chars().collect();
    parse_chars(&chars, 0)
}

/// Index of the parenthesis closing the one at `chars[0]`.
fn find_matching_paren(chars: &[char]) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, &c) in chars.iter().enumerate() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

fn apply_unary(
    sequence: &mut Vec<RegexNode>,
    operator: Operator,
    position: usize,
) -> Result<()> {
    let back = sequence
        .pop()
        .ok_or(RegexpError::OperatorOnEmptyWord { operator, position })?;
    sequence.push(RegexNode::wrap(operator, back));
    Ok(())
}

/// Move the accumulated sequence into the choice operand list.
fn flush_choice_operand(
    sequence: &mut Vec<RegexNode>,
    choice: &mut Vec<RegexNode>,
    position: usize,
) -> Result<()> {
    if sequence.is_empty() {
        return Err(RegexpError::EmptyChoiceOperand { position }.into());
    }
    choice.push(RegexNode::join(Operator::Sequence, std::mem::take(sequence)));
    Ok(())
}

fn parse_chars(chars: &[char], offset: usize) -> Result<Option<RegexNode>> {
    let mut sequence: Vec<RegexNode> = Vec::new();
    let mut choice: Vec<RegexNode> = Vec::new();
    let mut idx = 0;

    while idx < chars.len() {
        let position = offset + idx;
        match chars[idx] {
            '(' => {
                let close = find_matching_paren(&chars[idx..])
                    .ok_or(RegexpError::UnclosedParenthesis { position })?
                    + idx;
                let inner = parse_chars(&chars[idx + 1..close], position + 1)?
                    .ok_or(RegexpError::EmptyParentheses { position })?;
                sequence.push(inner);
                idx = close;
            }
            ')' => return Err(RegexpError::StrayClosingParenthesis { position }.into()),
            '*' => apply_unary(&mut sequence, Operator::Star, position)?,
            '+' => apply_unary(&mut sequence, Operator::Plus, position)?,
            '?' => apply_unary(&mut sequence, Operator::Option, position)?,
            '|' => flush_choice_operand(&mut sequence, &mut choice, position)?,
            c if c.is_whitespace() => {}
            c => sequence.push(RegexNode::char(c)),
        }
        idx += 1;
    }

    if !choice.is_empty() {
        flush_choice_operand(&mut sequence, &mut choice, offset + chars.len())?;
        return Ok(Some(RegexNode::join(Operator::Choice, choice)));
    }
    if sequence.is_empty() {
        return Ok(None);
    }
    Ok(Some(RegexNode::join(Operator::Sequence, sequence)))
}
