//! CNF clause to Horn rule translation.
//!
//! Accepts a textual disjunction like `(~A OR ~B OR C)`. A negated literal in
//! the clause becomes a positive premise of the Horn rule (the implication
//! `A AND B => C` is the clause `~A OR ~B OR C`), and the single positive
//! literal becomes the conclusion. Clauses with zero or multiple positive
//! literals are not Horn-representable and fail with a positional error.

use crate::domain::error::{ClauseError, RuletraderError};
use crate::domain::rule::{HornRule, Literal};

/// One literal token with its character offset in the clause text.
struct Token<'a> {
    text: &'a str,
    position: usize,
}

/// True when `OR` at byte offset `i` is a standalone keyword.
fn is_or_keyword(input: &str, i: usize) -> bool {
    if !input[i..].starts_with("OR") {
        return false;
    }
    let before_ok = input[..i]
        .chars()
        .next_back()
        .map(|c| !c.is_alphanumeric() && c != '_')
        .unwrap_or(true);
    let after_ok = input[i + 2..]
        .chars()
        .next()
        .map(|c| !c.is_alphanumeric() && c != '_')
        .unwrap_or(true);
    before_ok && after_ok
}

/// Split the clause body into literal tokens on standalone `OR` keywords,
/// keeping absolute character positions for error reporting.
fn split_literals(input: &str, base: usize) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut seg_start = 0;
    let mut i = 0;

    while i < input.len() {
        if is_or_keyword(input, i) {
            tokens.push(segment_token(input, seg_start, i, base));
            i += 2;
            seg_start = i;
        } else {
            i += input[i..].chars().next().map(|c| c.len_utf8()).unwrap_or(1);
        }
    }
    tokens.push(segment_token(input, seg_start, input.len(), base));
    tokens
}

fn segment_token(input: &str, start: usize, end: usize, base: usize) -> Token<'_> {
    let segment = &input[start..end];
    let trimmed = segment.trim();
    let leading = segment.len() - segment.trim_start().len();
    Token {
        text: trimmed,
        position: base + start + leading,
    }
}

/// Translate one disjunctive clause into a Horn rule.
///
/// Errors carry the character offset of the offending token in `text`, so
/// [`ClauseError::display_with_context`] can point a caret at it.
pub fn parse_clause(
    text: &str,
    rule_id: &str,
    description: &str,
) -> Result<HornRule, ClauseError> {
    let trimmed = text.trim();
    let outer_start = text.len() - text.trim_start().len();

    // Strip one pair of outer parentheses if present.
    let (body, base) = if trimmed.starts_with('(') && trimmed.ends_with(')') && trimmed.len() >= 2 {
        (&trimmed[1..trimmed.len() - 1], outer_start + 1)
    } else {
        (trimmed, outer_start)
    };

    let mut premises: Vec<Literal> = Vec::new();
    let mut conclusions: Vec<Token<'_>> = Vec::new();

    for token in split_literals(body, base) {
        if token.text.is_empty() {
            return Err(ClauseError {
                message: "empty literal".to_string(),
                position: token.position,
            });
        }

        if let Some(rest) = token.text.strip_prefix('~') {
            let symbol = rest.trim();
            if symbol.is_empty() {
                return Err(ClauseError {
                    message: "empty symbol after '~'".to_string(),
                    position: token.position,
                });
            }
            // "~A" in the clause is the premise "A must be true".
            premises.push(Literal::positive(symbol));
        } else if let Some(rest) = token
            .text
            .strip_prefix("NOT ")
            .or_else(|| token.text.strip_prefix("not "))
        {
            let symbol = rest.trim();
            if symbol.is_empty() {
                return Err(ClauseError {
                    message: "empty symbol after 'NOT'".to_string(),
                    position: token.position,
                });
            }
            premises.push(Literal::positive(symbol));
        } else {
            conclusions.push(token);
        }
    }

    match conclusions.len() {
        0 => Err(ClauseError {
            message: "clause has no positive literal to use as a conclusion".to_string(),
            position: outer_start,
        }),
        1 => Ok(HornRule::new(
            rule_id,
            premises,
            conclusions[0].text,
            description,
        )),
        _ => Err(ClauseError {
            message: format!(
                "clause must have exactly one positive literal to be Horn-convertible, found {}",
                conclusions.len()
            ),
            position: conclusions[1].position,
        }),
    }
}

/// Parse a clause listing: one `RULE_ID: clause [; description]` per line.
/// Blank lines and `#` comment lines are ignored. Any bad line fails the
/// whole listing.
pub fn parse_clause_listing(content: &str) -> Result<Vec<HornRule>, RuletraderError> {
    let mut rules = Vec::new();

    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((rule_id, rest)) = line.split_once(':') else {
            return Err(RuletraderError::RuleInvalid {
                reason: format!("line {}: expected 'RULE_ID: clause'", lineno + 1),
            });
        };
        let rule_id = rule_id.trim();
        if rule_id.is_empty() {
            return Err(RuletraderError::RuleInvalid {
                reason: format!("line {}: empty rule id", lineno + 1),
            });
        }

        let (clause, description) = match rest.split_once(';') {
            Some((clause, description)) => (clause.trim(), description.trim()),
            None => (rest.trim(), ""),
        };

        let rule =
            parse_clause(clause, rule_id, description).map_err(|e| RuletraderError::RuleInvalid {
                reason: format!("line {} ({rule_id}): {}", lineno + 1, e.display_with_context(clause)),
            })?;
        rules.push(rule);
    }

    Ok(rules)
}
