// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Condition compiler: strings and ASTs into typed predicates.
//!
//! Conditions arrive either as `attribute.operator.value[,value...]` strings
//! or as a [`QueryNode`] tree. Compilation validates the column, checks the
//! operator against the column type's allow-list, parses every value into a
//! typed [`FilterValue`], and produces a [`FilterNode`] predicate tree that
//! the store renders with bound parameters.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use uuid::Uuid;

use crate::error::{JobsError, Result};
use crate::search::ast::QueryNode;
use crate::search::columns::{
    ColumnDef, ColumnType, SearchOperator, operator_allowed, resolve_column,
};

/// A parsed, typed search value.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Text value.
    Text(String),
    /// Integer value.
    Int(i64),
    /// Boolean value.
    Bool(bool),
    /// Normalized absolute timestamp.
    Timestamp(DateTime<Utc>),
    /// UUID value.
    Uuid(Uuid),
}

/// One validated single-attribute condition.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledCondition {
    /// The resolved column.
    pub column: &'static ColumnDef,
    /// The operator, after array reinterpretation.
    pub op: SearchOperator,
    /// The typed values, arity-checked for the operator.
    pub values: Vec<FilterValue>,
}

/// A compiled predicate tree, consumed by the store's query builder.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    /// Both children must match.
    And(Box<FilterNode>, Box<FilterNode>),
    /// Either child must match.
    Or(Box<FilterNode>, Box<FilterNode>),
    /// A single condition.
    Cond(CompiledCondition),
}

// ============================================================================
// Condition compilation
// ============================================================================

/// Compile a single condition from its parts.
///
/// Applies column resolution, the operator allow-list, array reinterpretation
/// (`IN`/`NIN` on an array column become `CONTAINS`/`NCONTAINS`), value
/// parsing, and arity checks.
pub fn compile_condition(attribute: &str, op_text: &str, values: &[&str]) -> Result<CompiledCondition> {
    let column = resolve_column(attribute)?;

    let op = SearchOperator::parse(op_text).ok_or_else(|| JobsError::UnsupportedOperator {
        op: op_text.to_string(),
        column: column.name.to_string(),
    })?;

    if !operator_allowed(op, column.col_type) {
        return Err(JobsError::UnsupportedOperator {
            op: op.as_str().to_string(),
            column: column.name.to_string(),
        });
    }

    // The column itself is multi-valued, so membership means set-overlap.
    let op = if column.col_type == ColumnType::TextArray {
        match op {
            SearchOperator::In => SearchOperator::Contains,
            SearchOperator::Nin => SearchOperator::Ncontains,
            other => other,
        }
    } else {
        op
    };

    let (min, max) = op.arity();
    if values.len() < min || max.is_some_and(|m| values.len() > m) {
        return Err(JobsError::InvalidValue {
            column: column.name.to_string(),
            value: values.join(","),
            reason: format!(
                "operator {} expects {} value(s), got {}",
                op.as_str(),
                match max {
                    Some(m) if m == min => m.to_string(),
                    Some(m) => format!("{}..{}", min, m),
                    None => format!("{}+", min),
                },
                values.len()
            ),
        });
    }

    let values = values
        .iter()
        .map(|v| parse_value(column, v))
        .collect::<Result<Vec<_>>>()?;

    Ok(CompiledCondition { column, op, values })
}

fn parse_value(column: &ColumnDef, raw: &str) -> Result<FilterValue> {
    let invalid = |reason: &str| JobsError::InvalidValue {
        column: column.name.to_string(),
        value: raw.to_string(),
        reason: reason.to_string(),
    };

    match column.col_type {
        ColumnType::Text | ColumnType::TextArray => Ok(FilterValue::Text(raw.to_string())),
        ColumnType::Integer => raw
            .trim()
            .parse::<i64>()
            .map(FilterValue::Int)
            .map_err(|_| invalid("not an integer")),
        ColumnType::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(FilterValue::Bool(true)),
            "false" => Ok(FilterValue::Bool(false)),
            _ => Err(invalid("not a boolean")),
        },
        ColumnType::Uuid => raw
            .trim()
            .parse::<Uuid>()
            .map(FilterValue::Uuid)
            .map_err(|_| invalid("not a UUID")),
        ColumnType::Timestamp => parse_timestamp(raw.trim())
            .map(FilterValue::Timestamp)
            .ok_or_else(|| invalid("unparseable timestamp")),
    }
}

// ============================================================================
// Timestamp normalization
// ============================================================================

/// Parse a possibly-truncated ISO-8601 timestamp into an absolute instant.
///
/// Accepted forms, most precise first: full RFC 3339 with offset or `Z`,
/// fractional seconds, seconds, minutes, hours, date, year-month, and bare
/// year. Truncated fields default to their minimum; timestamps without an
/// offset are interpreted as UTC.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    // Offset-carrying forms first.
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M%z", "%Y-%m-%dT%H%z"] {
        if let Ok(dt) = DateTime::parse_from_str(text, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    // Naive forms, interpreted as UTC.
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    // Hour-only has no NaiveDateTime format; parse date and hour separately.
    if let Some((date_part, hour_part)) = text.split_once('T') {
        if let (Ok(date), Ok(hour)) = (
            NaiveDate::parse_from_str(date_part, "%Y-%m-%d"),
            hour_part.parse::<u32>(),
        ) {
            let time = NaiveTime::from_hms_opt(hour, 0, 0)?;
            return Some(Utc.from_utc_datetime(&date.and_time(time)));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", text), "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }
    if text.len() == 4 {
        if let Ok(year) = text.parse::<i32>() {
            let date = NaiveDate::from_ymd_opt(year, 1, 1)?;
            return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
        }
    }

    None
}

// ============================================================================
// String conditions
// ============================================================================

/// Compile a list of `attribute.operator.value[,value...]` strings.
///
/// The conditions are AND-combined. An empty list yields `None` (no filter).
pub fn compile_strings(conditions: &[String]) -> Result<Option<FilterNode>> {
    let mut root: Option<FilterNode> = None;
    for condition in conditions {
        let node = FilterNode::Cond(compile_string(condition)?);
        root = Some(match root {
            Some(acc) => FilterNode::And(Box::new(acc), Box::new(node)),
            None => node,
        });
    }
    Ok(root)
}

fn compile_string(condition: &str) -> Result<CompiledCondition> {
    let mut parts = condition.splitn(3, '.');
    let (attribute, op_text, rest) = match (parts.next(), parts.next(), parts.next()) {
        (Some(a), Some(o), Some(r)) if !a.is_empty() && !o.is_empty() => (a, o, r),
        _ => {
            return Err(JobsError::InvalidValue {
                column: condition.to_string(),
                value: condition.to_string(),
                reason: "condition must have the form attribute.operator.value".to_string(),
            });
        }
    };

    // List operators take comma-separated values; single-value operators take
    // the remainder verbatim so LIKE patterns may contain commas.
    let values: Vec<&str> = match SearchOperator::parse(op_text) {
        Some(op) if op.arity().1 != Some(1) => rest.split(',').collect(),
        _ => vec![rest],
    };

    compile_condition(attribute, op_text, &values)
}

// ============================================================================
// AST compilation
// ============================================================================

/// Compile a parsed boolean-expression tree into a predicate.
///
/// AND/OR nodes recurse into both children. Unary nodes with a blank operator
/// pass their child through unchanged; the grammar never produces anything
/// else, and a non-blank unary operator is rejected rather than guessed at.
pub fn compile_ast(node: &QueryNode) -> Result<FilterNode> {
    match node {
        QueryNode::Leaf {
            attribute,
            op,
            value,
        } => {
            let values: Vec<&str> = match SearchOperator::parse(op) {
                Some(parsed) if parsed.arity().1 != Some(1) => value.split(',').collect(),
                _ => vec![value.as_str()],
            };
            Ok(FilterNode::Cond(compile_condition(attribute, op, &values)?))
        }
        QueryNode::Unary { op, child } => {
            if op.trim().is_empty() {
                compile_ast(child)
            } else {
                Err(JobsError::UnsupportedOperator {
                    op: op.clone(),
                    column: "<unary>".to_string(),
                })
            }
        }
        QueryNode::Binary { op, left, right } => {
            let l = Box::new(compile_ast(left)?);
            let r = Box::new(compile_ast(right)?);
            match op.to_ascii_uppercase().as_str() {
                "AND" => Ok(FilterNode::And(l, r)),
                "OR" => Ok(FilterNode::Or(l, r)),
                other => Err(JobsError::UnsupportedOperator {
                    op: other.to_string(),
                    column: "<binary>".to_string(),
                }),
            }
        }
    }
}
