// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Searchable column registry and operator allow-lists.
//!
//! The search grammar is restricted to this fixed column set. Attribute
//! names arrive in camelCase from callers and are normalized to the store's
//! snake_case naming before lookup.

use crate::error::JobsError;

/// Semantic type of a searchable column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Text/varchar column.
    Text,
    /// Integer column.
    Integer,
    /// Boolean column.
    Boolean,
    /// Timestamptz column.
    Timestamp,
    /// UUID column.
    Uuid,
    /// text[] column; membership operators become set-overlap.
    TextArray,
}

/// A searchable column of the jobs table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    /// The column name in the jobs table.
    pub name: &'static str,
    /// The column's semantic type.
    pub col_type: ColumnType,
}

/// The fixed searchable column set.
///
/// JSON blob columns (file_inputs, parameter_set, subscriptions) are
/// intentionally not searchable.
pub const COLUMNS: &[ColumnDef] = &[
    ColumnDef { name: "id", col_type: ColumnType::Integer },
    ColumnDef { name: "uuid", col_type: ColumnType::Uuid },
    ColumnDef { name: "tenant", col_type: ColumnType::Text },
    ColumnDef { name: "owner", col_type: ColumnType::Text },
    ColumnDef { name: "created_by", col_type: ColumnType::Text },
    ColumnDef { name: "created_by_tenant", col_type: ColumnType::Text },
    ColumnDef { name: "name", col_type: ColumnType::Text },
    ColumnDef { name: "description", col_type: ColumnType::Text },
    ColumnDef { name: "status", col_type: ColumnType::Text },
    ColumnDef { name: "last_message", col_type: ColumnType::Text },
    ColumnDef { name: "visible", col_type: ColumnType::Boolean },
    ColumnDef { name: "created", col_type: ColumnType::Timestamp },
    ColumnDef { name: "last_updated", col_type: ColumnType::Timestamp },
    ColumnDef { name: "ended", col_type: ColumnType::Timestamp },
    ColumnDef { name: "app_id", col_type: ColumnType::Text },
    ColumnDef { name: "app_version", col_type: ColumnType::Text },
    ColumnDef { name: "job_type", col_type: ColumnType::Text },
    ColumnDef { name: "exec_system_id", col_type: ColumnType::Text },
    ColumnDef { name: "exec_system_logical_queue", col_type: ColumnType::Text },
    ColumnDef { name: "archive_system_id", col_type: ColumnType::Text },
    ColumnDef { name: "dtn_system_id", col_type: ColumnType::Text },
    ColumnDef { name: "node_count", col_type: ColumnType::Integer },
    ColumnDef { name: "cores_per_node", col_type: ColumnType::Integer },
    ColumnDef { name: "memory_mb", col_type: ColumnType::Integer },
    ColumnDef { name: "max_minutes", col_type: ColumnType::Integer },
    ColumnDef { name: "tags", col_type: ColumnType::TextArray },
    ColumnDef { name: "is_mpi", col_type: ColumnType::Boolean },
    ColumnDef { name: "shared_app_ctx", col_type: ColumnType::Boolean },
    ColumnDef { name: "remote_job_id", col_type: ColumnType::Text },
    ColumnDef { name: "remote_job_id2", col_type: ColumnType::Text },
    ColumnDef { name: "remote_outcome", col_type: ColumnType::Text },
    ColumnDef { name: "remote_queue", col_type: ColumnType::Text },
    ColumnDef { name: "remote_submitted", col_type: ColumnType::Timestamp },
    ColumnDef { name: "remote_started", col_type: ColumnType::Timestamp },
    ColumnDef { name: "remote_ended", col_type: ColumnType::Timestamp },
    ColumnDef { name: "remote_checks_success", col_type: ColumnType::Integer },
    ColumnDef { name: "remote_checks_failed", col_type: ColumnType::Integer },
    ColumnDef { name: "remote_last_status_check", col_type: ColumnType::Timestamp },
    ColumnDef { name: "blocked_count", col_type: ColumnType::Integer },
    ColumnDef { name: "input_transaction_id", col_type: ColumnType::Text },
    ColumnDef { name: "archive_transaction_id", col_type: ColumnType::Text },
];

/// Normalize a caller-supplied attribute name to snake_case.
///
/// `lastUpdated` becomes `last_updated`; already-snake names pass through.
pub fn normalize_attribute(attribute: &str) -> String {
    let mut out = String::with_capacity(attribute.len() + 4);
    for ch in attribute.chars() {
        if ch.is_ascii_uppercase() {
            out.push('_');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Resolve an attribute name to its column definition.
///
/// Fails with `InvalidColumn` when the attribute does not map to a known
/// searchable column.
pub fn resolve_column(attribute: &str) -> Result<&'static ColumnDef, JobsError> {
    let normalized = normalize_attribute(attribute);
    COLUMNS
        .iter()
        .find(|c| c.name == normalized)
        .ok_or_else(|| JobsError::InvalidColumn {
            attribute: attribute.to_string(),
        })
}

// ============================================================================
// Operators
// ============================================================================

/// Search operators of the restricted grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOperator {
    /// Equality.
    Eq,
    /// Inequality.
    Neq,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// SQL LIKE pattern match.
    Like,
    /// Negated LIKE.
    Nlike,
    /// Membership in a value list.
    In,
    /// Negated membership.
    Nin,
    /// Inclusive range over two values.
    Between,
    /// Negated inclusive range.
    Nbetween,
    /// Set overlap for array columns.
    Contains,
    /// Negated set overlap.
    Ncontains,
}

impl SearchOperator {
    /// The canonical spelling of this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            SearchOperator::Eq => "EQ",
            SearchOperator::Neq => "NEQ",
            SearchOperator::Lt => "LT",
            SearchOperator::Lte => "LTE",
            SearchOperator::Gt => "GT",
            SearchOperator::Gte => "GTE",
            SearchOperator::Like => "LIKE",
            SearchOperator::Nlike => "NLIKE",
            SearchOperator::In => "IN",
            SearchOperator::Nin => "NIN",
            SearchOperator::Between => "BETWEEN",
            SearchOperator::Nbetween => "NBETWEEN",
            SearchOperator::Contains => "CONTAINS",
            SearchOperator::Ncontains => "NCONTAINS",
        }
    }

    /// Parse an operator, case-insensitively.
    pub fn parse(op: &str) -> Option<SearchOperator> {
        match op.to_ascii_uppercase().as_str() {
            "EQ" => Some(SearchOperator::Eq),
            "NEQ" => Some(SearchOperator::Neq),
            "LT" => Some(SearchOperator::Lt),
            "LTE" => Some(SearchOperator::Lte),
            "GT" => Some(SearchOperator::Gt),
            "GTE" => Some(SearchOperator::Gte),
            "LIKE" => Some(SearchOperator::Like),
            "NLIKE" => Some(SearchOperator::Nlike),
            "IN" => Some(SearchOperator::In),
            "NIN" => Some(SearchOperator::Nin),
            "BETWEEN" => Some(SearchOperator::Between),
            "NBETWEEN" => Some(SearchOperator::Nbetween),
            "CONTAINS" => Some(SearchOperator::Contains),
            "NCONTAINS" => Some(SearchOperator::Ncontains),
            _ => None,
        }
    }

    /// How many values the operator expects: (min, max). None = unbounded.
    pub fn arity(self) -> (usize, Option<usize>) {
        match self {
            SearchOperator::In
            | SearchOperator::Nin
            | SearchOperator::Contains
            | SearchOperator::Ncontains => (1, None),
            SearchOperator::Between | SearchOperator::Nbetween => (2, Some(2)),
            _ => (1, Some(1)),
        }
    }
}

/// Whether `op` is allowed on a column of type `col_type`.
pub fn operator_allowed(op: SearchOperator, col_type: ColumnType) -> bool {
    use SearchOperator::*;
    match col_type {
        ColumnType::Text => matches!(
            op,
            Eq | Neq | Lt | Lte | Gt | Gte | Like | Nlike | In | Nin | Between | Nbetween
        ),
        ColumnType::Integer => {
            matches!(op, Eq | Neq | Lt | Lte | Gt | Gte | In | Nin | Between | Nbetween)
        }
        ColumnType::Boolean => matches!(op, Eq | Neq),
        ColumnType::Timestamp => matches!(op, Eq | Neq | Lt | Lte | Gt | Gte | Between | Nbetween),
        ColumnType::Uuid => matches!(op, Eq | Neq | In | Nin),
        // IN/NIN are accepted and reinterpreted as set-overlap by the compiler.
        ColumnType::TextArray => matches!(op, In | Nin | Contains | Ncontains),
    }
}
