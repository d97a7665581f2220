// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Boolean-expression tree for parsed search requests.
//!
//! The request layer parses its SQL-like WHERE grammar into this tree; the
//! compiler walks it with exhaustive matching over the three node variants.

/// A node of the parsed search expression.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryNode {
    /// A single `attribute op value` condition.
    Leaf {
        /// Attribute name as supplied by the caller (camelCase accepted).
        attribute: String,
        /// Operator text (EQ, LIKE, BETWEEN, ...).
        op: String,
        /// Value text; list operators take comma-separated values.
        value: String,
    },
    /// A node with one child.
    ///
    /// The grammar only produces unary nodes with an empty operator (grouping
    /// parentheses); the compiler passes the child through unchanged and
    /// rejects any non-blank unary operator.
    Unary {
        /// Operator text; expected to be blank.
        op: String,
        /// The wrapped sub-expression.
        child: Box<QueryNode>,
    },
    /// An AND/OR combination of two sub-expressions.
    Binary {
        /// "AND" or "OR" (case-insensitive).
        op: String,
        /// Left sub-expression.
        left: Box<QueryNode>,
        /// Right sub-expression.
        right: Box<QueryNode>,
    },
}

impl QueryNode {
    /// Convenience constructor for a leaf condition.
    pub fn leaf(attribute: &str, op: &str, value: &str) -> QueryNode {
        QueryNode::Leaf {
            attribute: attribute.to_string(),
            op: op.to_string(),
            value: value.to_string(),
        }
    }

    /// Convenience constructor for an AND node.
    pub fn and(left: QueryNode, right: QueryNode) -> QueryNode {
        QueryNode::Binary {
            op: "AND".to_string(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Convenience constructor for an OR node.
    pub fn or(left: QueryNode, right: QueryNode) -> QueryNode {
        QueryNode::Binary {
            op: "OR".to_string(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Convenience constructor for a grouping (blank-operator) unary node.
    pub fn group(child: QueryNode) -> QueryNode {
        QueryNode::Unary {
            op: String::new(),
            child: Box::new(child),
        }
    }
}
