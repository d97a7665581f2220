// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Search/query compiler for job listings.
//!
//! Translates `attribute.operator.value` condition strings or a parsed
//! boolean-expression tree into a predicate over the jobs table's fixed
//! column set. The compiler validates columns, operators, and values; it
//! never executes SQL itself. The store renders the compiled predicate
//! through bound parameters.

pub mod ast;
pub mod columns;
pub mod compiler;

pub use self::ast::QueryNode;
pub use self::columns::{ColumnDef, ColumnType, SearchOperator, resolve_column};
pub use self::compiler::{
    CompiledCondition, FilterNode, FilterValue, compile_ast, compile_condition, compile_strings,
    parse_timestamp,
};
