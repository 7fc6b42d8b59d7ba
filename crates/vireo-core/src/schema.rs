//! Output schemas of plan nodes.
//!
//! The evaluator never plans anything. It only needs to know what columns an
//! upstream node produces so names can be bound to positions.

use vireo_common::types::LogicalType;

/// One named, typed output column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputColumn {
    /// Column name as the planner knows it.
    pub name: String,
    /// Declared type.
    pub data_type: LogicalType,
}

impl OutputColumn {
    /// Creates a new output column.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: LogicalType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// The ordered output columns of a plan node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<OutputColumn>,
}

impl Schema {
    /// Creates a schema from its columns, in output order.
    #[must_use]
    pub fn new(columns: Vec<OutputColumn>) -> Self {
        Self { columns }
    }

    /// The columns, in output order.
    #[must_use]
    pub fn columns(&self) -> &[OutputColumn] {
        &self.columns
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the schema has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of the first column called `name`.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// The declared column types, in order.
    #[must_use]
    pub fn types(&self) -> Vec<LogicalType> {
        self.columns.iter().map(|c| c.data_type).collect()
    }

    /// Output of a join: this schema's columns followed by `right`'s.
    #[must_use]
    pub fn concat(&self, right: &Schema) -> Schema {
        let mut columns = Vec::with_capacity(self.len() + right.len());
        columns.extend_from_slice(&self.columns);
        columns.extend_from_slice(&right.columns);
        Schema { columns }
    }
}

/// A plan node, as far as expression binding is concerned.
pub trait PlanNode {
    /// The node's output columns.
    fn schema(&self) -> &Schema;
}
