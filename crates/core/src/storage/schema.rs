//! Table schema configuration (Functional Core - pure data).

/// Table schema configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub table_name: String,
    pub partition_key: KeyAttribute,
    pub sort_key: Option<KeyAttribute>,
    pub throughput: ProvisionedThroughput,
}

/// A key attribute definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAttribute {
    pub name: String,
    pub attribute_type: AttributeType,
}

/// Scalar attribute types usable in a key schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    Number,
    String,
}

/// Read and write capacity reserved for a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisionedThroughput {
    pub read_capacity_units: i64,
    pub write_capacity_units: i64,
}

/// Returns the fixed schema of the movies table.
///
/// Partition key `year` (number), sort key `title` (string), one read and one
/// write capacity unit. This is a pure function - no I/O.
pub fn movies_table_schema(table_name: &str) -> TableSchema {
    TableSchema {
        table_name: table_name.to_string(),
        partition_key: KeyAttribute {
            name: "year".to_string(),
            attribute_type: AttributeType::Number,
        },
        sort_key: Some(KeyAttribute {
            name: "title".to_string(),
            attribute_type: AttributeType::String,
        }),
        throughput: ProvisionedThroughput {
            read_capacity_units: 1,
            write_capacity_units: 1,
        },
    }
}
