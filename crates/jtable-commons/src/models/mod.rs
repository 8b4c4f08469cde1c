//! Catalog and identifier models.

pub mod column_meta;
pub mod sql_value;
pub mod table_name;
pub mod tenant_id;
pub mod virtual_table;

pub use column_meta::ColumnMeta;
pub use sql_value::SqlValue;
pub use table_name::TableName;
pub use tenant_id::TenantId;
pub use virtual_table::VirtualTable;
