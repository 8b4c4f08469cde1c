//! # jtable-core
//!
//! Schema-on-read virtual tables over a JSON document store.
//!
//! Callers write ordinary SQL against virtual tables; the client keeps their
//! column catalog in `_meta_json_t`, stores every row as a JSON document in
//! `_data_json_t` and rewrites DML/DQL into statements over that table.
//!
//! - [`types`]: Type Descriptor Registry (`TINYINT`, `TIMESTAMP`, `INT`,
//!   `VARCHAR(n)`, `DECIMAL(p,s)`)
//! - [`catalog`]: catalog store, in-memory snapshot and payload backfills
//! - [`rewrite`]: SELECT/UPDATE/DELETE/INSERT rewriting
//! - [`defaults`]: default expressions evaluated by the engine
//! - [`access`]: tenant and admin scoping
//! - [`engine`]: the underlying SQL engine seam and its SQLite adapter
//!
//! # Example
//!
//! ```
//! use jtable_commons::{SqlValue, TenantId};
//! use jtable_core::{AccessScope, JsonTableClient, SqliteEngine};
//!
//! let engine = SqliteEngine::open_in_memory().unwrap();
//! let mut client = JsonTableClient::connect(Box::new(engine), AccessScope::tenant(TenantId::new(1))).unwrap();
//!
//! client
//!     .execute("CREATE TABLE t1 (c1 INT DEFAULT NULL, c2 VARCHAR(30) DEFAULT 'ca', c3 VARCHAR NOT NULL)")
//!     .unwrap();
//! client.execute("INSERT INTO t1 (c2, c3) VALUES ('hello', 'foo')").unwrap();
//!
//! let rows = client.query("SELECT * FROM t1").unwrap();
//! assert_eq!(
//!     rows.rows[0],
//!     vec![SqlValue::Null, SqlValue::from("hello"), SqlValue::from("foo")]
//! );
//! ```

pub mod access;
pub mod catalog;
pub mod client;
pub mod defaults;
pub mod engine;
pub mod error;
pub mod rewrite;
pub mod types;

pub use access::{AccessScope, RowFilter};
pub use client::{ClientOptions, ExecutionResult, JsonTableClient, QueryOptions};
pub use engine::{EngineError, EngineTransaction, PhysicalDialect, RowSet, ScopedTransaction, SqlEngine, SqliteEngine};
pub use error::{JsonTableError, Result};
pub use rewrite::PhysicalStatement;
pub use types::{CanonicalValue, TypeDescriptor, TypeError};
