//! sqlparser integration.
//!
//! - `utils`: dialect, parser options and token helpers shared by every parser
//! - `extensions`: grammar the stock MySQL dialect does not hand back in a
//!   form the catalog can apply (ALTER TABLE actions)

pub mod extensions;
pub mod utils;
