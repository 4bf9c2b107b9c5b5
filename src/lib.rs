//! # sqlbind: named placeholders for plain SQL
//!
//! Write SQL with named parameters, get back a statement with the values
//! spliced in as literals. List values expand into parenthesized tuples, and
//! a `#` in front of a placeholder substitutes the value's length instead.
//!
//! ## Quick Example
//!
//! ```
//! use std::collections::HashMap;
//! use sqlbind::prelude::*;
//!
//! let mut bindings = HashMap::new();
//! bindings.insert("ids".to_string(), Value::from(vec![1, 2, 3]));
//! bindings.insert("name".to_string(), Value::from("O'Brien"));
//!
//! let sql = substitute(
//!     "select * from t where id in :ids and name = @name -- :ids stays",
//!     &bindings,
//! )?;
//! assert_eq!(
//!     sql,
//!     "select * from t where id in (1, 2, 3) and name = 'O''Brien' -- :ids stays"
//! );
//! # Ok::<(), sqlbind::BindError>(())
//! ```
//!
//! ## Placeholders
//!
//! | Syntax                    | Replaced with          |
//! |---------------------------|------------------------|
//! | `:name`, `@name`          | value                  |
//! | `:"a name"`, `@"a name"`  | value                  |
//! | `%(name)s`                | value                  |
//! | `#:name`, `#@name`        | length                 |
//! | `#:"a name"`, `#@"a name"`| length                 |
//! | `#%(name)s`               | length                 |
//!
//! Placeholders inside string literals, quoted identifiers and comments are
//! never touched. Names that have no binding are left exactly as written.

pub mod config;
pub mod encode;
pub mod error;
pub mod lexer;
pub mod substitute;
pub mod value;

pub use config::Config;
pub use encode::encode;
pub use error::{BindError, BindResult};
pub use lexer::{tokenize, Lexer, Token};
pub use substitute::{substitute, Bindings, Placeholder, SqlTokenKind, Substituter};
pub use value::Value;

pub mod prelude {
    pub use crate::encode::encode;
    pub use crate::error::*;
    pub use crate::substitute::{substitute, Bindings, Substituter};
    pub use crate::value::Value;
}
