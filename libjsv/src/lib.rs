//! JSV: JSON Separated Values.
//!
//! A JSV template describes the shape a stream of similar JSON records
//! shares, so each record can be transmitted without repeating the keys the
//! template already names:
//!
//! ```text
//! template  [{"name","age"}]
//! record    [{"ada",36},{"grace",45}]
//! decoded   [{"name":"ada","age":36},{"name":"grace","age":45}]
//! ```
//!
//! Compile a template once with [`Template::compile`] (or infer one from a
//! sample record with [`Template::from_value`]), then [`Template::encode`]
//! and [`Template::decode`] records against it:
//!
//! ```
//! use libjsv::Template;
//! use serde_json::json;
//!
//! let template = Template::compile("[{\"name\",\"age\"}]")?;
//! let compact = template.encode(&json!([{"name": "ada", "age": 36}]))?;
//! assert_eq!(compact, "[{\"ada\",36}]");
//! assert_eq!(template.decode(&compact)?, json!([{"name": "ada", "age": 36}]));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Records may omit templated object fields (the slot stays empty), carry
//! untemplated keys inline as ordinary `"key":value` pairs, and repeat a
//! template's last array element as often as needed.

mod decode;
mod encode;
mod error;
mod json;
mod program;
mod scanner;
mod template;
mod tree;

pub use crate::error::{EncodeError, RecordError, TemplateError};
pub use crate::template::Template;

pub use serde_json::Value;
