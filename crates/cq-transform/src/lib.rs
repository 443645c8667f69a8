//! cq-transform - Transform dispatch for CellQL
//!
//! Transform action lines (`.group(by=[A])`, `.get_target_date() as D`)
//! are parsed into a [`TransformCall`] without evaluating anything and
//! dispatched by name through a [`TransformRegistry`]. The registry holds
//! the built-in `group` transform and the lookup-join transforms declared in
//! `cellql.yml`.

pub mod builtins;
pub mod call;
pub mod error;
pub mod lookup;
pub mod registry;

pub use builtins::GroupTransform;
pub use call::{split_alias, ArgValue, TransformCall};
pub use error::{TransformError, TransformResult};
pub use lookup::LookupTransform;
pub use registry::{TransformHandler, TransformRegistry};
