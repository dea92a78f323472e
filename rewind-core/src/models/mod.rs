mod entity_key;
mod field_diff;
mod live_entity;
mod query;
mod revision;
mod row;
mod value;

pub use entity_key::{EntityKey, Identifier, KeyValue};
pub use field_diff::FieldDiff;
pub use live_entity::{ColumnFilter, LiveEntity};
pub use query::Query;
pub use revision::{Revision, RevisionType};
pub use row::{RawRow, RevisionRow};
pub use value::Value;
