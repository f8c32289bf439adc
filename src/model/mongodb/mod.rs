mod bson;
mod collection;
pub mod errors;

pub use bson::{u32_id_filter, u32_in_filter};
pub use collection::{ensure_indexes_exist, Coll, MongoCollection};
