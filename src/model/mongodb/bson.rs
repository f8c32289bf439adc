use mongodb::bson::{doc, Document};

/// Filter matching the document whose `_id` is the given integer ID.
pub fn u32_id_filter(id: u32) -> Document {
    doc! {
        "_id": id,
    }
}

/// Filter matching every document whose `field` is one of the given integer IDs.
pub fn u32_in_filter(field: &str, ids: &[u32]) -> Document {
    doc! {
        field: {
            "$in": ids,
        }
    }
}
