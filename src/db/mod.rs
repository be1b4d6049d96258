//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const CONTRIBUTIONS: &str = "contributions";
    pub const PRODUCTS: &str = "products";
    /// Keyed by `Vote::doc_id(user, product)`
    pub const VOTES: &str = "votes";
    /// Singleton documents; see `SETTINGS_DOC`
    pub const CONFIGURATION: &str = "configuration";
    pub const SETTINGS_DOC: &str = "settings";
}

/// Stored field names, for partial updates that must not overwrite
/// concurrent writes to other fields of the same document.
pub mod fields {
    pub const NAME: &str = "name";
    pub const DESCRIPTION: &str = "description";
    pub const PHOTO_URL: &str = "photoURL";
    pub const AVERAGE_PRICE_PER_KG: &str = "averagePricePerKg";
    pub const AVERAGE_RATING: &str = "averageRating";
    pub const IS_ADMIN: &str = "isAdmin";
    pub const IS_ACTIVE: &str = "isActive";
    pub const UPDATED_AT: &str = "updatedAt";
}
