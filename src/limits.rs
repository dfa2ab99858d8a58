//! Hard bounds on stored data. Everything here is enforced at the mutation
//! boundary so a misbehaving client cannot grow a shop without limit.

/// Earliest accepted booking timestamp (unix ms). Rejects obviously bogus
/// pre-epoch instants produced by sign errors.
pub const MIN_VALID_TIMESTAMP_MS: i64 = 0;

/// Latest accepted booking timestamp (unix ms), roughly year 3000.
pub const MAX_VALID_TIMESTAMP_MS: i64 = 32_503_680_000_000;

/// Longest service a shop can offer, in minutes (one full day).
pub const MAX_SERVICE_DURATION_MINUTES: u32 = 24 * 60;

/// Maximum shops a single server will materialize.
pub const MAX_SHOPS: usize = 256;

/// Maximum length of a shop name (doubles as the WAL file stem).
pub const MAX_SHOP_NAME_LEN: usize = 64;

/// Catalog size bounds per shop.
pub const MAX_EMPLOYEES_PER_SHOP: usize = 500;
pub const MAX_SERVICES_PER_SHOP: usize = 500;

/// Bookings retained per employee. Cancelled bookings count too, since they
/// are kept forever.
pub const MAX_BOOKINGS_PER_EMPLOYEE: usize = 100_000;

/// Length bounds for catalog and customer text fields.
pub const MAX_NAME_LEN: usize = 256;
pub const MAX_TEXT_LEN: usize = 1024;
pub const MAX_NOTES_LEN: usize = 2048;

/// Rows returned by the admin recent-bookings view.
pub const RECENT_BOOKINGS_LIMIT: usize = 20;
