//! Response cache trait.

/// Storage for full raw response bodies keyed by request URI.
///
/// Entries are written once and are never invalidated by writes elsewhere in
/// the system; an implementation may expire them when configured with a TTL.
pub trait ResponseCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    fn put(&self, key: String, body: Vec<u8>);
}
