use ulid::Ulid;

/// `<prefix>_<ULID>`; ids sort by the millisecond they were minted in.
///
/// ```
/// let id = gateway_common::id::prefixed_ulid("conn");
/// assert!(id.starts_with("conn_"));
/// ```
pub fn prefixed_ulid(prefix: &str) -> String {
    format!("{}_{}", prefix, Ulid::new())
}

/// Types whose instances carry a `<PREFIX>_<ULID>` id.
pub trait PrefixedId {
    const PREFIX: &'static str;

    fn generate_id() -> String {
        prefixed_ulid(Self::PREFIX)
    }
}

/// Prefixes in use across the gateway.
pub mod prefix {
    pub const CONNECTION: &str = "conn";
}
