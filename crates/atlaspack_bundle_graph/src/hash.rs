use xxhash_rust::xxh3::xxh3_64;
use xxhash_rust::xxh3::Xxh3;

/// Hasher for bundle ids, public ids and bundle content hashes.
///
/// Digests must not change between runs or platforms, since they end up in output file names
/// and in cached bundle graphs.
pub type IdentifierHasher = Xxh3;

pub fn hash_string(s: &str) -> String {
  hash_bytes(s.as_bytes())
}

pub fn hash_bytes(s: &[u8]) -> String {
  let res = xxh3_64(s);
  format!("{:016x}", res)
}

/// Fixed size hex digest of everything fed into `hasher` so far.
pub fn digest_hex(hasher: &IdentifierHasher) -> String {
  format!("{:032x}", hasher.digest128())
}

/// Returns true if `s` is a non-empty, even length string of hex digits.
pub fn is_hex_id(s: &str) -> bool {
  !s.is_empty() && s.len() % 2 == 0 && s.bytes().all(|b| b.is_ascii_hexdigit())
}
