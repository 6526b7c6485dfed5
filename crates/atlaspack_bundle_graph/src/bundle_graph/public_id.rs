use std::borrow::Cow;

use crate::error::BundleGraphError;
use crate::error::BundleGraphResult;
use crate::hash::hash_string;
use crate::hash::is_hex_id;

const BASE62_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

fn base62_encode(bytes: &[u8]) -> String {
  let mut digits: Vec<u8> = bytes.iter().copied().skip_while(|b| *b == 0).collect();
  if digits.is_empty() {
    return String::from("0");
  }

  let mut result = Vec::new();
  while !digits.is_empty() {
    let mut remainder = 0u32;
    let mut quotient = Vec::with_capacity(digits.len());
    for digit in digits {
      let acc = remainder * 256 + digit as u32;
      let q = acc / 62;
      remainder = acc % 62;
      if !quotient.is_empty() || q != 0 {
        quotient.push(q as u8);
      }
    }

    result.push(BASE62_ALPHABET[remainder as usize]);
    digits = quotient;
  }

  result.reverse();
  String::from_utf8(result).unwrap_or_default()
}

fn hex_to_bytes(hex: &str) -> Vec<u8> {
  (0..hex.len() / 2)
    .filter_map(|i| u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok())
    .collect()
}

/// Generates a short, base62 encoded public id for `id`
///
/// The shortest prefix of at least `min_length` characters that `already_exists` rejects is
/// returned. Ids that are not hex digests are hashed first.
pub fn generate_public_id<F>(
  id: &str,
  min_length: usize,
  already_exists: F,
) -> BundleGraphResult<String>
where
  F: Fn(&str) -> bool,
{
  let hex = if is_hex_id(id) {
    Cow::Borrowed(id)
  } else {
    Cow::Owned(hash_string(id))
  };

  let encoded = base62_encode(&hex_to_bytes(&hex));
  let start = min_length.clamp(1, encoded.len());

  for end in start..=encoded.len() {
    let candidate = &encoded[..end];
    if !already_exists(candidate) {
      return Ok(candidate.to_string());
    }
  }

  Err(BundleGraphError::PublicIdCollision(id.to_string()))
}

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn encodes_base62() {
    assert_eq!(base62_encode(&[]), "0");
    assert_eq!(base62_encode(&[61]), "Z");
    assert_eq!(base62_encode(&[0xff]), "47");
    assert_eq!(base62_encode(&[0x01, 0x00]), "48");
  }

  #[test]
  fn uses_the_shortest_free_prefix() {
    let id = "deadbeefdeadbeef";
    let first = generate_public_id(id, 5, |_| false).unwrap();
    assert_eq!(first.len(), 5);

    let taken = HashSet::from([first.clone()]);
    let second = generate_public_id(id, 5, |candidate| taken.contains(candidate)).unwrap();
    assert_eq!(second.len(), 6);
    assert!(second.starts_with(&first));
  }

  #[test]
  fn hashes_non_hex_ids() {
    let public_id = generate_public_id("src/index.js", 5, |_| false).unwrap();
    assert_eq!(public_id.len(), 5);
    assert_eq!(
      public_id,
      generate_public_id("src/index.js", 5, |_| false).unwrap()
    );
  }

  #[test]
  fn fails_when_every_prefix_is_taken() {
    let result = generate_public_id("abcd", 5, |_| true);
    assert!(matches!(
      result,
      Err(BundleGraphError::PublicIdCollision(id)) if id == "abcd"
    ));
  }
}
