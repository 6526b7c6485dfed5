use std::collections::HashSet;

use url::form_urlencoded;

use super::BundleGraph;
use crate::error::BundleGraphResult;
use crate::hash::digest_hex;
use crate::hash::IdentifierHasher;
use crate::types::Asset;
use crate::types::Bundle;

impl BundleGraph {
  /// Digest of the assets a bundle currently contains, in traversal order.
  ///
  /// The hash is cached until the contents of the bundle change.
  pub fn get_content_hash(&mut self, bundle_id: &str) -> BundleGraphResult<String> {
    if let Some(hash) = self.bundle_content_hashes.get(bundle_id) {
      return Ok(hash.clone());
    }

    let hash = self.compute_content_hash(bundle_id)?;
    tracing::trace!(bundle_id, hash = %hash, "Computed bundle content hash");

    self
      .bundle_content_hashes
      .insert(bundle_id.to_string(), hash.clone());

    Ok(hash)
  }

  fn compute_content_hash(&self, bundle_id: &str) -> BundleGraphResult<String> {
    let mut assets = Vec::new();
    self.traverse_assets(bundle_id, |asset, _| assets.push(asset));

    let mut hasher = IdentifierHasher::new();
    for asset in assets {
      let public_id = self.get_asset_public_id(&asset.id)?;
      hasher.update(asset_content_key(public_id, asset).as_bytes());
    }

    Ok(digest_hex(&hasher))
  }

  /// Inline bundles that end up in the output of `bundle_id`.
  ///
  /// Includes inline bundles referenced from the bundle (and, recursively, from those inline
  /// bundles) and inline bundles below it in the bundle hierarchy.
  pub fn get_inline_bundles(&self, bundle_id: &str) -> Vec<&Bundle> {
    let mut bundles = Vec::new();
    let mut seen = HashSet::new();
    self.collect_referenced_inline_bundles(bundle_id, &mut seen, &mut bundles);

    self.traverse_bundles(Some(bundle_id), |child, actions| {
      if child.is_inline() {
        if seen.insert(child.id.clone()) {
          bundles.push(child);
        }
      } else if child.id != bundle_id {
        actions.skip_children();
      }
    });

    bundles
  }

  fn collect_referenced_inline_bundles<'a>(
    &'a self,
    bundle_id: &str,
    seen: &mut HashSet<String>,
    bundles: &mut Vec<&'a Bundle>,
  ) {
    seen.insert(bundle_id.to_string());

    for referenced in self.get_referenced_bundles(bundle_id) {
      if referenced.is_inline() && !seen.contains(&referenced.id) {
        bundles.push(referenced);
        self.collect_referenced_inline_bundles(&referenced.id, seen, bundles);
      }
    }
  }

  /// The identity of a bundle's output.
  ///
  /// Besides the content hash this covers the inline bundles embedded into the output, the child
  /// bundles it loads and its environment, so it changes whenever the emitted file would.
  pub fn get_hash(&mut self, bundle_id: &str) -> BundleGraphResult<String> {
    let content_hash = self.get_content_hash(bundle_id)?;

    let inline_bundle_ids: Vec<String> = self
      .get_inline_bundles(bundle_id)
      .into_iter()
      .map(|bundle| bundle.id.clone())
      .collect();

    let mut inline_hashes = Vec::with_capacity(inline_bundle_ids.len());
    for inline_bundle_id in &inline_bundle_ids {
      inline_hashes.push(self.get_content_hash(inline_bundle_id)?);
    }

    let mut hasher = IdentifierHasher::new();
    hasher.update(bundle_id.as_bytes());
    hasher.update(content_hash.as_bytes());

    for inline_hash in &inline_hashes {
      hasher.update(inline_hash.as_bytes());
    }

    for child in self.get_child_bundles(bundle_id) {
      if !child.is_inline() {
        hasher.update(child.id.as_bytes());
      }
    }

    hasher.update(self.bundle(bundle_id).env.canonical_json().as_bytes());

    Ok(digest_hex(&hasher))
  }
}

fn asset_content_key(public_id: &str, asset: &Asset) -> String {
  let file_path = asset.file_path.display().to_string();
  let query = canonical_query(asset.query.as_deref());

  [
    public_id,
    asset.output_hash.as_str(),
    file_path.as_str(),
    query.as_str(),
    asset.file_type.extension(),
    asset.unique_key.as_deref().unwrap_or_default(),
  ]
  .join(":")
}

/// Re-encodes a query string so equivalent encodings hash the same, keeping the pair order
fn canonical_query(query: Option<&str>) -> String {
  let Some(query) = query else {
    return String::new();
  };

  let query = query.strip_prefix('?').unwrap_or(query);
  form_urlencoded::Serializer::new(String::new())
    .extend_pairs(form_urlencoded::parse(query.as_bytes()))
    .finish()
}
