use url::Url;

use crate::host::ItemDescriptor;

/// Normalizes a raw target.
///
/// Parses `raw` as an absolute URL and drops the fragment, keeping scheme,
/// host, port, path and query. Returns `raw` unchanged when it does not parse,
/// so callers must check syncability before trusting the result.
pub fn normalize(raw: &str) -> String {
  match Url::parse(raw) {
    Ok(mut url) => {
      url.set_fragment(None);
      url.into()
    }
    Err(_) => raw.to_string(),
  }
}

/// Returns the committed target if non-empty, else the pending target, else "".
///
/// A freshly created or navigating instance often has no committed target
/// yet; without the fallback the engine would not recognize an instance it
/// just created and would create it again on the next pass.
pub fn resolve_raw_target(item: &ItemDescriptor) -> &str {
  [item.committed.as_deref(), item.pending.as_deref()]
    .into_iter()
    .flatten()
    .find(|target| !target.is_empty())
    .unwrap_or("")
}
