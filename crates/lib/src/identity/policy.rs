use url::Url;

use super::normalize::{normalize, resolve_raw_target};
use crate::host::ItemDescriptor;

/// Schemes that are syncable unless configured otherwise.
pub const DEFAULT_SCHEMES: &[&str] = &["http", "https"];

/// Prefix of grouped identity keys, followed by the serialized origin.
const GROUPED_KEY_PREFIX: &str = "origin:";

/// Host matcher for selective grouping.
///
/// `*.example.com` matches `example.com` and every subdomain of it; anything
/// else matches the host exactly. Matching is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostPattern {
  Exact(String),
  Suffix(String),
}

impl HostPattern {
  pub fn parse(pattern: &str) -> Self {
    let pattern = pattern.trim().to_ascii_lowercase();
    match pattern.strip_prefix("*.") {
      Some(suffix) => HostPattern::Suffix(suffix.to_string()),
      None => HostPattern::Exact(pattern),
    }
  }

  pub fn matches(&self, host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    match self {
      HostPattern::Exact(expected) => host == *expected,
      HostPattern::Suffix(suffix) => {
        host == *suffix
          || host
            .strip_suffix(suffix.as_str())
            .is_some_and(|rest| rest.ends_with('.'))
      }
    }
  }
}

/// How normalized targets are grouped into canonical slots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum IdentityPolicy {
  /// One slot per distinct normalized target.
  #[default]
  Exact,
  /// One slot per origin (scheme, host and port).
  Grouped,
  /// Origin slots for matching hosts, exact slots everywhere else.
  Selective(Vec<HostPattern>),
}

/// A syncable item reduced to its identity key and normalized target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
  pub key: String,
  pub representation: String,
}

/// Syncability rules plus identity policy for one deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
  policy: IdentityPolicy,
  schemes: Vec<String>,
}

impl Default for Identity {
  fn default() -> Self {
    Self::new(IdentityPolicy::default())
  }
}

impl Identity {
  pub fn new(policy: IdentityPolicy) -> Self {
    Self {
      policy,
      schemes: DEFAULT_SCHEMES.iter().map(|s| s.to_string()).collect(),
    }
  }

  /// Replaces the scheme allow-list.
  pub fn with_schemes<I, S>(mut self, schemes: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    self.schemes = schemes.into_iter().map(|s| s.as_ref().to_ascii_lowercase()).collect();
    self
  }

  pub fn policy(&self) -> &IdentityPolicy {
    &self.policy
  }

  pub fn schemes(&self) -> &[String] {
    &self.schemes
  }

  /// True iff `raw` is an absolute network address with an allowed scheme.
  pub fn is_syncable(&self, raw: &str) -> bool {
    match Url::parse(raw) {
      Ok(url) => self.schemes.iter().any(|s| s == url.scheme()) && url.host().is_some(),
      Err(_) => false,
    }
  }

  /// Identity key of a raw target under this policy.
  ///
  /// Deterministic and side-effect free. Unparseable input yields the input
  /// itself, mirroring [`normalize`].
  pub fn identity_key(&self, raw: &str) -> String {
    let representation = normalize(raw);
    match Url::parse(&representation) {
      Ok(url) if self.groups(&url) => grouped_key(&url).unwrap_or(representation),
      _ => representation,
    }
  }

  fn groups(&self, url: &Url) -> bool {
    match &self.policy {
      IdentityPolicy::Exact => false,
      IdentityPolicy::Grouped => true,
      IdentityPolicy::Selective(patterns) => url
        .host_str()
        .is_some_and(|host| patterns.iter().any(|p| p.matches(host))),
    }
  }

  /// Classifies a raw target, or `None` if it is not syncable.
  pub fn classify_raw(&self, raw: &str) -> Option<Classified> {
    if !self.is_syncable(raw) {
      return None;
    }
    Some(Classified {
      key: self.identity_key(raw),
      representation: normalize(raw),
    })
  }

  /// Classifies an item by its resolved target, ignoring its pinned flag.
  pub fn classify(&self, item: &ItemDescriptor) -> Option<Classified> {
    self.classify_raw(resolve_raw_target(item))
  }
}

fn grouped_key(url: &Url) -> Option<String> {
  let origin = url.origin();
  origin
    .is_tuple()
    .then(|| format!("{}{}", GROUPED_KEY_PREFIX, origin.ascii_serialization()))
}
