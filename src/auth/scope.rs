//! Scope modeling for the authorize leg.

// self
use crate::_prelude::*;

/// Errors emitted when validating scopes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ScopeValidationError {
	/// Empty scope entries are not allowed.
	#[error("Scope entries cannot be empty.")]
	Empty,
	/// Scopes cannot contain embedded whitespace or delimiter characters.
	#[error("Scope contains a separator character: {scope}.")]
	ContainsSeparator {
		/// The offending scope string.
		scope: String,
	},
}

/// Ordered, deduplicated list of OAuth scopes.
///
/// Unlike a sorted set, the first-seen order is kept so the authorize URL carries the scopes
/// exactly as configured (`repo,user` stays `repo,user`).
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ScopeSet(Arc<[String]>);
impl ScopeSet {
	/// Creates a scope list from any iterator, dropping duplicates.
	pub fn new<I, S>(scopes: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut seen = Vec::<String>::new();

		for scope in scopes {
			let owned: String = scope.into();

			if owned.is_empty() {
				return Err(ScopeValidationError::Empty);
			}
			if owned.chars().any(|ch| ch.is_whitespace() || ch == ',') {
				return Err(ScopeValidationError::ContainsSeparator { scope: owned });
			}
			if !seen.contains(&owned) {
				seen.push(owned);
			}
		}

		Ok(Self(Arc::from(seen)))
	}

	/// Scopes requested when nothing else is configured: `repo,user`.
	pub fn repo_user() -> Self {
		Self(Arc::from(["repo".to_owned(), "user".to_owned()]))
	}

	/// Returns true if no scopes are defined.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterator over scopes in configured order.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(String::as_str)
	}

	/// Joins the scopes with the provider's delimiter; `None` when the list is empty.
	pub fn join(&self, delimiter: char) -> Option<String> {
		if self.is_empty() {
			return None;
		}

		let mut buf = String::new();

		for (idx, value) in self.iter().enumerate() {
			if idx > 0 {
				buf.push(delimiter);
			}

			buf.push_str(value);
		}

		Some(buf)
	}
}
impl Debug for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ScopeSet").field(&self.0).finish()
	}
}
impl Display for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.join(',').unwrap_or_default())
	}
}
/// Parses comma- and/or whitespace-separated scope strings such as `repo,user` or `repo user`.
impl FromStr for ScopeSet {
	type Err = ScopeValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.trim().is_empty() {
			return Err(ScopeValidationError::Empty);
		}

		Self::new(s.split(|ch: char| ch == ',' || ch.is_whitespace()).filter(|part| !part.is_empty()))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn scopes_keep_order_and_dedupe() {
		let scopes = ScopeSet::new(["repo", "user", "repo"]).expect("Scope list should be valid.");

		assert_eq!(scopes.iter().count(), 2);
		assert_eq!(scopes.join(','), Some("repo,user".into()));
		assert_eq!(scopes.join(' '), Some("repo user".into()));
		assert_eq!(scopes.to_string(), "repo,user");
	}

	#[test]
	fn scopes_parse_mixed_separators() {
		let scopes = ScopeSet::from_str("repo, user read:org").expect("Scope string should parse.");

		assert_eq!(scopes.iter().collect::<Vec<_>>(), vec!["repo", "user", "read:org"]);
		assert!(ScopeSet::from_str("   ").is_err(), "Whitespace-only input must be rejected.");
	}

	#[test]
	fn invalid_scopes_error() {
		assert_eq!(ScopeSet::new([""]), Err(ScopeValidationError::Empty));
		assert!(matches!(
			ScopeSet::new(["repo,user"]),
			Err(ScopeValidationError::ContainsSeparator { .. })
		));
		assert_eq!(ScopeSet::default().join(','), None);
	}
}
