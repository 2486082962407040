//! Provider identifier embedded in handoff messages.

// std
use std::ops::Deref;
// self
use crate::_prelude::*;

const IDENTIFIER_MAX_LEN: usize = 64;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("Provider identifier cannot be empty.")]
	Empty,
	/// The identifier contains a character outside `[a-z0-9_-]`.
	#[error("Provider identifier contains an unsupported character: {ch:?}.")]
	InvalidCharacter {
		/// First offending character.
		ch: char,
	},
	/// The identifier exceeded the allowed character count.
	#[error("Provider identifier exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
}

/// Identifier for an OAuth provider, used as the `authorization:{provider}:` message prefix.
///
/// Only lowercase ASCII letters, digits, `_` and `-` are accepted, so the identifier can never
/// contain the `:` separator the opener splits messages on.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProviderId(String);
impl ProviderId {
	/// Creates a new identifier after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
		let view = value.as_ref();

		validate_view(view)?;

		Ok(Self(view.to_owned()))
	}
}
impl Deref for ProviderId {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for ProviderId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl From<ProviderId> for String {
	fn from(value: ProviderId) -> Self {
		value.0
	}
}
impl TryFrom<String> for ProviderId {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_view(&value)?;

		Ok(Self(value))
	}
}
impl Debug for ProviderId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Provider({})", self.0)
	}
}
impl Display for ProviderId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl FromStr for ProviderId {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

fn validate_view(view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty);
	}
	if let Some(ch) = view
		.chars()
		.find(|ch| !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '-')))
	{
		return Err(IdentifierError::InvalidCharacter { ch });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn identifiers_validate_charset() {
		let github = ProviderId::new("github").expect("Provider fixture should be valid.");

		assert_eq!(github.as_ref(), "github");
		assert_eq!(ProviderId::new(""), Err(IdentifierError::Empty));
		assert_eq!(
			ProviderId::new("git:hub"),
			Err(IdentifierError::InvalidCharacter { ch: ':' })
		);
		assert!(ProviderId::new("GitHub").is_err());
		assert!(ProviderId::new("with space").is_err());
		assert!(ProviderId::new("a".repeat(IDENTIFIER_MAX_LEN + 1)).is_err());
	}

	#[test]
	fn serde_round_trip_enforces_validation() {
		let provider: ProviderId =
			serde_json::from_str("\"gitlab-ee\"").expect("Provider should deserialize.");

		assert_eq!(provider.as_ref(), "gitlab-ee");
		assert!(serde_json::from_str::<ProviderId>("\"a:b\"").is_err());
	}
}
