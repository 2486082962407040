// self
use crate::_prelude::*;

/// Provider-specific quirks that influence how the relay talks to a provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderQuirks {
	/// Character used to join scopes when constructing the `scope` parameter.
	pub scope_delimiter: char,
	/// Token endpoint reports OAuth errors with `200 OK` instead of `400`.
	pub errors_with_ok_status: bool,
}
impl ProviderQuirks {
	/// Quirks observed on github.com and GitHub Enterprise Server.
	pub const fn github() -> Self {
		Self { scope_delimiter: ',', errors_with_ok_status: true }
	}
}
impl Default for ProviderQuirks {
	fn default() -> Self {
		Self { scope_delimiter: ' ', errors_with_ok_status: false }
	}
}
