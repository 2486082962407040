//! Shared helpers for the authorize and callback legs.

// self
use crate::_prelude::*;

/// Path of the callback endpoint the provider redirects back to.
pub const CALLBACK_PATH: &str = "/api/callback";

/// Redirect URI derived from the inbound `Host` header.
///
/// The string is kept exactly as formatted (`https://{host}/api/callback`) and never
/// re-serialized through [`Url`], so the value sent on the authorize leg and the one
/// recomputed on the callback leg are byte-identical.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RedirectUri(String);
impl RedirectUri {
	/// Builds the redirect URI for `host`.
	///
	/// Hosts that would change the URL's shape (userinfo, extra path, query, or fragment) are
	/// rejected.
	pub fn for_host(host: &str) -> Result<Self> {
		if host.is_empty() {
			return Err(Error::invalid_request("the Host header is empty"));
		}
		if host.chars().any(|ch| ch.is_whitespace() || ch.is_control()) {
			return Err(Error::invalid_request("the Host header contains whitespace"));
		}

		let raw = format!("https://{host}{CALLBACK_PATH}");
		let parsed = Url::parse(&raw)
			.map_err(|_| Error::invalid_request("the Host header is not a valid authority"))?;

		if parsed.host().is_none()
			|| !parsed.username().is_empty()
			|| parsed.password().is_some()
			|| parsed.path() != CALLBACK_PATH
			|| parsed.query().is_some()
			|| parsed.fragment().is_some()
		{
			return Err(Error::invalid_request("the Host header is not a plain authority"));
		}

		Ok(Self(raw))
	}

	/// Returns the exact redirect URI string.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for RedirectUri {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Display for RedirectUri {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
