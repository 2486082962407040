//! Popup-to-opener handoff protocol.
//!
//! The callback page talks to the window that opened it in two phases:
//!
//! 1. **Announce**: right after attaching its `message` listener, the popup posts
//!    `authorizing:{provider}` to `window.opener` with target origin `*`.
//! 2. **Deliver**: when the opener answers with any message, the listener posts
//!    `authorization:{provider}:{status}:{json}` back to the origin that answered, then
//!    detaches itself so the result is delivered at most once.
//!
//! The result is never posted before the opener has answered the announcement.

// self
use crate::{
	_prelude::*,
	auth::ProviderId,
	error::ErrorKind,
	flows::AccessGrant,
};

/// Result status carried by the deliver message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandoffStatus {
	/// The code exchange produced a token.
	Success,
	/// The flow failed; the payload describes why.
	Error,
}
impl HandoffStatus {
	/// Returns the wire label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Success => "success",
			Self::Error => "error",
		}
	}
}
impl Display for HandoffStatus {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// JSON payload of a successful handoff.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessPayload {
	/// Access token for the opener to use against the provider API.
	pub token: String,
	/// Provider identifier.
	pub provider: ProviderId,
}

/// JSON payload of a failed handoff.
///
/// Only a stable kind and the relay's own message are exposed; transport internals never
/// reach the browser.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
	/// Stable error classification.
	pub kind: ErrorKind,
	/// Human-readable summary.
	pub message: String,
}
impl From<&Error> for ErrorPayload {
	fn from(err: &Error) -> Self {
		Self { kind: err.kind(), message: err.to_string() }
	}
}

/// One of the two messages exchanged with the opener window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandoffMessage {
	/// Phase one: tell the opener the popup is ready.
	Announce {
		/// Provider identifier.
		provider: ProviderId,
	},
	/// Phase two: hand over the result.
	Deliver {
		/// Provider identifier.
		provider: ProviderId,
		/// Result status.
		status: HandoffStatus,
		/// Serialized JSON payload.
		payload: String,
	},
}
impl HandoffMessage {
	/// Builds the deliver message for a successful exchange.
	pub fn success(grant: &AccessGrant) -> Result<Self, serde_json::Error> {
		let payload = serde_json::to_string(&SuccessPayload {
			token: grant.access_token.expose().to_owned(),
			provider: grant.provider.clone(),
		})?;

		Ok(Self::Deliver { provider: grant.provider.clone(), status: HandoffStatus::Success, payload })
	}

	/// Builds the deliver message for a failed flow.
	pub fn failure(provider: &ProviderId, err: &Error) -> Result<Self, serde_json::Error> {
		let payload = serde_json::to_string(&ErrorPayload::from(err))?;

		Ok(Self::Deliver { provider: provider.clone(), status: HandoffStatus::Error, payload })
	}

	/// Renders the string posted to the opener.
	pub fn to_wire(&self) -> String {
		match self {
			Self::Announce { provider } => format!("authorizing:{provider}"),
			Self::Deliver { provider, status, payload } =>
				format!("authorization:{provider}:{status}:{payload}"),
		}
	}
}

/// Renders the HTML page returned by the callback endpoint.
///
/// The listener is attached before the announcement is posted, and removes itself on its
/// first invocation.
pub fn render_page(deliver: &HandoffMessage) -> String {
	let provider = match deliver {
		HandoffMessage::Announce { provider } | HandoffMessage::Deliver { provider, .. } =>
			provider.clone(),
	};
	let announce = HandoffMessage::Announce { provider }.to_wire();

	format!(
		r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>Authorizing…</title></head>
<body>
<script>
  const receiveMessage = (message) => {{
    window.opener.postMessage(
      '{deliver}',
      message.origin
    );

    window.removeEventListener("message", receiveMessage, false);
  }};
  window.addEventListener("message", receiveMessage, false);

  window.opener.postMessage('{announce}', "*");
</script>
</body>
</html>
"#,
		deliver = escape_js_single_quoted(&deliver.to_wire()),
		announce = escape_js_single_quoted(&announce),
	)
}

/// Escapes `raw` for a single-quoted JavaScript literal inside an inline `<script>`.
///
/// Ordinary JSON passes through unchanged apart from backslashes, so the opener receives the
/// exact payload string.
pub fn escape_js_single_quoted(raw: &str) -> String {
	let mut buf = String::with_capacity(raw.len());

	for ch in raw.chars() {
		match ch {
			'\\' => buf.push_str("\\\\"),
			'\'' => buf.push_str("\\'"),
			'<' => buf.push_str("\\u003c"),
			'>' => buf.push_str("\\u003e"),
			'&' => buf.push_str("\\u0026"),
			'\n' => buf.push_str("\\n"),
			'\r' => buf.push_str("\\r"),
			'\u{2028}' => buf.push_str("\\u2028"),
			'\u{2029}' => buf.push_str("\\u2029"),
			_ => buf.push(ch),
		}
	}

	buf
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn github() -> ProviderId {
		ProviderId::new("github").expect("Provider fixture should be valid.")
	}

	fn grant(token: &str) -> AccessGrant {
		AccessGrant { access_token: crate::auth::TokenSecret::new(token), provider: github() }
	}

	#[test]
	fn success_message_matches_wire_format() {
		let message = HandoffMessage::success(&grant("gho_abc123"))
			.expect("Success payload should serialize.");

		assert_eq!(
			message.to_wire(),
			r#"authorization:github:success:{"token":"gho_abc123","provider":"github"}"#
		);
		assert_eq!(HandoffMessage::Announce { provider: github() }.to_wire(), "authorizing:github");
	}

	#[test]
	fn failure_message_carries_kind_and_message() {
		let err = Error::InvalidGrant { reason: "bad_verification_code".into() };
		let message =
			HandoffMessage::failure(&github(), &err).expect("Error payload should serialize.");

		assert_eq!(
			message.to_wire(),
			r#"authorization:github:error:{"kind":"invalid_grant","message":"Provider rejected the grant: bad_verification_code."}"#
		);
	}

	#[test]
	fn page_registers_listener_before_announcing() {
		let message = HandoffMessage::success(&grant("gho_abc123"))
			.expect("Success payload should serialize.");
		let page = render_page(&message);
		let add = page.find("addEventListener").expect("Listener registration should exist.");
		let announce =
			page.find("postMessage('authorizing:github', \"*\")").expect("Announce should exist.");
		let deliver = page
			.find(r#"'authorization:github:success:{"token":"gho_abc123","provider":"github"}'"#)
			.expect("Deliver payload should appear verbatim.");

		assert!(deliver < add, "Deliver call lives inside the listener body.");
		assert!(add < announce, "Listener must be attached before announcing.");
		assert!(page.contains("removeEventListener(\"message\", receiveMessage, false)"));
		assert!(page.contains("message.origin"));
	}

	#[test]
	fn hostile_payloads_cannot_escape_the_script() {
		let escaped = escape_js_single_quoted(r#"</script><script>alert('x')\"#);

		assert!(!escaped.contains('<'));
		assert!(!escaped.contains("'x'"));
		assert_eq!(escaped, r#"\u003c/script\u003e\u003cscript\u003ealert(\'x\')\\"#);
	}
}
