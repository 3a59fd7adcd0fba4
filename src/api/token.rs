//! Generation tokens for "latest request wins".
//!
//! Every async request (and every frame loop) captures a token when it starts
//! and checks it when it completes. Issuing a new token invalidates all older
//! ones, so a slow response can never overwrite a newer one.

use std::cell::Cell;

/// One generation, captured when a request starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token(u64);

/// Issues tokens for one kind of request.
#[derive(Debug, Default)]
pub struct RequestTokens {
	current: Cell<u64>,
}

impl RequestTokens {
	/// A counter with no token issued yet.
	pub fn new() -> Self {
		Self::default()
	}

	/// Start a new generation; all previously issued tokens become stale.
	pub fn issue(&self) -> Token {
		let next = self.current.get().wrapping_add(1);
		self.current.set(next);
		Token(next)
	}

	/// Stale every outstanding token without starting new work.
	pub fn invalidate(&self) {
		self.current.set(self.current.get().wrapping_add(1));
	}

	/// Whether `token` is still the latest one.
	pub fn is_current(&self, token: Token) -> bool {
		self.current.get() == token.0
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn newer_token_stales_older() {
		let tokens = RequestTokens::new();
		let first = tokens.issue();
		assert!(tokens.is_current(first));
		let second = tokens.issue();
		assert!(!tokens.is_current(first));
		assert!(tokens.is_current(second));
	}

	#[test]
	fn invalidate_stales_everything() {
		let tokens = RequestTokens::new();
		let token = tokens.issue();
		tokens.invalidate();
		assert!(!tokens.is_current(token));
	}
}
