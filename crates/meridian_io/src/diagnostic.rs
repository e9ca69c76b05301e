//! Rendering of effect node graphs.
//!
//! Every node has an id of the form `io-<n>` (`io-pipe-<n>` for pipe
//! composites) where `n` is a base-32 sequence number drawn from the node's
//! [`IoRuntime`](crate::IoRuntime). A rendered graph lists a node, its state
//! and, one level deeper, every subscriber that is itself a node:
//!
//! ```text
//!  · IO: io-0 (success)
//!    · IO: io-1 (success)
//!      · IO: io-2 (pending)
//! ```

use crate::sink::State;

/// Deepest level rendered; deeper subscribers are elided.
pub const MAX_DEPTH: usize = 64;

/// A node that can describe itself.
pub trait Diagnostic {
    /// Returns the node id.
    fn id(&self) -> &str;

    /// Returns the node's settlement state.
    fn state(&self) -> State;

    /// Appends this node and its node subscribers to `out`, indented by
    /// `level`.
    fn render(&self, level: usize, out: &mut String);
}

/// Renders `node` and everything subscribed to it.
#[must_use]
pub fn render_diagnostic(node: &dyn Diagnostic) -> String {
    let mut out = String::new();
    node.render(0, &mut out);
    out
}

/// Emits [`render_diagnostic`] through `tracing` at info level.
pub fn print_diagnostic(node: &dyn Diagnostic) {
    let rendered = render_diagnostic(node);
    tracing::info!(node = node.id(), "effect graph\n{}", rendered.trim_end());
}

pub(crate) fn write_line(level: usize, id: &str, label: &dyn core::fmt::Display, out: &mut String) {
    out.push_str(&"  ".repeat(level));
    out.push_str(&format!(" · IO: {id} ({label})\n"));
}

pub(crate) fn write_elided(level: usize, out: &mut String) {
    out.push_str(&"  ".repeat(level));
    out.push_str(" · ...\n");
}

pub(crate) fn to_base32(mut n: u64) -> String {
    const DIGITS: &[u8; 32] = b"0123456789abcdefghijklmnopqrstuv";
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(DIGITS[(n % 32) as usize]);
        n /= 32;
    }
    digits.iter().rev().map(|&d| char::from(d)).collect()
}
