//! Per-request options and cancellation.
//!
//! Every engine call takes a [`RequestContext`]: a small copy-on-write
//! options value passed explicitly down the walk, never global state.
//! The walker itself extends it as it descends (e.g. marking that the
//! current body accepts the `count` meta-attribute).

use tokio_util::sync::CancellationToken;

use crate::error::Error;

/// Options and cancellation for a single engine call.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Observed at least once per block descent and once per
    /// candidate-emission loop; when fired, the call returns
    /// [`crate::ErrorKind::Cancelled`] with no partial output.
    pub cancel: CancellationToken,
    /// Pre-instantiate nested required fields in structured-type
    /// snippets.
    pub prefill_required_fields: bool,
    /// Set by the walker while inside a body whose schema enables the
    /// `count` extension.
    pub(crate) active_count: bool,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_prefill_required_fields(mut self) -> Self {
        self.prefill_required_fields = true;
        self
    }

    /// Re-scope this context to a body with the given extensions. Each
    /// body descent derives its own copy, so flags never leak into
    /// sibling or nested bodies.
    pub(crate) fn scoped_to(&self, extensions: lethe_schema::BodyExtensions) -> Self {
        let mut next = self.clone();
        next.active_count = extensions.count;
        next
    }

    /// Bail out if the caller has given up on this request.
    pub(crate) fn check(&self) -> Result<(), Error> {
        if self.cancel.is_cancelled() {
            Err(Error::cancelled())
        } else {
            Ok(())
        }
    }
}
