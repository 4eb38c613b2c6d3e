//! Schema-directed language-service engine for Lethe.
//!
//! Given a [`PathContext`] (a root body schema, parsed files, and a
//! reference index), a [`Decoder`] answers the positional queries
//! behind editor features:
//! - [`Decoder::completion_at`]: candidates at a cursor
//! - [`Decoder::hover_at`]: hover payload at a cursor
//! - [`Decoder::semantic_tokens`]: schema-aware highlighting
//! - [`Decoder::reference_origins`] / [`Decoder::reference_targets`]
//!
//! Each call runs synchronously to completion, holds no shared mutable
//! state, and observes the request's cancellation token during the
//! walk. A [`Decoder`] serves one path context; hold one per language
//! variant or file tree.

use std::collections::BTreeMap;

use tracing::debug;

use lethe_schema::BodySchema;
use lethe_syntax::{Body, File, Pos};

mod blocks;
mod candidates;
mod context;
mod error;
mod expr;
mod hover;
mod reference;
mod semantic_tokens;
mod walk;

pub use blocks::{resolve_effective_body, EffectiveBody};
pub use tokio_util::sync::CancellationToken;
pub use candidates::{Candidate, CandidateKind, Candidates, TextEdit};
pub use context::RequestContext;
pub use error::{Error, ErrorKind};
pub use hover::HoverData;
pub use reference::{ReferenceIndex, ReferenceOrigin, ReferenceTarget};
pub use semantic_tokens::{SemanticToken, TokenModifier, TokenType};

use walk::Walker;

/// Everything the engine knows about one file tree: the root schema,
/// the parsed files, and the pluggable reference index. Immutable for
/// the lifetime of the decoder serving it.
#[derive(Debug, Clone, Default)]
pub struct PathContext {
    /// The body schema rooted at every file. Queries other than
    /// semantic tokens fail with [`ErrorKind::NoSchema`] without one.
    pub root_schema: Option<BodySchema>,
    pub files: BTreeMap<String, File>,
    pub reference_index: ReferenceIndex,
}

impl PathContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parsed file under its own filename.
    pub fn add_file(&mut self, file: File) {
        self.files.insert(file.filename.clone(), file);
    }
}

/// The engine façade for one path context.
#[derive(Debug, Clone)]
pub struct Decoder {
    ctx: PathContext,
}

impl Decoder {
    pub fn new(ctx: PathContext) -> Self {
        Self { ctx }
    }

    pub fn path_context(&self) -> &PathContext {
        &self.ctx
    }

    /// Completion candidates at `pos`.
    pub fn completion_at(
        &self,
        req: &RequestContext,
        filename: &str,
        pos: Pos,
    ) -> Result<Candidates, Error> {
        let (file, body) = self.native_file(filename)?;
        let schema = self.root_schema()?;
        debug!(%filename, %pos, "completion request");
        Walker::new(&self.ctx, filename, file).complete_in_body(req, body, schema, pos)
    }

    /// Hover payload at `pos`, or `None` when the position carries no
    /// schema information (e.g. inter-statement whitespace).
    pub fn hover_at(
        &self,
        req: &RequestContext,
        filename: &str,
        pos: Pos,
    ) -> Result<Option<HoverData>, Error> {
        let (file, body) = self.native_file(filename)?;
        let schema = self.root_schema()?;
        debug!(%filename, %pos, "hover request");
        Walker::new(&self.ctx, filename, file).hover_in_body(req, body, schema, pos)
    }

    /// Schema-aware semantic tokens for a whole file, sorted by
    /// position. Schema absence is not an error here: an empty list.
    pub fn semantic_tokens(
        &self,
        req: &RequestContext,
        filename: &str,
    ) -> Result<Vec<SemanticToken>, Error> {
        let (file, body) = self.native_file(filename)?;
        let Some(schema) = self.ctx.root_schema.as_ref() else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        Walker::new(&self.ctx, filename, file).tokens_in_body(
            req,
            body,
            schema,
            &Default::default(),
            &mut out,
        )?;
        out.sort_by(|a, b| a.range.start.cmp(&b.range.start));
        Ok(out)
    }

    /// Reference origins declared in a file: every expression the
    /// schema reads as a reference. Best-effort: uninterpretable
    /// expressions are skipped. `allow_self_refs` keeps origins that
    /// point at the address of their own declaring attribute.
    pub fn reference_origins(
        &self,
        req: &RequestContext,
        filename: &str,
        allow_self_refs: bool,
    ) -> Result<Vec<ReferenceOrigin>, Error> {
        let (file, body) = self.native_file(filename)?;
        let schema = self.root_schema()?;
        let mut out = Vec::new();
        Walker::new(&self.ctx, filename, file).origins_in_body(
            req,
            body,
            schema,
            allow_self_refs,
            &mut out,
        )?;
        Ok(out)
    }

    /// Reference targets declared in a file: every attribute and block
    /// whose schema carries an address, sorted by address.
    pub fn reference_targets(
        &self,
        req: &RequestContext,
        filename: &str,
    ) -> Result<Vec<ReferenceTarget>, Error> {
        let (file, body) = self.native_file(filename)?;
        let schema = self.root_schema()?;
        let mut out = Vec::new();
        Walker::new(&self.ctx, filename, file).targets_in_body(req, body, schema, &mut out)?;
        out.sort_by(|a, b| a.address.cmp(&b.address));
        Ok(out)
    }

    /// Look a file up and insist on the native dialect. The format
    /// check comes before the schema check: a foreign-dialect file is
    /// reported as such even when no schema is configured.
    fn native_file(&self, filename: &str) -> Result<(&File, &Body), Error> {
        let file = self
            .ctx
            .files
            .get(filename)
            .ok_or_else(|| Error::file_not_found(filename))?;
        let body = file
            .native_body()
            .ok_or_else(|| Error::unknown_file_format(filename))?;
        Ok((file, body))
    }

    fn root_schema(&self) -> Result<&BodySchema, Error> {
        self.ctx.root_schema.as_ref().ok_or_else(Error::no_schema)
    }
}
