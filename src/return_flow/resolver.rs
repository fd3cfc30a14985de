//! Request-id resolution on return from the payment page
//!
//! The gateway redirects the buyer back with the request id in one of
//! several places depending on how the session was entered. Resolution is
//! an explicit ordered list of resolvers, first hit wins:
//!
//! 1. `requestId` query parameter
//! 2. `reference` query parameter
//! 3. last path segment, if numeric
//! 4. one-time stashed value from the checkout step
//!
//! The stash is consumed when read, so a second resolution pass over the
//! same context cannot double-consume it.

use std::collections::HashMap;
use tracing::debug;

/// Everything the return page knows about its own URL, plus the value
/// stashed before the buyer was sent to the gateway.
#[derive(Debug, Clone, Default)]
pub struct ReturnContext {
    pub query: HashMap<String, String>,
    pub path: String,
    pub stash: Option<String>,
}

type Resolver = fn(&mut ReturnContext) -> Option<String>;

const RESOLVERS: &[(&str, Resolver)] = &[
    ("requestId param", from_request_id_param),
    ("reference param", from_reference_param),
    ("path segment", from_numeric_path_segment),
    ("stash", from_stash),
];

/// Try each resolver in order, short-circuiting on the first hit.
pub fn resolve_request_id(ctx: &mut ReturnContext) -> Option<String> {
    for (name, resolver) in RESOLVERS {
        if let Some(value) = resolver(ctx) {
            debug!(source = name, "resolved request id");
            return Some(value);
        }
    }
    None
}

fn from_request_id_param(ctx: &mut ReturnContext) -> Option<String> {
    non_empty(ctx.query.get("requestId").cloned())
}

fn from_reference_param(ctx: &mut ReturnContext) -> Option<String> {
    non_empty(ctx.query.get("reference").cloned())
}

fn from_numeric_path_segment(ctx: &mut ReturnContext) -> Option<String> {
    let segment = ctx.path.trim_end_matches('/').rsplit('/').next()?;
    if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
        Some(segment.to_string())
    } else {
        None
    }
}

fn from_stash(ctx: &mut ReturnContext) -> Option<String> {
    non_empty(ctx.stash.take())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
