//! Span attribute constants for conversation instrumentation.
//!
//! One shared vocabulary for `tracing::span!` field names, so dashboards
//! can slice by intent, state, or outcome without per-crate name drift.
//!
//! Span naming convention: `"{operation} {intent}"`
//! (e.g., `"handle_message product_query"`)

// --- Required attributes ---

/// The engine operation being performed (e.g., "handle_message", "sweep").
pub const CONVO_OPERATION_NAME: &str = "convo.operation.name";

/// The user whose session is being handled.
pub const CONVO_USER_ID: &str = "convo.user.id";

// --- Recommended attributes ---

/// Classified intent of the message (e.g., "product_query", "selection").
pub const CONVO_INTENT: &str = "convo.intent";

/// Dialogue state before the message was handled.
pub const CONVO_STATE: &str = "convo.state";

/// Product resolved from a back-reference, when any.
pub const CONVO_REFERENCED_PRODUCT: &str = "convo.referenced_product";

/// Running purchase-intent score after this turn.
pub const CONVO_PURCHASE_INTENT: &str = "convo.purchase_intent";

/// Number of candidates in a served answer.
pub const CONVO_CANDIDATE_COUNT: &str = "convo.candidate_count";

/// Whether the answer was produced from the offline fallback pool.
pub const CONVO_DEGRADED: &str = "convo.degraded";

// --- Operation name values ---

/// End-to-end handling of one user message.
pub const OP_HANDLE_MESSAGE: &str = "handle_message";

/// External catalog search.
pub const OP_SEARCH: &str = "search";

/// LLM phrasing of a reply.
pub const OP_PHRASE: &str = "phrase";

/// Periodic idle-session sweep.
pub const OP_SWEEP: &str = "sweep";
