//! Topic and event names exchanged between agents.
//!
//! Topic names double as the event names of the envelopes published on them,
//! except for the assistant reply which is published on
//! [`ASSISTANT_RESPONSE`] with the event [`ASSISTANT_REPLY_COMPLETED`].

/// Upload API announces a stored object.
pub const DOCS_UPLOADED: &str = "docs.uploaded";
/// Parser finished extracting document text.
pub const DOCS_PARSED: &str = "docs.parsed";
/// Parser could not fetch the uploaded object.
pub const DOCS_UPLOAD_FAILED: &str = "docs.upload.failed";
/// Parser fetched the object but could not extract text.
pub const DOCS_PARSE_FAILED: &str = "docs.parse.failed";
/// Live-connection gateway forwards user text.
pub const USER_MESSAGE: &str = "user.message";
/// Assistant delegates a question about active documents.
pub const LEGAL_FOLLOWUP_REQUESTED: &str = "legal.followup.requested";
/// Legal answered a document follow-up.
pub const LEGAL_FOLLOWUP_COMPLETED: &str = "legal.followup.completed";
/// Legal could not answer a document follow-up.
pub const LEGAL_FOLLOWUP_FAILED: &str = "legal.followup.failed";
/// Legal produced a document analysis.
pub const ANALYSIS_COMPLETED: &str = "analysis.completed";
/// Legal could not produce a document analysis.
pub const ANALYSIS_FAILED: &str = "analysis.failed";
/// Assistant produced a draft for validation.
pub const DRAFT_CREATED: &str = "draft.created";
/// Validator accepted a draft.
pub const DRAFT_APPROVED: &str = "draft.approved";
/// Validator rejected a draft.
pub const DRAFT_REJECTED: &str = "draft.rejected";
/// Assistant could not answer a user message.
pub const CHAT_ERROR: &str = "chat.error";
/// Final reply topic consumed by the delivery bridge.
pub const ASSISTANT_RESPONSE: &str = "assistant.response";
/// Event name of a completed assistant reply.
pub const ASSISTANT_REPLY_COMPLETED: &str = "assistant.reply.completed";

/// Default event assigned to adapted legacy messages.
pub const LEGACY_MESSAGE: &str = "legacy.message";
/// Default source assigned to adapted legacy messages.
pub const LEGACY_SOURCE: &str = "legacy";

/// Topics the delivery bridge forwards to live connections by default.
pub const DEFAULT_DELIVERY_TOPICS: &[&str] = &[
    ASSISTANT_RESPONSE,
    LEGAL_FOLLOWUP_COMPLETED,
    LEGAL_FOLLOWUP_FAILED,
    CHAT_ERROR,
    DRAFT_APPROVED,
    DRAFT_REJECTED,
    ANALYSIS_FAILED,
    DOCS_UPLOAD_FAILED,
    DOCS_PARSE_FAILED,
];
