//! Domain constants for the design-export pipeline

/// Lifetime of an [`crate::types::AuthorizationState`] row, in minutes.
///
/// `expires_at` is always `created_at` plus exactly this duration.
pub const AUTHORIZATION_STATE_TTL_MINUTES: i64 = 10;

/// Safety margin subtracted from a token's expiry before it is considered
/// usable, in seconds. Covers clock drift and in-flight request latency.
pub const TOKEN_EXPIRY_SKEW_SECONDS: i64 = 60;

/// Interval between autofill job status polls, in seconds.
pub const JOB_POLL_INTERVAL_SECONDS: u64 = 2;

/// Overall deadline for an autofill job to reach a terminal state, in
/// seconds. The remote job may still complete after this; it is simply not
/// awaited further.
pub const JOB_POLL_TIMEOUT_SECONDS: u64 = 60;

/// Per-request timeout for calls to the design platform, in seconds.
pub const PLATFORM_REQUEST_TIMEOUT_SECONDS: u64 = 30;

/// Per-request timeout for fetching source images before upload, in seconds.
pub const IMAGE_FETCH_TIMEOUT_SECONDS: u64 = 10;
