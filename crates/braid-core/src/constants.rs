//! Named limits and defaults
//!
//! TigerStyle: Every tunable has exactly one named home. Call sites never
//! carry magic numbers.

/// Similarity above this keeps the message on its current branch.
pub const STAY_THRESHOLD_DEFAULT: f32 = 0.47;

/// Similarity at or below this makes a branch a new semantic cluster.
pub const NEW_CLUSTER_THRESHOLD_DEFAULT: f32 = 0.20;

/// Another branch's score above this routes the message there.
pub const ROUTE_THRESHOLD_DEFAULT: f32 = 0.42;

/// How many branches the classifier considers per request.
pub const BRANCHES_FOR_CONTEXT_MAX_DEFAULT: usize = 10;

/// Multiplier applied to non-current branch scores when the message carries
/// an explicit topic-return cue ("back to ...").
pub const TOPIC_RETURN_BOOST_FACTOR: f32 = 2.5;

/// Centroid weight for user turns. User turns define the topic; assistant
/// turns elaborate it, so user drift moves the centroid harder.
pub const USER_CENTROID_WEIGHT: f32 = 3.0;

/// Centroid weight for assistant turns.
pub const ASSISTANT_CENTROID_WEIGHT: f32 = 1.0;

/// Total deadline for one routing request.
pub const PIPELINE_TIMEOUT_MS_DEFAULT: u64 = 10_000;

/// Deadline for a background fact-extraction pass.
pub const FACT_EXTRACTION_TIMEOUT_MS: u64 = 15_000;

/// Embedding dimension of the default sidecar model
/// (paraphrase-MiniLM-L6-v2).
pub const EMBEDDING_DIM_DEFAULT: usize = 384;

/// Default base URL of the embedding sidecar.
pub const EMBEDDING_BASE_URL_DEFAULT: &str = "http://127.0.0.1:8100";

/// Branch summaries are clipped to this many characters.
pub const BRANCH_SUMMARY_CHARS_MAX: usize = 100;
