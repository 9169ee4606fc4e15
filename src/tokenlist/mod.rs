pub mod io;
pub mod merge;
pub mod model;
pub mod schema;

pub use io::{fetch_published_tokenlist, load_tokenlist, save_json};
pub use merge::{build_token_map, dedupe_tokens, ensure_native_token, update_tokenlist, MergeOutcome};
pub use model::{TagDefinition, TokenList, Version, DEFAULT_LIST_NAME};
pub use schema::{validate_token, validate_tokenlist, SchemaViolation, MAX_DECIMALS};
