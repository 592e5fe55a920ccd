use std::time::Duration;

// doc constants
pub const DOC_ID: &str = "_id";
pub const DOC_CREATED: &str = "created_at";
pub const DOC_MODIFIED: &str = "updated_at";

// filter operator keys
pub const OP_IN: &str = "$in";
pub const OP_GT: &str = "$gt";
pub const OP_GTE: &str = "$gte";
pub const OP_LT: &str = "$lt";
pub const OP_LTE: &str = "$lte";
pub const OP_NE: &str = "$ne";
pub const OP_REGEX: &str = "$regex";
pub const OP_OPTIONS: &str = "$options";

// update operator keys
pub const OP_SET: &str = "$set";

// cache constants
pub const CACHE_WILDCARD: char = '*';
pub const DEFAULT_RESULT_TTL: Duration = Duration::from_secs(300);

// regex flag characters accepted by `$options`
pub const REGEX_FLAGS: &str = "imsxU";
