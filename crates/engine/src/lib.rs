pub mod categorize;
pub mod matcher;
pub mod selector;
pub mod summary;
pub mod validate;

pub use categorize::{categorize, CategorizeOutput};
pub use matcher::{matches, MatchError};
pub use selector::{select, RuleSet};
pub use summary::{summarize, uncategorized, MerchantTally, Summary, UncategorizedReport};
pub use validate::{load_json, load_toml, validate, ValidationError};
