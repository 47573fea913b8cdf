pub mod issue;
pub mod project;
pub mod user;
pub mod priority;
pub mod issue_type;
pub mod resolution;
pub mod status;
pub mod search;

pub use issue::*;
pub use project::*;
pub use user::*;
pub use priority::*;
pub use issue_type::*;
pub use resolution::*;
pub use status::*;
pub use search::*;
