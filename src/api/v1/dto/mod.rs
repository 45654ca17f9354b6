pub mod snippets;
pub mod users;
