pub(crate) mod answers;
pub(crate) mod categories;
pub(crate) mod questions;
pub(crate) mod results;
pub(crate) mod tests;
pub(crate) mod users;
