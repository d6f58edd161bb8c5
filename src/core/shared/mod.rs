pub mod schema;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod utils;

pub use utils::{create_pool, run_migrations, DbPool};
