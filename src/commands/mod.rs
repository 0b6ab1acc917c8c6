pub mod evaluate;
pub mod init;
pub mod run;
pub mod search;
pub mod stats;
pub mod transcript;

use crate::config::Config;
use crate::database::{SqliteStore, SupabaseStore, TableStore};
use crate::error::Result;

/// Open the remote Supabase tables, or the local SQLite file when `local` is set
pub(crate) fn open_store(config: &Config, local: bool) -> Result<Box<dyn TableStore>> {
    if local {
        config.ensure_directories()?;
        return Ok(Box::new(SqliteStore::open(&config.database_path())?));
    }
    let (url, key) = config.supabase()?;
    Ok(Box::new(SupabaseStore::new(url, key)?))
}
