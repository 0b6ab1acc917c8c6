use crate::config::Config;
use crate::database::SqliteStore;
use crate::error::Result;

pub fn run(config: &Config) -> Result<()> {
    let path = config.database_path();
    if !path.exists() {
        println!("No local database at {}. Run with --local first.", path.display());
        return Ok(());
    }

    let stats = SqliteStore::open(&path)?.stats()?;

    println!("Local database statistics:\n");
    println!("Videos: {}", stats.total_videos);
    println!("Channels: {}", stats.unique_channels);
    println!("Transcriptions: {}", stats.total_transcriptions);
    println!("  stored as null: {}", stats.null_transcriptions);

    Ok(())
}
