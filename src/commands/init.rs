use std::io::{self, Write};

use crate::config::{Config, GEMINI_API_KEY, SUPABASE_KEY, SUPABASE_URL, YOUTUBE_API_KEY};
use crate::error::Result;

const KEYS: [&str; 4] = [YOUTUBE_API_KEY, GEMINI_API_KEY, SUPABASE_URL, SUPABASE_KEY];

pub fn run(config: &Config, force: bool) -> Result<()> {
    config.ensure_directories()?;

    let env_file = config.env_file_path();

    if env_file.exists() && !force {
        println!("Config already exists at {}", env_file.display());
        println!("Use --force to overwrite.");
        return Ok(());
    }

    let mut contents = String::new();
    for key in KEYS {
        print!("{} (leave empty to skip): ", key);
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        contents.push_str(&format!("{}={}\n", key, input.trim()));
    }

    std::fs::write(&env_file, contents)?;

    println!("Config saved to {}", env_file.display());
    println!("Data directory: {}", config.data_dir.display());

    Ok(())
}
