use crate::commands::open_store;
use crate::config::Config;
use crate::database::{InsertOutcome, save_transcript};
use crate::error::{Error, Result};
use crate::transcript::{TranscriptResolution, YouTubeCaptions, resolve};
use crate::youtube::extract_video_id;

pub async fn run(config: &Config, input: &str, languages: &[String], save: bool, local: bool) -> Result<()> {
    let video_id = extract_video_id(input)
        .ok_or_else(|| Error::Config(format!("invalid video URL or ID: {input}")))?;
    let languages: Vec<&str> = languages.iter().map(String::as_str).collect();

    eprintln!("Fetching transcript for: {}", video_id);
    let captions = YouTubeCaptions::new()?;
    let resolution = resolve(&captions, &video_id, &languages).await;

    match &resolution {
        TranscriptResolution::Accepted { text, language } => {
            println!("Language: {}", language.eng_name());
            println!("Words: {}", text.split_whitespace().count());
            println!(
                "\nPreview (first 500 chars):\n{}{}",
                text.chars().take(500).collect::<String>(),
                if text.chars().count() > 500 { "..." } else { "" }
            );
        }
        TranscriptResolution::Blank(_) => println!("Transcript is blank."),
        TranscriptResolution::RejectedLanguage(language) => {
            println!("Transcript is in {}; it would be stored as null.", language.eng_name());
        }
        TranscriptResolution::Undetected => {
            println!("Could not detect the transcript language; it would be stored as null.");
        }
        TranscriptResolution::Unavailable(reason) => println!("No transcript available: {}", reason),
    }

    if save {
        let store = open_store(config, local)?;
        let record = resolution.into_record(&video_id);
        match save_transcript(store.as_ref(), &record).await? {
            InsertOutcome::Inserted => println!("Saved to transcriptions."),
            InsertOutcome::Skipped => println!("Already in transcriptions, nothing written."),
        }
    }

    Ok(())
}
