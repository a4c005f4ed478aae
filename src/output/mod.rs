use anyhow::Result;
use serde::Serialize;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::pipeline::Transcript;

/// JSON body for a fetched transcript
#[derive(Debug, Serialize)]
struct TranscriptResponse<'a> {
    success: bool,
    #[serde(flatten)]
    transcript: &'a Transcript,
}

/// Render a transcript in the requested format
pub fn render(transcript: &Transcript, format: &OutputFormat) -> Result<String> {
    let content = match format {
        OutputFormat::Text => transcript.full_text.clone(),
        OutputFormat::Json => serde_json::to_string_pretty(&TranscriptResponse {
            success: true,
            transcript,
        })?,
    };
    Ok(content)
}

/// Save transcript to file
pub async fn save_to_file(transcript: &Transcript, path: &Path, format: &OutputFormat) -> Result<()> {
    let content = render(transcript, format)?;
    fs_err::write(path, content)?;
    Ok(())
}

/// Print transcript to console
pub fn print_to_console(transcript: &Transcript, format: &OutputFormat) -> Result<()> {
    println!("{}", render(transcript, format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::VideoId;
    use chrono::Utc;

    fn transcript() -> Transcript {
        Transcript {
            video_id: VideoId::new("dQw4w9WgXcQ").unwrap(),
            full_text: "Hello world".to_string(),
            source: "mirrors",
            retrieved_at: Utc::now(),
        }
    }

    #[test]
    fn test_render_text() {
        assert_eq!(render(&transcript(), &OutputFormat::Text).unwrap(), "Hello world");
    }

    #[test]
    fn test_render_json() {
        let rendered = render(&transcript(), &OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["transcript"], "Hello world");
        assert_eq!(value["video_id"], "dQw4w9WgXcQ");
        assert_eq!(value["source"], "mirrors");
        assert!(value["retrieved_at"].as_str().is_some());
        assert!(value.get("full_text").is_none());
    }

    #[tokio::test]
    async fn test_save_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        save_to_file(&transcript(), &path, &OutputFormat::Text).await.unwrap();
        assert_eq!(fs_err::read_to_string(&path).unwrap(), "Hello world");
    }
}
