//! Media commands. Argument checking only: this deployment does not download
//! or transcode audio/video, so valid requests get an explanatory reply.

use async_trait::async_trait;
use hush_core::{
    error::HushError,
    traits::{CommandContext, CommandHandler},
};

/// Whether `url` points at a single YouTube video.
pub fn is_youtube_url(url: &str) -> bool {
    let rest = match url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
    {
        Some(r) => r,
        None => url,
    };
    let (host, path) = rest.split_once('/').unwrap_or((rest, ""));
    let host = host.strip_prefix("www.").unwrap_or(host);

    let id = match host {
        "youtu.be" => path.split(['?', '/']).next().unwrap_or(""),
        "youtube.com" | "m.youtube.com" | "music.youtube.com" => {
            if let Some(query) = path.strip_prefix("watch?") {
                query
                    .split('&')
                    .find_map(|kv| kv.strip_prefix("v="))
                    .unwrap_or("")
            } else if let Some(short) = path.strip_prefix("shorts/") {
                short.split(['?', '/']).next().unwrap_or("")
            } else {
                ""
            }
        }
        _ => "",
    };

    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// `yt <url>` placeholder.
pub struct YtCommand;

#[async_trait]
impl CommandHandler for YtCommand {
    fn name(&self) -> &str {
        "yt"
    }

    fn description(&self) -> &str {
        "YouTube video downloader (stub)"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<(), HushError> {
        let Some(url) = ctx.args.first() else {
            return ctx
                .reply(&format!(
                    "❌ Please provide a YouTube video link after {}yt",
                    ctx.prefix
                ))
                .await;
        };
        ctx.reply(&format!(
            "🎬 Downloading YouTube video:\n{url}\n\n(This is a stub command, downloads are not available yet.)"
        ))
        .await
    }
}

/// `song <query>`.
pub struct SongCommand;

#[async_trait]
impl CommandHandler for SongCommand {
    fn name(&self) -> &str {
        "song"
    }

    fn description(&self) -> &str {
        "Search a song by name"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<(), HushError> {
        let query = ctx.args.join(" ");
        if query.is_empty() {
            return ctx
                .reply(&format!("❌ Usage: {}song <name>", ctx.prefix))
                .await;
        }
        ctx.reply(&format!(
            "🎵 {query}\n\nAudio downloads are not available on this bot."
        ))
        .await
    }
}

/// `video <youtube-url>`.
pub struct VideoCommand;

#[async_trait]
impl CommandHandler for VideoCommand {
    fn name(&self) -> &str {
        "video"
    }

    fn description(&self) -> &str {
        "Fetch a YouTube video by URL"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<(), HushError> {
        match ctx.args.first() {
            Some(url) if is_youtube_url(url) => {
                ctx.reply(&format!(
                    "🎬 {url}\n\nVideo downloads are not available on this bot."
                ))
                .await
            }
            _ => {
                ctx.reply(&format!("❌ Usage: {}video <youtube-url>", ctx.prefix))
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{message_from, run, RecordingConnection};

    #[test]
    fn test_youtube_url_forms() {
        assert!(is_youtube_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(is_youtube_url("https://youtube.com/watch?feature=x&v=dQw4w9WgXcQ"));
        assert!(is_youtube_url("http://m.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(is_youtube_url("https://youtu.be/dQw4w9WgXcQ?t=10"));
        assert!(is_youtube_url("https://www.youtube.com/shorts/abc_DEF-123"));
        assert!(is_youtube_url("youtu.be/dQw4w9WgXcQ"));
    }

    #[test]
    fn test_non_youtube_urls_rejected() {
        assert!(!is_youtube_url("https://vimeo.com/12345"));
        assert!(!is_youtube_url("https://www.youtube.com/"));
        assert!(!is_youtube_url("https://www.youtube.com/watch?list=abc"));
        assert!(!is_youtube_url("https://youtu.be/"));
        assert!(!is_youtube_url("https://youtu.be/bad id"));
        assert!(!is_youtube_url("not a url"));
    }

    #[tokio::test]
    async fn test_yt_without_link() {
        let conn = RecordingConnection::default();
        let msg = message_from("1@s.whatsapp.net");
        run(&YtCommand, &conn, &msg, &[]).await.unwrap();
        assert_eq!(
            conn.texts(),
            vec!["❌ Please provide a YouTube video link after .yt"]
        );
    }

    #[tokio::test]
    async fn test_yt_echoes_link() {
        let conn = RecordingConnection::default();
        let msg = message_from("1@s.whatsapp.net");
        run(&YtCommand, &conn, &msg, &["https://youtu.be/x"]).await.unwrap();
        assert!(conn.texts()[0].contains("https://youtu.be/x"));
    }

    #[tokio::test]
    async fn test_song_requires_query() {
        let conn = RecordingConnection::default();
        let msg = message_from("1@s.whatsapp.net");
        run(&SongCommand, &conn, &msg, &[]).await.unwrap();
        assert_eq!(conn.texts(), vec!["❌ Usage: .song <name>"]);

        run(&SongCommand, &conn, &msg, &["never", "gonna"]).await.unwrap();
        assert!(conn.texts()[1].starts_with("🎵 never gonna"));
    }

    #[tokio::test]
    async fn test_video_validates_url() {
        let conn = RecordingConnection::default();
        let msg = message_from("1@s.whatsapp.net");
        run(&VideoCommand, &conn, &msg, &["https://example.com"])
            .await
            .unwrap();
        assert_eq!(conn.texts(), vec!["❌ Usage: .video <youtube-url>"]);

        run(
            &VideoCommand,
            &conn,
            &msg,
            &["https://www.youtube.com/watch?v=dQw4w9WgXcQ"],
        )
        .await
        .unwrap();
        assert!(conn.texts()[1].contains("not available"));
    }
}
