//! Media caption rendering.

use crate::fetcher::MediaMetadata;

/// Longest description excerpt included in a caption.
const DESCRIPTION_EXCERPT_CHARS: usize = 200;

/// Most hashtags appended to a caption.
const MAX_TAGS: usize = 5;

/// Renders a delivery caption from probe metadata, fitting it under the
/// channel's ceiling. Tags are the first thing sacrificed, then the
/// description excerpt; the title always survives.
pub fn build_caption(meta: &MediaMetadata, ceiling: usize) -> String {
    let mut lines = vec![format!("🎬 {}", meta.title)];

    if let Some(uploader) = &meta.uploader {
        lines.push(format!("👤 {}", uploader));
    }
    if let Some(views) = meta.view_count {
        lines.push(format!("👁 {} views", format_count(views)));
    }
    if let Some(secs) = meta.duration_secs {
        lines.push(format!("⏱ {}", format_duration(secs)));
    }

    if let Some(description) = meta
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
    {
        lines.push(String::new());
        lines.push(excerpt(description, DESCRIPTION_EXCERPT_CHARS));
    }

    let mut caption = lines.join("\n");
    if caption.chars().count() > ceiling {
        caption = excerpt(&caption, ceiling.saturating_sub(1));
    }

    let tags: Vec<String> = meta
        .tags
        .iter()
        .take(MAX_TAGS)
        .map(|t| format!("#{}", t.replace(char::is_whitespace, "")))
        .collect();
    if !tags.is_empty() {
        let tag_line = tags.join(" ");
        if caption.chars().count() + tag_line.chars().count() + 2 <= ceiling {
            caption.push_str("\n\n");
            caption.push_str(&tag_line);
        }
    }

    caption
}

/// Truncates to at most `max` chars, appending an ellipsis when cut.
fn excerpt(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}

fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn format_duration(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> MediaMetadata {
        MediaMetadata {
            title: "Test Video".to_string(),
            uploader: Some("Some Channel".to_string()),
            view_count: Some(1234567),
            duration_secs: Some(215),
            description: Some("A short description".to_string()),
            tags: vec!["music".to_string(), "live".to_string()],
        }
    }

    #[test]
    fn test_full_caption() {
        let caption = build_caption(&meta(), 1024);
        assert!(caption.contains("🎬 Test Video"));
        assert!(caption.contains("👤 Some Channel"));
        assert!(caption.contains("1,234,567 views"));
        assert!(caption.contains("⏱ 3:35"));
        assert!(caption.contains("A short description"));
        assert!(caption.ends_with("#music #live"));
    }

    #[test]
    fn test_minimal_metadata() {
        let meta = MediaMetadata {
            title: "Bare".to_string(),
            ..Default::default()
        };
        assert_eq!(build_caption(&meta, 1024), "🎬 Bare");
    }

    #[test]
    fn test_long_description_is_excerpted() {
        let mut m = meta();
        m.description = Some("x".repeat(500));
        let caption = build_caption(&m, 1024);
        assert!(caption.contains('…'));
        assert!(caption.chars().count() < 400);
    }

    #[test]
    fn test_tags_dropped_before_description() {
        let mut m = meta();
        m.description = Some("d".repeat(190));
        // Ceiling fits everything except the tag line
        let without_tags = build_caption(&m, 250);
        assert!(!without_tags.contains('#'));
        assert!(without_tags.contains("ddd"));
    }

    #[test]
    fn test_caption_never_exceeds_ceiling() {
        let mut m = meta();
        m.title = "t".repeat(300);
        m.description = Some("d".repeat(500));
        let caption = build_caption(&m, 200);
        assert!(caption.chars().count() <= 200);
    }

    #[test]
    fn test_at_most_five_tags() {
        let mut m = meta();
        m.tags = (0..10).map(|i| format!("tag{}", i)).collect();
        let caption = build_caption(&m, 1024);
        assert_eq!(caption.matches('#').count(), 5);
    }

    #[test]
    fn test_whitespace_stripped_from_tags() {
        let mut m = meta();
        m.tags = vec!["two words".to_string()];
        let caption = build_caption(&m, 1024);
        assert!(caption.ends_with("#twowords"));
    }

    #[test]
    fn test_hour_long_duration() {
        assert_eq!(format_duration(3725), "1:02:05");
        assert_eq!(format_duration(59), "0:59");
    }
}
