//! Canned chat responses.

pub const START_TEXT: &str = "\
👋 Hi! Send me a YouTube link and I'll download it for you.

You can pick HD video, SD video or audio only. Files too large to \
send directly get a temporary download link instead.

Type /help for more details.";

pub const HELP_TEXT: &str = "\
📖 How to use this bot:

1. Send a YouTube link (youtube.com, youtu.be or Shorts).
2. Pick a quality: 🎥 HD (up to 1080p), 📱 SD (up to 480p) or 🎵 Audio.
3. Wait for the download to finish.

Small files are sent right here in the chat. Larger ones are kept for \
24 hours behind a single-use download link.";

pub const CHOOSE_QUALITY_TEXT: &str = "🎬 Choose a quality:";

pub const PROBING_TEXT: &str = "🔍 Fetching video information…";

pub const SESSION_EXPIRED_TEXT: &str =
    "⚠️ I lost track of that link. Please send it again.";
