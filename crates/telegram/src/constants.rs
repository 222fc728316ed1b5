//! Constants used throughout the telegram bot

/// Default minimum interval between accepted requests from one user
pub const COOLDOWN_SECONDS: u64 = 30;

/// Cooldown entries older than this many cooldown windows are evicted
pub const COOLDOWN_EVICTION_FACTOR: u32 = 4;

/// File name given to uploaded videos
pub const VIDEO_FILE_NAME: &str = "video.mp4";

/// Emoji constants for consistent UI
pub mod emoji {
    pub const ERROR: &str = "❌";
    pub const INFO: &str = "📊";
    pub const DOWNLOAD: &str = "📥";
    pub const WAIT: &str = "⏳";
}

/// User-facing texts
pub mod text {
    pub const USAGE: &str = "❌ Please send a valid TikTok link.\n\n\
        Example: https://www.tiktok.com/@username/video/123456789";

    pub const HELP: &str = "🤖 TikTok Download Bot\n\n\
        📥 How to use:\n\
        1. Open the TikTok app\n\
        2. Tap Share on a video\n\
        3. Tap Copy Link\n\
        4. Send the link to this bot\n\n\
        🔗 Example:\n\
        https://www.tiktok.com/@username/video/123456789\n\n\
        /stats - bot statistics";

    pub const PROCESSING: &str = "🔄 Processing...";
    pub const DOWNLOADING: &str = "📥 Downloading video...";
    pub const UPLOADING: &str = "📤 Uploading...";
    pub const DONE: &str = "✅ Download complete!";
    pub const CAPTION: &str = "🎬 Downloaded with TikTok Download Bot";
}
