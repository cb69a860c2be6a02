//! Maps a quality tier to an ordered list of format preferences.
//!
//! Selection never fails: every tier ends in a fallback that any resource
//! can satisfy, so a fetch that exhausts the whole list is the
//! orchestrator's failure, not the selector's.

use super::types::{DownloadPlan, QualityTier};

/// Builds the ordered format-preference list for a tier.
///
/// `merge_capable` gates the separate video+audio entries, which require
/// post-download merging.
pub fn select_formats(tier: QualityTier, merge_capable: bool) -> DownloadPlan {
    let mut prefs: Vec<String> = Vec::new();

    match tier {
        QualityTier::Audio => {
            prefs.push("bestaudio[ext=m4a]".to_string());
            prefs.push("bestaudio".to_string());
        }
        QualityTier::Hd => {
            prefs.push("best[height<=1080][ext=mp4]".to_string());
            if merge_capable {
                prefs.push("bestvideo[height<=1080]+bestaudio".to_string());
            }
            prefs.push("best".to_string());
        }
        QualityTier::Sd => {
            prefs.push("best[height<=480][ext=mp4]".to_string());
            if merge_capable {
                prefs.push("bestvideo[height<=480]+bestaudio".to_string());
            }
            prefs.push("best".to_string());
            // Last resort so *some* download always succeeds
            prefs.push("worst".to_string());
        }
    }

    DownloadPlan::new(prefs)
}
