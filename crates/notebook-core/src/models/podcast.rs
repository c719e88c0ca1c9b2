//! Podcast episode models

use serde::{Deserialize, Serialize};

/// Generation job state of an episode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeStatus {
    Running,
    Processing,
    Completed,
    Failed,
    Error,
    Pending,
    Submitted,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerVoiceConfig {
    pub name: String,
    pub voice_id: String,
    #[serde(default)]
    pub backstory: String,
    #[serde(default)]
    pub personality: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tts_provider: String,
    #[serde(default)]
    pub tts_model: String,
    #[serde(default)]
    pub speakers: Vec<SpeakerVoiceConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub speaker_config: String,
    #[serde(default)]
    pub outline_provider: String,
    #[serde(default)]
    pub outline_model: String,
    #[serde(default)]
    pub transcript_provider: String,
    #[serde(default)]
    pub transcript_model: String,
    #[serde(default)]
    pub default_briefing: String,
    #[serde(default)]
    pub num_segments: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialogue: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    #[serde(default)]
    pub transcript: Vec<TranscriptEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutlineSegment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    #[serde(default)]
    pub segments: Vec<OutlineSegment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodcastEpisode {
    pub id: String,
    pub name: String,
    pub episode_profile: EpisodeProfile,
    pub speaker_profile: SpeakerProfile,
    #[serde(default)]
    pub briefing: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<Transcript>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline: Option<Outline>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_status: Option<EpisodeStatus>,
}

impl PodcastEpisode {
    /// Audio location as reported by the backend, URL first
    pub fn audio_path(&self) -> Option<&str> {
        self.audio_url
            .as_deref()
            .or(self.audio_file.as_deref())
            .filter(|p| !p.is_empty())
    }

    /// Completed episodes that have audio attached
    pub fn is_playable(&self) -> bool {
        self.job_status == Some(EpisodeStatus::Completed) && self.audio_path().is_some()
    }
}

/// Resolve an episode's audio path against the API base URL.
///
/// Absolute `http(s)://` URLs pass through; anything else is joined to
/// `base` with exactly one `/` between them.
pub fn resolve_audio_url(base: &str, audio_path: &str) -> Option<String> {
    if audio_path.is_empty() {
        return None;
    }

    let lower = audio_path.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Some(audio_path.to_string());
    }

    let base = base.trim_end_matches('/');
    match audio_path.strip_prefix('/') {
        Some(rest) => Some(format!("{}/{}", base, rest)),
        None => Some(format!("{}/{}", base, audio_path)),
    }
}
