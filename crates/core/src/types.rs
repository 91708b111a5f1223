use serde::{Deserialize, Deserializer, Serialize};

/// Kind of segment reported by the skip-times service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipType {
    Op,
    Ed,
    MixedOp,
    MixedEd,
    Recap,
    #[serde(other)]
    Unknown,
}

impl SkipType {
    /// Every type the service knows about, in the order it is requested.
    pub const ALL: [SkipType; 5] = [
        SkipType::Ed,
        SkipType::MixedEd,
        SkipType::MixedOp,
        SkipType::Op,
        SkipType::Recap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SkipType::Op => "op",
            SkipType::Ed => "ed",
            SkipType::MixedOp => "mixed-op",
            SkipType::MixedEd => "mixed-ed",
            SkipType::Recap => "recap",
            SkipType::Unknown => "unknown",
        }
    }
}

/// Half-open range `[start_time, end_time)` in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipInterval {
    pub start_time: f64,
    pub end_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipEntry {
    pub interval: SkipInterval,
    pub skip_type: SkipType,
    #[serde(default)]
    pub skip_id: String,
    #[serde(default)]
    pub episode_length: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipTimesResponse {
    #[serde(default)]
    pub found: bool,
    #[serde(default, deserialize_with = "lenient_entries")]
    pub results: Vec<SkipEntry>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status_code: i64,
}

impl SkipTimesResponse {
    /// First entry of the given type, if any.
    pub fn first_of(&self, skip_type: SkipType) -> Option<&SkipEntry> {
        self.results.iter().find(|entry| entry.skip_type == skip_type)
    }

    /// Episode length reported by the first entry that carries one, or 0.
    pub fn episode_length(&self) -> f64 {
        self.results
            .iter()
            .map(|entry| entry.episode_length)
            .find(|len| *len != 0.0 && !len.is_nan())
            .unwrap_or(0.0)
    }
}

/// Entries that fail to decode are dropped one by one instead of failing the payload.
fn lenient_entries<'de, D>(deserializer: D) -> Result<Vec<SkipEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?;

    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<SkipEntry>(value) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(error = %e, "dropping malformed skip entry");
                None
            }
        })
        .collect())
}

/// What to ask the skip-times service for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkipRequest {
    pub mal_id: u64,
    pub episode: u32,
    pub episode_length: Option<f64>,
}

impl SkipRequest {
    pub fn new(mal_id: u64, episode: u32) -> Self {
        Self {
            mal_id,
            episode,
            episode_length: None,
        }
    }

    pub fn with_episode_length(mut self, seconds: f64) -> Self {
        self.episode_length = Some(seconds);
        self
    }
}
