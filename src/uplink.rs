use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use log::{info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::FALLBACK_VALUE;

const GEMINI_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent";

const PROMPT: &str = "Generate a random \"emotional state\" value between 1 and 10 \
for a visualization system. 1 is calm/abstract, 10 is intense/chaotic. \
Provide a short scientific reasoning string.";

/// A structured value fetched from the remote source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodReading {
    pub value: f64,
    pub reasoning: String,
    pub mood_vector: String,
}

impl MoodReading {
    /// Substituted by the Gemini source when the request or the payload
    /// fails. Returned as a regular success so the polling loop treats it
    /// as a degraded value, not an error.
    pub fn fallback() -> Self {
        Self {
            value: FALLBACK_VALUE,
            reasoning: "Error State: Fallback initiated.".to_string(),
            mood_vector: "ERROR".to_string(),
        }
    }
}

/// The external collaborator the polling loop asks for the next value.
/// `fetch_next` may block; it is always called off the main thread.
pub trait ValueSource: Send + Sync {
    fn fetch_next(&self) -> Result<MoodReading>;
    fn describe(&self) -> &'static str;
}

/// Local stand-in used when no API credential is configured. Never touches
/// the network.
pub struct SimulatedSource;

impl ValueSource for SimulatedSource {
    fn fetch_next(&self) -> Result<MoodReading> {
        let mut rng = rand::rng();
        Ok(MoodReading {
            value: rng.random_range(1..=10) as f64,
            reasoning: "Simulation Mode: Random generation due to missing API key.".to_string(),
            mood_vector: "SIMULATED".to_string(),
        })
    }

    fn describe(&self) -> &'static str {
        "simulation (no API key)"
    }
}

/// Live source backed by the Gemini generateContent REST endpoint.
pub struct GeminiSource {
    client: reqwest::blocking::Client,
    api_key: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: String,
}

impl GeminiSource {
    pub fn new(api_key: String) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client, api_key })
    }

    fn request(&self) -> Result<MoodReading> {
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": PROMPT }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "value": {
                            "type": "NUMBER",
                            "description": "A number between 1.0 and 10.0"
                        },
                        "reasoning": {
                            "type": "STRING",
                            "description": "Scientific justification for this state change"
                        },
                        "mood_vector": {
                            "type": "STRING",
                            "description": "Short hex code or vector name for the mood"
                        }
                    },
                    "required": ["value", "reasoning", "mood_vector"]
                }
            }
        });

        let response: GenerateContentResponse = self
            .client
            .post(format!("{GEMINI_ENDPOINT}?key={}", self.api_key))
            .json(&body)
            .send()
            .context("request failed")?
            .error_for_status()
            .context("server returned an error status")?
            .json()
            .context("response body was not valid JSON")?;

        let text = response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or_else(|| anyhow!("empty response"))?;

        serde_json::from_str(text).context("model output did not match the expected shape")
    }
}

impl ValueSource for GeminiSource {
    /// Transport and parse failures are recovered locally: the caller sees
    /// a successful fetch carrying the fallback reading.
    fn fetch_next(&self) -> Result<MoodReading> {
        Ok(self.request().unwrap_or_else(|e| {
            warn!("gemini request failed: {e:#}");
            MoodReading::fallback()
        }))
    }

    fn describe(&self) -> &'static str {
        "gemini-2.5-flash"
    }
}

/// Pick the live source when `GEMINI_API_KEY` is set, the simulated one
/// otherwise.
pub fn source_from_env() -> Result<Arc<dyn ValueSource>> {
    match std::env::var("GEMINI_API_KEY") {
        Ok(key) if !key.is_empty() => {
            info!("using live value source");
            Ok(Arc::new(GeminiSource::new(key)?))
        }
        _ => {
            info!("GEMINI_API_KEY not set, using simulated value source");
            Ok(Arc::new(SimulatedSource))
        }
    }
}

/// Outcome of one dispatched fetch, marshaled back to the main thread.
pub struct FetchOutcome {
    pub result: Result<MoodReading>,
}

/// Run one fetch on a worker thread. The main loop drains the channel each
/// frame; shared state is only touched there.
pub fn dispatch(source: Arc<dyn ValueSource>, tx: Sender<FetchOutcome>) {
    std::thread::spawn(move || {
        let result = source.fetch_next();
        // Receiver may be gone during shutdown; nothing to do then.
        let _ = tx.send(FetchOutcome { result });
    });
}
