//! Optional headline translation through the Gemini generative language API

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::http_agent;
use crate::config::AppConfig;
use crate::error::FetchError;
use crate::models::NewsArticle;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Serialize, Deserialize)]
struct WireArticle {
    id: String,
    headline: String,
    #[serde(rename = "subHeadline", default)]
    sub_headline: String,
    #[serde(default)]
    source: String,
}

/// Translate headlines into the primary language of `country_code`.
///
/// Returns the input untouched when no API key is configured, when there is
/// nothing to translate, or when the call fails in any way.
pub fn translate_headlines(
    articles: Vec<NewsArticle>,
    country_code: &str,
    config: &AppConfig,
) -> Vec<NewsArticle> {
    let Some(api_key) = config.translation_key() else {
        tracing::warn!("translation API key not found, skipping translation");
        return articles;
    };
    if articles.is_empty() {
        return articles;
    }

    match request_translation(&articles, country_code, &api_key, config) {
        Ok(translated) => translated,
        Err(e) => {
            tracing::error!(country = country_code, error = %e, "failed to translate headlines");
            articles
        }
    }
}

fn request_translation(
    articles: &[NewsArticle],
    country_code: &str,
    api_key: &str,
    config: &AppConfig,
) -> Result<Vec<NewsArticle>, FetchError> {
    let payload = build_request(articles, country_code)?;
    let url = format!("{}/{}:generateContent", API_BASE, config.translation_model);

    let agent = http_agent(config.fetch_timeout());
    let mut response = agent
        .post(&url)
        .query("key", api_key)
        .header("Content-Type", "application/json")
        .header("User-Agent", &config.user_agent)
        .send(payload.as_str())?;
    let body = response.body_mut().read_to_string()?;

    let text = response_text(&body)?;
    merge_translation(articles, &text)
}

pub(crate) fn build_request(
    articles: &[NewsArticle],
    country_code: &str,
) -> Result<String, FetchError> {
    let prompt = format!(
        "Translate the 'headline' and 'subHeadline' values in the following JSON array of news \
         articles into the primary official language of the country with ISO 3166-1 code {}. \
         Maintain the exact original JSON structure, including all original property names and \
         'id' values. Only modify the text content of 'headline' and 'subHeadline'.",
        country_code
    );

    let wire: Vec<WireArticle> = articles
        .iter()
        .map(|a| WireArticle {
            id: a.id.clone(),
            headline: a.headline.clone(),
            sub_headline: a.sub_headline.clone().unwrap_or_default(),
            source: a.source.clone(),
        })
        .collect();

    let body = json!({
        "contents": [
            { "role": "user", "parts": [{ "text": prompt }] },
            { "role": "user", "parts": [{ "text": serde_json::to_string_pretty(&wire)? }] }
        ],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "id": { "type": "STRING" },
                        "headline": { "type": "STRING" },
                        "subHeadline": { "type": "STRING" },
                        "source": { "type": "STRING" }
                    },
                    "required": ["id", "headline", "subHeadline", "source"]
                }
            }
        }
    });
    Ok(body.to_string())
}

/// Pull the generated text out of a generateContent response
pub(crate) fn response_text(body: &str) -> Result<String, FetchError> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    value
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(|t| t.as_str())
        .filter(|t| !t.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| FetchError::invalid("translation response was empty"))
}

/// Combine translated text with the originals. Sources are never translated.
pub(crate) fn merge_translation(
    originals: &[NewsArticle],
    translated_json: &str,
) -> Result<Vec<NewsArticle>, FetchError> {
    let translated: Vec<WireArticle> = serde_json::from_str(translated_json)?;
    if translated.len() != originals.len() {
        return Err(FetchError::invalid(format!(
            "expected {} translated articles, got {}",
            originals.len(),
            translated.len()
        )));
    }

    Ok(translated
        .into_iter()
        .zip(originals)
        .map(|(t, original)| NewsArticle {
            id: t.id,
            headline: t.headline,
            sub_headline: Some(t.sub_headline).filter(|s| !s.trim().is_empty()),
            source: original.source.clone(),
        })
        .collect())
}
