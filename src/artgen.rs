use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::fetch::PageFetcher;
use crate::identity::IdentityKey;
use crate::prompt::{art_prompt, NEGATIVE_PROMPT};
use crate::record::ContentRecord;

const VISION_XL_MODEL: &str = "5c232a9e-9061-4777-980a-ddc8e65647c6";
const POLL_INTERVAL: Duration = Duration::from_secs(3);
const POLL_TIMEOUT: Duration = Duration::from_secs(120);
const INIT_STRENGTH: f32 = 0.25;
const SERVICE: &str = "image generation";

/// Where a generation job stands.
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    Pending,
    Complete(Vec<String>),
    Failed,
}

#[derive(Deserialize)]
struct InitImageResponse {
    #[serde(rename = "uploadInitImage")]
    upload: InitImageUpload,
}

#[derive(Deserialize)]
struct InitImageUpload {
    id: String,
    url: String,
    /// Presigned form fields; delivered either as an object or as a JSON string.
    fields: Value,
}

pub struct ArtClient {
    client: reqwest::Client,
    base: String,
    api_key: String,
}

impl ArtClient {
    pub fn new(base: &str, api_key: Option<String>) -> Result<Self> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(Error::MissingCredential("LEONARDO_API_KEY"))?;
        Ok(ArtClient {
            client: reqwest::Client::new(),
            base: base.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        let url = format!("{}{}", self.base, path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| Error::http(&url, e))?;
        if !response.status().is_success() {
            return Err(Error::Status {
                url,
                status: response.status(),
            });
        }
        response.json().await.map_err(|e| Error::http(&url, e))
    }

    /// Upload a reference image; returns its init image id.
    pub async fn upload_reference(&self, path: &Path) -> Result<String> {
        let extension = match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("jpg") | None => "jpeg".to_string(),
            Some(other) => other.to_string(),
        };

        let init = self
            .post_json("/init-image", &json!({ "extension": extension }))
            .await?;
        let InitImageResponse { upload } = serde_json::from_value(init)?;

        let mut form = reqwest::multipart::Form::new();
        for (k, v) in form_fields(&upload.fields)? {
            form = form.text(k, v);
        }
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "reference".into());
        form = form.part("file", reqwest::multipart::Part::bytes(bytes).file_name(file_name));

        let response = self
            .client
            .post(&upload.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::http(&upload.url, e))?;
        if !response.status().is_success() {
            return Err(Error::Status {
                url: upload.url,
                status: response.status(),
            });
        }
        Ok(upload.id)
    }

    pub async fn create_generation(&self, prompt: &str, init_image: Option<&str>) -> Result<String> {
        let mut payload = json!({
            "prompt": prompt,
            "negative_prompt": NEGATIVE_PROMPT,
            "modelId": VISION_XL_MODEL,
            "width": 1024,
            "height": 1024,
            "num_images": 1,
            "guidance_scale": 7,
            "presetStyle": "CINEMATIC",
            "public": false,
            "promptMagic": true,
        });
        if let Some(id) = init_image {
            payload["init_image_id"] = json!(id);
            payload["init_strength"] = json!(INIT_STRENGTH);
        }

        let data = self.post_json("/generations", &payload).await?;
        data.pointer("/sdGenerationJob/generationId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(Error::Response {
                service: SERVICE,
                details: "no generationId in response".into(),
            })
    }

    pub async fn poll(&self, generation_id: &str) -> Result<JobStatus> {
        let url = format!("{}/generations/{}", self.base, generation_id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| Error::http(&url, e))?;
        if !response.status().is_success() {
            // transient; the caller keeps polling
            return Ok(JobStatus::Pending);
        }
        let data: Value = response.json().await.map_err(|e| Error::http(&url, e))?;
        Ok(job_status(&data))
    }

    pub async fn wait_for(&self, generation_id: &str) -> Result<Vec<String>> {
        let start = Instant::now();
        while start.elapsed() < POLL_TIMEOUT {
            match self.poll(generation_id).await? {
                JobStatus::Complete(urls) => return Ok(urls),
                JobStatus::Failed => {
                    return Err(Error::Response {
                        service: SERVICE,
                        details: "generation failed".into(),
                    })
                }
                JobStatus::Pending => {
                    println!("   Generating... ({}s)", start.elapsed().as_secs());
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
            }
        }
        Err(Error::Response {
            service: SERVICE,
            details: format!("timed out after {}s", POLL_TIMEOUT.as_secs()),
        })
    }
}

pub fn job_status(data: &Value) -> JobStatus {
    let generation = &data["generations_by_pk"];
    match generation["status"].as_str() {
        Some("COMPLETE") => JobStatus::Complete(
            generation["generated_images"]
                .as_array()
                .map(|imgs| {
                    imgs.iter()
                        .filter_map(|i| i["url"].as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default(),
        ),
        Some("FAILED") => JobStatus::Failed,
        _ => JobStatus::Pending,
    }
}

fn form_fields(fields: &Value) -> Result<Vec<(String, String)>> {
    let parsed;
    let object = match fields {
        Value::String(s) => {
            parsed = serde_json::from_str::<Value>(s)?;
            &parsed
        }
        other => other,
    };

    let map = object.as_object().ok_or(Error::Response {
        service: SERVICE,
        details: "upload fields are not an object".into(),
    })?;
    Ok(map
        .iter()
        .map(|(k, v)| {
            let v = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), v)
        })
        .collect())
}

pub fn art_filename(key: &IdentityKey, date_str: &str) -> String {
    format!("daily_art_gate{}_{}.png", key.gate().unwrap_or("unknown"), date_str)
}

/// Generate the day's poster into `out_dir`. Every failure short of a missing
/// credential is reported and yields `None`.
pub async fn generate_daily_art<F: PageFetcher>(
    client: &ArtClient,
    fetcher: &F,
    record: &ContentRecord,
    key: &IdentityKey,
    reference: Option<&Path>,
    out_dir: &Path,
    date_str: &str,
) -> Option<PathBuf> {
    let prompt = art_prompt(record);
    println!("   Prompt ready ({} chars)", prompt.chars().count());

    let mut init_image = None;
    if let Some(path) = reference.filter(|p| p.is_file()) {
        println!("   Uploading reference: {}", path.display());
        match client.upload_reference(path).await {
            Ok(id) => init_image = Some(id),
            Err(e) => warn!("Reference upload failed: {}", e),
        }
    }

    let result = async {
        let id = client.create_generation(&prompt, init_image.as_deref()).await?;
        info!(generation = %id, "generation started");
        let urls = client.wait_for(&id).await?;
        let url = urls.into_iter().next().ok_or(Error::Response {
            service: SERVICE,
            details: "no image url in completed job".into(),
        })?;
        let bytes = fetcher.fetch_bytes(&url).await?;
        let path = out_dir.join(art_filename(key, date_str));
        tokio::fs::create_dir_all(out_dir).await?;
        tokio::fs::write(&path, bytes).await?;
        Ok::<_, Error>(path)
    }
    .await;

    match result {
        Ok(path) => {
            println!("   Poster saved: {}", path.display());
            Some(path)
        }
        Err(e) => {
            warn!("Image generation failed: {}", e);
            None
        }
    }
}

// ── Tests ──
