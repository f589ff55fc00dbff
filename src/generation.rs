//! Image generation requests and the submit-then-poll workflow.
//!
//! The workflow drives a [`LoadingIndicator`] for its whole duration:
//! started before submission, updated after each status poll and stopped
//! exactly once however the workflow ends.

use serde::{Deserialize, Serialize};

use crate::animator::LoadingIndicator;
use crate::error::{Error, Result};
use crate::settings::{ImageStyle, Settings};

/// Where and what to ask the generation service for.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// API root, without trailing slash
    pub base_url: String,
    pub model_id: String,
    pub width: u32,
    pub height: u32,
    pub num_images: u32,
    pub negative_prompt: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api-key.fusionbrain.ai/key/api/v1".to_string(),
            model_id: "4".to_string(),
            width: 1024,
            height: 1024,
            num_images: 1,
            negative_prompt: "яркие цвета, кислотность, высокая контрастность".to_string(),
        }
    }
}

impl ServiceConfig {
    pub fn run_url(&self) -> String {
        format!("{}/text2image/run", self.base_url.trim_end_matches('/'))
    }

    pub fn status_url(&self, uuid: &str) -> String {
        format!("{}/text2image/status/{uuid}", self.base_url.trim_end_matches('/'))
    }
}

/// How long to wait for an image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollPolicy {
    /// Status requests before giving up
    pub max_attempts: u32,
    /// Pause between status requests
    pub delay_ms: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            delay_ms: 4000,
        }
    }
}

/// The `params` part of a generation request.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GenerationParams {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub style: ImageStyle,
    pub width: u32,
    pub height: u32,
    pub num_images: u32,
    #[serde(rename = "negativePromptUnclip")]
    pub negative_prompt: String,
    #[serde(rename = "generateParams")]
    pub generate_params: Query,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Query {
    pub query: String,
}

impl GenerationParams {
    pub fn new(query: &str, style: ImageStyle, service: &ServiceConfig) -> Self {
        Self {
            kind: "GENERATE",
            style,
            width: service.width,
            height: service.height,
            num_images: service.num_images,
            negative_prompt: service.negative_prompt.clone(),
            generate_params: Query {
                query: query.to_string(),
            },
        }
    }

    /// Request for the user's current description and style.
    pub fn from_settings(settings: &Settings, service: &ServiceConfig) -> Self {
        Self::new(&settings.description, settings.style, service)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Job status reported by the service.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenerationStatus {
    Initial,
    Processing,
    Done,
    Fail,
    #[serde(other)]
    Unknown,
}

impl GenerationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GenerationStatus::Done | GenerationStatus::Fail)
    }
}

/// Answer to a submission.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RunResponse {
    pub uuid: String,
    pub status: GenerationStatus,
}

/// Answer to a status poll.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    #[serde(default)]
    pub uuid: String,
    pub status: GenerationStatus,
    /// Base64-encoded PNG images, present once done
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Transport to the generation service.
///
/// Implement this for your I/O mechanism (fetch API, HTTP client, fakes).
/// No `Send` bounds, works in both native and WASM (single-threaded) contexts.
pub trait GenerationClient {
    /// Submit a job, returning its id.
    fn submit(&self, params: &GenerationParams) -> impl std::future::Future<Output = Result<RunResponse>>;

    /// Fetch the current status of a job.
    fn status(&self, uuid: &str) -> impl std::future::Future<Output = Result<StatusResponse>>;
}

/// Submit `params` and poll until the images are ready.
///
/// The indicator total is set to `policy.max_attempts` and the attempt to 0
/// before it is started; each poll then reports its 1-based attempt
/// number. `on_status` sees every status the service reports. `sleep(ms)`
/// is awaited between polls but not after the last one.
///
/// Returns the image payloads on `DONE`, [`Error::GenerationFailed`] on
/// `FAIL`, [`Error::AttemptsExhausted`] when polling runs out, or the
/// client's own error. The indicator is stopped exactly once in every case.
pub async fn generate_image<C, L, Y, YFut, F>(
    client: &C,
    indicator: &mut L,
    params: &GenerationParams,
    policy: &PollPolicy,
    sleep: Y,
    mut on_status: F,
) -> Result<Vec<String>>
where
    C: GenerationClient,
    L: LoadingIndicator + ?Sized,
    Y: Fn(u32) -> YFut,
    YFut: std::future::Future<Output = ()>,
    F: FnMut(&GenerationStatus),
{
    indicator.set_attempt_total(policy.max_attempts);
    indicator.set_attempt(0);
    indicator.start();

    let result = submit_and_poll(client, indicator, params, policy, sleep, &mut on_status).await;

    indicator.stop();
    result
}

async fn submit_and_poll<C, L, Y, YFut, F>(
    client: &C,
    indicator: &mut L,
    params: &GenerationParams,
    policy: &PollPolicy,
    sleep: Y,
    on_status: &mut F,
) -> Result<Vec<String>>
where
    C: GenerationClient,
    L: LoadingIndicator + ?Sized,
    Y: Fn(u32) -> YFut,
    YFut: std::future::Future<Output = ()>,
    F: FnMut(&GenerationStatus),
{
    let run = client.submit(params).await?;
    tracing::info!(uuid = %run.uuid, status = ?run.status, "generation submitted");
    on_status(&run.status);

    for attempt in 1..=policy.max_attempts {
        let response = client.status(&run.uuid).await?;
        on_status(&response.status);
        indicator.set_attempt(attempt);
        tracing::info!(attempt, status = ?response.status, "generation status");

        match response.status {
            GenerationStatus::Done => return Ok(response.images),
            GenerationStatus::Fail => {
                return Err(Error::GenerationFailed(
                    response
                        .error_description
                        .unwrap_or_else(|| "no description".to_string()),
                ))
            }
            _ => {}
        }

        if attempt < policy.max_attempts {
            sleep(policy.delay_ms).await;
        }
    }

    Err(Error::AttemptsExhausted(policy.max_attempts))
}

/// Browser transport: `fetch` plus a `setTimeout` sleep.
#[cfg(feature = "web")]
pub mod web {
    use super::*;
    use js_sys::{Array, Promise, JSON};
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{Blob, BlobPropertyBag, FormData, Headers, Request, RequestInit, Response};

    fn request_error(context: &str, err: JsValue) -> Error {
        Error::Request(format!("{context}: {err:?}"))
    }

    /// [`GenerationClient`] using the browser `fetch` API.
    #[derive(Clone, Debug)]
    pub struct FetchClient {
        service: ServiceConfig,
        headers: Vec<(&'static str, String)>,
    }

    impl FetchClient {
        pub fn new(service: ServiceConfig, settings: &Settings) -> Self {
            Self {
                service,
                headers: settings.access_headers().to_vec(),
            }
        }

        fn headers(&self) -> Result<Headers> {
            let headers = Headers::new().map_err(|e| request_error("Failed to create headers", e))?;
            for (name, value) in &self.headers {
                headers
                    .set(name, value)
                    .map_err(|e| request_error("Failed to set header", e))?;
            }
            Ok(headers)
        }

        fn request(&self, method: &str, url: &str, body: Option<&JsValue>) -> Result<Request> {
            let init = RequestInit::new();
            init.set_method(method);
            if let Some(body) = body {
                init.set_body(body);
            }
            let headers: JsValue = self.headers()?.into();
            init.set_headers(&headers);
            Request::new_with_str_and_init(url, &init).map_err(|e| request_error("Failed to build request", e))
        }

        /// Multipart submission: `model_id` plus the JSON `params` blob.
        pub fn run_request(&self, params: &GenerationParams) -> Result<Request> {
            let form = FormData::new().map_err(|e| request_error("Failed to create form", e))?;
            form.append_with_str("model_id", &self.service.model_id)
                .map_err(|e| request_error("Failed to append model_id", e))?;

            let options = BlobPropertyBag::new();
            options.set_type("application/json");
            let parts = Array::of1(&JsValue::from_str(&params.to_json()?));
            let blob = Blob::new_with_str_sequence_and_options(&parts, &options)
                .map_err(|e| request_error("Failed to create params blob", e))?;
            form.append_with_blob("params", &blob)
                .map_err(|e| request_error("Failed to append params", e))?;

            let body: JsValue = form.into();
            self.request("POST", &self.service.run_url(), Some(&body))
        }

        pub fn status_request(&self, uuid: &str) -> Result<Request> {
            self.request("GET", &self.service.status_url(uuid), None)
        }

        async fn fetch_json<T: serde::de::DeserializeOwned>(&self, request: Request) -> Result<T> {
            let window = web_sys::window().ok_or_else(|| Error::Browser("No window available".into()))?;
            let response: Response = JsFuture::from(window.fetch_with_request(&request))
                .await
                .map_err(|e| request_error("Fetch failed", e))?
                .dyn_into()
                .map_err(|_| Error::Request("Fetch did not return a Response".into()))?;

            if !response.ok() {
                return Err(Error::Request(format!("{} answered {}", request.url(), response.status())));
            }

            let body = JsFuture::from(
                response
                    .json()
                    .map_err(|e| request_error("Failed to read body", e))?,
            )
            .await
            .map_err(|e| request_error("Body is not JSON", e))?;
            let text: String = JSON::stringify(&body)
                .map_err(|e| request_error("Failed to re-encode body", e))?
                .into();
            Ok(serde_json::from_str(&text)?)
        }
    }

    impl GenerationClient for FetchClient {
        async fn submit(&self, params: &GenerationParams) -> Result<RunResponse> {
            self.fetch_json(self.run_request(params)?).await
        }

        async fn status(&self, uuid: &str) -> Result<StatusResponse> {
            self.fetch_json(self.status_request(uuid)?).await
        }
    }

    /// Resolve after `ms` milliseconds using `setTimeout`.
    ///
    /// Resolves at once when no timer can be set, so callers never hang.
    pub async fn sleep_ms(ms: u32) {
        let promise = Promise::new(&mut |resolve, _| {
            let scheduled = match web_sys::window() {
                Some(window) => window
                    .set_timeout_with_callback_and_timeout_and_arguments_0(
                        &resolve,
                        ms.min(i32::MAX as u32) as i32,
                    )
                    .map_err(|e| tracing::warn!("setTimeout failed: {e:?}"))
                    .is_ok(),
                None => false,
            };
            if !scheduled {
                let _ = resolve.call0(&JsValue::NULL);
            }
        });
        let _ = JsFuture::from(promise).await;
    }
}
