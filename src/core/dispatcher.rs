use crate::core::routes::{ResolvedRoute, RouteTable};
use crate::domain::payload::{Attachment, FormPayload, PayloadValue, RouteParams, Submitted};
use crate::domain::ports::{ConfigProvider, Dispatch, RequestOptions};
use crate::utils::error::{MarketError, Result, ValidationErrors};
use async_trait::async_trait;
use reqwest::multipart::{Form as MultipartForm, Part};
use reqwest::{Client, Method, StatusCode};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use url::Url;

/// Field the backend reads to route a spoofed POST.
pub const METHOD_FIELD: &str = "_method";

/// Sends form payloads to named server routes.
pub struct MutationDispatcher {
    client: Client,
    base_url: Url,
    routes: RouteTable,
    headers: BTreeMap<String, String>,
}

impl MutationDispatcher {
    pub fn new<C: ConfigProvider + ?Sized>(config: &C, routes: RouteTable) -> Result<Self> {
        let base_url = Url::parse(config.base_url())?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds()))
            .build()?;

        Ok(Self {
            client,
            base_url,
            routes,
            headers: config.default_headers().clone(),
        })
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    fn build_request(
        &self,
        route: ResolvedRoute,
        payload: &FormPayload,
        options: RequestOptions,
    ) -> Result<reqwest::RequestBuilder> {
        let multipart = payload.has_files() || options.force_multipart;

        let mut request = if multipart {
            let mut form = MultipartForm::new();
            let method = if route.method == Method::POST || route.method == Method::GET {
                route.method.clone()
            } else {
                // multipart bodies only travel on POST
                form = form.text(METHOD_FIELD, route.method.as_str().to_string());
                Method::POST
            };
            for (name, value) in payload.iter() {
                form = append_part(form, name, value)?;
            }
            tracing::debug!(
                "Sending {} {} as multipart (route method {})",
                method,
                route.url,
                route.method
            );
            self.client.request(method, route.url).multipart(form)
        } else if route.method == Method::GET
            || (route.method == Method::DELETE && payload.is_empty())
        {
            self.client.request(route.method, route.url)
        } else {
            self.client
                .request(route.method, route.url)
                .json(&payload.to_json())
        };

        request = request
            .header(reqwest::header::ACCEPT, "application/json")
            .header("X-Requested-With", "XMLHttpRequest");
        for (name, value) in &self.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        Ok(request)
    }
}

fn list_name(name: &str) -> String {
    if name.ends_with("[]") {
        name.to_string()
    } else {
        format!("{}[]", name)
    }
}

fn file_part(attachment: &Attachment) -> Result<Part> {
    let part = Part::bytes(attachment.bytes.clone())
        .file_name(attachment.file_name.clone())
        .mime_str(&attachment.mime_type)?;
    Ok(part)
}

fn append_part(form: MultipartForm, name: &str, value: &PayloadValue) -> Result<MultipartForm> {
    let form = match value {
        PayloadValue::Text(text) => form.text(name.to_string(), text.clone()),
        PayloadValue::Bool(flag) => form.text(name.to_string(), if *flag { "1" } else { "0" }),
        PayloadValue::List(items) => {
            let key = list_name(name);
            items
                .iter()
                .fold(form, |form, item| form.text(key.clone(), item.clone()))
        }
        PayloadValue::File(attachment) => form.part(name.to_string(), file_part(attachment)?),
        PayloadValue::Files(attachments) => {
            let key = list_name(name);
            let mut form = form;
            for attachment in attachments {
                form = form.part(key.clone(), file_part(attachment)?);
            }
            form
        }
    };
    Ok(form)
}

#[async_trait]
impl Dispatch for MutationDispatcher {
    async fn dispatch(
        &self,
        route_name: &str,
        params: &RouteParams,
        payload: &FormPayload,
        options: RequestOptions,
    ) -> Result<Submitted> {
        let route = self.routes.resolve(&self.base_url, route_name, params)?;
        tracing::info!("Submitting {} ({} {})", route_name, route.method, route.url);

        let request = self.build_request(route, payload, options)?;
        let response = request.send().await?;
        let status = response.status();
        let final_url = response.url().to_string();
        let body = response.text().await?;

        tracing::debug!("{} responded {} from {}", route_name, status, final_url);

        if status.is_success() {
            return Ok(Submitted {
                status: status.as_u16(),
                final_url,
                preserve_scroll: options.preserve_scroll,
                body: serde_json::from_str(&body).ok(),
            });
        }

        match status {
            StatusCode::UNPROCESSABLE_ENTITY => {
                let json = serde_json::from_str(&body).unwrap_or(serde_json::Value::Null);
                let errors = ValidationErrors::from_json(&json);
                tracing::warn!(
                    "{} rejected with {} field errors",
                    route_name,
                    errors.fields.len()
                );
                Err(MarketError::Validation(errors))
            }
            StatusCode::NOT_FOUND => Err(MarketError::NotFound {
                resource: route_name.to_string(),
            }),
            other => {
                tracing::error!("{} failed with status {}", route_name, other);
                Err(MarketError::HttpStatus {
                    status: other.as_u16(),
                    body,
                })
            }
        }
    }
}

type SuccessHook = Box<dyn FnOnce(&Submitted) + Send>;
type ErrorHook = Box<dyn FnOnce(&MarketError) + Send>;
type FinishHook = Box<dyn FnOnce() + Send>;

/// Per-submission switches and callbacks. `on_finish` runs after the
/// processing flag has been cleared, whatever the outcome.
#[derive(Default)]
pub struct SubmitOptions {
    pub preserve_scroll: bool,
    pub force_multipart: bool,
    on_success: Option<SuccessHook>,
    on_error: Option<ErrorHook>,
    on_finish: Option<FinishHook>,
}

impl SubmitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn preserve_scroll(mut self) -> Self {
        self.preserve_scroll = true;
        self
    }

    pub fn force_multipart(mut self) -> Self {
        self.force_multipart = true;
        self
    }

    pub fn on_success(mut self, hook: impl FnOnce(&Submitted) + Send + 'static) -> Self {
        self.on_success = Some(Box::new(hook));
        self
    }

    pub fn on_error(mut self, hook: impl FnOnce(&MarketError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(hook));
        self
    }

    pub fn on_finish(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_finish = Some(Box::new(hook));
        self
    }

    fn request_options(&self) -> RequestOptions {
        RequestOptions {
            preserve_scroll: self.preserve_scroll,
            force_multipart: self.force_multipart,
        }
    }
}

struct ProcessingGuard<'a>(&'a AtomicBool);

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Client-side form: payload, server errors and the in-flight flag.
#[derive(Debug, Default)]
pub struct Form {
    payload: Mutex<FormPayload>,
    errors: Mutex<BTreeMap<String, String>>,
    processing: AtomicBool,
    transient: Vec<String>,
}

impl Form {
    pub fn new(payload: FormPayload) -> Self {
        Self {
            payload: Mutex::new(payload),
            ..Self::default()
        }
    }

    /// Fields dropped after a successful submission (image previews,
    /// specification drafts).
    pub fn with_transient(mut self, fields: &[&str]) -> Self {
        self.transient = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn payload(&self) -> FormPayload {
        self.payload
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update<F: FnOnce(&mut FormPayload)>(&self, edit: F) {
        let mut payload = self.payload.lock().unwrap_or_else(PoisonError::into_inner);
        edit(&mut payload);
    }

    pub fn errors(&self) -> BTreeMap<String, String> {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn error(&self, field: &str) -> Option<String> {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(field)
            .cloned()
    }

    pub fn has_errors(&self) -> bool {
        !self
            .errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::Acquire)
    }

    fn set_errors(&self, errors: BTreeMap<String, String>) {
        *self.errors.lock().unwrap_or_else(PoisonError::into_inner) = errors;
    }

    fn clear_transient(&self) {
        let mut payload = self.payload.lock().unwrap_or_else(PoisonError::into_inner);
        for field in &self.transient {
            payload.remove(field);
        }
    }

    /// Submits the current payload. A second call while one is in flight
    /// fails with `AlreadyProcessing` and sends nothing.
    pub async fn submit<D: Dispatch + ?Sized>(
        &self,
        dispatcher: &D,
        route_name: &str,
        params: &RouteParams,
        options: SubmitOptions,
    ) -> Result<Submitted> {
        if self
            .processing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!(
                "Ignoring submit of {} while a request is in flight",
                route_name
            );
            return Err(MarketError::AlreadyProcessing);
        }
        let guard = ProcessingGuard(&self.processing);

        self.set_errors(BTreeMap::new());
        let payload = self.payload();
        let request_options = options.request_options();
        let SubmitOptions {
            on_success,
            on_error,
            on_finish,
            ..
        } = options;

        let result = dispatcher
            .dispatch(route_name, params, &payload, request_options)
            .await;

        match &result {
            Ok(submitted) => {
                self.clear_transient();
                if let Some(hook) = on_success {
                    hook(submitted);
                }
            }
            Err(err) => {
                if let MarketError::Validation(errors) = err {
                    self.set_errors(errors.fields.clone());
                }
                if let Some(hook) = on_error {
                    hook(err);
                }
            }
        }

        drop(guard);
        if let Some(hook) = on_finish {
            hook();
        }
        result
    }
}
