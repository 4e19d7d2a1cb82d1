use anyhow::{anyhow, bail, Context};
use closure_traits::{ChannelCallBack, ChannelCallBackOutput};
use farm_shared::{
    const_config::path::{PathSpec, PATH_TOKEN_REFRESH},
    token::{bearer_header_value, TokenPair},
    uac::ApiError,
};
use futures::channel::oneshot;
use reqwest::{header::AUTHORIZATION, Method, StatusCode};
use secrecy::{ExposeSecret as _, SecretString};
use std::fmt::Debug;
use tracing::{debug, info, warn};

use crate::AuthContext;

pub mod api;

/// Talks to the dashboard backend on behalf of the session in `context`.
///
/// Requests carry the stored access token. A 401 triggers one token refresh
/// and, if that worked, exactly one retry. If the refresh fails the session is
/// torn down and [`ApiError::SessionExpired`] is returned
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    api_url: String,
    context: AuthContext,
}

/// Everything needed to send the same request a second time
#[derive(Debug, Clone)]
struct PreparedRequest {
    method: Method,
    url: String,
    args: serde_json::Value,
}

impl ApiClient {
    #[tracing::instrument(name = "NEW API-CLIENT", skip(context))]
    pub fn new(api_url: String, context: AuthContext) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url,
            context,
        }
    }

    pub fn context(&self) -> &AuthContext {
        &self.context
    }

    #[tracing::instrument(skip(args, ui_notify))]
    // WARNING: Must skip args as it may contain sensitive info
    pub fn send_request_expect_json<F, T, U>(
        &self,
        path_spec: PathSpec,
        args: &T,
        ui_notify: F,
    ) -> oneshot::Receiver<Result<U, ApiError>>
    where
        T: serde::Serialize + Debug,
        F: UiCallBack,
        U: Send + Debug + serde::de::DeserializeOwned + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let prepared = match self.prepare(&path_spec, args) {
            Ok(x) => x,
            Err(e) => {
                send_result(tx, Err(e));
                ui_notify();
                return rx;
            }
        };
        let client = self.clone();
        let retry = prepared.clone();
        let on_done = move |resp: reqwest::Result<reqwest::Response>| async move {
            let msg = match client.handle_unauthorized(resp, retry).await {
                Ok(response) => process_json_body(response).await,
                Err(e) => Err(e),
            };
            send_result(tx, msg);
            ui_notify();
        };
        self.initiate_request(&prepared, on_done);
        rx
    }

    #[tracing::instrument(skip(args, ui_notify))]
    pub fn send_request_expect_empty<F, T>(
        &self,
        path_spec: PathSpec,
        args: &T,
        ui_notify: F,
    ) -> oneshot::Receiver<Result<(), ApiError>>
    where
        T: serde::Serialize + Debug,
        F: UiCallBack,
    {
        let (tx, rx) = oneshot::channel();
        let prepared = match self.prepare(&path_spec, args) {
            Ok(x) => x,
            Err(e) => {
                send_result(tx, Err(e));
                ui_notify();
                return rx;
            }
        };
        let client = self.clone();
        let retry = prepared.clone();
        let on_done = move |resp: reqwest::Result<reqwest::Response>| async move {
            let msg = match client.handle_unauthorized(resp, retry).await {
                Ok(response) => process_empty(response).await,
                Err(e) => Err(e),
            };
            send_result(tx, msg);
            ui_notify();
        };
        self.initiate_request(&prepared, on_done);
        rx
    }

    fn prepare<T>(&self, path_spec: &PathSpec, args: &T) -> Result<PreparedRequest, ApiError>
    where
        T: serde::Serialize + Debug,
    {
        let args = serde_json::to_value(args).context("failed to serialize request arguments")?;
        Ok(PreparedRequest {
            method: path_spec.method.clone(),
            url: self.path_to_url(path_spec.path),
            args,
        })
    }

    fn build_request(
        &self,
        prepared: &PreparedRequest,
        access_token: Option<&SecretString>,
    ) -> reqwest::RequestBuilder {
        let mut request = self
            .http
            .request(prepared.method.clone(), &prepared.url);
        // GET only supports flat objects as query arguments, anything else is
        // sent without arguments
        request = if prepared.method != Method::GET {
            request.json(&prepared.args)
        } else if prepared.args.is_object() {
            request.query(&prepared.args)
        } else {
            request
        };
        if let Some(token) = access_token {
            request = request.header(AUTHORIZATION, bearer_header_value(token));
        }
        request
    }

    fn initiate_request<F, O>(&self, prepared: &PreparedRequest, on_done: F)
    where
        F: ChannelCallBack<O>,
        O: ChannelCallBackOutput,
    {
        let access_token = self.context.access_token();
        let request = self.build_request(prepared, access_token.as_ref());
        reqwest_cross::fetch(request, on_done)
    }

    /// Passes through anything that is not a 401. On a 401 refreshes the
    /// tokens and sends `prepared` once more with the new access token
    #[tracing::instrument(skip_all)]
    async fn handle_unauthorized(
        &self,
        response: reqwest::Result<reqwest::Response>,
        prepared: PreparedRequest,
    ) -> Result<reqwest::Response, ApiError> {
        let response = extract_response(response)?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        info!("Unauthorized request, attempting to refresh token");
        let tokens = match self.refresh_tokens().await {
            Ok(tokens) => tokens,
            Err(err) => {
                warn!(?err, "Token refresh failed, ending session");
                self.context.expire_session();
                return Err(ApiError::SessionExpired);
            }
        };

        info!("Token refreshed, retrying request");
        let retried = self
            .build_request(&prepared, Some(&tokens.access))
            .send()
            .await;
        extract_response(retried)
    }

    #[tracing::instrument(skip(self), err(Debug))]
    async fn refresh_tokens(&self) -> anyhow::Result<TokenPair> {
        let refresh = self
            .context
            .refresh_token()
            .context("no refresh token stored")?;
        let response = self
            .http
            .request(
                PATH_TOKEN_REFRESH.method.clone(),
                self.path_to_url(PATH_TOKEN_REFRESH.path),
            )
            .json(&serde_json::json!({ "refresh": refresh.expose_secret() }))
            .send()
            .await
            .context("failed to send refresh request")?;
        let status = response.status();
        if !status.is_success() {
            bail!("refresh rejected with status code: {status}");
        }
        let tokens: TokenPair = response
            .json()
            .await
            .context("failed to parse refresh response as json")?;
        self.context.store_tokens(tokens.clone());
        Ok(tokens)
    }

    #[tracing::instrument(ret)]
    fn path_to_url(&self, path: &str) -> String {
        format!("{}{path}", self.api_url.trim_end_matches('/'))
    }
}

fn send_result<U: Debug>(tx: oneshot::Sender<Result<U, ApiError>>, msg: Result<U, ApiError>) {
    if tx.send(msg).is_err() {
        debug!("receiver dropped before the response arrived");
    }
}

#[tracing::instrument(ret, err(Debug))]
async fn process_empty(response: reqwest::Response) -> Result<(), ApiError> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(handle_error(response).await)
    }
}

#[tracing::instrument(ret, err(Debug))]
async fn process_json_body<T>(response: reqwest::Response) -> Result<T, ApiError>
where
    T: Debug + serde::de::DeserializeOwned,
{
    if response.status().is_success() {
        Ok(response
            .json()
            .await
            .context("failed to parse result as json")?)
    } else {
        Err(handle_error(response).await)
    }
}

/// Uses the `detail` field of a JSON error body when there is one
#[tracing::instrument(ret)]
async fn handle_error(response: reqwest::Response) -> ApiError {
    let status = response.status();
    debug_assert!(
        !status.is_success(),
        "this is supposed to be an error, right? Status code is: {status}"
    );
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => return anyhow!(e).context("failed to get response body").into(),
    };
    let detail = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| value.get("detail")?.as_str().map(str::to_string))
        .unwrap_or_else(|| "Unknown error".to_string());
    ApiError::RequestFailed { status, detail }
}

/// Provides a way to standardize the error message
fn extract_response(
    response: reqwest::Result<reqwest::Response>,
) -> Result<reqwest::Response, ApiError> {
    if response.is_err() {
        info!("Response is err: {:#?}", response);
    }
    Ok(response.context("failed to send request")?)
}

pub trait UiCallBack: 'static + Send + FnOnce() {}
impl<T> UiCallBack for T where T: 'static + Send + FnOnce() {}

#[cfg(not(target_arch = "wasm32"))]
pub mod closure_traits {
    pub trait ChannelCallBack<O>:
        'static + Send + FnOnce(reqwest::Result<reqwest::Response>) -> O
    {
    }
    impl<T, O> ChannelCallBack<O> for T where
        T: 'static + Send + FnOnce(reqwest::Result<reqwest::Response>) -> O
    {
    }
    pub trait ChannelCallBackOutput: futures::Future<Output = ()> + Send {}
    impl<T> ChannelCallBackOutput for T where T: futures::Future<Output = ()> + Send {}
}

#[cfg(target_arch = "wasm32")]
pub mod closure_traits {
    pub trait ChannelCallBack<O>:
        'static + FnOnce(reqwest::Result<reqwest::Response>) -> O
    {
    }
    impl<T, O> ChannelCallBack<O> for T where
        T: 'static + FnOnce(reqwest::Result<reqwest::Response>) -> O
    {
    }
    pub trait ChannelCallBackOutput: futures::Future<Output = ()> {}
    impl<T> ChannelCallBackOutput for T where T: futures::Future<Output = ()> {}
}
