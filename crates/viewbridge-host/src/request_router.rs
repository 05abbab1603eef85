//! Dispatches webview requests.
//!
//! Every request that resolves to a route is handled on its own task and
//! answered with exactly one response carrying the request's id. Handler
//! failures become `{id, error}`; nothing escapes the router. Requests that
//! resolve to no route are logged and left unanswered.

use std::sync::Arc;

use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, warn};
use uuid::Uuid;
use viewbridge_ipc::protocol::{LoginRequest, UpdateConfigurationRequest};
use viewbridge_ipc::{EndpointSender, Envelope, Request, Response};
use viewbridge_telemetry::RequestContext;

use crate::context::BridgeContext;
use crate::error::{BridgeError, BridgeResult};
use crate::routes::{Command, Route, RouteTable};
use crate::view_context::ViewContext;

/// Host-side request dispatcher for one view.
#[derive(Clone)]
pub struct RequestRouter {
    ctx: BridgeContext,
    routes: Arc<RouteTable>,
    outbound: EndpointSender,
    view_context: ViewContext,
    view_id: Uuid,
    cancel: CancellationToken,
}

impl RequestRouter {
    /// Create a router answering on `outbound`.
    ///
    /// Cancelling `cancel` abandons every request still in flight.
    #[must_use]
    pub fn new(
        ctx: BridgeContext,
        routes: Arc<RouteTable>,
        outbound: EndpointSender,
        view_context: ViewContext,
        view_id: Uuid,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            ctx,
            routes,
            outbound,
            view_context,
            view_id,
            cancel,
        }
    }

    /// Start handling `request`.
    ///
    /// Returns `None` without answering when no route matches.
    pub fn dispatch(&self, request: Request) -> Option<JoinHandle<()>> {
        let Some(route) = self.routes.resolve(&request.method) else {
            warn!(
                method = %request.method,
                id = %request.id,
                view_id = %self.view_id,
                "unhandled webview request"
            );
            return None;
        };

        let context = RequestContext::new("request_router")
            .with_view_id(self.view_id)
            .with_envelope_id(request.id.as_str())
            .with_method(request.method.as_str());
        let span = context.span();
        let router = self.clone();

        Some(tokio::spawn(
            async move {
                tokio::select! {
                    biased;
                    () = router.cancel.cancelled() => {
                        debug!("request abandoned: view destroyed");
                    },
                    response = router.respond(request, route) => {
                        if router.cancel.is_cancelled() {
                            debug!("dropping response: view destroyed");
                        } else {
                            router.outbound.post_envelope(&Envelope::Response(response));
                            debug!(elapsed_ms = context.elapsed_ms(), "request completed");
                        }
                    },
                }
            }
            .instrument(span),
        ))
    }

    /// Produce the response for `request` along `route`.
    pub async fn respond(&self, request: Request, route: Route) -> Response {
        let id = request.id.clone();
        let outcome = match route {
            Route::Proxy => self.proxy(request).await,
            Route::Local(command) => self.run(command, request).await,
        };
        match outcome {
            Ok(params) => Response::success(id, params),
            Err(e) => {
                debug!(error = %e, "request failed");
                Response::error(id, e.to_string())
            },
        }
    }

    async fn proxy(&self, request: Request) -> BridgeResult<Value> {
        let backend = self.ctx.session().backend()?;
        Ok(backend.send_request(&request.method, request.params).await?)
    }

    async fn run(&self, command: Command, request: Request) -> BridgeResult<Value> {
        match command {
            Command::Bootstrap => self.bootstrap(),
            Command::SlackLogin => self.slack_login().await,
            Command::CompleteSignup => self.complete_signup(request.params).await,
            Command::Login => self.login(request.params).await,
            Command::UpdateConfiguration => self.update_configuration(request.params),
        }
    }

    fn bootstrap(&self) -> BridgeResult<Value> {
        let mut data = self.ctx.session().bootstrap_data()?;
        data.merge_context(&self.view_context.snapshot());
        Ok(serde_json::to_value(data)?)
    }

    async fn slack_login(&self) -> BridgeResult<Value> {
        let url = self.ctx.session().slack_login_url()?;
        if self.ctx.url_opener().open(&url).await {
            Ok(Value::Bool(true))
        } else {
            Err(BridgeError::UrlNotOpened)
        }
    }

    async fn complete_signup(&self, params: Option<Value>) -> BridgeResult<Value> {
        let token = match params {
            Some(Value::String(token)) => token,
            None | Some(Value::Null) => self.ctx.session().signup_token(),
            Some(_) => {
                return Err(invalid_params(
                    Command::CompleteSignup,
                    "expected a signup token string",
                ));
            },
        };
        let code = self.ctx.session().login_via_signup_token(&token).await;
        self.signed_in_bootstrap(code)
    }

    async fn login(&self, params: Option<Value>) -> BridgeResult<Value> {
        let LoginRequest { email, password } = parse(Command::Login, params)?;
        let code = self.ctx.session().login(&email, &password).await;
        self.signed_in_bootstrap(code)
    }

    fn signed_in_bootstrap(&self, code: viewbridge_session::LoginResult) -> BridgeResult<Value> {
        if !code.is_success() {
            return Err(BridgeError::Login(code));
        }
        Ok(self.ctx.session().bootstrap_value()?)
    }

    fn update_configuration(&self, params: Option<Value>) -> BridgeResult<Value> {
        let UpdateConfigurationRequest { name, value } =
            parse(Command::UpdateConfiguration, params)?;
        self.ctx.config().set(&name, value)?;
        Ok(json!({}))
    }
}

fn parse<T: serde::de::DeserializeOwned>(command: Command, params: Option<Value>) -> BridgeResult<T> {
    serde_json::from_value(params.unwrap_or(Value::Null))
        .map_err(|e| invalid_params(command, &e.to_string()))
}

fn invalid_params(command: Command, message: &str) -> BridgeError {
    BridgeError::InvalidParams {
        method: command.method().to_owned(),
        message: message.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Harness, harness};
    use viewbridge_events::SessionStatus;
    use viewbridge_ipc::ResponseBody;

    fn router(h: &Harness) -> RequestRouter {
        RequestRouter::new(
            h.ctx.clone(),
            Arc::new(RouteTable::standard("codeStream")),
            h.outbound.clone(),
            ViewContext::new(h.context_override.clone()),
            Uuid::new_v4(),
            CancellationToken::new(),
        )
    }

    async fn call(r: &RequestRouter, method: &str, params: Option<Value>) -> Response {
        let route = r.routes.resolve(method).unwrap();
        r.respond(Request::new("1", method, params), route).await
    }

    #[tokio::test]
    async fn test_proxy_requires_sign_in() {
        let h = harness();
        let response = call(&router(&h), "codeStream/posts", None).await;
        assert_eq!(response.body, ResponseBody::Error("Not signed in".to_owned()));
    }

    #[tokio::test]
    async fn test_proxy_passes_params_through() {
        let h = harness();
        h.sign_in().await;
        let response = call(&router(&h), "codeStream/posts", Some(json!({"limit": 5}))).await;
        assert_eq!(
            response.body,
            ResponseBody::Params(json!({"method": "codeStream/posts", "params": {"limit": 5}}))
        );
    }

    #[tokio::test]
    async fn test_login_failure_returns_code() {
        let h = harness();
        let response = call(
            &router(&h),
            "login",
            Some(json!({"email": "dev@example.com", "password": "wrong"})),
        )
        .await;
        assert_eq!(
            response.body,
            ResponseBody::Error("INVALID_CREDENTIALS".to_owned())
        );
        assert_eq!(h.ctx.session().status(), SessionStatus::SignedOut);
    }

    #[tokio::test]
    async fn test_login_success_returns_bootstrap() {
        let h = harness();
        let response = call(
            &router(&h),
            "login",
            Some(json!({"email": "dev@example.com", "password": "secret"})),
        )
        .await;
        let ResponseBody::Params(data) = response.body else {
            panic!("expected success");
        };
        assert_eq!(data["session"]["userId"], json!("u1"));
        assert_eq!(h.ctx.session().status(), SessionStatus::SignedIn);
    }

    #[tokio::test]
    async fn test_login_with_bad_params() {
        let h = harness();
        let response = call(&router(&h), "login", Some(json!({"email": 3}))).await;
        let ResponseBody::Error(message) = response.body else {
            panic!("expected error");
        };
        assert!(message.starts_with("invalid params for 'login'"));
    }

    #[tokio::test]
    async fn test_bootstrap_merges_view_context() {
        let mut h = harness();
        h.context_override = json!({"panel": "codemarks"}).as_object().unwrap().clone();
        h.sign_in().await;
        let response = call(&router(&h), "bootstrap", None).await;
        let ResponseBody::Params(data) = response.body else {
            panic!("expected success");
        };
        assert_eq!(data["context"], json!({"panel": "codemarks"}));
    }

    #[tokio::test]
    async fn test_bootstrap_signed_out_fails_fast() {
        let h = harness();
        let response = call(&router(&h), "bootstrap", None).await;
        assert_eq!(response.body, ResponseBody::Error("Not signed in".to_owned()));
    }

    #[tokio::test]
    async fn test_slack_login_opens_url() {
        let h = harness();
        let response = call(&router(&h), "slack-login", None).await;
        assert_eq!(response.body, ResponseBody::Params(Value::Bool(true)));
        let opened = h.opened.lock().unwrap();
        let token = h.ctx.session().signup_token();
        assert_eq!(
            opened[0],
            format!("https://app.example.com/service-auth/slack?state={token}")
        );
    }

    #[tokio::test]
    async fn test_slack_login_without_handler() {
        let h = harness();
        h.refuse_urls();
        let response = call(&router(&h), "slack-login", None).await;
        assert_eq!(
            response.body,
            ResponseBody::Error("No app found to open url".to_owned())
        );
    }

    #[tokio::test]
    async fn test_complete_signup_uses_given_token() {
        let h = harness();
        let bad = call(&router(&h), "complete-signup", Some(json!("stale"))).await;
        assert_eq!(bad.body, ResponseBody::Error("TOKEN_INVALID".to_owned()));

        let good = call(&router(&h), "complete-signup", Some(json!("good"))).await;
        assert!(matches!(good.body, ResponseBody::Params(_)));
    }

    #[tokio::test]
    async fn test_update_configuration() {
        let h = harness();
        let r = router(&h);
        let ok = call(
            &r,
            "update-configuration",
            Some(json!({"name": "muteAll", "value": true})),
        )
        .await;
        assert_eq!(ok.body, ResponseBody::Params(json!({})));
        assert_eq!(h.ctx.config().get("muteAll"), Some(json!(true)));

        let unknown = call(
            &r,
            "update-configuration",
            Some(json!({"name": "fontSize", "value": 12})),
        )
        .await;
        assert_eq!(
            unknown.body,
            ResponseBody::Error("unknown configuration option 'fontSize'".to_owned())
        );
    }

    #[tokio::test]
    async fn test_dispatch_answers_once_on_channel() {
        let mut h = harness();
        let r = router(&h);
        r.dispatch(Request::new("42", "bootstrap", None))
            .unwrap()
            .await
            .unwrap();

        let raw = h.inbound.recv().await.unwrap();
        assert_eq!(raw["id"], json!("42"));
        assert_eq!(raw["error"], json!("Not signed in"));
        assert!(h.inbound.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_dispatch_ignores_unknown_methods() {
        let h = harness();
        assert!(router(&h).dispatch(Request::new("9", "reload-webview", None)).is_none());
    }

    #[tokio::test]
    async fn test_cancelled_router_sends_nothing() {
        let mut h = harness();
        let r = router(&h);
        r.cancel.cancel();
        r.dispatch(Request::new("1", "bootstrap", None))
            .unwrap()
            .await
            .unwrap();
        assert!(h.inbound.try_recv().is_none());
    }
}
