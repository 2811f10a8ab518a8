//! Client for the `/actions` endpoints.

use async_trait::async_trait;
use hcloud_core::id::ActionId;
use hcloud_core::query::ListOpts;
use hcloud_core::types::Meta;
use hcloud_core::{Error, Result, ResourceClient, ServiceClient};
use tokio_util::sync::CancellationToken;

use crate::models::{Action, ActionListParams};
use crate::waiter::{ActionFetcher, ActionWaiter, ProgressReceivers};

/// Client for reading and waiting on actions.
#[derive(Debug, Clone)]
pub struct ActionClient {
    resources: ResourceClient<Action>,
}

impl ActionClient {
    /// Create a client on top of an existing transport.
    #[must_use]
    pub fn new(inner: ServiceClient) -> Self {
        Self {
            resources: ResourceClient::new(inner),
        }
    }

    /// Fetch an action by ID; `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn get_by_id(&self, id: ActionId) -> Result<Option<Action>> {
        self.resources.get_by_id(id).await
    }

    /// Fetch one page of actions.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn list(
        &self,
        opts: &ListOpts,
        params: &ActionListParams,
    ) -> Result<(Vec<Action>, Meta)> {
        self.resources.list(opts, &params.to_pairs()).await
    }

    /// Fetch all actions matching `params`.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn all(&self, params: &ActionListParams) -> Result<Vec<Action>> {
        self.resources
            .all(&ListOpts::default(), &params.to_pairs())
            .await
    }

    /// A waiter polling through this client at the configured poll interval.
    #[must_use]
    pub fn waiter(&self) -> ActionWaiter<Self> {
        ActionWaiter::new(self.clone(), self.resources.service().poll_interval())
    }

    /// See [`ActionWaiter::wait_for`].
    ///
    /// # Errors
    ///
    /// Returns the first failed action, fetch error or cancellation.
    pub async fn wait_for(&self, cancel: &CancellationToken, actions: &mut [Action]) -> Result<()> {
        self.waiter().wait_for(cancel, actions).await
    }

    /// See [`ActionWaiter::wait_for_func`].
    ///
    /// # Errors
    ///
    /// Returns the first error from `handle`, a fetch error or cancellation.
    pub async fn wait_for_func<H>(
        &self,
        cancel: &CancellationToken,
        actions: &mut [Action],
        handle: H,
    ) -> Result<()>
    where
        H: Fn(&Action) -> Result<()> + Sync,
    {
        self.waiter().wait_for_func(cancel, actions, handle).await
    }

    /// See [`ActionWaiter::watch_progress`].
    #[must_use]
    pub fn watch_progress(&self, cancel: &CancellationToken, action: Action) -> ProgressReceivers {
        self.waiter().watch_progress(cancel, action)
    }

    /// See [`ActionWaiter::watch_overall_progress`].
    #[must_use]
    pub fn watch_overall_progress(
        &self,
        cancel: &CancellationToken,
        actions: Vec<Action>,
    ) -> ProgressReceivers {
        self.waiter().watch_overall_progress(cancel, actions)
    }
}

#[async_trait]
impl ActionFetcher for ActionClient {
    async fn fetch_action(&self, id: ActionId) -> Result<Action> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| Error::ActionsNotFound(vec![id.get()]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActionStatus;
    use hcloud_core::{RetryPolicy, ServiceClientBuilder};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> ActionClient {
        let inner = ServiceClientBuilder::new(server.uri())
            .unwrap()
            .with_token("token")
            .with_retry_policy(RetryPolicy::no_retry())
            .with_poll_interval(Duration::from_millis(10))
            .build()
            .unwrap();
        ActionClient::new(inner)
    }

    fn action_body(status: &str, progress: u8) -> serde_json::Value {
        json!({
            "action": {
                "id": 1,
                "command": "create_server",
                "status": status,
                "progress": progress,
                "started": "2016-01-30T23:55:00+00:00",
                "finished": null,
                "resources": [{"id": 42, "type": "server"}],
                "error": null
            }
        })
    }

    #[tokio::test]
    async fn get_by_id_decodes_action() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/actions/1"))
            .and(header("authorization", "Bearer token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(action_body("running", 20)))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let action = client.get_by_id(ActionId::new(1)).await.unwrap().unwrap();
        assert_eq!(action.command, "create_server");
        assert_eq!(action.progress, 20);
        assert_eq!(action.resources[0].id, 42);
    }

    #[tokio::test]
    async fn list_sends_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/actions"))
            .and(query_param("status", "running"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "actions": [{"id": 1, "status": "running"}],
                "meta": {"pagination": {"page": 1, "per_page": 25, "last_page": 1, "total_entries": 1}}
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let params = ActionListParams {
            statuses: vec![ActionStatus::Running],
            ..ActionListParams::default()
        };
        let (actions, meta) = client.list(&ListOpts::default(), &params).await.unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(meta.pagination.and_then(|p| p.total_entries), Some(1));
    }

    #[tokio::test]
    async fn missing_action_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/actions/1"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"code": "not_found", "message": "action not found"}
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client.fetch_action(ActionId::new(1)).await.unwrap_err();
        assert_eq!(err, Error::ActionsNotFound(vec![1]));
    }

    #[tokio::test]
    async fn wait_for_polls_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/actions/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(action_body("running", 50)))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/actions/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(action_body("success", 100)))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let mut actions = vec![client.get_by_id(ActionId::new(1)).await.unwrap().unwrap()];
        client
            .wait_for(&CancellationToken::new(), &mut actions)
            .await
            .unwrap();

        assert_eq!(actions[0].status, ActionStatus::Success);
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }
}
