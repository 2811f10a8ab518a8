//! Generic CRUD plumbing shared by the per-resource clients.
//!
//! The API wraps single resources as `{"<singular>": {...}}` and lists as
//! `{"<plural>": [...], "meta": {...}}`. [`ResourceClient`] unwraps those envelopes so the
//! typed clients only describe paths and payloads.

use std::fmt::Display;
use std::marker::PhantomData;
use std::str::FromStr;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::client::ServiceClient;
use crate::error::{Error, Result};
use crate::query::{ListOpts, ALL_PAGES_PER_PAGE};
use crate::types::Meta;

/// A resource kind exposed by the API.
pub trait Resource: DeserializeOwned + Send + 'static {
    /// Typed identifier of the resource.
    type Id: Copy + Display + FromStr + Send + Sync;

    /// JSON key wrapping a single resource.
    const SINGULAR: &'static str;
    /// JSON key wrapping a list of resources.
    const PLURAL: &'static str;
    /// Collection path relative to the API base URL.
    const PATH: &'static str;
}

/// Extract and decode `key` from a response envelope.
///
/// # Errors
///
/// Returns [`Error::ParseError`] if the key is missing or does not decode as `T`.
pub fn take_field<T>(value: &mut Value, key: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let field = value
        .get_mut(key)
        .map(Value::take)
        .ok_or_else(|| Error::ParseError(format!("response has no `{key}` field")))?;
    serde_json::from_value(field)
        .map_err(|err| Error::ParseError(format!("invalid `{key}` field: {err}")))
}

/// CRUD client for one resource kind.
pub struct ResourceClient<R> {
    inner: ServiceClient,
    _marker: PhantomData<fn() -> R>,
}

impl<R> Clone for ResourceClient<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _marker: PhantomData,
        }
    }
}

impl<R> std::fmt::Debug for ResourceClient<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceClient")
            .field("inner", &self.inner)
            .finish()
    }
}

impl<R: Resource> ResourceClient<R> {
    /// Wrap a transport.
    #[must_use]
    pub fn new(inner: ServiceClient) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    /// Return the underlying transport.
    #[must_use]
    pub fn service(&self) -> &ServiceClient {
        &self.inner
    }

    /// Path of a single resource.
    #[must_use]
    pub fn item_path(id: R::Id) -> String {
        format!("{}/{id}", R::PATH)
    }

    /// Fetch a resource by ID; `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn get_by_id(&self, id: R::Id) -> Result<Option<R>> {
        let body: Option<Value> = self.inner.get_optional(&Self::item_path(id)).await?;
        body.map(|mut body| take_field(&mut body, R::SINGULAR))
            .transpose()
    }

    /// Fetch a resource by its unique name; `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<R>> {
        if name.is_empty() {
            return Ok(None);
        }
        let (items, _) = self
            .list(&ListOpts::default(), &[("name", name.to_string())])
            .await?;
        Ok(items.into_iter().next())
    }

    /// Fetch a resource by ID when `id_or_name` parses as one, falling back to the name.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn get(&self, id_or_name: &str) -> Result<Option<R>> {
        if let Ok(id) = id_or_name.parse::<R::Id>() {
            if let Some(resource) = self.get_by_id(id).await? {
                return Ok(Some(resource));
            }
        }
        self.get_by_name(id_or_name).await
    }

    /// Fetch one page of resources.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn list(
        &self,
        opts: &ListOpts,
        filters: &[(&'static str, String)],
    ) -> Result<(Vec<R>, Meta)> {
        let mut params = opts.to_pairs();
        params.extend_from_slice(filters);

        let mut body: Value = self.inner.get_json(R::PATH, &params).await?;
        let items = take_field(&mut body, R::PLURAL)?;
        let meta = match body.get_mut("meta") {
            Some(meta) => serde_json::from_value(meta.take())?,
            None => Meta::default(),
        };
        Ok((items, meta))
    }

    /// Fetch every page of resources.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn all(
        &self,
        opts: &ListOpts,
        filters: &[(&'static str, String)],
    ) -> Result<Vec<R>> {
        let mut page_opts = ListOpts {
            page: Some(1),
            per_page: Some(opts.per_page.unwrap_or(ALL_PAGES_PER_PAGE)),
            label_selector: opts.label_selector.clone(),
        };
        let mut all = Vec::new();

        loop {
            let (items, meta) = self.list(&page_opts, filters).await?;
            all.extend(items);
            match meta.next_page() {
                Some(next) => page_opts.page = Some(next),
                None => return Ok(all),
            }
        }
    }

    /// Create a resource, decoding the full response body.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn create<B, T>(&self, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.inner
            .send_json(Method::POST, R::PATH, Some(body), &[])
            .await
    }

    /// Create a resource whose response only wraps the new resource.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn create_item<B>(&self, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
    {
        let mut response: Value = self.create(body).await?;
        take_field(&mut response, R::SINGULAR)
    }

    /// Update a resource and return its new state.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn update<B>(&self, id: R::Id, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
    {
        let mut response: Value = self
            .inner
            .send_json(Method::PUT, &Self::item_path(id), Some(body), &[])
            .await?;
        take_field(&mut response, R::SINGULAR)
    }

    /// Delete a resource whose deletion completes synchronously.
    ///
    /// # Errors
    ///
    /// Returns transport errors.
    pub async fn delete(&self, id: R::Id) -> Result<()> {
        self.inner
            .send_empty::<()>(Method::DELETE, &Self::item_path(id), None)
            .await
    }

    /// Delete a resource whose deletion returns a body, e.g. an action.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn delete_returning<T>(&self, id: R::Id) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.inner
            .send_json::<(), T>(Method::DELETE, &Self::item_path(id), None, &[])
            .await
    }

    /// Trigger `POST <path>/<id>/actions/<name>`.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn action<B, T>(&self, id: R::Id, name: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let path = format!("{}/actions/{name}", Self::item_path(id));
        self.inner.send_json(Method::POST, &path, body, &[]).await
    }
}

/// Implement the read operations every resource client shares.
///
/// The client must hold its [`ResourceClient`] in a field named `resources`, and the
/// filter type must provide `to_pairs(&self) -> Vec<(&'static str, String)>`.
#[macro_export]
macro_rules! read_operations {
    ($resource:ty, $params:ty) => {
        /// Fetch by ID; `None` if it does not exist.
        ///
        /// # Errors
        ///
        /// Returns transport or decoding errors.
        pub async fn get_by_id(
            &self,
            id: <$resource as $crate::resource::Resource>::Id,
        ) -> $crate::Result<Option<$resource>> {
            self.resources.get_by_id(id).await
        }

        /// Fetch by name; `None` if it does not exist.
        ///
        /// # Errors
        ///
        /// Returns transport or decoding errors.
        pub async fn get_by_name(&self, name: &str) -> $crate::Result<Option<$resource>> {
            self.resources.get_by_name(name).await
        }

        /// Fetch by ID if `id_or_name` parses as one, otherwise by name.
        ///
        /// # Errors
        ///
        /// Returns transport or decoding errors.
        pub async fn get(&self, id_or_name: &str) -> $crate::Result<Option<$resource>> {
            self.resources.get(id_or_name).await
        }

        /// Fetch one page.
        ///
        /// # Errors
        ///
        /// Returns transport or decoding errors.
        pub async fn list(
            &self,
            opts: &$crate::query::ListOpts,
            params: &$params,
        ) -> $crate::Result<(Vec<$resource>, $crate::types::Meta)> {
            self.resources.list(opts, &params.to_pairs()).await
        }

        /// Fetch every page.
        ///
        /// # Errors
        ///
        /// Returns transport or decoding errors.
        pub async fn all(
            &self,
            opts: &$crate::query::ListOpts,
            params: &$params,
        ) -> $crate::Result<Vec<$resource>> {
            self.resources.all(opts, &params.to_pairs()).await
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{RetryPolicy, ServiceClientBuilder};
    use crate::id::SshKeyId;
    use serde::Deserialize;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Key {
        id: SshKeyId,
        name: String,
    }

    impl Resource for Key {
        type Id = SshKeyId;
        const SINGULAR: &'static str = "ssh_key";
        const PLURAL: &'static str = "ssh_keys";
        const PATH: &'static str = "ssh_keys";
    }

    fn test_client(server: &MockServer) -> ResourceClient<Key> {
        let inner = ServiceClientBuilder::new(server.uri())
            .unwrap()
            .with_retry_policy(RetryPolicy::no_retry())
            .build()
            .unwrap();
        ResourceClient::new(inner)
    }

    struct KeyClient {
        resources: ResourceClient<Key>,
    }

    impl KeyClient {
        crate::read_operations!(Key, crate::query::ListParams);
    }

    #[tokio::test]
    async fn read_operations_delegate() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ssh_keys"))
            .and(query_param("name", "deploy"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ssh_keys": [{"id": 3, "name": "deploy"}]
            })))
            .mount(&server)
            .await;

        let client = KeyClient {
            resources: test_client(&server),
        };
        let params = crate::query::ListParams::by_name("deploy");
        let (keys, meta) = client.list(&ListOpts::default(), &params).await.unwrap();
        assert_eq!(keys[0].id, SshKeyId::new(3));
        assert!(meta.next_page().is_none());
        assert!(client.get_by_name("deploy").await.unwrap().is_some());
    }

    #[test]
    fn take_field_reports_missing_key() {
        let mut value = json!({"other": 1});
        let err = take_field::<i64>(&mut value, "ssh_key").unwrap_err();
        assert!(matches!(err, Error::ParseError(_)));
    }

    #[tokio::test]
    async fn get_falls_back_to_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ssh_keys/123"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"code": "not_found", "message": "not found"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ssh_keys"))
            .and(query_param("name", "123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ssh_keys": [{"id": 7, "name": "123"}]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let key = client.get("123").await.unwrap().unwrap();
        assert_eq!(key.id, SshKeyId::new(7));
    }

    #[tokio::test]
    async fn get_by_name_empty_is_none() {
        let server = MockServer::start().await;
        let client = test_client(&server);
        assert!(client.get_by_name("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn all_walks_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ssh_keys"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ssh_keys": [{"id": 1, "name": "a"}],
                "meta": {"pagination": {"page": 1, "per_page": 50, "next_page": 2, "last_page": 2, "total_entries": 2}}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ssh_keys"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ssh_keys": [{"id": 2, "name": "b"}],
                "meta": {"pagination": {"page": 2, "per_page": 50, "previous_page": 1, "next_page": null, "last_page": 2, "total_entries": 2}}
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let keys = client.all(&ListOpts::default(), &[]).await.unwrap();
        let names: Vec<_> = keys.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn update_unwraps_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/ssh_keys/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ssh_key": {"id": 1, "name": "renamed"}
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let key = client
            .update(SshKeyId::new(1), &json!({"name": "renamed"}))
            .await
            .unwrap();
        assert_eq!(key.name, "renamed");
    }

    #[tokio::test]
    async fn delete_accepts_no_content() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/ssh_keys/1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        client.delete(SshKeyId::new(1)).await.unwrap();
    }
}
