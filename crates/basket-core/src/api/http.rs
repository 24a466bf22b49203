use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::{ApiError, ShoppingApi};
use crate::config::CoreConfig;
use crate::constants::{paths, ACCESS_KEY_HEADER, UNKNOWN_ERROR_DETAIL};
use crate::models::{ClearMode, ItemId, ItemUpdate, NewItem, Product, ProductId, ShoppingItem};
use crate::session::Session;

/// Detail used when an error body parses but carries no `detail`
const MISSING_DETAIL: &str = "Request failed";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// CRUD client for the household server
#[derive(Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    config: CoreConfig,
    session: Session,
}

impl HttpApi {
    pub fn new(config: CoreConfig, session: Session) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            config,
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        self.config.endpoint(path)
    }

    /// Attach the credential, send, and map failure statuses.
    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let token = self.session.token().ok_or(ApiError::NotLoggedIn)?;

        let response = request.header(ACCESS_KEY_HEADER, token).send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            warn!("server rejected access key, logging out");
            self.session.invalidate();
            return Err(ApiError::Unauthorized);
        }

        if !status.is_success() {
            let detail = match response.json::<ErrorBody>().await {
                Ok(ErrorBody {
                    detail: Some(serde_json::Value::String(detail)),
                }) => detail,
                Ok(ErrorBody {
                    detail: Some(other),
                }) => other.to_string(),
                Ok(ErrorBody { detail: None }) => MISSING_DETAIL.to_string(),
                Err(_) => UNKNOWN_ERROR_DETAIL.to_string(),
            };
            debug!(status = status.as_u16(), %detail, "request rejected");
            return Err(ApiError::rejected(status.as_u16(), detail));
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        Ok(response.json::<T>().await?)
    }

    /// For endpoints whose body (if any) carries nothing we need.
    async fn send_empty(&self, request: RequestBuilder) -> Result<(), ApiError> {
        self.send(request).await?;
        Ok(())
    }
}

#[async_trait]
impl ShoppingApi for HttpApi {
    async fn fetch_products(&self) -> Result<Vec<Product>, ApiError> {
        self.send_json(self.client.get(self.url(paths::PRODUCTS)))
            .await
    }

    async fn create_product(&self, name: &str) -> Result<Product, ApiError> {
        let request = self
            .client
            .post(self.url(paths::PRODUCTS))
            .json(&json!({ "name": name }));
        self.send_json(request).await
    }

    async fn rename_product(&self, id: ProductId, name: &str) -> Result<Product, ApiError> {
        let request = self
            .client
            .put(self.url(&format!("{}/{}", paths::PRODUCTS, id)))
            .json(&json!({ "name": name }));
        self.send_json(request).await
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), ApiError> {
        let request = self
            .client
            .delete(self.url(&format!("{}/{}", paths::PRODUCTS, id)));
        self.send_empty(request).await
    }

    async fn reorder_products(&self, order: &[ProductId]) -> Result<Vec<Product>, ApiError> {
        let request = self
            .client
            .put(self.url(paths::PRODUCTS_REORDER))
            .json(&json!({ "product_ids": order }));
        self.send_json(request).await
    }

    async fn fetch_shopping_list(&self) -> Result<Vec<ShoppingItem>, ApiError> {
        let rows: Vec<serde_json::Value> = self
            .send_json(self.client.get(self.url(paths::SHOPPING)))
            .await?;
        Ok(ShoppingItem::from_rows(rows))
    }

    async fn add_item(&self, item: &NewItem) -> Result<ShoppingItem, ApiError> {
        let request = self.client.post(self.url(paths::SHOPPING)).json(item);
        self.send_json(request).await
    }

    async fn update_item(
        &self,
        id: ItemId,
        update: &ItemUpdate,
    ) -> Result<ShoppingItem, ApiError> {
        let request = self
            .client
            .put(self.url(&format!("{}/{}", paths::SHOPPING, id)))
            .json(update);
        self.send_json(request).await
    }

    async fn delete_item(&self, id: ItemId) -> Result<(), ApiError> {
        let request = self
            .client
            .delete(self.url(&format!("{}/{}", paths::SHOPPING, id)));
        self.send_empty(request).await
    }

    async fn set_checked(&self, id: ItemId, is_checked: bool) -> Result<ShoppingItem, ApiError> {
        let request = self
            .client
            .put(self.url(&format!("{}/{}/check", paths::SHOPPING, id)))
            .json(&json!({ "is_checked": is_checked }));
        self.send_json(request).await
    }

    async fn clear_list(&self, mode: ClearMode) -> Result<(), ApiError> {
        let request = self
            .client
            .post(self.url(paths::SHOPPING_CLEAR))
            .json(&json!({ "keep_unchecked": mode.keep_unchecked() }));
        self.send_empty(request).await
    }
}
