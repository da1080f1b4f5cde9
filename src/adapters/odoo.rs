use crate::config::toml_config::ErpConfig;
use crate::core::bom::display_name;
use crate::domain::model::{BomDocument, BomLine, Category};
use crate::domain::ports::BomSource;
use crate::utils::error::{RecipeError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::OnceCell;

const PRODUCTION_MODEL: &str = "mrp.production";
const MOVE_MODEL: &str = "stock.move";

fn unavailable(message: impl Into<String>) -> RecipeError {
    RecipeError::ExternalSourceUnavailable {
        source_name: "erp".to_string(),
        message: message.into(),
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    message: String,
    #[serde(default)]
    data: Option<RpcErrorData>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorData {
    #[serde(default)]
    message: Option<String>,
}

impl RpcError {
    fn describe(&self) -> String {
        match self.data.as_ref().and_then(|d| d.message.as_deref()) {
            Some(detail) => format!("{}: {}", self.message, detail),
            None => self.message.clone(),
        }
    }
}

/// Odoo 的 many2one 欄位：`[id, "名稱"]`，未設定時為 `false`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Many2One {
    Linked(#[allow(dead_code)] i64, String),
    Empty(#[allow(dead_code)] bool),
}

impl Many2One {
    fn name(&self) -> &str {
        match self {
            Many2One::Linked(_, name) => name,
            Many2One::Empty(_) => "",
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProductionOrder {
    name: String,
    product_id: Many2One,
    #[serde(default)]
    move_raw_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct StockMove {
    product_id: Many2One,
    product_uom_qty: f64,
    product_uom: Many2One,
}

/// 透過 JSON-RPC 從 Odoo 讀取製令與原料
pub struct OdooClient {
    client: Client,
    config: ErpConfig,
    uid: OnceCell<i64>,
    request_id: AtomicU64,
}

impl OdooClient {
    pub fn new(config: ErpConfig) -> Self {
        Self {
            client: Client::new(),
            config,
            uid: OnceCell::new(),
            request_id: AtomicU64::new(1),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/jsonrpc", self.config.url.trim_end_matches('/'))
    }

    async fn call(&self, service: &str, method: &str, args: Value) -> Result<Value> {
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "method": "call",
            "params": { "service": service, "method": method, "args": args },
            "id": id,
        });

        tracing::debug!("ERP call {}.{} (id {})", service, method, id);
        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .timeout(Duration::from_secs(self.config.request_timeout_seconds))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(unavailable(format!(
                "ERP request failed with status: {}",
                response.status()
            )));
        }

        let reply: RpcResponse = response.json().await?;
        if let Some(error) = reply.error {
            return Err(unavailable(error.describe()));
        }
        reply
            .result
            .ok_or_else(|| unavailable(format!("empty result for {}.{}", service, method)))
    }

    async fn login(&self) -> Result<i64> {
        let result = self
            .call(
                "common",
                "login",
                json!([self.config.database, self.config.username, self.config.password]),
            )
            .await?;
        let uid = result
            .as_i64()
            .ok_or_else(|| unavailable(format!("authentication failed for user {}", self.config.username)))?;
        tracing::info!("Authenticated with ERP as uid {}", uid);
        Ok(uid)
    }

    async fn execute_kw<T: DeserializeOwned>(
        &self,
        model: &str,
        method: &str,
        args: Value,
        fields: &[&str],
    ) -> Result<T> {
        let uid = *self.uid.get_or_try_init(|| self.login()).await?;
        let kwargs = json!({
            "fields": fields,
            "context": { "lang": self.config.language },
        });
        let result = self
            .call(
                "object",
                "execute_kw",
                json!([
                    self.config.database,
                    uid,
                    self.config.password,
                    model,
                    method,
                    args,
                    kwargs
                ]),
            )
            .await?;
        // 回應格式不符視為 ERP 端的問題
        serde_json::from_value(result)
            .map_err(|e| unavailable(format!("unexpected {}.{} response: {}", model, method, e)))
    }

    async fn find_order(&self, reference: &str) -> Result<ProductionOrder> {
        let orders: Vec<ProductionOrder> = self
            .execute_kw(
                PRODUCTION_MODEL,
                "search_read",
                json!([[["name", "=", reference]]]),
                &["name", "product_id", "move_raw_ids"],
            )
            .await?;
        orders
            .into_iter()
            .next()
            .ok_or_else(|| unavailable(format!("No manufacturing order found with the name {}", reference)))
    }

    /// 子工單可以直接給 B/F，否則查子工單產品名稱是否含 fly
    async fn child_category(&self, child_ref: &str) -> Result<Category> {
        if let Some(category) = Category::from_code(child_ref) {
            return Ok(category);
        }
        let child = self.find_order(child_ref).await?;
        let category = Category::from_product_name(child.product_id.name());
        tracing::info!("Child order {} ({}) is {}", child_ref, child.product_id.name(), category);
        Ok(category)
    }
}

#[async_trait]
impl BomSource for OdooClient {
    async fn fetch(&self, parent_ref: &str, child_ref: &str) -> Result<BomDocument> {
        let order = self.find_order(parent_ref).await?;

        let moves: Vec<StockMove> = if order.move_raw_ids.is_empty() {
            Vec::new()
        } else {
            self.execute_kw(
                MOVE_MODEL,
                "read",
                json!([order.move_raw_ids]),
                &["product_id", "product_uom_qty", "product_uom"],
            )
            .await?
        };

        let lines = moves
            .into_iter()
            .map(|m| BomLine {
                product: m.product_id.name().to_string(),
                quantity: m.product_uom_qty,
                unit: m.product_uom.name().to_string(),
            })
            .collect::<Vec<_>>();

        let child_category = self.child_category(child_ref).await?;
        tracing::info!("Fetched {} BOM lines for {}", lines.len(), order.name);

        Ok(BomDocument {
            parent_ref: parent_ref.to_string(),
            product_display_name: display_name(order.product_id.name()).to_string(),
            bom_name: order.name,
            child_category,
            lines,
        })
    }
}
