use crate::services::access::AccessGate;
use crate::services::catalog::PhotoCatalog;
use crate::services::gallery::format_file_size;
use crate::services::upload::PhotoStore;
use crate::web::flash::FlashSigner;
use crate::Config;
use anyhow::Result;
use axum::http::{header, HeaderMap};
use std::collections::HashMap;
use std::sync::Arc;
use tera::{Tera, Value};

pub struct AppState {
    pub config: Config,
    pub store: PhotoStore,
    pub gate: AccessGate,
    pub templates: Tera,
    pub flash: FlashSigner,
}

impl AppState {
    pub fn new(config: Config, catalog: Arc<dyn PhotoCatalog>) -> Result<Self> {
        let mut templates = Tera::default();

        templates.register_filter("format_date", format_date_filter);
        templates.register_filter("filesize", filesize_filter);
        templates.add_raw_templates(vec![
            ("base.html", include_str!("../../templates/base.html")),
            ("index.html", include_str!("../../templates/index.html")),
            ("upload.html", include_str!("../../templates/upload.html")),
        ])?;

        let store = PhotoStore::from_config(&config, catalog);
        let gate = AccessGate::from_config(&config.access);
        let flash = FlashSigner::new(&config.site.secret_key);

        Ok(Self {
            config,
            store,
            gate,
            templates,
            flash,
        })
    }

    pub fn catalog(&self) -> &dyn PhotoCatalog {
        self.store.catalog()
    }

    /// Configured public URL, else derived from the request's Host header.
    pub fn base_url(&self, headers: &HeaderMap) -> String {
        if let Some(url) = &self.config.site.public_base_url {
            return url.trim_end_matches('/').to_string();
        }

        let host = headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("localhost");
        let scheme = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("http");
        format!("{}://{}", scheme, host)
    }
}

fn format_date_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let date_str = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("format_date requires a string"))?;

    let format = args
        .get("format")
        .and_then(|v| v.as_str())
        .unwrap_or("%Y-%m-%d %H:%M:%S");

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(date_str) {
        return Ok(Value::String(dt.format(format).to_string()));
    }

    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(date_str, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Value::String(dt.format(format).to_string()));
    }

    Ok(Value::String(date_str.to_string()))
}

fn filesize_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let bytes = value
        .as_u64()
        .ok_or_else(|| tera::Error::msg("filesize requires a non-negative integer"))?;
    Ok(Value::String(format_file_size(bytes)))
}
