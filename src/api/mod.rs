// src/api/mod.rs
pub mod handlers;
pub mod reply;

use serde::Deserialize;
use std::{convert::Infallible, sync::Arc};
use warp::Filter;

use crate::load::Loader;
use crate::store::Database;

pub const DEFAULT_BUSINESS_ID: i64 = 1004;
pub const DEFAULT_FILE_FORMAT: &str = "utf-8";

/// Shared handles injected into every request.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub loader: Loader,
    pub max_upload_bytes: u64,
}

impl AppState {
    pub fn new(db: Database, loader: Loader, max_upload_bytes: u64) -> Self {
        Self {
            db: Arc::new(db),
            loader,
            max_upload_bytes,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DataQuery {
    #[serde(default = "default_business_id")]
    pub business_id: i64,
    #[serde(default = "default_diagnostic")]
    pub diagnostic: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    pub file_format: Option<String>,
}

fn default_business_id() -> i64 {
    DEFAULT_BUSINESS_ID
}

fn default_diagnostic() -> bool {
    true
}

fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// The complete route tree, rejections already turned into JSON replies.
pub fn routes(
    state: AppState,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Infallible> + Clone {
    let status = warp::path("status")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(handlers::status);

    let data = warp::path("data")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<DataQuery>())
        .and(with_state(state.clone()))
        .and_then(handlers::get_data);

    let upload = warp::path("upload_business_csv")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::query::<UploadQuery>())
        .and(warp::multipart::form().max_length(state.max_upload_bytes))
        .and(with_state(state))
        .and_then(handlers::upload_business_csv);

    status
        .or(data)
        .or(upload)
        .recover(reply::recover)
        .with(warp::trace::request())
}
