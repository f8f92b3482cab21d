use bytes::BufMut;
use futures::TryStreamExt;
use std::time::Instant;
use tracing::{info, warn};
use warp::{
    http::StatusCode,
    multipart::FormData,
    reject::Rejection,
    reply::Reply,
};

use super::{
    reply::{self, ErrorBody, UploadResponse},
    AppState, DataQuery, UploadQuery, DEFAULT_FILE_FORMAT,
};
use crate::error::LoadError;
use crate::store::SymptomStore;

pub async fn status() -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&serde_json::json!({ "status": "Health OK" })))
}

pub async fn get_data(query: DataQuery, state: AppState) -> Result<impl Reply, Rejection> {
    let DataQuery {
        business_id,
        diagnostic,
    } = query;
    let db = state.db.clone();
    let found =
        tokio::task::spawn_blocking(move || db.session()?.find(business_id, diagnostic)).await;

    let reply = match found {
        Ok(Ok(records)) => {
            info!(
                business_id,
                diagnostic,
                matches = records.len(),
                "data query"
            );
            warp::reply::with_status(warp::reply::json(&records), StatusCode::OK)
        }
        Ok(Err(e)) => {
            warn!(error = %e, "data query failed");
            reply::error(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new("query_failed", e.to_string()),
            )
        }
        Err(e) => reply::internal_error(e),
    };
    Ok(reply)
}

pub async fn upload_business_csv(
    query: UploadQuery,
    form: FormData,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let start = Instant::now();

    let upload = match read_form(form).await {
        Ok(upload) => upload,
        Err(e) => {
            warn!(error = %e, "could not read multipart upload");
            return Ok(reply::error(
                StatusCode::BAD_REQUEST,
                ErrorBody::new("invalid_upload", e.to_string()),
            ));
        }
    };
    let Some(file) = upload.file else {
        return Ok(reply::error(
            StatusCode::BAD_REQUEST,
            ErrorBody::new("missing_file", "multipart field `file` is required"),
        ));
    };
    let encoding = upload
        .file_format
        .or(query.file_format)
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FILE_FORMAT.to_string());

    info!(
        bytes = file.len(),
        file_name = upload.file_name.as_deref().unwrap_or("-"),
        encoding = %encoding,
        "upload received"
    );

    // rows are processed one at a time with blocking store calls
    let db = state.db.clone();
    let loader = state.loader;
    let outcome = tokio::task::spawn_blocking(move || {
        let mut session = db
            .session()
            .map_err(|source| LoadError::Persistence { row: None, source })?;
        loader.load_bytes(&mut session, &file, &encoding)
    })
    .await;

    let elapsed = start.elapsed().as_secs_f64();
    let reply = match outcome {
        Ok(Ok(summary)) => {
            info!(
                rows = summary.rows_committed,
                elapsed_s = elapsed,
                "upload loaded"
            );
            warp::reply::with_status(
                warp::reply::json(&UploadResponse::from_summary(summary, elapsed)),
                StatusCode::OK,
            )
        }
        Ok(Err(e)) => {
            warn!(error = %e, elapsed_s = elapsed, "upload rejected");
            reply::load_error(e)
        }
        Err(e) => reply::internal_error(e),
    };
    Ok(reply)
}

#[derive(Debug, Default)]
struct Upload {
    file: Option<Vec<u8>>,
    file_name: Option<String>,
    file_format: Option<String>,
}

async fn read_form(form: FormData) -> Result<Upload, warp::Error> {
    let parts: Vec<(String, Option<String>, Vec<u8>)> = form
        .and_then(|mut part| async move {
            let mut data = Vec::new();
            while let Some(chunk) = part.data().await {
                data.put(chunk?);
            }
            Ok::<_, warp::Error>((
                part.name().to_string(),
                part.filename().map(str::to_string),
                data,
            ))
        })
        .try_collect()
        .await?;

    let mut upload = Upload::default();
    for (name, file_name, data) in parts {
        match name.as_str() {
            "file" => {
                upload.file_name = file_name;
                upload.file = Some(data);
            }
            "file_format" => {
                upload.file_format = Some(String::from_utf8_lossy(&data).trim().to_string());
            }
            _ => {}
        }
    }
    Ok(upload)
}
