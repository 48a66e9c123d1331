//! Addon upload handler.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::extract::multipart::{Field, Multipart};
use axum::http::StatusCode;
use workshop_catalog::{AddonRecord, IngestRequest, ingest_addon};
use workshop_core::{AddonMetadata, MAX_IMAGES_PER_ADDON};
use workshop_storage::{ArtifactKind, StorageError, StoredArtifact};

/// Accumulated multipart state for one upload request.
///
/// Artifacts are placed on disk as their fields stream in; whoever stops the
/// request early is responsible for discarding what was already placed.
#[derive(Default)]
struct UploadIntake {
    main: Option<(StoredArtifact, String)>,
    images: Vec<StoredArtifact>,
    name: Option<String>,
    author: Option<String>,
    description: Option<String>,
    kind: Option<String>,
}

/// POST /v1/addons - Upload a new addon package with optional preview images.
///
/// Expected multipart fields: `file` (the package), `image0`..`image4`
/// (previews), and the text fields `name`, `author`, `description`, `kind`.
#[tracing::instrument(skip(state, multipart))]
pub async fn upload_addon(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<AddonRecord>)> {
    let mut intake = UploadIntake::default();

    if let Err(e) = read_fields(&state, multipart, &mut intake).await {
        discard_placed(&state, &intake).await;
        return Err(e);
    }

    let Some((main, original_name)) = intake.main.take() else {
        discard_placed(&state, &intake).await;
        return Err(ApiError::BadRequest("no addon file uploaded".to_string()));
    };

    let request = IngestRequest {
        main,
        original_name,
        metadata: AddonMetadata {
            name: intake.name.take().unwrap_or_default(),
            author: intake.author.take(),
            description: intake.description.take().unwrap_or_default(),
            kind: intake.kind.take(),
        },
        images: std::mem::take(&mut intake.images),
    };

    // The ingest flow cleans up the placed artifacts itself on every
    // rejection path (missing fields, duplicate content, store failure).
    let record = ingest_addon(state.catalog.as_ref(), state.storage.as_ref(), request).await?;

    tracing::info!(addon_id = %record.id, name = %record.name, "addon uploaded");
    Ok((StatusCode::CREATED, Json(record)))
}

/// Whether a multipart field name is one of the allowed image slots.
fn is_image_field(name: &str) -> bool {
    name.strip_prefix("image")
        .and_then(|s| s.parse::<usize>().ok())
        .is_some_and(|i| i < MAX_IMAGES_PER_ADDON)
}

async fn read_fields(
    state: &AppState,
    mut multipart: Multipart,
    intake: &mut UploadIntake,
) -> ApiResult<()> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        let Some(field_name) = field.name().map(str::to_string) else {
            continue;
        };

        match field_name.as_str() {
            "file" => {
                if intake.main.is_some() {
                    return Err(ApiError::BadRequest(
                        "duplicate addon file field".to_string(),
                    ));
                }
                let original_name = field.file_name().unwrap_or("addon").to_string();
                let placed = place_field(state, ArtifactKind::Package, &mut field).await?;
                intake.main = Some((placed, original_name));
            }
            name if is_image_field(name) => {
                let placed = place_field(state, ArtifactKind::Image, &mut field).await?;
                intake.images.push(placed);
            }
            "name" => intake.name = Some(read_text(field).await?),
            "author" => intake.author = Some(read_text(field).await?),
            "description" => intake.description = Some(read_text(field).await?),
            "kind" => intake.kind = Some(read_text(field).await?),
            other => {
                tracing::debug!(field = %other, "ignoring unknown multipart field");
            }
        }
    }
    Ok(())
}

/// Stream one multipart file field into the artifact store.
async fn place_field(
    state: &AppState,
    kind: ArtifactKind,
    field: &mut Field<'_>,
) -> ApiResult<StoredArtifact> {
    let original_name = field.file_name().unwrap_or("upload").to_string();
    let content_type = field.content_type().map(str::to_string);

    let mut upload = state
        .storage
        .place_stream(kind, &original_name, content_type.as_deref())
        .await?;

    loop {
        let chunk = match field.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => {
                let _ = upload.abort().await;
                return Err(ApiError::BadRequest(format!(
                    "malformed multipart body: {e}"
                )));
            }
        };
        if let Err(e) = upload.write(chunk).await {
            let _ = upload.abort().await;
            return Err(e.into());
        }
    }

    Ok(upload.finish().await?)
}

async fn read_text(field: Field<'_>) -> ApiResult<String> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))
}

/// Remove artifacts placed for a request that was rejected at the transport
/// layer, before the ingest flow took ownership of cleanup.
async fn discard_placed(state: &AppState, intake: &UploadIntake) {
    let keys = intake
        .main
        .iter()
        .map(|(artifact, _)| artifact.key.as_str())
        .chain(intake.images.iter().map(|artifact| artifact.key.as_str()));

    for key in keys {
        match state.storage.delete(key).await {
            Ok(()) | Err(StorageError::NotFound(_)) => {}
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "failed to clean up artifact after rejected upload");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_field_names() {
        assert!(is_image_field("image0"));
        assert!(is_image_field("image4"));
        assert!(!is_image_field("image5"));
        assert!(!is_image_field("imageX"));
        assert!(!is_image_field("file"));
    }
}
