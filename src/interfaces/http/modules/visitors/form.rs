//! Multipart parsing for visitor submissions
//!
//! Text fields arrive under their camelCase names; `visitorImage` is
//! required, `bikeNumberImage` optional. Images are stored as soon as they
//! are read so only references travel further.

use axum::extract::multipart::{Field, Multipart};

use crate::application::{ImageStore, SubmitVisitor};
use crate::domain::VisitorDetails;
use crate::infrastructure::uploads::local::normalize_extension;
use crate::interfaces::http::common::ApiError;

pub const VISITOR_IMAGE_FIELD: &str = "visitorImage";
pub const BIKE_IMAGE_FIELD: &str = "bikeNumberImage";

/// Pick a stored extension from the file name, falling back to the
/// content type.
fn image_extension(field: &Field<'_>) -> Option<&'static str> {
    let from_name = field
        .file_name()
        .and_then(|name| name.rsplit_once('.'))
        .and_then(|(_, ext)| normalize_extension(ext));

    from_name.or_else(|| {
        field
            .content_type()
            .and_then(|ct| ct.strip_prefix("image/"))
            .and_then(normalize_extension)
    })
}

async fn read_image(field: Field<'_>, images: &dyn ImageStore) -> Result<Option<String>, ApiError> {
    let name = field.name().unwrap_or_default().to_string();
    let ext = image_extension(&field);
    let bytes = field
        .bytes()
        .await
        .map_err(|e| ApiError::validation(format!("Could not read {}: {}", name, e.body_text())))?;

    // Browsers send an empty part for an untouched file input.
    if bytes.is_empty() {
        return Ok(None);
    }
    let ext = ext.ok_or_else(|| ApiError::validation(format!("{} must be a JPEG, PNG or WebP image", name)))?;

    let image_ref = images.save(&bytes, ext).await.map_err(|e| {
        ApiError(crate::domain::DomainError::Internal(format!("Image store: {}", e)))
    })?;
    Ok(Some(image_ref))
}

pub async fn parse_submission(mut multipart: Multipart, images: &dyn ImageStore) -> Result<SubmitVisitor, ApiError> {
    let mut details = VisitorDetails::default();
    let mut manual_bike_number = None;
    let mut visitor_image_ref = None;
    let mut bike_image_ref = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed form data: {}", e.body_text())))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            VISITOR_IMAGE_FIELD => visitor_image_ref = read_image(field, images).await?,
            BIKE_IMAGE_FIELD => bike_image_ref = read_image(field, images).await?,
            _ => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::validation(format!("Could not read {}: {}", name, e.body_text())))?;
                let slot = match name.as_str() {
                    "visitorName" => &mut details.visitor_name,
                    "visitorPhone" => &mut details.visitor_phone,
                    "visitorAddress" => &mut details.visitor_address,
                    "ownerName" => &mut details.owner_name,
                    "ownerEmail" => &mut details.owner_email,
                    "ownerMobile" => &mut details.owner_mobile,
                    "flatNo" => &mut details.flat_no,
                    "floor" => &mut details.floor,
                    "visitorEmail" => {
                        details.visitor_email = Some(value);
                        continue;
                    }
                    "bikeNumber" => {
                        manual_bike_number = Some(value);
                        continue;
                    }
                    _ => continue,
                };
                *slot = value;
            }
        }
    }

    let visitor_image_ref =
        visitor_image_ref.ok_or_else(|| ApiError::validation("Visitor photo is required"))?;

    Ok(SubmitVisitor {
        details,
        visitor_image_ref,
        bike_image_ref,
        manual_bike_number,
    })
}
