use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::core::distance::calculate_bounding_box;
use crate::models::{CandidateUser, GeoPoint};
use crate::services::directory::{DirectoryError, UserDirectory};

/// Number of documents requested per page
const PAGE_SIZE: usize = 100;

/// Hard stop for pagination so a misbehaving API cannot loop forever
const MAX_PAGES: usize = 1000;

/// Appwrite-backed user directory
///
/// Lists the documents of a profiles collection and maps each one to a
/// `CandidateUser`. Documents without coordinates are kept unplaced so a
/// shared location can still position them.
pub struct AppwriteDirectory {
    base_url: String,
    api_key: String,
    project_id: String,
    database_id: String,
    collection: String,
    client: Client,
}

/// Profile document as stored in Appwrite
#[derive(Debug, Deserialize)]
struct ProfileDocument {
    #[serde(rename = "userId")]
    user_id: String,
    name: String,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    profession: Option<String>,
    #[serde(alias = "lat")]
    latitude: Option<f64>,
    #[serde(alias = "lng")]
    longitude: Option<f64>,
}

impl ProfileDocument {
    fn into_candidate(self) -> CandidateUser {
        let location = match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
            _ => None,
        };

        CandidateUser {
            id: self.user_id,
            name: self.name,
            image: self.image.unwrap_or_default(),
            profession: self.profession.unwrap_or_default(),
            location,
        }
    }
}

impl AppwriteDirectory {
    /// Create a new Appwrite directory client
    pub fn new(
        base_url: String,
        api_key: String,
        project_id: String,
        database_id: String,
        collection: String,
        timeout: Duration,
    ) -> Result<Self, DirectoryError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            api_key,
            project_id,
            database_id,
            collection,
            client,
        })
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.base_url.trim_end_matches('/'),
            self.database_id,
            self.collection
        )
    }

    /// Fetch every page matching `filters`
    async fn list_documents(&self, filters: &[String]) -> Result<Vec<CandidateUser>, DirectoryError> {
        let mut candidates = Vec::new();
        let mut offset = 0usize;

        for _ in 0..MAX_PAGES {
            let mut queries = filters.to_vec();
            queries.push(format!("limit({})", PAGE_SIZE));
            queries.push(format!("offset({})", offset));

            // Build query array for Appwrite
            let queries_json = serde_json::to_string(&queries)
                .map_err(|e| DirectoryError::InvalidResponse(e.to_string()))?;
            let full_url = format!(
                "{}?query={}",
                self.documents_url(),
                urlencoding::encode(&queries_json)
            );

            let response = self
                .client
                .get(&full_url)
                .header("X-Appwrite-Key", &self.api_key)
                .header("X-Appwrite-Project", &self.project_id)
                .send()
                .await?;

            let status = response.status();
            if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
                return Err(DirectoryError::Unauthorized);
            }
            if !status.is_success() {
                return Err(DirectoryError::ApiError(format!(
                    "Failed to list profiles: {}",
                    status
                )));
            }

            let json: Value = response.json().await?;

            let total = json.get("total").and_then(|t| t.as_u64()).map(|t| t as usize);

            let documents = json
                .get("documents")
                .and_then(|d| d.as_array())
                .ok_or_else(|| DirectoryError::InvalidResponse("Missing documents array".into()))?;

            let page_len = documents.len();
            candidates.extend(documents.iter().filter_map(|doc| {
                let data = doc.get("data").unwrap_or(doc);
                serde_json::from_value::<ProfileDocument>(data.clone())
                    .ok()
                    .map(ProfileDocument::into_candidate)
            }));

            offset += page_len;
            let exhausted = page_len < PAGE_SIZE || total.is_some_and(|t| offset >= t);
            if exhausted {
                break;
            }
        }

        tracing::debug!("Listed {} directory profiles from Appwrite", candidates.len());

        Ok(candidates)
    }
}

/// Server-side pre-filter for a radius search
///
/// The longitude bounds are dropped when the box crosses the antimeridian,
/// so the filter never excludes a point inside the radius.
fn bounding_box_filters(origin: GeoPoint, radius_m: f64) -> Vec<String> {
    let bbox = calculate_bounding_box(origin, radius_m);

    let mut filters = vec![
        format!("greaterThanEqual(\"latitude\", {})", bbox.min_lat),
        format!("lessThanEqual(\"latitude\", {})", bbox.max_lat),
    ];
    if bbox.min_lng >= -180.0 && bbox.max_lng <= 180.0 {
        filters.push(format!("greaterThanEqual(\"longitude\", {})", bbox.min_lng));
        filters.push(format!("lessThanEqual(\"longitude\", {})", bbox.max_lng));
    }
    filters
}

#[async_trait]
impl UserDirectory for AppwriteDirectory {
    async fn candidates(&self) -> Result<Vec<CandidateUser>, DirectoryError> {
        self.list_documents(&[]).await
    }

    async fn candidates_near(
        &self,
        origin: GeoPoint,
        radius_m: f64,
    ) -> Result<Vec<CandidateUser>, DirectoryError> {
        self.list_documents(&bounding_box_filters(origin, radius_m)).await
    }

    async fn health_check(&self) -> Result<bool, DirectoryError> {
        let url = format!(
            "{}/databases/{}",
            self.base_url.trim_end_matches('/'),
            self.database_id
        );

        let response = self
            .client
            .get(&url)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
            .send()
            .await?;

        Ok(response.status().is_success())
    }
}
