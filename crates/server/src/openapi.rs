use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String, pub service: String, pub version: String }

#[derive(ToSchema)]
pub struct ListingDoc {
    pub id: u64,
    pub address: String,
    pub area: String,
    pub open_house_time: String,
    pub redfin_url: String,
    pub notes: String,
    pub price: Option<u64>,
}

#[derive(ToSchema)]
pub struct LeadRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    /// `open_house` or `contact` (default)
    pub source: Option<String>,
    pub listing_id: Option<i64>,
    pub listing_address: Option<String>,
}

#[derive(ToSchema)]
pub struct StatusMessageDoc { pub success: bool, pub message: String }

#[derive(ToSchema)]
pub struct DetailResponse { pub detail: String }

#[derive(OpenApi)]
#[openapi(
    info(title = "Seattle Home Picks API", version = "1.0.0"),
    paths(
        crate::routes::health::health,
        crate::routes::open_houses::list,
        crate::routes::leads::create,
    ),
    components(
        schemas(
            HealthResponse,
            ListingDoc,
            LeadRequest,
            StatusMessageDoc,
            DetailResponse,
        )
    ),
    tags(
        (name = "health"),
        (name = "open-houses"),
        (name = "leads")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_public_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        assert!(paths.iter().any(|p| *p == "/"));
        assert!(paths.iter().any(|p| *p == "/open-houses"));
        assert!(paths.iter().any(|p| *p == "/leads"));
    }
}
