use crate::api;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health_check,
        api::auth::register,
        api::auth::login,
        api::request::create_request,
        api::order::create_proxy_order,
        api::shipment::create_shipment,
        api::shipment::get_by_order,
        api::admin::create_user,
        api::admin::broadcast,
        // Add other endpoints here as we document them
    ),
    tags(
        (name = "partslink", description = "PartsLink sourcing & logistics API")
    )
)]
pub struct ApiDoc;
