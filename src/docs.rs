use utoipa::OpenApi;

use crate::modules::media::dto::MediaResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::media::handler::upload_media,
        crate::modules::media::handler::get_media,
        crate::modules::media::handler::delete_media,
        crate::modules::media::streaming::stream_media,
        crate::modules::media::streaming::stream_hls,
    ),
    components(
        schemas(
            MediaResponse,
        )
    ),
    tags(
        (name = "Media", description = "Upload, playback resolution and deletion"),
        (name = "Delivery", description = "Static media and HLS artifact delivery")
    )
)]
pub struct ApiDoc;
