use actix_web::http::header;
use actix_web::HttpResponse;

/// 1x1 transparent GIF.
pub static PIXEL_GIF: [u8; 43] = [
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, //
    0x80, 0x00, 0x00, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x21, //
    0xf9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00, //
    0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44, //
    0x01, 0x00, 0x3b,
];

pub const CONTENT_TYPE: &str = "image/gif";

/// The only response `/track` ever sends.
pub fn response() -> HttpResponse {
    HttpResponse::Ok()
        .content_type(CONTENT_TYPE)
        .insert_header((
            header::CACHE_CONTROL,
            "no-cache, no-store, must-revalidate",
        ))
        .body(&PIXEL_GIF[..])
}
