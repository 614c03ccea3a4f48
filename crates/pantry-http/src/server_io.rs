//! HTTP-bound encoder/decoder.
//!
//! [`ServerEncoderDecoder`] wraps a [`Codec`] with the response conventions
//! every handler shares: the `Content-Type` header is settled before the
//! status line, the status is written before the body, and every body is
//! rendered as an [`ApiResponse`] envelope.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderValue};
use http::{HeaderMap, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use pantry_encoding::{Codec, ContentType, EncodingError};
use pantry_model::{ApiResponse, ErrorCode, QueryFilteredResult, ResponseDetails};

use crate::writer::ResponseWriter;

/// Shared request decoder and response encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerEncoderDecoder {
    default_content_type: ContentType,
}

impl ServerEncoderDecoder {
    /// Create an encoder/decoder whose responses default to `default_content_type`.
    #[must_use]
    pub const fn new(default_content_type: ContentType) -> Self {
        Self {
            default_content_type,
        }
    }

    /// The configured default content type.
    #[must_use]
    pub const fn content_type(&self) -> ContentType {
        self.default_content_type
    }

    fn request_content_type(headers: &HeaderMap) -> ContentType {
        headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(ContentType::try_from_mime)
            .unwrap_or_default()
    }

    fn response_content_type(&self, w: &ResponseWriter) -> ContentType {
        match w.header(&CONTENT_TYPE) {
            Some(preset) => ContentType::from_mime(preset),
            None => self.default_content_type,
        }
    }

    /// Decode a request body in the format named by its `Content-Type`.
    ///
    /// JSON bodies are decoded strictly: unknown fields are an error.
    pub fn decode_request<T: DeserializeOwned>(&self, req: &http::Request<Bytes>) -> Result<T, EncodingError> {
        self.decode_body(req.headers(), req.body())
    }

    /// Decode a body whose format is named by `headers`, strictly for JSON.
    pub fn decode_body<T: DeserializeOwned>(&self, headers: &HeaderMap, body: &[u8]) -> Result<T, EncodingError> {
        let codec = Codec::new(Self::request_content_type(headers));
        codec.unmarshal_strict(body)
    }

    /// Decode JSON bytes leniently.
    pub fn decode_bytes<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, EncodingError> {
        Codec::json().unmarshal(bytes)
    }

    /// Write `value` in a success envelope with `200 OK`.
    pub fn respond_with_data<T: Serialize + ?Sized>(
        &self,
        details: &ResponseDetails,
        w: &mut ResponseWriter,
        value: &T,
    ) {
        self.encode_response_with_status(details, w, value, StatusCode::OK);
    }

    /// Write `value` in a success envelope with `status`.
    pub fn encode_response_with_status<T: Serialize + ?Sized>(
        &self,
        details: &ResponseDetails,
        w: &mut ResponseWriter,
        value: &T,
        status: StatusCode,
    ) {
        let envelope = ApiResponse::new(value, details.clone());
        self.write_envelope(w, &envelope, status);
    }

    /// Write one page of a list and its pagination with `200 OK`.
    pub fn encode_list_response<T: Serialize>(
        &self,
        details: &ResponseDetails,
        w: &mut ResponseWriter,
        page: QueryFilteredResult<T>,
    ) {
        let envelope = ApiResponse::list(page.data, page.pagination, details.clone());
        self.write_envelope(w, &envelope, StatusCode::OK);
    }

    /// Write an error envelope with `status`.
    pub fn encode_error_response(
        &self,
        details: &ResponseDetails,
        w: &mut ResponseWriter,
        message: &str,
        code: ErrorCode,
        status: StatusCode,
    ) {
        let envelope: ApiResponse<()> = ApiResponse::error(code, message, details.clone());
        self.write_envelope(w, &envelope, status);
    }

    /// Header, then status, then body. A body that fails to encode is
    /// logged; the status already written stands.
    fn write_envelope<T: Serialize>(&self, w: &mut ResponseWriter, envelope: &ApiResponse<T>, status: StatusCode) {
        let content_type = self.response_content_type(w);
        w.set_header(CONTENT_TYPE, HeaderValue::from_static(content_type.as_mime()));
        w.write_header(status);

        if let Err(err) = Codec::new(content_type).encode(&mut *w, envelope) {
            tracing::error!(error = %err, %content_type, %status, "encoding response body");
        }
    }

    /// `400 invalid_request_input`.
    pub fn encode_invalid_input_response(&self, details: &ResponseDetails, w: &mut ResponseWriter) {
        self.encode_error_response(
            details,
            w,
            "invalid input attached to request",
            ErrorCode::InvalidRequestInput,
            StatusCode::BAD_REQUEST,
        );
    }

    /// `404 not_found`.
    pub fn encode_not_found_response(&self, details: &ResponseDetails, w: &mut ResponseWriter) {
        self.encode_error_response(
            details,
            w,
            "resource not found",
            ErrorCode::NotFound,
            StatusCode::NOT_FOUND,
        );
    }

    /// `401 unauthenticated`.
    pub fn encode_unauthorized_response(&self, details: &ResponseDetails, w: &mut ResponseWriter) {
        self.encode_error_response(
            details,
            w,
            "invalid credentials provided",
            ErrorCode::Unauthenticated,
            StatusCode::UNAUTHORIZED,
        );
    }

    /// `403 forbidden`.
    pub fn encode_invalid_permissions_response(&self, details: &ResponseDetails, w: &mut ResponseWriter) {
        self.encode_error_response(
            details,
            w,
            "invalid permissions",
            ErrorCode::Forbidden,
            StatusCode::FORBIDDEN,
        );
    }

    /// `500 internal`.
    pub fn encode_unspecified_internal_server_error_response(
        &self,
        details: &ResponseDetails,
        w: &mut ResponseWriter,
    ) {
        self.encode_error_response(
            details,
            w,
            "something has gone awry",
            ErrorCode::Internal,
            StatusCode::INTERNAL_SERVER_ERROR,
        );
    }

    /// Serialize `value` in the default content type.
    ///
    /// # Panics
    ///
    /// Panics when `value` cannot be represented. Only for startup and
    /// background paths with no caller to report to.
    #[must_use]
    pub fn must_encode<T: Serialize + ?Sized>(&self, value: &T) -> Vec<u8> {
        Codec::new(self.default_content_type)
            .encode_to_vec(value)
            .unwrap_or_else(|err| panic!("encoding value: {err}"))
    }

    /// Serialize `value` as JSON.
    ///
    /// # Panics
    ///
    /// Panics when `value` cannot be represented as JSON.
    #[must_use]
    pub fn must_encode_json<T: Serialize + ?Sized>(&self, value: &T) -> Vec<u8> {
        Codec::json()
            .encode_to_vec(value)
            .unwrap_or_else(|err| panic!("encoding value as JSON: {err}"))
    }
}
