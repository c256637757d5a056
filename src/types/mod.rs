//! Type definitions for the Nailkit HTTP client
//!
//! Request options and replay metadata, transport and envelope responses,
//! and identifier newtypes.

pub mod identifiers;
pub mod request;
pub mod response;

pub use identifiers::{DEFAULT_LOGIN_ROUTE, RouteName};
pub use request::{
    AUTHORIZATION, CONTENT_TYPE, JSON_CONTENT_TYPE, Method, QueryValue, RequestOptions,
    RequestOptionsBuilder, RetryableRequestInfo,
};
pub use response::{ApiResponse, RawResponse, TransportResponse, is_success_code};
