//! Data Transfer Objects for REST responses that are not plain domain
//! types.

pub mod rollback_dto;

pub use rollback_dto::*;
