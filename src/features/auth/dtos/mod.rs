pub mod auth_dto;

pub use auth_dto::{CodeResponseDto, MessageResponseDto, TokenResponseDto, UserIdDto, UserLoginDto};
