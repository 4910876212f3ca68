pub mod auth_handler;

pub use auth_handler::{
    __path_get_code, __path_info, __path_login, __path_save_code, get_code, info, login, save_code,
};
