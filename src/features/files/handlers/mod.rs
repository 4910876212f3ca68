mod file_handler;

pub use file_handler::{
    __path_download_file, __path_fill_queue, __path_get_calendar, __path_get_files,
    __path_upload_file, download_file, fill_queue, get_calendar, get_files, upload_file,
};
