pub mod file_dto;

pub use file_dto::{
    CalendarFilterQuery, FileFilterQuery, FileResponseDto, FillQueueResponseDto, UploadFileDto,
};
