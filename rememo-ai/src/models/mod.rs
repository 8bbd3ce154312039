//! Wire types for rememo-ai requests and responses

pub mod diary;
pub mod photo;
pub mod scoring;

pub use diary::{DiaryModifyRequest, DiaryRequest, DiaryResponse, PhotoItem};
pub use photo::{PhotoId, PhotoInput};
pub use scoring::{ImageScoringRequest, ImageScoringResponse, ScoreQuery};
