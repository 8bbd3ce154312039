//! Diary generation request/response types

use serde::{Deserialize, Serialize};

/// One photo of a diary day with its optional metadata
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PhotoItem {
    #[serde(rename = "photoUrl")]
    pub photo_url: String,
    #[serde(rename = "shootingDateTime", default)]
    pub shooting_date_time: Option<String>,
    #[serde(rename = "detailedAddress", default)]
    pub detailed_address: Option<String>,
    /// Position within the day; photos without one go last
    #[serde(default)]
    pub sequence: Option<i64>,
    #[serde(default)]
    pub keyword: Option<String>,
}

/// POST /generate body
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiaryRequest {
    /// Sample of the user's own writing, used as a style reference
    pub user_speech: String,
    pub image_info: Vec<PhotoItem>,
}

/// POST /modify body
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiaryModifyRequest {
    pub user_speech: String,
    pub diary: String,
    pub user_request: String,
    /// 1-based sentence indices the user wants changed
    #[serde(rename = "modifyLines", default)]
    pub modify_lines: Option<Vec<usize>>,
}

/// Generated or modified diary plus its emotion label
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DiaryResponse {
    pub diary: String,
    pub emoji: String,
}
