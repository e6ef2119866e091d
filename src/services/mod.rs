pub mod authorizer;
pub mod storage;
pub mod upload_log;
