pub mod auth_service;
pub mod extract_service;
pub mod insight_service;
pub mod report_service;
