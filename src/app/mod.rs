pub mod prediction_service;
pub mod training;
