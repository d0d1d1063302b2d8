// Application layer - Ingestion, scoring and scheduling use cases
pub mod ingestion_pipeline;
pub mod monitor_service;
pub mod quality_scorer;
pub mod reading_sink;
pub mod scheduler;
pub mod sensor_registry;
pub mod simulator;
