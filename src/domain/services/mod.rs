pub mod auth_service;
pub mod job_queue;
pub mod notification;
pub mod renderer;
