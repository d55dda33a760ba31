pub mod client;
pub mod configuration;
pub mod domain;
pub mod endpoints;
pub mod expectation;
pub mod report;
pub mod scenarios;
pub mod telemetry;
pub mod workflow;
