#![allow(dead_code)]

pub mod agent_mock;
pub mod api_app;
