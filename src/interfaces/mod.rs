//! Interface layer: the REST API

pub mod http;
