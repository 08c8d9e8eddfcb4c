// Adapters layer: concrete implementations for external systems (http backend).

pub mod http;
