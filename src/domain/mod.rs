// Domain layer: filter values, page schemas, form payloads and the ports the core talks through.

pub mod model;
pub mod payload;
pub mod ports;
pub mod schema;
