// Domain layer: models, the hole-numbering mapper, scoring helpers, and the
// ports the pipeline plugs into. No I/O here besides the port signatures.

pub mod mapping;
pub mod model;
pub mod ports;
pub mod scoring;
