// Domain layer: records, flags and the ports the pipeline talks through.

pub mod model;
pub mod ports;
