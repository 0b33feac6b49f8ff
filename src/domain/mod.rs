// Domain layer: city records, table rows and the ports the importer talks to.

pub mod model;
pub mod ports;
