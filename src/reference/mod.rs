//! Static lookup tables injected into the client.

mod countries;
mod routes;

pub use countries::CountryTable;
pub use routes::RouteTable;
