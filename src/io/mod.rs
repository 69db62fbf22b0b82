//! I/O abstraction layer for talking to the GitHub API

pub mod reqwest_transport;
pub mod transport;
pub mod uri;

pub use reqwest_transport::ReqwestTransport;
pub use transport::{HttpRequest, HttpResponse, HttpTransport};
pub use uri::{ApiEndpoints, RepoRef};
