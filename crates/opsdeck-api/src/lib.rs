// opsdeck-api: Async clients for the services shown on the opsdeck dashboard.

pub mod error;
pub mod github;
pub mod models;
pub mod netlify;
pub mod transport;
pub mod vercel;

pub use error::Error;
pub use github::GithubClient;
pub use netlify::NetlifyClient;
pub use transport::TransportConfig;
pub use vercel::VercelClient;
