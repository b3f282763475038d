// API module entry
// Concrete endpoints built on `RequestHandler`

mod files;

pub use files::FilesEndpoint;
