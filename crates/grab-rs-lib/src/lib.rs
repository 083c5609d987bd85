pub mod error;
pub use error::Result;
pub use error::Error;

pub mod config;
pub use config::Config;

pub mod coordinate;
pub use coordinate::DependencyCoordinate;
pub use coordinate::Exclusion;
pub use coordinate::Record;

pub mod dependency;
pub use dependency::DependencyDescriptor;

pub mod repository;
pub use repository::Repository;
pub use repository::RepositoryRegistry;

pub mod progress;
pub mod transport;
pub mod local_repository;

pub mod resolver;
pub use resolver::ResolutionEngine;
pub use resolver::GraphEngine;

pub mod load_path;
pub use load_path::LoadPath;
pub use load_path::ClassPath;

pub mod grab_engine;
pub use grab_engine::GrabEngine;
