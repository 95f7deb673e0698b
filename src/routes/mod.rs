pub mod publisher;

pub use publisher::publisher_router;
