// Server module entry point
// Binds the listener and serves connections

pub mod connection;
pub mod listener;

// `loop` is a keyword, so the file is mounted as server_loop
#[path = "loop.rs"]
pub mod server_loop;

// Re-export commonly used items
pub use listener::create_listener;
pub use server_loop::serve;
