pub mod cache;
pub mod forms;
pub mod image;
pub mod middleware;
pub mod slug;
pub mod validation;
