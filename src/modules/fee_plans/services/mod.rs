pub mod line_item_resolver;

pub use line_item_resolver::{LineItemResolver, Resolution, ResolutionStrategy, ResolveTarget};
