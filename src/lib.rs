mod basic;
pub mod prelude {
    use crate::basic;
    pub use basic::*;

    #[cfg(feature = "ecs")]
    pub use ecs::{
        plugin::{ResultProjectionPlugin, default_app},
        post_processing::PostProcessing,
    };
}
