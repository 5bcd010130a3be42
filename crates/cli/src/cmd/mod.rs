mod build;
mod inspect;
mod toolchains;

pub use build::cmd_build;
pub use inspect::cmd_inspect;
pub use toolchains::cmd_toolchains;
