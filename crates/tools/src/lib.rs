//! Developer tooling: read-only inspectors over worlds and the engine.

mod inspector;

pub use inspector::{EngineInspector, EngineSummary, EntityInfo, WorldInspector, WorldSummary};

pub fn crate_info() -> &'static str {
    "tileworld-tools v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("tools"));
    }
}
