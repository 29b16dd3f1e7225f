pub mod orchestrator;
pub mod recorder;

#[cfg(test)]
pub(crate) mod support;
