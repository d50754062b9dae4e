pub mod ids;
pub mod instance;
pub mod requests;
pub mod sector;
pub mod template;
pub mod view;

#[cfg(test)]
pub(crate) mod fixtures;
